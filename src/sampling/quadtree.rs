//! Hierarchical importance map over screen space
//!
//! A complete 4-ary tree of depth L partitions `[0, 1]^2` into `4^(L-1)` leaf
//! regions. Leaves hold measured importance; every internal node holds the sum
//! of its four children. Drawing a sample walks from the root to a leaf,
//! choosing one child per level in proportion to its weight, so each draw
//! costs O(L) regardless of screen resolution and no per-pixel CDF is needed.
//!
//! Child order within a node is `0 = (x0, y0)`, `1 = (x1, y0)`,
//! `2 = (x0, y1)`, `3 = (x1, y1)`.

use glam::Vec2;

use crate::core::error::Error;
use crate::core::rng::RandomState;
use crate::core::types::Result;

/// Child sums below this are treated as degenerate and sampled uniformly
pub const DEGENERATE_EPSILON: f32 = 1e-6;

/// Deepest tree accepted, `4^(MAX_DEPTH-1)` leaves
pub const MAX_DEPTH: u32 = 12;

const UNIFORM: [f32; 4] = [0.25; 4];

/// Leaf grid side for a tree of `depth` levels
fn leaf_side(depth: u32) -> Result<usize> {
    if depth == 0 || depth > MAX_DEPTH {
        return Err(Error::config(format!(
            "quadtree depth {} outside 1..={}",
            depth, MAX_DEPTH
        )));
    }
    Ok(1usize << (depth - 1))
}

/// A node addressed by level (0 = root) and grid position within that level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub level: u32,
    pub x: u32,
    pub y: u32,
}

impl NodeId {
    pub const ROOT: NodeId = NodeId { level: 0, x: 0, y: 0 };

    /// Child `index` (0..4) one level down
    pub fn child(self, index: usize) -> NodeId {
        NodeId {
            level: self.level + 1,
            x: self.x * 2 + (index as u32 & 1),
            y: self.y * 2 + (index as u32 >> 1),
        }
    }

    /// Screen-space bounds `(min, max)` of this node
    pub fn bounds(self) -> (Vec2, Vec2) {
        let size = 1.0 / (1u32 << self.level) as f32;
        let min = Vec2::new(self.x as f32 * size, self.y as f32 * size);
        (min, min + Vec2::splat(size))
    }
}

/// Result of one root-to-leaf walk
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FoveatedSample {
    pub leaf: NodeId,
    /// Lower corner of the leaf footprint in `[0, 1]^2`
    pub min: Vec2,
    /// Upper corner of the leaf footprint
    pub max: Vec2,
    /// Probability of reaching this leaf
    pub probability: f32,
}

impl FoveatedSample {
    /// Footprint packed as `(min.x, min.y, max.x, max.y)`
    pub fn to_array(&self) -> [f32; 4] {
        [self.min.x, self.min.y, self.max.x, self.max.y]
    }
}

/// Complete quadtree of importance weights, stored level by level
#[derive(Clone, Debug)]
pub struct ImportanceQuadTree {
    depth: u32,
    /// `levels[k]` is a row-major `2^k x 2^k` grid
    levels: Vec<Vec<f32>>,
}

impl ImportanceQuadTree {
    /// Build from leaf weights, row-major over a `2^(depth-1)` square grid
    pub fn from_leaves(depth: u32, leaves: Vec<f32>) -> Result<Self> {
        let side = leaf_side(depth)?;
        if leaves.len() != side * side {
            return Err(Error::config(format!(
                "depth {} needs {} leaves, got {}",
                depth,
                side * side,
                leaves.len()
            )));
        }

        let mut levels = vec![leaves];
        for level in (0..depth - 1).rev() {
            let side = 1usize << level;
            let below = &levels[levels.len() - 1];
            let below_side = side * 2;
            let mut sums = vec![0.0; side * side];
            for y in 0..side {
                for x in 0..side {
                    let (cx, cy) = (x * 2, y * 2);
                    sums[y * side + x] = below[cy * below_side + cx]
                        + below[cy * below_side + cx + 1]
                        + below[(cy + 1) * below_side + cx]
                        + below[(cy + 1) * below_side + cx + 1];
                }
            }
            levels.push(sums);
        }
        levels.reverse();

        Ok(Self { depth, levels })
    }

    /// Build by supersampling `score` on an `samples x samples` grid per leaf
    ///
    /// `score` receives screen positions in `[0, 1]^2`; negative scores are
    /// clamped to zero. A leaf's importance is the mean of its samples.
    pub fn build<F>(depth: u32, samples: u32, score: F) -> Result<Self>
    where
        F: Fn(Vec2) -> f32,
    {
        let samples = samples.max(1);
        let side = leaf_side(depth)? as u32;
        let leaf_size = 1.0 / side as f32;
        let step = leaf_size / samples as f32;

        let mut leaves = Vec::with_capacity((side * side) as usize);
        for y in 0..side {
            for x in 0..side {
                let origin = Vec2::new(x as f32, y as f32) * leaf_size;
                let mut total = 0.0;
                for sy in 0..samples {
                    for sx in 0..samples {
                        let p = origin + Vec2::new(sx as f32 + 0.5, sy as f32 + 0.5) * step;
                        total += score(p).max(0.0);
                    }
                }
                leaves.push(total / (samples * samples) as f32);
            }
        }

        Self::from_leaves(depth, leaves)
    }

    /// Build from an RGBA preview image using a luminance/contrast heuristic
    ///
    /// Leaf importance is mean luminance plus luminance standard deviation of
    /// the pixels falling in the leaf, so both bright and noisy regions attract
    /// samples. Leaves that cover no pixel get zero.
    pub fn from_image(depth: u32, rgba: &[f32], width: u32, height: u32) -> Result<Self> {
        let side = leaf_side(depth)?;
        let mut sum = vec![0.0f64; side * side];
        let mut sum_sq = vec![0.0f64; side * side];
        let mut count = vec![0u32; side * side];

        for py in 0..height as usize {
            for px in 0..width as usize {
                let i = (py * width as usize + px) * 4;
                let Some(texel) = rgba.get(i..i + 3) else { continue };
                let lum = (0.2126 * texel[0] + 0.7152 * texel[1] + 0.0722 * texel[2]) as f64;

                let lx = px * side / width as usize;
                let ly = py * side / height as usize;
                let leaf = ly * side + lx;
                sum[leaf] += lum;
                sum_sq[leaf] += lum * lum;
                count[leaf] += 1;
            }
        }

        let leaves = (0..side * side)
            .map(|i| {
                if count[i] == 0 {
                    return 0.0;
                }
                let n = count[i] as f64;
                let mean = sum[i] / n;
                let variance = (sum_sq[i] / n - mean * mean).max(0.0);
                (mean + variance.sqrt()).max(0.0) as f32
            })
            .collect();

        Self::from_leaves(depth, leaves)
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Number of leaf regions, `4^(depth-1)`
    pub fn leaf_count(&self) -> usize {
        self.levels[self.depth as usize - 1].len()
    }

    /// Weight stored at `node`
    pub fn weight(&self, node: NodeId) -> f32 {
        let side = 1usize << node.level;
        self.levels[node.level as usize][node.y as usize * side + node.x as usize]
    }

    /// Sum of all leaf weights
    pub fn total(&self) -> f32 {
        self.levels[0][0]
    }

    /// Probability of descending into each child of `node`
    ///
    /// Returns exactly `[0.25; 4]` for leaves and for nodes whose children sum
    /// to less than [`DEGENERATE_EPSILON`].
    pub fn node_probabilities(&self, node: NodeId) -> [f32; 4] {
        if node.level + 1 >= self.depth {
            return UNIFORM;
        }

        let children = [0, 1, 2, 3].map(|i| self.weight(node.child(i)));
        let sum: f32 = children.iter().sum();
        if sum < DEGENERATE_EPSILON {
            return UNIFORM;
        }
        children.map(|c| c / sum)
    }

    /// Walk from the root to a leaf, one uniform draw per level
    pub fn sample(&self, rng: &mut RandomState) -> FoveatedSample {
        let mut node = NodeId::ROOT;
        let mut probability = 1.0;

        for _ in 0..self.depth - 1 {
            let probabilities = self.node_probabilities(node);
            let index = select_region(&probabilities, rng.next_f32());
            probability *= probabilities[index];
            node = node.child(index);
        }

        let (min, max) = node.bounds();
        FoveatedSample {
            leaf: node,
            min,
            max,
            probability,
        }
    }
}

/// Inverse-CDF choice among four children
///
/// Accumulates in child order and returns the first index whose running sum
/// reaches `u`. Rounding can leave the total just below 1, so a `u` that never
/// triggers selects the last child.
pub fn select_region(probabilities: &[f32; 4], u: f32) -> usize {
    let mut running = 0.0;
    for (index, p) in probabilities.iter().enumerate() {
        running += p;
        if running >= u {
            return index;
        }
    }
    3
}

/// Gaze-centred Gaussian falloff used to build the foveation map
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FoveaScore {
    /// Gaze point in `[0, 1]^2`
    pub center: Vec2,
    /// Standard deviation of the falloff, in screen units
    pub radius: f32,
    /// Minimum importance kept in the periphery so no region starves
    pub floor: f32,
}

impl FoveaScore {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self {
            center,
            radius,
            floor: 0.05,
        }
    }

    pub fn score(&self, p: Vec2) -> f32 {
        let sigma = self.radius.max(1e-3);
        let d2 = (p - self.center).length_squared();
        self.floor + (-d2 / (2.0 * sigma * sigma)).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_uniform(p: [f32; 4]) {
        assert_eq!(p, [0.25, 0.25, 0.25, 0.25]);
    }

    #[test]
    fn test_select_region_examples() {
        let p = [0.1, 0.2, 0.3, 0.4];
        assert_eq!(select_region(&p, 0.05), 0);
        assert_eq!(select_region(&p, 0.25), 1);
        assert_eq!(select_region(&p, 0.99), 3);
        assert_eq!(select_region(&p, 1.0), 3);
    }

    #[test]
    fn test_select_region_short_total_falls_back_to_last() {
        let p = [0.1, 0.1, 0.1, 0.1];
        assert_eq!(select_region(&p, 0.9), 3);
    }

    #[test]
    fn test_bad_shapes_are_configuration_errors() {
        assert!(ImportanceQuadTree::from_leaves(0, vec![]).unwrap_err().is_configuration());
        assert!(ImportanceQuadTree::from_leaves(3, vec![1.0; 15]).unwrap_err().is_configuration());
        assert!(ImportanceQuadTree::build(33, 1, |_| 1.0).unwrap_err().is_configuration());
        assert!(ImportanceQuadTree::build(MAX_DEPTH + 1, 1, |_| 1.0).is_err());
        assert!(ImportanceQuadTree::from_image(0, &[], 0, 0).is_err());
        assert_eq!(ImportanceQuadTree::from_leaves(1, vec![2.0]).unwrap().leaf_count(), 1);
    }

    #[test]
    fn test_internal_nodes_sum_children() {
        let leaves: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let tree = ImportanceQuadTree::from_leaves(3, leaves).unwrap();

        assert_eq!(tree.leaf_count(), 16);
        // Top-left quadrant holds leaves (0,0) (1,0) (0,1) (1,1) = 0 + 1 + 4 + 5
        assert_eq!(tree.weight(NodeId { level: 1, x: 0, y: 0 }), 10.0);
        assert_eq!(tree.total(), (0..16).sum::<i32>() as f32);
    }

    #[test]
    fn test_uniform_score_gives_uniform_tree() {
        let tree = ImportanceQuadTree::build(4, 2, |_| 3.0).unwrap();

        let first = tree.weight(NodeId { level: 3, x: 0, y: 0 });
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(tree.weight(NodeId { level: 3, x, y }), first);
            }
        }

        for level in 0..3 {
            let side = 1 << level;
            for y in 0..side {
                for x in 0..side {
                    assert_uniform(tree.node_probabilities(NodeId { level, x, y }));
                }
            }
        }
    }

    #[test]
    fn test_probabilities_normalized() {
        let tree = ImportanceQuadTree::build(5, 3, |p| p.x * p.x + 0.3 * p.y).unwrap();
        for level in 0..4 {
            let side = 1 << level;
            for y in 0..side {
                for x in 0..side {
                    let p = tree.node_probabilities(NodeId { level, x, y });
                    let sum: f32 = p.iter().sum();
                    assert!((sum - 1.0).abs() < 1e-5, "level {} sum {}", level, sum);
                }
            }
        }
    }

    #[test]
    fn test_degenerate_node_is_exactly_uniform() {
        let mut leaves = vec![0.0; 16];
        leaves[15] = 1.0;
        let tree = ImportanceQuadTree::from_leaves(3, leaves).unwrap();

        // Top-left quadrant is all zero
        assert_uniform(tree.node_probabilities(NodeId { level: 1, x: 0, y: 0 }));
        // Bottom-right quadrant is not
        assert_eq!(
            tree.node_probabilities(NodeId { level: 1, x: 1, y: 1 }),
            [0.0, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn test_leaf_probabilities_uniform() {
        let tree = ImportanceQuadTree::build(2, 1, |p| p.x).unwrap();
        assert_uniform(tree.node_probabilities(NodeId { level: 1, x: 1, y: 0 }));
    }

    #[test]
    fn test_sample_lands_in_leaf() {
        let tree = ImportanceQuadTree::build(4, 2, |p| p.y).unwrap();
        let mut rng = RandomState::new(3);
        for _ in 0..100 {
            let s = tree.sample(&mut rng);
            assert_eq!(s.leaf.level, 3);
            let (min, max) = s.leaf.bounds();
            assert_eq!((s.min, s.max), (min, max));
            assert!((s.max.x - s.min.x - 0.125).abs() < 1e-6);
            assert!(s.probability > 0.0 && s.probability <= 1.0);
        }
    }

    #[test]
    fn test_sampling_follows_importance() {
        // All weight in the right half of the screen
        let tree = ImportanceQuadTree::build(3, 2, |p| if p.x > 0.5 { 1.0 } else { 0.0 }).unwrap();
        let mut rng = RandomState::new(11);
        for _ in 0..200 {
            let s = tree.sample(&mut rng);
            assert!(s.min.x >= 0.5);
        }
    }

    #[test]
    fn test_sample_probability_matches_leaf_share() {
        let leaves = vec![1.0, 1.0, 1.0, 5.0];
        let tree = ImportanceQuadTree::from_leaves(2, leaves).unwrap();
        let mut rng = RandomState::new(5);
        let s = tree.sample(&mut rng);
        let expected = tree.weight(s.leaf) / tree.total();
        assert!((s.probability - expected).abs() < 1e-6);
    }

    #[test]
    fn test_fovea_score_peaks_at_center() {
        let fovea = FoveaScore::new(Vec2::new(0.25, 0.75), 0.1);
        let tree = ImportanceQuadTree::build(3, 4, |p| fovea.score(p)).unwrap();
        let p = tree.node_probabilities(NodeId::ROOT);
        // Gaze sits in the bottom-left quadrant (x0, y1)
        let best = (0..4).max_by(|a, b| p[*a].total_cmp(&p[*b])).unwrap();
        assert_eq!(best, 2);
        assert!(p.iter().all(|v| *v > 0.0));
    }

    #[test]
    fn test_from_image_prefers_bright_regions() {
        let (w, h) = (8u32, 8u32);
        let mut rgba = vec![0.0; (w * h * 4) as usize];
        for y in 0..h {
            for x in 0..w {
                if x < 4 && y < 4 {
                    let i = ((y * w + x) * 4) as usize;
                    rgba[i..i + 3].copy_from_slice(&[1.0, 1.0, 1.0]);
                }
            }
        }
        let tree = ImportanceQuadTree::from_image(2, &rgba, w, h).unwrap();
        assert_eq!(tree.node_probabilities(NodeId::ROOT), [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_node_child_bounds() {
        let child = NodeId::ROOT.child(3);
        assert_eq!(child, NodeId { level: 1, x: 1, y: 1 });
        let (min, max) = child.bounds();
        assert_eq!(min, Vec2::new(0.5, 0.5));
        assert_eq!(max, Vec2::new(1.0, 1.0));
    }
}
