//! Importance sampling structures for foveated rendering

pub mod quadtree;

pub use quadtree::{
    select_region, FoveaScore, FoveatedSample, ImportanceQuadTree, NodeId, DEGENERATE_EPSILON,
};
