use criterion::{criterion_group, criterion_main, Criterion, black_box};

use glam::Vec2;

use voltrace::core::rng::RandomState;
use voltrace::sampling::{FoveaScore, ImportanceQuadTree};

fn gaze_tree(depth: u32) -> ImportanceQuadTree {
    let score = FoveaScore::new(Vec2::new(0.3, 0.6), 0.15);
    ImportanceQuadTree::build(depth, 4, |p| score.score(p)).unwrap()
}

fn bench_build_depth_6(c: &mut Criterion) {
    let score = FoveaScore::new(Vec2::splat(0.5), 0.2);

    c.bench_function("quadtree_build_depth_6", |b| {
        b.iter(|| ImportanceQuadTree::build(black_box(6), 4, |p| score.score(p)).unwrap());
    });
}

fn bench_build_depth_9(c: &mut Criterion) {
    let score = FoveaScore::new(Vec2::splat(0.5), 0.2);

    c.bench_function("quadtree_build_depth_9", |b| {
        b.iter(|| ImportanceQuadTree::build(black_box(9), 2, |p| score.score(p)).unwrap());
    });
}

fn bench_from_image_512(c: &mut Criterion) {
    let size = 512u32;
    let rgba: Vec<f32> = (0..size * size)
        .flat_map(|i| {
            let v = ((i % size) as f32 / size as f32).powi(2);
            [v, v, v, 1.0]
        })
        .collect();

    c.bench_function("quadtree_from_image_512", |b| {
        b.iter(|| ImportanceQuadTree::from_image(black_box(6), black_box(&rgba), size, size).unwrap());
    });
}

fn bench_sample_regions(c: &mut Criterion) {
    let tree = gaze_tree(6);
    let mut rng = RandomState::new(7);

    c.bench_function("quadtree_sample_16_regions", |b| {
        b.iter(|| {
            for _ in 0..16 {
                black_box(tree.sample(&mut rng));
            }
        });
    });
}

fn bench_sample_deep(c: &mut Criterion) {
    let tree = gaze_tree(10);
    let mut rng = RandomState::new(7);

    c.bench_function("quadtree_sample_depth_10", |b| {
        b.iter(|| black_box(tree.sample(&mut rng)));
    });
}

criterion_group!(
    benches,
    bench_build_depth_6,
    bench_build_depth_9,
    bench_from_image_512,
    bench_sample_regions,
    bench_sample_deep,
);
criterion_main!(benches);
