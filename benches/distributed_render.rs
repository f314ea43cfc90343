//! Decomposed render with halo exchange, by rank count.
//!
//! Run with: cargo bench --bench distributed_render

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use julia_compute::core::actions::decompose::blur::blur_image;
use julia_compute::core::actions::generate_fractal::serial::render_serial;
use julia_compute::core::fractals::julia::algorithm::JuliaAlgorithm;
use julia_compute::core::fractals::julia::colour_mapping::factory::julia_colour_map_factory;
use julia_compute::engine::render_distributed;
use julia_compute::{ClusterConfig, FractalParams, ImageDims, LocalCluster};

fn bench_ranks(c: &mut Criterion) {
    let params = FractalParams::default();
    let dims = ImageDims::new(512, 512).unwrap();
    let mut group = c.benchmark_group("distributed");

    for ranks in [1, 2, 4, 8] {
        let cluster = LocalCluster::new(ClusterConfig::with_ranks(ranks)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(ranks), &cluster, |b, &cluster| {
            b.iter(|| render_distributed(cluster, &params, black_box(dims)).unwrap());
        });
    }

    group.finish();
}

fn bench_blur(c: &mut Criterion) {
    let params = FractalParams::default();
    let dims = ImageDims::new(512, 512).unwrap();
    let image = render_serial(
        dims,
        &JuliaAlgorithm::new(&params, dims),
        &julia_colour_map_factory(params.theme(), params.max_iterations()),
    );

    c.bench_function("blur_image_512", |b| b.iter(|| blur_image(black_box(&image))));
}

criterion_group!(benches, bench_ranks, bench_blur);
criterion_main!(benches);
