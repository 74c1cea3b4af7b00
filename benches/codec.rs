#[path = "../util/util.rs"]
mod util;

use util::bench_images;

use std::time::Duration;

use criterion::{
    criterion_group, criterion_main, measurement::WallTime, Bencher, BenchmarkId, Criterion,
    SamplingMode,
};
use image::RgbImage;
use wta::PixelGrid;

fn bench(c: &mut Criterion, group: &str, mut f: impl FnMut(&mut Bencher<WallTime>, &RgbImage)) {
    let mut group = c.benchmark_group(group);
    group
        .sample_size(30)
        .noise_threshold(0.05)
        .sampling_mode(SamplingMode::Flat)
        .warm_up_time(Duration::from_millis(500));

    for (name, image) in bench_images() {
        group.bench_with_input(BenchmarkId::from_parameter(name), image, &mut f);
    }
}

fn encode_single(c: &mut Criterion) {
    bench(c, "encode_single", |b, image| {
        let grid = PixelGrid::try_from(image).unwrap();
        b.iter(|| wta::encode(grid).unwrap())
    });
}

fn encode_par(c: &mut Criterion) {
    bench(c, "encode_par", |b, image| {
        let grid = PixelGrid::try_from(image).unwrap();
        b.iter(|| wta::encode_par(grid).unwrap())
    });
}

fn decode_single(c: &mut Criterion) {
    bench(c, "decode_single", |b, image| {
        let bytes = wta::encode(PixelGrid::try_from(image).unwrap()).unwrap();
        b.iter(|| wta::decode(&bytes).unwrap())
    });
}

fn decode_par(c: &mut Criterion) {
    bench(c, "decode_par", |b, image| {
        let bytes = wta::encode(PixelGrid::try_from(image).unwrap()).unwrap();
        b.iter(|| wta::decode_par(&bytes).unwrap())
    });
}

criterion_group!(benches, encode_single, encode_par, decode_single, decode_par);
criterion_main!(benches);
