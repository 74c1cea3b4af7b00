#![allow(dead_code)]

use std::sync::OnceLock;

use image::{Rgb, RgbImage};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;

/// A smooth gradient with a little noise, so the palette has a few thousand colors.
pub fn noisy_gradient(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    RgbImage::from_fn(width, height, |x, y| {
        let noise = rng.gen_range(0..8);
        #[allow(clippy::cast_possible_truncation)]
        Rgb([
            (x * 255 / width) as u8,
            (y * 255 / height) as u8,
            ((x + y) % 200 + noise) as u8,
        ])
    })
}

/// Uniformly random pixels, the worst case for palette size.
pub fn random_image(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    RgbImage::from_fn(width, height, |_, _| Rgb(rng.gen()))
}

static BENCH_IMAGES: OnceLock<Vec<(String, RgbImage)>> = OnceLock::new();

pub fn load_bench_images() -> Vec<(String, RgbImage)> {
    [(480, 270), (1920, 1080)]
        .into_iter()
        .flat_map(|(w, h)| {
            [
                (format!("gradient_{w}x{h}"), noisy_gradient(w, h, 0)),
                (format!("random_{w}x{h}"), random_image(w, h, 0)),
            ]
        })
        .collect()
}

pub fn bench_images() -> &'static [(String, RgbImage)] {
    BENCH_IMAGES.get_or_init(load_bench_images)
}
