//! A compact palette-rank image codec.
//!
//! `wta` reduces every pixel of an RGB image to an 18-bit quantized color,
//! ranks the distinct quantized colors by how often they occur,
//! and replaces each pixel with its rank, packed at the bit (not byte) level.
//! The result is the `.wta` format:
//!
//! ```text
//! uint32 magic = 0xFFBEADFF | uint32 rows | uint32 cols | uint32 num_colors
//! num_colors × 18-bit quantized colors, most frequent first
//! rows * cols × ceil(log2(num_colors))-bit rank codes
//! zero padding up to the final byte
//! ```
//!
//! All fields are written least-significant-bit first with no byte alignment between them.
//! Quantization drops the low two bits of each channel, so decoding is lossy:
//! every channel comes back within `3` of its original value.
//!
//! # Features
//! - `threads`: exposes parallel versions of the per-pixel passes via [`rayon`].
//! - `image`: enables integration with the [`image`] crate.
//!
//! # Example
//! ```
//! # use wta::{PixelGrid, Error};
//! # use palette::Srgb;
//! # fn main() -> Result<(), Error> {
//! let pixels = vec![Srgb::new(200, 10, 10), Srgb::new(200, 10, 10), Srgb::new(0, 0, 255)];
//! let grid = PixelGrid::new(&pixels, 1, 3)?;
//!
//! let bytes = wta::encode(grid)?;
//! let image = wta::decode(&bytes)?;
//! assert_eq!((image.rows(), image.cols()), (1, 3));
//! # Ok(())
//! # }
//! ```
//!
//! Lower level building blocks are also exposed:
//! the bit-level [`BitWriter`] and [`BitReader`],
//! the [`Quantizer`] trait with its default [`Rgb666`] implementation,
//! and the frequency ranking in [`RankedColors`].

#![deny(unsafe_code)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod bitstream;
mod codec;
mod error;
mod instrument;
mod quantize;
mod ranking;
mod types;

pub use bitstream::*;
pub use codec::*;
pub use error::*;
pub use instrument::*;
pub use quantize::*;
pub use ranking::*;
pub use types::*;

/// The magic number at the start of every `.wta` stream.
pub const MAGIC: u32 = 0xFFBE_ADFF;

/// The number of bits used for each palette entry in the `.wta` format.
pub const PALETTE_KEY_BITS: u32 = 18;

/// The maximum number of distinct colors a `.wta` palette can hold (`2^18`).
pub const MAX_PALETTE_COLORS: u32 = 1 << PALETTE_KEY_BITS;

/// The maximum supported image size in number of pixels is `u32::MAX`.
pub const MAX_PIXELS: u32 = u32::MAX;

/// The size in bytes of the [`BitWriter`] buffer.
pub const BUFFER_BYTES: usize = 4096;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use palette::Srgb;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoroshiro128PlusPlus;

    /// `len` uniformly random colors from a fixed seed.
    pub fn random_colors(len: usize, seed: u64) -> Vec<Srgb<u8>> {
        let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
        (0..len)
            .map(|_| Srgb::new(rng.gen(), rng.gen(), rng.gen()))
            .collect()
    }

    /// 1024 random colors drawn from a small set of 16, so that colors repeat.
    pub fn test_data_1024() -> Vec<Srgb<u8>> {
        let swatches = random_colors(16, 42);
        let mut rng = Xoroshiro128PlusPlus::seed_from_u64(7);
        (0..1024)
            .map(|_| swatches[rng.gen_range(0..swatches.len())])
            .collect()
    }

    /// A `rows` x `cols` horizontal/vertical gradient.
    #[allow(clippy::cast_possible_truncation)]
    pub fn gradient(rows: u32, cols: u32) -> Vec<Srgb<u8>> {
        (0..rows)
            .flat_map(|y| {
                (0..cols).map(move |x| {
                    Srgb::new(
                        (x * 255 / cols.max(1)) as u8,
                        (y * 255 / rows.max(1)) as u8,
                        ((x + y) % 256) as u8,
                    )
                })
            })
            .collect()
    }
}
