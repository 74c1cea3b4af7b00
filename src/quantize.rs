//! Color quantization into palette keys.

use crate::PALETTE_KEY_BITS;
use palette::Srgb;

/// A lossy mapping between colors and integer keys.
///
/// Encoding with a [`Quantizer`] replaces each color with its key,
/// and decoding replaces each key with a representative color.
/// Only keys below `2^18` fit in a `.wta` palette entry.
pub trait Quantizer {
    /// Returns the key for the given color.
    fn quantize(&self, color: Srgb<u8>) -> u32;

    /// Returns the representative color for the given key.
    fn dequantize(&self, key: u32) -> Srgb<u8>;
}

/// The default quantizer: keeps the high 6 bits of each channel to form an 18-bit key.
///
/// Each key covers 4 consecutive levels of each channel
/// and dequantizes to the midpoint `2 + 4 * c` of that range,
/// so every channel is reconstructed within `3` of its original value.
///
/// # Examples
/// ```
/// # use wta::{Quantizer, Rgb666};
/// # use palette::Srgb;
/// let key = Rgb666.quantize(Srgb::new(253, 148, 1));
/// assert_eq!(key, (63 << 12) | (37 << 6));
/// assert_eq!(Rgb666.dequantize(key), Srgb::new(254, 150, 2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb666;

impl Rgb666 {
    /// The number of bits kept per channel.
    pub const CHANNEL_BITS: u32 = PALETTE_KEY_BITS / 3;

    /// The number of low bits dropped from each channel.
    const SHIFT: u32 = u8::BITS - Self::CHANNEL_BITS;

    /// Masks a single channel of a key.
    const MASK: u32 = (1 << Self::CHANNEL_BITS) - 1;
}

impl Quantizer for Rgb666 {
    #[inline]
    fn quantize(&self, color: Srgb<u8>) -> u32 {
        let [r, g, b] = [color.red, color.green, color.blue].map(|c| u32::from(c) >> Self::SHIFT);
        (r << (2 * Self::CHANNEL_BITS)) | (g << Self::CHANNEL_BITS) | b
    }

    #[inline]
    fn dequantize(&self, key: u32) -> Srgb<u8> {
        let channel = |shift: u32| {
            let c = (key >> shift) & Self::MASK;
            #[allow(clippy::cast_possible_truncation)]
            {
                ((c << Self::SHIFT) + (1 << (Self::SHIFT - 1))) as u8
            }
        };
        Srgb::new(channel(2 * Self::CHANNEL_BITS), channel(Self::CHANNEL_BITS), channel(0))
    }
}
