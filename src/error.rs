//! Error types returned by the codec.

use crate::{AboveMaxLen, DimensionMismatch};
use thiserror::Error;

/// The reasons a byte stream is rejected as not being a valid `.wta` stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The first 32 bits were not [`MAGIC`](crate::MAGIC).
    #[error("bad magic number {found:#010X}")]
    BadMagic {
        /// The value found in place of the magic number.
        found: u32,
    },
    /// The stream ended before the requested bits could be read.
    #[error("truncated stream: needed {needed} more bits but only {available} remain")]
    Truncated {
        /// The number of bits requested.
        needed: u64,
        /// The number of bits left in the stream.
        available: u64,
    },
    /// A pixel's rank code does not index into the palette.
    #[error("rank {rank} is out of range for a palette of {num_colors} colors")]
    RankOutOfRange {
        /// The rank that was read.
        rank: u32,
        /// The palette length from the header.
        num_colors: u32,
    },
    /// The header describes a palette larger than the format allows,
    /// or an empty palette for a non-empty image.
    #[error("invalid palette length {num_colors} for {pixels} pixels")]
    BadPaletteLength {
        /// The palette length from the header.
        num_colors: u32,
        /// The number of pixels from the header.
        pixels: u64,
    },
    /// `rows * cols` is above [`MAX_PIXELS`](crate::MAX_PIXELS).
    #[error("image of {rows}x{cols} pixels is too large")]
    TooManyPixels {
        /// The row count from the header.
        rows: u32,
        /// The column count from the header.
        cols: u32,
    },
}

/// The error type for encoding and decoding.
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying sink or source failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The input is not a valid `.wta` stream.
    #[error("invalid wta stream: {0}")]
    Format(#[from] FormatError),
    /// The image has more distinct quantized colors than the palette can hold,
    /// or a quantized color does not fit in a palette entry.
    #[error("too many colors for the palette: {0}")]
    Capacity(AboveMaxLen<u32>),
    /// The pixel slice does not match the requested dimensions.
    #[error(transparent)]
    Dimensions(#[from] DimensionMismatch),
}
