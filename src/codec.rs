//! Encoding images into and decoding images from the `.wta` format.

use crate::{
    AboveMaxLen, BitReader, BitWriter, DecodedImage, Error, FileHeader, FormatError, Instrument,
    LogPhases, Phase, PixelGrid, Quantizer, RankedColors, Rgb666, TieBreak, MAX_PALETTE_COLORS,
    MAX_PIXELS, PALETTE_KEY_BITS,
};
use palette::Srgb;
#[cfg(feature = "threads")]
use rayon::prelude::*;
use std::io::{Read, Write};

/// Returns the number of bits used for each rank code given the palette length.
///
/// This is `ceil(log2(num_colors))`, which is `0` for a single color (and for an empty palette).
///
/// # Examples
/// ```
/// # use wta::rank_code_width;
/// assert_eq!(rank_code_width(1), 0);
/// assert_eq!(rank_code_width(2), 1);
/// assert_eq!(rank_code_width(9000), 14);
/// assert_eq!(rank_code_width(1 << 18), 18);
/// ```
#[must_use]
pub const fn rank_code_width(num_colors: u32) -> u32 {
    if num_colors <= 1 {
        0
    } else {
        u32::BITS - (num_colors - 1).leading_zeros()
    }
}

/// A builder struct to specify the options for encoding.
///
/// # Examples
/// ```
/// # use wta::{EncodeOptions, TieBreak};
/// let options = EncodeOptions::new().tie_break(TieBreak::Key);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions<Q = Rgb666> {
    /// The quantizer used to compute palette keys.
    quantizer: Q,
    /// The order of equally frequent colors in the palette.
    tie_break: TieBreak,
}

impl EncodeOptions {
    /// Creates a new [`EncodeOptions`] with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            quantizer: Rgb666,
            tie_break: TieBreak::FirstSeen,
        }
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q: Quantizer> EncodeOptions<Q> {
    /// Sets how equally frequent colors are ordered in the palette.
    ///
    /// The default is [`TieBreak::FirstSeen`].
    #[must_use]
    pub fn tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Sets the quantizer used to compute palette keys.
    ///
    /// The default is [`Rgb666`]. The same quantizer must be given when decoding.
    #[must_use]
    pub fn quantizer<Q2: Quantizer>(self, quantizer: Q2) -> EncodeOptions<Q2> {
        EncodeOptions { quantizer, tie_break: self.tie_break }
    }
}

/// Information about a completed encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSummary {
    /// The header that was written.
    pub header: FileHeader,
    /// The number of bits used for each rank code.
    pub rank_code_width: u32,
    /// The number of bits written, excluding the final padding.
    pub bits_written: u64,
}

impl EncodeSummary {
    /// The number of bytes written, including the final padding.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bits_written.div_ceil(8)
    }
}

/// Encodes an image into a `.wta` byte stream with the default options.
///
/// # Errors
/// Returns [`Error::Capacity`] if the image has too many distinct quantized colors.
pub fn encode(grid: PixelGrid) -> Result<Vec<u8>, Error> {
    let mut bytes = Vec::new();
    encode_to_writer(grid, &mut bytes, &EncodeOptions::new(), &mut LogPhases::new())?;
    Ok(bytes)
}

/// Encodes an image into `sink`.
///
/// The palette is checked before anything is written,
/// so `sink` is left untouched if [`Error::Capacity`] is returned.
///
/// # Errors
/// Returns [`Error::Capacity`] if a quantized color does not fit in a palette entry
/// or there are more than [`MAX_PALETTE_COLORS`] distinct quantized colors.
/// Returns [`Error::Io`] if writing to `sink` fails.
pub fn encode_to_writer<Q: Quantizer>(
    grid: PixelGrid,
    sink: impl Write,
    options: &EncodeOptions<Q>,
    instrument: &mut impl Instrument,
) -> Result<EncodeSummary, Error> {
    let keys = grid
        .iter()
        .map(|&color| options.quantizer.quantize(color))
        .collect::<Vec<_>>();
    instrument.phase(Phase::Quantized);

    let ranked = rank(&keys, options.tie_break)?;
    instrument.phase(Phase::Ranked);

    let ranks = ranked.map_ranks(&keys);
    write_stream(grid, &ranked, &ranks, sink, instrument)
}

/// Encodes an image into a `.wta` byte stream with the default options in parallel.
///
/// The output is identical to [`encode`].
///
/// # Errors
/// Returns [`Error::Capacity`] if the image has too many distinct quantized colors.
#[cfg(feature = "threads")]
pub fn encode_par(grid: PixelGrid) -> Result<Vec<u8>, Error> {
    let mut bytes = Vec::new();
    encode_to_writer_par(grid, &mut bytes, &EncodeOptions::new(), &mut LogPhases::new())?;
    Ok(bytes)
}

/// Encodes an image into `sink`, quantizing and remapping pixels in parallel.
///
/// The output is identical to [`encode_to_writer`].
///
/// # Errors
/// See [`encode_to_writer`].
#[cfg(feature = "threads")]
pub fn encode_to_writer_par<Q: Quantizer + Sync>(
    grid: PixelGrid,
    sink: impl Write,
    options: &EncodeOptions<Q>,
    instrument: &mut impl Instrument,
) -> Result<EncodeSummary, Error> {
    let keys = grid
        .par_iter()
        .map(|&color| options.quantizer.quantize(color))
        .collect::<Vec<_>>();
    instrument.phase(Phase::Quantized);

    let ranked = rank(&keys, options.tie_break)?;
    instrument.phase(Phase::Ranked);

    let ranks = ranked.map_ranks_par(&keys);
    write_stream(grid, &ranked, &ranks, sink, instrument)
}

/// Ranks the keys, rejecting palettes that cannot be written.
fn rank(keys: &[u32], tie_break: TieBreak) -> Result<RankedColors, Error> {
    let ranked = RankedColors::new(keys, tie_break).map_err(Error::Capacity)?;
    if ranked.num_colors() > MAX_PALETTE_COLORS {
        return Err(Error::Capacity(AboveMaxLen(MAX_PALETTE_COLORS)));
    }
    Ok(ranked)
}

/// Writes the header, palette, and rank codes.
fn write_stream(
    grid: PixelGrid,
    ranked: &RankedColors,
    ranks: &[u32],
    sink: impl Write,
    instrument: &mut impl Instrument,
) -> Result<EncodeSummary, Error> {
    let header = FileHeader {
        rows: grid.rows(),
        cols: grid.cols(),
        num_colors: ranked.num_colors(),
    };

    let mut writer = BitWriter::new(sink);
    writer.write_header(&header)?;
    instrument.phase(Phase::HeaderWritten);

    for &key in ranked.palette() {
        writer.write_bits(key, PALETTE_KEY_BITS)?;
    }
    instrument.phase(Phase::PaletteWritten);

    let width = rank_code_width(header.num_colors);
    log::debug!(
        "encoding {}x{} pixels with {} colors at {width} bits per pixel",
        header.rows,
        header.cols,
        header.num_colors,
    );

    if width > 0 {
        for &rank in ranks {
            writer.write_bits(rank, width)?;
        }
    }

    let bits_written = writer.bits_written();
    writer.close()?;
    instrument.phase(Phase::PixelsWritten);

    Ok(EncodeSummary {
        header,
        rank_code_width: width,
        bits_written,
    })
}

/// Decodes a `.wta` byte stream with the default quantizer.
///
/// # Errors
/// Returns [`Error::Format`] if `bytes` is not a valid `.wta` stream.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, Error> {
    decode_with(bytes, &Rgb666, &mut LogPhases::new())
}

/// Decodes a `.wta` byte stream using the given quantizer to reconstruct colors.
///
/// # Errors
/// Returns [`Error::Format`] if `bytes` is not a valid `.wta` stream.
pub fn decode_with(
    bytes: &[u8],
    quantizer: &impl Quantizer,
    instrument: &mut impl Instrument,
) -> Result<DecodedImage, Error> {
    let (header, palette, ranks) = read_stream(&mut BitReader::new(bytes), instrument)?;

    let colors = dequantize_palette(&palette, quantizer);
    let pixels = ranks.to_colors(&colors);
    instrument.phase(Phase::PixelsRead);

    Ok(DecodedImage::new_unchecked(pixels, header.rows, header.cols))
}

/// Reads all of `reader` into memory and decodes it.
///
/// # Errors
/// Returns [`Error::Io`] if reading fails
/// or [`Error::Format`] if the data is not a valid `.wta` stream.
pub fn decode_from_reader(
    reader: impl Read,
    quantizer: &impl Quantizer,
    instrument: &mut impl Instrument,
) -> Result<DecodedImage, Error> {
    let reader = BitReader::from_reader(reader)?;
    decode_with(&reader.into_inner(), quantizer, instrument)
}

/// Decodes a `.wta` byte stream with the default quantizer,
/// reconstructing pixels in parallel.
///
/// # Errors
/// Returns [`Error::Format`] if `bytes` is not a valid `.wta` stream.
#[cfg(feature = "threads")]
pub fn decode_par(bytes: &[u8]) -> Result<DecodedImage, Error> {
    decode_with_par(bytes, &Rgb666, &mut LogPhases::new())
}

/// Decodes a `.wta` byte stream using the given quantizer,
/// reconstructing pixels in parallel.
///
/// # Errors
/// Returns [`Error::Format`] if `bytes` is not a valid `.wta` stream.
#[cfg(feature = "threads")]
pub fn decode_with_par(
    bytes: &[u8],
    quantizer: &impl Quantizer,
    instrument: &mut impl Instrument,
) -> Result<DecodedImage, Error> {
    let (header, palette, ranks) = read_stream(&mut BitReader::new(bytes), instrument)?;

    let colors = dequantize_palette(&palette, quantizer);
    let pixels = ranks.to_colors_par(&colors);
    instrument.phase(Phase::PixelsRead);

    Ok(DecodedImage::new_unchecked(pixels, header.rows, header.cols))
}

/// Dequantizes each palette entry once.
fn dequantize_palette(palette: &[u32], quantizer: &impl Quantizer) -> Vec<Srgb<u8>> {
    palette.iter().map(|&key| quantizer.dequantize(key)).collect()
}

/// The rank of every pixel in a stream.
#[derive(Debug, PartialEq, Eq)]
enum PixelRanks {
    /// This many pixels, all of rank `0`. No rank codes are stored for a palette of one color.
    Uniform(usize),
    /// One rank per pixel in raster order.
    Coded(Vec<u32>),
}

impl PixelRanks {
    /// Looks up the color of every pixel.
    fn to_colors(&self, colors: &[Srgb<u8>]) -> Vec<Srgb<u8>> {
        match self {
            Self::Uniform(len) => colors.first().map_or_else(Vec::new, |&color| vec![color; *len]),
            Self::Coded(ranks) => ranks.iter().map(|&rank| colors[rank as usize]).collect(),
        }
    }

    /// Looks up the color of every pixel in parallel.
    #[cfg(feature = "threads")]
    fn to_colors_par(&self, colors: &[Srgb<u8>]) -> Vec<Srgb<u8>> {
        match self {
            Self::Uniform(_) => self.to_colors(colors),
            Self::Coded(ranks) => ranks.par_iter().map(|&rank| colors[rank as usize]).collect(),
        }
    }
}

/// Reads and validates the header, then reads the palette and every rank code.
///
/// Returns the header, the palette keys indexed by rank, and the rank of each pixel.
fn read_stream(
    reader: &mut BitReader<impl AsRef<[u8]>>,
    instrument: &mut impl Instrument,
) -> Result<(FileHeader, Vec<u32>, PixelRanks), FormatError> {
    let header = reader.read_header()?;
    let FileHeader { rows, cols, num_colors } = header;

    let pixels = header.num_pixels();
    if pixels > u64::from(MAX_PIXELS) {
        return Err(FormatError::TooManyPixels { rows, cols });
    }
    if num_colors > MAX_PALETTE_COLORS || (num_colors == 0 && pixels > 0) {
        return Err(FormatError::BadPaletteLength { num_colors, pixels });
    }

    // check the length up front so that a forged header cannot cause a huge allocation
    let width = rank_code_width(num_colors);
    let needed = u64::from(num_colors) * u64::from(PALETTE_KEY_BITS) + pixels * u64::from(width);
    let available = reader.bits_remaining();
    if needed > available {
        return Err(FormatError::Truncated { needed, available });
    }
    instrument.phase(Phase::HeaderRead);

    log::debug!("decoding {rows}x{cols} pixels with {num_colors} colors at {width} bits per pixel");

    let palette = (0..num_colors)
        .map(|_| reader.read_bits(PALETTE_KEY_BITS))
        .collect::<Result<Vec<_>, _>>()?;
    instrument.phase(Phase::PaletteRead);

    #[allow(clippy::cast_possible_truncation)]
    let pixels = pixels as usize;

    let ranks = if width == 0 {
        PixelRanks::Uniform(pixels)
    } else {
        let ranks = (0..pixels)
            .map(|_| {
                let rank = reader.read_bits(width)?;
                if rank < num_colors {
                    Ok(rank)
                } else {
                    Err(FormatError::RankOutOfRange { rank, num_colors })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        PixelRanks::Coded(ranks)
    };

    Ok((header, palette, ranks))
}
