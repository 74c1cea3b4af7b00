//! Bit-level stream I/O independent of byte boundaries.
//!
//! Values are packed least-significant-bit first: the first bit written is bit `0` of the first byte,
//! the ninth bit written is bit `0` of the second byte, and so on.
//! For example, writing `0x3F` in 6 bits, `0x0` in 4 bits, `0xF0` in 8 bits, and `0xAA` in 6 bits
//! produces the bytes `[0x3F, 0xC0, 0xAB]`.

use crate::{FormatError, BUFFER_BYTES, MAGIC};
use bitvec::prelude::*;
use std::io::{self, Read, Write};

/// The capacity of the [`BitWriter`] buffer in bits.
const BUFFER_BITS: usize = BUFFER_BYTES * 8;

/// The fixed 16-byte header at the start of every `.wta` stream,
/// excluding the magic number which is implied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FileHeader {
    /// The number of pixel rows.
    pub rows: u32,
    /// The number of pixel columns.
    pub cols: u32,
    /// The number of distinct quantized colors, i.e., the palette length.
    pub num_colors: u32,
}

impl FileHeader {
    /// The number of pixels described by the header.
    #[must_use]
    pub fn num_pixels(&self) -> u64 {
        u64::from(self.rows) * u64::from(self.cols)
    }
}

/// A writer that appends values of arbitrary bit width to a byte sink.
///
/// Bits are accumulated in a fixed [`BUFFER_BYTES`] buffer which is written out to the sink
/// whenever it fills up, so memory use does not grow with the size of the output.
/// Call [`BitWriter::close`] to write out the final partial buffer.
/// Dropping a [`BitWriter`] without closing it discards any buffered bits.
///
/// # Examples
/// ```
/// # use wta::BitWriter;
/// # fn main() -> std::io::Result<()> {
/// let mut writer = BitWriter::new(Vec::new());
/// writer.write_bits(0xFFA, 12)?;
/// writer.write_bits(1, 1)?;
/// let bytes = writer.close()?;
/// assert_eq!(bytes, [0xFA, 0x1F]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BitWriter<W: Write> {
    /// The underlying byte sink.
    sink: W,
    /// Bits not yet written to `sink`.
    bits: BitVec<u8, Lsb0>,
    /// The number of bits accepted since construction.
    total_bits: u64,
}

impl<W: Write> BitWriter<W> {
    /// Creates a new [`BitWriter`] that writes to `sink`.
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            bits: BitVec::with_capacity(BUFFER_BITS),
            total_bits: 0,
        }
    }

    /// Appends the low `width` bits of `value`, least-significant bit first.
    ///
    /// Bits of `value` above `width` are ignored. A `width` of `0` writes nothing.
    ///
    /// # Errors
    /// Returns an error if the buffer fills up and writing it to the sink fails.
    ///
    /// # Panics
    /// Panics if `width` is greater than `32`.
    pub fn write_bits(&mut self, value: u32, width: u32) -> io::Result<()> {
        assert!(width <= u32::BITS, "bit width {width} is above 32");

        let mut rest = &value.view_bits::<Lsb0>()[..width as usize];
        while !rest.is_empty() {
            let room = BUFFER_BITS - self.bits.len();
            let (head, tail) = rest.split_at(room.min(rest.len()));
            self.bits.extend_from_bitslice(head);
            rest = tail;

            if self.bits.len() == BUFFER_BITS {
                self.flush()?;
            }
        }

        self.total_bits += u64::from(width);
        Ok(())
    }

    /// Writes the magic number followed by the header fields as four 32-bit values.
    ///
    /// # Errors
    /// Returns an error if writing to the sink fails.
    pub fn write_header(&mut self, header: &FileHeader) -> io::Result<()> {
        self.write_bits(MAGIC, 32)?;
        self.write_bits(header.rows, 32)?;
        self.write_bits(header.cols, 32)?;
        self.write_bits(header.num_colors, 32)
    }

    /// Writes all buffered bits to the sink, zero-padding the last partial byte, and clears the buffer.
    ///
    /// Any bits written afterwards start on a new byte.
    ///
    /// # Errors
    /// Returns an error if writing to the sink fails.
    pub fn flush(&mut self) -> io::Result<()> {
        if !self.bits.is_empty() {
            let partial = self.bits.len() % 8;
            if partial != 0 {
                if let Some(last) = self.bits.as_raw_mut_slice().last_mut() {
                    *last &= (1 << partial) - 1;
                }
            }
            self.sink.write_all(self.bits.as_raw_slice())?;
            self.bits.clear();
        }
        self.sink.flush()
    }

    /// Flushes any buffered bits and returns the underlying sink.
    ///
    /// # Errors
    /// Returns an error if writing to the sink fails.
    pub fn close(mut self) -> io::Result<W> {
        self.flush()?;
        Ok(self.sink)
    }

    /// Returns the total number of bits written, including those still buffered.
    #[must_use]
    pub const fn bits_written(&self) -> u64 {
        self.total_bits
    }

    /// Gets a reference to the underlying sink.
    #[must_use]
    pub const fn get_ref(&self) -> &W {
        &self.sink
    }
}

/// A reader that extracts values of arbitrary bit width from an in-memory byte source.
///
/// The whole source must be available up front;
/// use [`BitReader::from_reader`] to load it from an [`io::Read`].
///
/// # Examples
/// ```
/// # use wta::{BitReader, FormatError};
/// # fn main() -> Result<(), FormatError> {
/// let mut reader = BitReader::new([0xFAu8, 0x1F]);
/// assert_eq!(reader.read_bits(12)?, 0xFFA);
/// assert_eq!(reader.read_bits(1)?, 1);
/// assert_eq!(reader.bits_remaining(), 3);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BitReader<B> {
    /// The bytes being read.
    source: B,
    /// The index of the next bit to read.
    pos: usize,
}

impl<B: AsRef<[u8]>> BitReader<B> {
    /// Creates a new [`BitReader`] positioned at the first bit of `source`.
    pub const fn new(source: B) -> Self {
        Self { source, pos: 0 }
    }

    /// Returns the source as a slice of bits.
    fn bits(&self) -> &BitSlice<u8, Lsb0> {
        self.source.as_ref().view_bits()
    }

    /// Reads the next `width` bits as an integer, least-significant bit first.
    ///
    /// A `width` of `0` returns `0` and does not advance the reader.
    ///
    /// # Errors
    /// Returns [`FormatError::Truncated`] if fewer than `width` bits remain.
    /// The reader is not advanced in this case.
    ///
    /// # Panics
    /// Panics if `width` is greater than `32`.
    pub fn read_bits(&mut self, width: u32) -> Result<u32, FormatError> {
        assert!(width <= u32::BITS, "bit width {width} is above 32");

        let end = self.pos + width as usize;
        let value = self
            .bits()
            .get(self.pos..end)
            .map(|bits| bits.iter_ones().fold(0, |value, i| value | (1 << i)))
            .ok_or_else(|| FormatError::Truncated {
                needed: width.into(),
                available: self.bits_remaining(),
            })?;

        self.pos = end;
        Ok(value)
    }

    /// Reads the magic number and the three header fields.
    ///
    /// # Errors
    /// Returns [`FormatError::BadMagic`] if the first 32 bits are not [`MAGIC`],
    /// or [`FormatError::Truncated`] if the source is shorter than a header.
    pub fn read_header(&mut self) -> Result<FileHeader, FormatError> {
        let found = self.read_bits(32)?;
        if found != MAGIC {
            return Err(FormatError::BadMagic { found });
        }

        Ok(FileHeader {
            rows: self.read_bits(32)?,
            cols: self.read_bits(32)?,
            num_colors: self.read_bits(32)?,
        })
    }

    /// Returns the number of bits read so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    /// Returns the number of unread bits left in the source, including trailing padding.
    #[must_use]
    pub fn bits_remaining(&self) -> u64 {
        (self.bits().len() - self.pos) as u64
    }

    /// Consumes the reader, returning the underlying source.
    pub fn into_inner(self) -> B {
        self.source
    }
}

impl BitReader<Vec<u8>> {
    /// Reads all of `reader` into memory and creates a [`BitReader`] over it.
    ///
    /// # Errors
    /// Returns an error if reading from `reader` fails.
    pub fn from_reader(mut reader: impl Read) -> io::Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self::new(bytes))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn written(f: impl FnOnce(&mut BitWriter<Vec<u8>>)) -> Vec<u8> {
        let mut writer = BitWriter::new(Vec::new());
        f(&mut writer);
        writer.close().unwrap()
    }

    #[test]
    fn packs_least_significant_bit_first() {
        let bytes = written(|w| {
            w.write_bits(0x3F, 6).unwrap();
            w.write_bits(0x00, 4).unwrap();
            w.write_bits(0xF0, 8).unwrap();
            w.write_bits(0xAA, 6).unwrap();
        });
        assert_eq!(bytes, [0x3F, 0xC0, 0xAB]);

        let mut reader = BitReader::new(bytes);
        assert_eq!(reader.read_bits(8).unwrap(), 0x3F);
        assert_eq!(reader.read_bits(16).unwrap(), 0xABC0);
    }

    #[test]
    fn round_trip_every_width() {
        for width in 0..=32 {
            let max = if width == 32 { u32::MAX } else { (1 << width) - 1 };
            for value in [0, 1 & max, max / 3, max - max / 2, max] {
                let bytes = written(|w| w.write_bits(value, width).unwrap());
                let mut reader = BitReader::new(bytes);
                assert_eq!(reader.read_bits(width).unwrap(), value, "width {width}");
            }
        }
    }

    #[test]
    fn high_bits_are_ignored() {
        let bytes = written(|w| w.write_bits(0xFFFF_FFF5, 3).unwrap());
        assert_eq!(bytes, [0b101]);
    }

    #[test]
    fn zero_width_is_a_no_op() {
        let bytes = written(|w| {
            w.write_bits(u32::MAX, 0).unwrap();
            assert_eq!(w.bits_written(), 0);
        });
        assert!(bytes.is_empty());

        let mut reader = BitReader::new([0xFFu8]);
        assert_eq!(reader.read_bits(0).unwrap(), 0);
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn final_byte_is_zero_padded() {
        assert_eq!(written(|w| w.write_bits(0xFF, 8).unwrap()).len(), 1);
        assert_eq!(written(|w| w.write_bits(0x1FF, 9).unwrap()), [0xFF, 0x01]);
    }

    #[test]
    fn repeated_flushes() {
        let mut writer = BitWriter::new(Vec::new());
        writer.flush().unwrap();
        writer.write_bits(0b11, 2).unwrap();
        writer.flush().unwrap();
        writer.flush().unwrap();
        writer.write_bits(0b1, 1).unwrap();
        assert_eq!(writer.close().unwrap(), [0b11, 0b1]);
    }

    #[test]
    fn buffer_is_written_out_when_full() {
        let mut writer = BitWriter::new(Vec::new());
        for i in 0..(BUFFER_BITS / 32 - 1) {
            #[allow(clippy::cast_possible_truncation)]
            writer.write_bits(i as u32, 32).unwrap();
        }
        writer.write_bits(0, 30).unwrap();
        assert!(writer.get_ref().is_empty());

        // straddles the buffer boundary: 2 bits fill the buffer, 5 remain buffered
        writer.write_bits(0b101_1111, 7).unwrap();
        assert_eq!(writer.get_ref().len(), BUFFER_BYTES);
        assert_eq!(writer.bits_written(), BUFFER_BITS as u64 + 5);

        let bytes = writer.close().unwrap();
        assert_eq!(bytes.len(), BUFFER_BYTES + 1);

        let mut reader = BitReader::new(bytes);
        for i in 0..(BUFFER_BITS / 32 - 1) {
            assert_eq!(reader.read_bits(32).unwrap() as usize, i);
        }
        assert_eq!(reader.read_bits(30).unwrap(), 0);
        assert_eq!(reader.read_bits(7).unwrap(), 0b101_1111);
    }

    #[test]
    fn header_round_trip() {
        let header = FileHeader { rows: 480, cols: 640, num_colors: 9000 };
        let bytes = written(|w| w.write_header(&header).unwrap());
        assert_eq!(bytes.len(), 16);
        assert_eq!(bytes[..4], [0xFF, 0xAD, 0xBE, 0xFF]);
        assert_eq!(BitReader::new(bytes).read_header(), Ok(header));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let header = FileHeader { rows: 1, cols: 1, num_colors: 1 };
        let mut bytes = written(|w| w.write_header(&header).unwrap());
        bytes[3] = 0x7F;
        assert_eq!(
            BitReader::new(bytes).read_header(),
            Err(FormatError::BadMagic { found: 0x7FBE_ADFF })
        );
    }

    #[test]
    fn reading_past_the_end_is_an_error() {
        let mut reader = BitReader::new([0xABu8, 0xCD]);
        assert_eq!(reader.read_bits(12).unwrap(), 0xDAB);
        assert_eq!(
            reader.read_bits(5),
            Err(FormatError::Truncated { needed: 5, available: 4 })
        );
        assert_eq!(reader.read_bits(4).unwrap(), 0xC);
        assert_eq!(reader.bits_remaining(), 0);

        let mut short_header = MAGIC.to_le_bytes().to_vec();
        short_header.extend([0xFF; 11]);
        assert_eq!(
            BitReader::new(short_header).read_header(),
            Err(FormatError::Truncated { needed: 32, available: 24 })
        );
    }

    #[test]
    fn from_reader_loads_everything() {
        let mut reader = BitReader::from_reader(&[0x01u8, 0x02][..]).unwrap();
        assert_eq!(reader.read_bits(16).unwrap(), 0x0201);
        assert_eq!(reader.into_inner(), [0x01, 0x02]);
    }
}
