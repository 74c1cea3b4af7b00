//! Contains various types needed across the crate.

use crate::MAX_PIXELS;
use palette::Srgb;
use std::{
    error::Error,
    fmt::{Debug, Display},
    ops::Deref,
};
#[cfg(feature = "image")]
use {
    image::RgbImage,
    palette::cast::{ComponentsAs, IntoComponents},
};

/// An error type for when a length or count is above the maximum supported value.
///
/// The inner value is the maximum supported value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AboveMaxLen<T>(pub T);

impl<T: Display> Display for AboveMaxLen<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "above the maximum length of {}", self.0)
    }
}

impl<T: Debug + Display> Error for AboveMaxLen<T> {}

/// An error type for when a pixel slice cannot form a `rows` x `cols` grid,
/// either because its length is not `rows * cols`
/// or because `rows * cols` is above [`MAX_PIXELS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionMismatch {
    /// The requested number of rows.
    pub rows: u32,
    /// The requested number of columns.
    pub cols: u32,
    /// The length of the pixel slice.
    pub len: usize,
}

impl Display for DimensionMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} pixels cannot form a {}x{} grid of at most {MAX_PIXELS} pixels",
            self.len, self.rows, self.cols
        )
    }
}

impl Error for DimensionMismatch {}

/// A borrowed `rows` x `cols` grid of pixels in raster order.
///
/// This is a simple new type wrapper around `&'a [Srgb<u8>]` with the invariants that
/// the length of the slice is exactly `rows * cols` and not greater than [`MAX_PIXELS`].
///
/// # Examples
/// From a raw pixel slice:
/// ```
/// # use wta::{PixelGrid, DimensionMismatch};
/// # use palette::Srgb;
/// # fn main() -> Result<(), DimensionMismatch> {
/// let pixels = vec![Srgb::new(0, 0, 0); 6];
/// let grid = PixelGrid::new(&pixels, 2, 3)?;
/// assert_eq!(grid.num_pixels(), 6);
/// # Ok(())
/// # }
/// ```
///
/// From an image (needs the `image` feature to be enabled):
/// ```no_run
/// # use wta::PixelGrid;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgb8();
/// let grid = PixelGrid::try_from(&img)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelGrid<'a> {
    /// The pixels in raster order.
    pixels: &'a [Srgb<u8>],
    /// The number of rows.
    rows: u32,
    /// The number of columns.
    cols: u32,
}

impl<'a> PixelGrid<'a> {
    /// Creates a new [`PixelGrid`] from a slice of pixels in raster order.
    ///
    /// # Errors
    /// Returns an error if `pixels.len() != rows * cols` or if `rows * cols` is above [`MAX_PIXELS`].
    pub fn new(pixels: &'a [Srgb<u8>], rows: u32, cols: u32) -> Result<Self, DimensionMismatch> {
        let count = u64::from(rows) * u64::from(cols);
        if count <= u64::from(MAX_PIXELS) && count == pixels.len() as u64 {
            Ok(Self { pixels, rows, cols })
        } else {
            Err(DimensionMismatch { rows, cols, len: pixels.len() })
        }
    }

    /// Returns the number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Returns the number of columns.
    #[must_use]
    pub const fn cols(&self) -> u32 {
        self.cols
    }

    /// Returns the number of pixels as a `u32`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn num_pixels(&self) -> u32 {
        self.pixels.len() as u32
    }
}

impl<'a> AsRef<[Srgb<u8>]> for PixelGrid<'a> {
    fn as_ref(&self) -> &[Srgb<u8>] {
        self
    }
}

impl<'a> Deref for PixelGrid<'a> {
    type Target = [Srgb<u8>];

    fn deref(&self) -> &Self::Target {
        self.pixels
    }
}

#[cfg(feature = "image")]
impl<'a> TryFrom<&'a RgbImage> for PixelGrid<'a> {
    type Error = DimensionMismatch;

    fn try_from(image: &'a RgbImage) -> Result<Self, Self::Error> {
        let (width, height) = image.dimensions();
        let pixels = image.pixels().len();
        let buf = &image.as_raw()[..(pixels * 3)];
        Self::new(buf.components_as(), height, width)
    }
}

/// An owned image reconstructed by [`decode`](crate::decode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// The pixels in raster order, `rows * cols` long.
    pixels: Vec<Srgb<u8>>,
    /// The number of rows.
    rows: u32,
    /// The number of columns.
    cols: u32,
}

impl DecodedImage {
    /// Creates a [`DecodedImage`] without checking that `pixels.len() == rows * cols`.
    pub(crate) fn new_unchecked(pixels: Vec<Srgb<u8>>, rows: u32, cols: u32) -> Self {
        debug_assert_eq!(pixels.len() as u64, u64::from(rows) * u64::from(cols));
        Self { pixels, rows, cols }
    }

    /// Returns the number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Returns the number of columns.
    #[must_use]
    pub const fn cols(&self) -> u32 {
        self.cols
    }

    /// Returns the pixels in raster order.
    #[must_use]
    pub fn pixels(&self) -> &[Srgb<u8>] {
        &self.pixels
    }

    /// Returns the pixel at `row` and `col`, or `None` if either is out of bounds.
    #[must_use]
    pub fn get(&self, row: u32, col: u32) -> Option<Srgb<u8>> {
        (row < self.rows && col < self.cols)
            .then(|| self.pixels[row as usize * self.cols as usize + col as usize])
    }

    /// Borrows this image as a [`PixelGrid`], e.g., to encode it again.
    #[must_use]
    pub fn as_grid(&self) -> PixelGrid<'_> {
        PixelGrid {
            pixels: &self.pixels,
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// Consumes the image, returning its pixels in raster order.
    #[must_use]
    pub fn into_pixels(self) -> Vec<Srgb<u8>> {
        self.pixels
    }

    /// Converts this image into an [`RgbImage`].
    #[cfg(feature = "image")]
    #[must_use]
    pub fn into_rgbimage(self) -> RgbImage {
        let (width, height) = (self.cols, self.rows);
        #[allow(clippy::unwrap_used)]
        {
            // pixels.len() is equal to rows * cols,
            // so the buffer is large enough by nature of its construction
            RgbImage::from_vec(width, height, self.pixels.into_components()).unwrap()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::cast_possible_truncation)]
mod tests {
    use super::*;

    #[test]
    fn grid_length_must_match_dimensions() {
        let pixels = vec![Srgb::new(1, 2, 3); 6];
        assert!(PixelGrid::new(&pixels, 2, 3).is_ok());
        assert!(PixelGrid::new(&pixels, 3, 2).is_ok());
        assert_eq!(
            PixelGrid::new(&pixels, 2, 2),
            Err(DimensionMismatch { rows: 2, cols: 2, len: 6 })
        );
        assert!(PixelGrid::new(&[], 0, 5).is_ok());
    }

    #[test]
    fn grid_above_max_pixels() {
        assert!(PixelGrid::new(&[], u32::MAX, 2).is_err());
    }

    #[test]
    fn decoded_image_indexing() {
        let pixels = (0..6).map(|i| Srgb::new(i, i, i)).collect::<Vec<_>>();
        let image = DecodedImage::new_unchecked(pixels, 2, 3);
        assert_eq!(image.get(1, 0), Some(Srgb::new(3, 3, 3)));
        assert_eq!(image.get(0, 3), None);
        assert_eq!(image.get(2, 0), None);
        assert_eq!(image.as_grid().num_pixels(), 6);
    }

    #[test]
    fn decoded_pixels_form_a_grid() {
        let pixels = (0..6).map(|i| Srgb::new(i, 0, 0)).collect::<Vec<_>>();
        let image = DecodedImage::new_unchecked(pixels.clone(), 3, 2);
        let (rows, cols) = (image.rows(), image.cols());
        let owned = image.into_pixels();
        assert_eq!(owned, pixels);

        let grid = PixelGrid::new(&owned, rows, cols).unwrap();
        assert_eq!((grid.rows(), grid.cols()), (3, 2));
        assert_eq!(grid[5], Srgb::new(5, 0, 0));
    }

    #[cfg(feature = "image")]
    #[test]
    fn rgbimage_conversion() {
        let image = RgbImage::from_fn(4, 3, |x, y| image::Rgb([x as u8, y as u8, 9]));
        let grid = PixelGrid::try_from(&image).unwrap();
        assert_eq!((grid.rows(), grid.cols()), (3, 4));
        assert_eq!(grid[4 + 2], Srgb::new(2, 1, 9));

        let decoded = DecodedImage::new_unchecked(grid.to_vec(), 3, 4);
        assert_eq!(decoded.into_rgbimage(), image);
    }
}
