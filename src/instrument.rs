//! Hooks for observing the progress of an encode or decode.

use std::{
    fmt::Display,
    time::{Duration, Instant},
};

/// The points at which an encode or decode reports progress, in the order they occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Every pixel has been quantized.
    Quantized,
    /// The frequency table has been built and sorted into a palette.
    Ranked,
    /// The header has been written.
    HeaderWritten,
    /// The palette has been written.
    PaletteWritten,
    /// Every rank code has been written and the stream closed.
    PixelsWritten,
    /// The header has been read and validated.
    HeaderRead,
    /// The palette has been read.
    PaletteRead,
    /// Every pixel has been read and dequantized.
    PixelsRead,
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Phase::Quantized => "quantized pixels",
                Phase::Ranked => "created color frequency table",
                Phase::HeaderWritten => "wrote header",
                Phase::PaletteWritten => "wrote lookup table",
                Phase::PixelsWritten => "wrote image data",
                Phase::HeaderRead => "read header",
                Phase::PaletteRead => "read lookup table",
                Phase::PixelsRead => "recreated image data",
            }
        )
    }
}

/// A caller-supplied hook that is invoked at each [`Phase`] boundary.
///
/// Any `FnMut(Phase)` closure is an [`Instrument`]:
/// ```
/// # use wta::{PixelGrid, EncodeOptions, Phase};
/// # use palette::Srgb;
/// # fn main() -> Result<(), wta::Error> {
/// # let pixels = vec![Srgb::new(0, 0, 0)];
/// # let grid = PixelGrid::new(&pixels, 1, 1)?;
/// let mut phases = Vec::new();
/// wta::encode_to_writer(grid, Vec::new(), &EncodeOptions::new(), &mut |phase: Phase| phases.push(phase))?;
/// assert_eq!(phases.last(), Some(&Phase::PixelsWritten));
/// # Ok(())
/// # }
/// ```
pub trait Instrument {
    /// Called once a [`Phase`] has completed.
    fn phase(&mut self, phase: Phase);
}

impl<F: FnMut(Phase)> Instrument for F {
    fn phase(&mut self, phase: Phase) {
        self(phase);
    }
}

/// An [`Instrument`] that logs the time spent in each phase at the `debug` level.
#[derive(Debug, Clone, Copy)]
pub struct LogPhases {
    /// When the previous phase ended.
    last: Instant,
}

impl LogPhases {
    /// Creates a new [`LogPhases`] that starts timing now.
    #[must_use]
    pub fn new() -> Self {
        Self { last: Instant::now() }
    }

    /// Returns the time since the last phase ended and restarts the timer.
    fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now - self.last;
        self.last = now;
        elapsed
    }
}

impl Default for LogPhases {
    fn default() -> Self {
        Self::new()
    }
}

impl Instrument for LogPhases {
    fn phase(&mut self, phase: Phase) {
        let elapsed = self.lap();
        log::debug!("{phase}: {}us", elapsed.as_micros());
    }
}
