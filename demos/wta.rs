#![deny(unsafe_code)]
#![warn(
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice
)]

use std::{
    error::Error,
    fmt::Display,
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    time::Instant,
};

use clap::{Parser, Subcommand, ValueEnum};
use wta::{EncodeOptions, Phase, PixelGrid, Rgb666, TieBreak};

#[derive(Copy, Clone, ValueEnum)]
enum CliTieBreak {
    FirstSeen,
    Key,
}

impl From<CliTieBreak> for TieBreak {
    fn from(value: CliTieBreak) -> Self {
        match value {
            CliTieBreak::FirstSeen => TieBreak::FirstSeen,
            CliTieBreak::Key => TieBreak::Key,
        }
    }
}

impl Display for CliTieBreak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                CliTieBreak::FirstSeen => "first-seen",
                CliTieBreak::Key => "key",
            }
        )
    }
}

#[derive(Subcommand)]
enum Command {
    /// Converts a PNG, JPEG, or other image into a .wta file.
    Compress {
        input: PathBuf,

        /// Defaults to the input path with a .wta extension.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, default_value_t = CliTieBreak::FirstSeen)]
        tie_break: CliTieBreak,

        #[arg(short, long, default_value_t = 0)]
        threads: u8,
    },
    /// Converts a .wta file back into a PNG or other image.
    Decompress {
        input: PathBuf,

        /// Defaults to the input path with a .png extension.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, default_value_t = 0)]
        threads: u8,
    },
}

#[derive(Parser)]
pub struct Options {
    #[arg(long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Runs `f` on a rayon pool with the given number of threads (`0` uses the global pool).
fn with_threads<T: Send>(
    threads: u8,
    f: impl FnOnce(bool) -> T + Send,
) -> Result<T, Box<dyn Error>> {
    Ok(match threads {
        0 => f(true),
        1 => f(false),
        t => rayon::ThreadPoolBuilder::new()
            .num_threads(t.into())
            .build()?
            .install(|| f(true)),
    })
}

/// Writes to a sibling temporary file and renames it over `path` only if `write` succeeds,
/// so a failed encode never leaves a truncated file behind.
fn write_atomically(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> Result<(), Box<dyn Error>>,
) -> Result<(), Box<dyn Error>> {
    let partial = path.with_extension("part");
    let result = File::create(&partial)
        .map_err(Into::into)
        .and_then(|file| -> Result<(), Box<dyn Error>> {
            let mut sink = BufWriter::new(file);
            write(&mut sink)?;
            sink.flush()?;
            Ok(())
        });

    match result {
        Ok(()) => Ok(fs::rename(&partial, path)?),
        Err(e) => {
            let _ = fs::remove_file(&partial);
            Err(e)
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let Options { verbose, command } = Options::parse();

    let mut last = Instant::now();
    let mut report = |phase: Phase| {
        if verbose {
            println!("{phase} took {}ms", last.elapsed().as_millis());
        }
        last = Instant::now();
    };

    macro_rules! log {
        ($name: literal, $val: expr) => {
            if verbose {
                let time = Instant::now();
                let value = $val;
                println!("{} took {}ms", $name, time.elapsed().as_millis());
                value
            } else {
                $val
            }
        };
    }

    match command {
        Command::Compress { input, output, tie_break, threads } => {
            let image = log!("read image", image::open(&input)?.into_rgb8());
            let grid = PixelGrid::try_from(&image)?;
            let options = EncodeOptions::new().tie_break(tie_break.into());
            let output = output.unwrap_or_else(|| input.with_extension("wta"));

            write_atomically(&output, |sink| {
                let summary = with_threads(threads, |par| {
                    if par {
                        wta::encode_to_writer_par(grid, &mut *sink, &options, &mut report)
                    } else {
                        wta::encode_to_writer(grid, &mut *sink, &options, &mut report)
                    }
                })??;

                println!(
                    "{}x{} pixels, {} colors, {} bits per pixel, {} bytes",
                    summary.header.rows,
                    summary.header.cols,
                    summary.header.num_colors,
                    summary.rank_code_width,
                    summary.bytes_written(),
                );
                Ok(())
            })?;
        }
        Command::Decompress { input, output, threads } => {
            let reader = BufReader::new(File::open(&input)?);
            let bytes = log!("read file", wta::BitReader::from_reader(reader)?.into_inner());

            let decoded = with_threads(threads, |par| {
                if par {
                    wta::decode_with_par(&bytes, &Rgb666, &mut report)
                } else {
                    wta::decode_with(&bytes, &Rgb666, &mut report)
                }
            })??;

            println!("{}x{} pixels", decoded.rows(), decoded.cols());

            let output = output.unwrap_or_else(|| input.with_extension("png"));
            log!("write image", decoded.into_rgbimage().save(output)?);
        }
    }

    Ok(())
}
