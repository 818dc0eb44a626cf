//! Helpers to parse CLI arguments and gather inputs in the
//! accompanying binaries.
//!
//! APIs here shouldn't be considered stable / used as a
//! library.

use std::{
    convert::TryFrom,
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
pub use clap::{App, Arg};
use indicatif::{ProgressBar, ProgressStyle};
pub use inflector::Inflector;
use rayon::iter::{once, Either, IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use serde_json::{Deserializer, Value};

use crate::{
    bridge::BridgeOp,
    convert::ThermalImageConverter,
    frame::{Header, ImageMessage, OutputFrame, RawFrame},
};

#[macro_export]
macro_rules! args_parser {
    ($name:expr) => {{
        $crate::cli::App::new($name)
            .version(clap::crate_version!())
            .author(clap::crate_authors!())
    }};
}

#[macro_export]
macro_rules! arg {
    ($name:expr) => {{
        use $crate::cli::Inflector;
        $crate::cli::Arg::with_name($name).value_name(&$name.to_screaming_snake_case())
    }};
}

#[macro_export]
macro_rules! opt {
    ($name:expr) => {{
        use $crate::cli::Inflector;
        $crate::cli::Arg::with_name($name)
            .long(&$name.to_kebab_case())
            .value_name(&$name.to_screaming_snake_case())
    }};
}

/// A frame read from a grayscale image file, or an image
/// message replayed from a rosbridge capture.
pub type GenericFrame = Either<RawFrame, ImageMessage>;

pub struct FrameInput {
    /// Where the frame came from, for log messages.
    pub source: String,
    /// Output file stem, unique per frame within a batch.
    pub stem: String,
    pub frame: GenericFrame,
}

impl FrameInput {
    fn try_from_image_path(path: String, input: usize) -> Result<Self> {
        let image = image::open(&path)
            .with_context(|| format!("could not read image {}", path))?
            .into_luma16();
        let (width, height) = image.dimensions();
        let stem = output_stem(&path, input);
        let header = Header {
            frame_id: file_stem(&path),
            ..Header::default()
        };
        let frame = RawFrame::new(header, width as usize, height as usize, image.into_raw());
        Ok(FrameInput {
            source: path,
            stem,
            frame: Either::Left(frame),
        })
    }

    /// Read every image in a capture. A capture is a stream of
    /// JSON values, each either a rosbridge `publish` op or a
    /// bare image message.
    fn try_from_capture<R: Read>(path: &str, input: usize, rdr: R) -> Vec<Result<Self>> {
        let stem = output_stem(path, input);
        Deserializer::from_reader(rdr)
            .into_iter::<Value>()
            .enumerate()
            .map(|(idx, val)| -> Result<Self> {
                let msg = message_from_capture(val?)
                    .with_context(|| format!("{}: entry {}", path, idx))?;
                Ok(FrameInput {
                    source: format!("{}#{}", path, idx),
                    stem: format!("{}-{:06}", stem, idx),
                    frame: Either::Right(msg),
                })
            })
            .collect()
    }

    /// `<dir>/<stem>.png`.
    pub fn output_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.png", self.stem))
    }

    pub fn convert(self, conv: &ThermalImageConverter) -> Result<OutputFrame> {
        let raw = match self.frame {
            Either::Left(raw) => raw,
            Either::Right(msg) => RawFrame::try_from(&msg)?,
        };
        Ok(conv.convert(raw)?)
    }
}

fn message_from_capture(val: Value) -> Result<ImageMessage> {
    if val.get("op").is_some() {
        match serde_json::from_value(val)? {
            BridgeOp::Publish { msg, .. } => Ok(serde_json::from_value(msg)?),
            other => anyhow::bail!("not a publish op: {:?}", other),
        }
    } else {
        Ok(serde_json::from_value(val)?)
    }
}

fn file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

// Input paths may share a file stem; the input index keeps
// output names apart.
fn output_stem(path: &str, input: usize) -> String {
    format!("{}-{:06}", file_stem(path), input)
}

pub fn process_paths_par(
    paths: Vec<String>,
    is_json: bool,
) -> impl IntoParallelIterator<Item = Result<FrameInput>> {
    let bar = ProgressBar::new(paths.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {wide_bar:cyan/blue} {pos:>7}/{len:7}"),
    );
    let bar_dup = bar.clone();

    paths
        .into_par_iter()
        .enumerate()
        .map(move |(idx, p)| {
            if is_json {
                let vec = File::open(&p)
                    .with_context(|| format!("could not open capture {}", p))
                    .map(|f| FrameInput::try_from_capture(&p, idx, BufReader::new(f)));
                match vec {
                    Ok(vec) => {
                        if vec.len() > 1 {
                            bar.inc_length(vec.len() as u64 - 1);
                        }
                        Either::Left(vec.into_par_iter())
                    }
                    Err(e) => Either::Right(once(Err(e))),
                }
            } else {
                Either::Right(once(FrameInput::try_from_image_path(p, idx)))
            }
        })
        .flatten()
        .inspect(move |_| bar_dup.inc(1))
}
