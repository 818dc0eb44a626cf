use thiserror::Error;

/// Reasons a frame could not be converted.
///
/// Every variant is a per-frame failure: the node logs it
/// and drops the frame, it never stops processing.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("unsupported image encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("image buffer size mismatch: expected {expected} bytes, found {actual}")]
    BufferSize { expected: usize, actual: usize },

    #[error("sample count mismatch: {width}x{height} frame needs {expected} samples, found {actual}")]
    SampleCount {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("row step of {step} bytes is shorter than {width} samples of {bytes_per_sample} bytes")]
    InvalidStep {
        step: usize,
        width: usize,
        bytes_per_sample: usize,
    },

    #[error("empty frame: width={0}, height={1}")]
    EmptyFrame(usize, usize),

    #[error("frame shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("IO error while reading samples: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConversionError>;
