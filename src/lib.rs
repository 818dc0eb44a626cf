//! False-color 16-bit thermal camera frames.
//!
//! Thermal cameras such as the FLIR One publish
//! single-channel 16-bit frames whose useful range is a
//! small, drifting slice of the sensor range. This crate
//! turns each such frame into an 8-bit BGR image: the
//! intensities are stretched so the coldest pixel maps to 0
//! and the hottest to 255, then mapped through the [jet
//! colormap][colormap::JET]. The frame header (sequence
//! number, timestamp and frame id) is carried over unchanged.
//!
//! # Usage
//!
//! The core is [`ThermalImageConverter`], a pure function
//! object with no notion of transport.
//!
//! ```rust
//! # fn test_compile() -> anyhow::Result<()> {
//! use thermal_color::{frame::Header, RawFrame, ThermalImageConverter};
//!
//! let raw = RawFrame::new(Header::default(), 2, 2, vec![0, 1000, 2000, 4000]);
//! let out = ThermalImageConverter::new().convert(raw)?;
//! assert_eq!(out.image.width(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! Wire images ([`ImageMessage`], the `sensor_msgs/Image`
//! layout) go through
//! [`convert_message`][ThermalImageConverter::convert_message].
//!
//! ## Running as a node
//!
//! [`node::ThermalImageNode`] wraps the converter in a
//! per-message callback that logs and drops frames it cannot
//! convert, and [`bridge::serve`] runs such a node over a
//! rosbridge JSON stream. The `thermal-color-node` binary
//! does exactly that on stdin/stdout, e.g. behind
//! `websocat ws://robot:9090`.
//!
//! The `thermal-colorize` binary converts 16-bit grayscale
//! image files, or captured rosbridge streams, to PNGs.

pub mod bridge;
pub mod colormap;
pub mod convert;
pub mod error;
pub mod frame;
pub mod logger;
pub mod node;
pub mod normalize;
pub mod queue;

#[cfg(feature = "cli")]
pub mod cli;

pub use crate::convert::ThermalImageConverter;
pub use crate::error::ConversionError;
pub use crate::frame::{ImageMessage, OutputFrame, RawFrame};
