//! The frame converter: min-max stretch, then false color.
use std::convert::TryFrom;

use crate::{
    colormap::{Colormap, JET},
    error::Result,
    frame::{ImageMessage, OutputFrame, RawFrame},
    normalize::normalize,
};

/// Converts 16-bit intensity frames into jet-colored BGR
/// frames. Holds no transport state; each call is
/// independent of the previous ones.
#[derive(Debug, Clone, Copy)]
pub struct ThermalImageConverter {
    colormap: &'static Colormap,
}

impl Default for ThermalImageConverter {
    fn default() -> Self {
        ThermalImageConverter { colormap: &JET }
    }
}

impl ThermalImageConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn convert(&self, raw: RawFrame) -> Result<OutputFrame> {
        let normalized = normalize(raw.grid()?);
        let image = self.colormap.apply(&normalized);
        Ok(OutputFrame {
            header: raw.header,
            image,
        })
    }

    /// Decode a wire image, convert it, and encode the result
    /// as a `bgr8` image with the same header.
    pub fn convert_message(&self, msg: &ImageMessage) -> Result<ImageMessage> {
        let raw = RawFrame::try_from(msg)?;
        Ok(self.convert(raw)?.into_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ConversionError,
        frame::{Header, Time, BGR8},
    };
    use anyhow::Result;

    fn header() -> Header {
        Header {
            seq: 11,
            stamp: Time {
                secs: 1_234,
                nsecs: 999_999_999,
            },
            frame_id: "flir_one_optical".into(),
        }
    }

    #[test]
    fn converts_reference_frame() -> Result<()> {
        let conv = ThermalImageConverter::new();
        let raw = RawFrame::new(header(), 2, 2, vec![0, 1000, 2000, 4000]);
        let out = conv.convert(raw)?;

        assert_eq!(out.header, header());
        assert_eq!((out.image.width(), out.image.height()), (2, 2));
        // BGR, as OpenCV's COLORMAP_JET gives for 0, 64, 128, 255.
        assert_eq!(out.image.pixel(0, 0), [128, 0, 0]);
        assert_eq!(out.image.pixel(0, 1), [255, 128, 0]);
        assert_eq!(out.image.pixel(1, 0), [126, 255, 130]);
        assert_eq!(out.image.pixel(1, 1), [0, 0, 128]);
        Ok(())
    }

    #[test]
    fn constant_frame_is_uniform() -> Result<()> {
        let conv = ThermalImageConverter::new();
        let raw = RawFrame::new(header(), 5, 3, vec![3100; 15]);
        let out = conv.convert(raw)?;
        for row in 0..3 {
            for col in 0..5 {
                assert_eq!(out.image.pixel(row, col), JET.entry(0));
            }
        }
        Ok(())
    }

    #[test]
    fn preserves_non_square_dimensions() -> Result<()> {
        let conv = ThermalImageConverter::new();
        let samples = (0..160 * 120).map(|i| (i % 4096) as u16).collect();
        let out = conv.convert(RawFrame::new(header(), 160, 120, samples))?;
        assert_eq!(out.image.width(), 160);
        assert_eq!(out.image.height(), 120);
        Ok(())
    }

    #[test]
    fn sample_count_mismatch_is_an_error() {
        let conv = ThermalImageConverter::new();
        let raw = RawFrame::new(header(), 2, 2, vec![0, 1, 2]);
        assert!(matches!(
            conv.convert(raw),
            Err(ConversionError::SampleCount { .. })
        ));
    }

    #[test]
    fn message_round_trip() -> Result<()> {
        let conv = ThermalImageConverter::new();
        let data = [0u16, 1000, 2000, 4000]
            .iter()
            .flat_map(|s| s.to_le_bytes().to_vec())
            .collect();
        let msg = ImageMessage {
            header: header(),
            height: 2,
            width: 2,
            encoding: "16UC1".into(),
            is_bigendian: 0,
            step: 4,
            data,
        };

        let out = conv.convert_message(&msg)?;
        assert_eq!(out.header, msg.header);
        assert_eq!(out.encoding, BGR8);
        assert_eq!((out.width, out.height, out.step), (2, 2, 6));
        assert_eq!(out.data.len(), 12);
        assert_eq!(&out.data[..3], &JET.entry(0));
        assert_eq!(&out.data[9..], &JET.entry(255));
        Ok(())
    }

    #[test]
    fn unsupported_encoding_is_an_error() {
        let conv = ThermalImageConverter::new();
        let msg = ImageMessage {
            header: header(),
            height: 1,
            width: 1,
            encoding: "rgb8".into(),
            is_bigendian: 0,
            step: 3,
            data: vec![1, 2, 3],
        };
        assert!(matches!(
            conv.convert_message(&msg),
            Err(ConversionError::UnsupportedEncoding(_))
        ));
    }
}
