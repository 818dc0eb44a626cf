//! Frames flowing through the converter, and the wire image
//! they are decoded from / encoded to.
//!
//! [`ImageMessage`] mirrors the `sensor_msgs/Image` layout
//! as it appears in rosbridge JSON: the pixel payload is a
//! base64 string. [`RawFrame`] is the decoded 16-bit grid,
//! [`NormalizedFrame`] and [`ColorFrame`] are the two
//! intermediate products, and [`OutputFrame`] is what gets
//! encoded back into an `ImageMessage` for publishing.
use std::{convert::TryFrom, io::Cursor};

use byteordered::{ByteOrdered, Endianness};
use itertools::iproduct;
use lazy_static::lazy_static;
use ndarray::{Array2, Array3, ArrayView2};
use regex::Regex;
use serde_derive::*;

use crate::error::{ConversionError, Result};

/// Encoding of the published color frames.
pub const BGR8: &str = "bgr8";

/// ROS1 `time`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Time {
    pub secs: u32,
    pub nsecs: u32,
}

/// Per-frame metadata. Never interpreted, only carried over.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    #[serde(default)]
    pub seq: u32,
    #[serde(default)]
    pub stamp: Time,
    #[serde(default)]
    pub frame_id: String,
}

/// Sample encodings accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Mono8,
    Mono16,
}

impl Encoding {
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Encoding::Mono8 => 1,
            Encoding::Mono16 => 2,
        }
    }

    /// Parse an image encoding name. Only single-channel
    /// unsigned 8 and 16-bit encodings are accepted.
    pub fn parse(name: &str) -> Result<Self> {
        lazy_static! {
            static ref GENERIC: Regex = Regex::new(r"^(\d+)([USF])C(\d+)$").unwrap();
        }

        match name {
            "mono16" | "16UC1" => return Ok(Encoding::Mono16),
            "mono8" | "8UC1" => return Ok(Encoding::Mono8),
            _ => {}
        }

        let detail = match GENERIC.captures(name) {
            Some(caps) => {
                let kind = match &caps[2] {
                    "U" => "unsigned",
                    "S" => "signed",
                    _ => "float",
                };
                format!(
                    "{} ({}-bit {}, {} channel(s))",
                    name, &caps[1], kind, &caps[3]
                )
            }
            None => name.to_string(),
        };
        Err(ConversionError::UnsupportedEncoding(detail))
    }
}

/// An image as carried on the wire.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ImageMessage {
    pub header: Header,
    pub height: u32,
    pub width: u32,
    pub encoding: String,
    #[serde(default)]
    pub is_bigendian: u8,
    pub step: u32,
    #[serde(with = "serde_helpers::base64_bytes")]
    pub data: Vec<u8>,
}

/// A decoded single-channel intensity frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub header: Header,
    pub width: usize,
    pub height: usize,
    pub samples: Vec<u16>,
}

impl RawFrame {
    pub fn new(header: Header, width: usize, height: usize, samples: Vec<u16>) -> Self {
        RawFrame {
            header,
            width,
            height,
            samples,
        }
    }

    /// View the samples as a `height x width` grid, checking
    /// that the buffer actually holds that many samples.
    pub fn grid(&self) -> Result<ArrayView2<'_, u16>> {
        if self.width == 0 || self.height == 0 {
            return Err(ConversionError::EmptyFrame(self.width, self.height));
        }
        let expected = self.width * self.height;
        if self.samples.len() != expected {
            return Err(ConversionError::SampleCount {
                width: self.width,
                height: self.height,
                expected,
                actual: self.samples.len(),
            });
        }
        Ok(ArrayView2::from_shape(
            (self.height, self.width),
            &self.samples,
        )?)
    }
}

impl TryFrom<&ImageMessage> for RawFrame {
    type Error = ConversionError;

    fn try_from(msg: &ImageMessage) -> Result<Self> {
        let encoding = Encoding::parse(&msg.encoding)?;
        let bytes_per_sample = encoding.bytes_per_sample();
        let width = msg.width as usize;
        let height = msg.height as usize;
        let step = msg.step as usize;

        let row_len = width * bytes_per_sample;
        if step < row_len {
            return Err(ConversionError::InvalidStep {
                step,
                width,
                bytes_per_sample,
            });
        }
        let expected = step * height;
        if msg.data.len() != expected {
            return Err(ConversionError::BufferSize {
                expected,
                actual: msg.data.len(),
            });
        }

        let endianness = if msg.is_bigendian != 0 {
            Endianness::Big
        } else {
            Endianness::Little
        };

        let mut samples = Vec::with_capacity(width * height);
        if row_len > 0 {
            // Rows may be padded up to `step` bytes.
            for row in msg.data.chunks_exact(step) {
                let mut rdr = ByteOrdered::runtime(Cursor::new(&row[..row_len]), endianness);
                for _ in 0..width {
                    let sample = match encoding {
                        Encoding::Mono8 => rdr.read_u8()? as u16,
                        Encoding::Mono16 => rdr.read_u16()?,
                    };
                    samples.push(sample);
                }
            }
        }

        Ok(RawFrame {
            header: msg.header.clone(),
            width,
            height,
            samples,
        })
    }
}

/// Intensities stretched to the full 8-bit range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedFrame(pub Array2<u8>);

/// `rows x cols x 3` pixels in blue, green, red order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorFrame(pub Array3<u8>);

impl ColorFrame {
    pub fn width(&self) -> usize {
        self.0.dim().1
    }

    pub fn height(&self) -> usize {
        self.0.dim().0
    }

    pub fn pixel(&self, row: usize, col: usize) -> [u8; 3] {
        [
            self.0[(row, col, 0)],
            self.0[(row, col, 1)],
            self.0[(row, col, 2)],
        ]
    }

    /// Pixels in red, green, blue order, row-major.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let (ht, wid, _) = self.0.dim();
        let mut out = Vec::with_capacity(ht * wid * 3);
        for (row, col) in iproduct!(0..ht, 0..wid) {
            let [b, g, r] = self.pixel(row, col);
            out.extend_from_slice(&[r, g, b]);
        }
        out
    }
}

/// A colored frame tagged with the metadata of its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFrame {
    pub header: Header,
    pub image: ColorFrame,
}

impl OutputFrame {
    pub fn into_message(self) -> ImageMessage {
        let width = self.image.width();
        let height = self.image.height();
        ImageMessage {
            header: self.header,
            height: height as u32,
            width: width as u32,
            encoding: BGR8.to_string(),
            is_bigendian: 0,
            step: (3 * width) as u32,
            data: self.image.0.iter().copied().collect(),
        }
    }
}

mod serde_helpers {
    pub mod base64_bytes {
        use serde::*;
        use serde_derive::*;

        // rosbridge sends `uint8[]` as base64, but plain
        // arrays show up in hand-written captures.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Encoded(String),
            Bytes(Vec<u8>),
        }

        pub fn serialize<S>(bytes: &[u8], ser: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            ser.serialize_str(&base64::encode(bytes))
        }

        pub fn deserialize<'de, D>(de: D) -> Result<Vec<u8>, D::Error>
        where
            D: Deserializer<'de>,
        {
            use serde::de::Error;
            match Repr::deserialize(de)? {
                Repr::Encoded(s) => base64::decode(&s).map_err(Error::custom),
                Repr::Bytes(b) => Ok(b),
            }
        }
    }
}
