//! False-color lookup tables.
//!
//! A [`Colormap`] maps each 8-bit intensity to a BGR triple.
//! The only table shipped is [`JET`]: dark blue through
//! cyan, yellow and red to dark red, entry for entry the
//! table OpenCV uses for `COLORMAP_JET`.
use lazy_static::lazy_static;
use ndarray::Array3;

use crate::{
    frame::{ColorFrame, NormalizedFrame},
    normalize::round_half_even,
};

const ENTRIES: usize = 256;

lazy_static! {
    /// The jet colormap, built once per process.
    pub static ref JET: Colormap = Colormap::jet();
}

/// 256 BGR entries, indexed by intensity.
#[derive(Clone, PartialEq, Eq)]
pub struct Colormap([[u8; 3]; ENTRIES]);

impl Colormap {
    /// Build a table from `f(idx) -> [blue, green, red]`, with
    /// channel values on the 0..=255 scale. Values are clamped
    /// and rounded to nearest, ties to even.
    pub fn from_fn<F: Fn(usize) -> [f64; 3]>(f: F) -> Self {
        let mut lut = [[0u8; 3]; ENTRIES];
        for (idx, entry) in lut.iter_mut().enumerate() {
            for (ch, val) in f(idx).iter().enumerate() {
                entry[ch] = round_half_even(val.max(0.).min(255.)) as u8;
            }
        }
        Colormap(lut)
    }

    // Octave's `jet(256)`: each channel is
    // `clamp(min(4x - a, b - 4x), 0, 1)` with x = idx / 255.
    // Scaled by 255 every term is exact, so ties stay ties.
    fn jet() -> Self {
        Self::from_fn(|idx| {
            let x4 = 4. * idx as f64;
            [
                (x4 + 127.5).min(637.5 - x4),
                (x4 - 127.5).min(892.5 - x4),
                (x4 - 382.5).min(1147.5 - x4),
            ]
        })
    }

    pub fn entry(&self, val: u8) -> [u8; 3] {
        self.0[val as usize]
    }

    pub fn entries(&self) -> &[[u8; 3]; ENTRIES] {
        &self.0
    }

    pub fn apply(&self, frame: &NormalizedFrame) -> ColorFrame {
        let (ht, wid) = frame.0.dim();
        ColorFrame(Array3::from_shape_fn((ht, wid, 3), |(row, col, ch)| {
            self.0[frame.0[(row, col)] as usize][ch]
        }))
    }
}

impl std::fmt::Debug for Colormap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Colormap")
            .field("first", &self.0[0])
            .field("last", &self.0[ENTRIES - 1])
            .finish()
    }
}
