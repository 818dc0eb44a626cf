//! Min-max stretch of raw intensities to 8 bits.
use ndarray::{Array2, ArrayView2};

use crate::frame::NormalizedFrame;

/// Smallest and largest sample, or `None` for an empty grid.
pub fn min_max(samples: &ArrayView2<u16>) -> Option<(u16, u16)> {
    samples.iter().fold(None, |acc, &val| match acc {
        None => Some((val, val)),
        Some((lo, hi)) => Some((lo.min(val), hi.max(val))),
    })
}

/// Map the smallest sample to 0 and the largest to 255,
/// linearly, rounding to nearest with ties to even.
///
/// A flat frame (including a single pixel) has no range to
/// stretch and comes out all zeros.
pub fn normalize(samples: ArrayView2<u16>) -> NormalizedFrame {
    let grid = match min_max(&samples) {
        Some((lo, hi)) if hi > lo => {
            let range = (hi - lo) as f64;
            samples.mapv(|val| stretch(val, lo, range))
        }
        _ => Array2::zeros(samples.raw_dim()),
    };
    NormalizedFrame(grid)
}

#[inline]
fn stretch(val: u16, lo: u16, range: f64) -> u8 {
    let tval = round_half_even((val - lo) as f64 * 255. / range);
    tval.max(0.).min(u8::MAX as f64) as u8
}

/// Round to nearest, exact halves to the even neighbour.
pub(crate) fn round_half_even(val: f64) -> f64 {
    let rounded = val.round();
    if (val - val.trunc()).abs() == 0.5 {
        2. * (val / 2.).round()
    } else {
        rounded
    }
}
