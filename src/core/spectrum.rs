//! RGB radiance values. The renderer works in linear RGB throughout; the
//! `Spectrum` alias keeps the door open for a spectral representation.

// std
use std::ops;
// others
use serde::{Deserialize, Serialize};
// spica
use crate::core::base::{clamp_t, Float};

#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct RgbSpectrum {
    pub c: [Float; 3],
}

impl RgbSpectrum {
    pub fn new(v: Float) -> Self {
        RgbSpectrum { c: [v, v, v] }
    }
    pub fn from_rgb(rgb: &[Float; 3]) -> Self {
        RgbSpectrum {
            c: [rgb[0], rgb[1], rgb[2]],
        }
    }
    pub fn rgb(r: Float, g: Float, b: Float) -> Self {
        RgbSpectrum { c: [r, g, b] }
    }
    pub fn to_rgb(&self) -> [Float; 3] {
        self.c
    }
    pub fn is_black(&self) -> bool {
        self.c[0] == 0.0 as Float && self.c[1] == 0.0 as Float && self.c[2] == 0.0 as Float
    }
    pub fn has_nans(&self) -> bool {
        self.c.iter().any(|v| v.is_nan() || v.is_infinite())
    }
    /// CIE luminance of the linear RGB triple.
    pub fn y(&self) -> Float {
        0.212_671 * self.c[0] + 0.715_160 * self.c[1] + 0.072_169 * self.c[2]
    }
    pub fn max_component_value(&self) -> Float {
        self.c[0].max(self.c[1].max(self.c[2]))
    }
    pub fn sqrt(&self) -> RgbSpectrum {
        RgbSpectrum {
            c: [self.c[0].sqrt(), self.c[1].sqrt(), self.c[2].sqrt()],
        }
    }
    pub fn exp(&self) -> RgbSpectrum {
        RgbSpectrum {
            c: [self.c[0].exp(), self.c[1].exp(), self.c[2].exp()],
        }
    }
    pub fn clamp(&self, low: Float, high: Float) -> RgbSpectrum {
        RgbSpectrum {
            c: [
                clamp_t(self.c[0], low, high),
                clamp_t(self.c[1], low, high),
                clamp_t(self.c[2], low, high),
            ],
        }
    }
}

impl From<Float> for RgbSpectrum {
    fn from(v: Float) -> Self {
        RgbSpectrum::new(v)
    }
}

impl num::Zero for RgbSpectrum {
    fn zero() -> RgbSpectrum {
        RgbSpectrum::new(0.0 as Float)
    }
    fn is_zero(&self) -> bool {
        self.is_black()
    }
}

impl_op_ex!(+|a: &RgbSpectrum, b: &RgbSpectrum| -> RgbSpectrum {
    RgbSpectrum { c: [a.c[0] + b.c[0], a.c[1] + b.c[1], a.c[2] + b.c[2]] }
});
impl_op_ex!(-|a: &RgbSpectrum, b: &RgbSpectrum| -> RgbSpectrum {
    RgbSpectrum { c: [a.c[0] - b.c[0], a.c[1] - b.c[1], a.c[2] - b.c[2]] }
});
impl_op_ex!(*|a: &RgbSpectrum, b: &RgbSpectrum| -> RgbSpectrum {
    RgbSpectrum { c: [a.c[0] * b.c[0], a.c[1] * b.c[1], a.c[2] * b.c[2]] }
});
impl_op_ex!(/|a: &RgbSpectrum, b: &RgbSpectrum| -> RgbSpectrum {
    RgbSpectrum { c: [a.c[0] / b.c[0], a.c[1] / b.c[1], a.c[2] / b.c[2]] }
});
impl_op_ex_commutative!(*|a: &RgbSpectrum, b: Float| -> RgbSpectrum {
    RgbSpectrum { c: [a.c[0] * b, a.c[1] * b, a.c[2] * b] }
});
impl_op_ex!(/|a: &RgbSpectrum, b: Float| -> RgbSpectrum {
    let inv = 1.0 as Float / b;
    RgbSpectrum { c: [a.c[0] * inv, a.c[1] * inv, a.c[2] * inv] }
});
impl_op_ex!(+=|a: &mut RgbSpectrum, b: &RgbSpectrum| {
    a.c[0] += b.c[0]; a.c[1] += b.c[1]; a.c[2] += b.c[2];
});
impl_op_ex!(*=|a: &mut RgbSpectrum, b: &RgbSpectrum| {
    a.c[0] *= b.c[0]; a.c[1] *= b.c[1]; a.c[2] *= b.c[2];
});
impl_op_ex!(*=|a: &mut RgbSpectrum, b: Float| {
    a.c[0] *= b; a.c[1] *= b; a.c[2] *= b;
});

pub type Spectrum = RgbSpectrum;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luminance_of_white_is_one() {
        assert!((RgbSpectrum::new(1.0).y() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn arithmetic() {
        let a = RgbSpectrum::rgb(0.25, 0.5, 1.0);
        let b = a * 2.0 as Float;
        assert_eq!(b, RgbSpectrum::rgb(0.5, 1.0, 2.0));
        let mut acc = RgbSpectrum::default();
        acc += a;
        acc += a;
        assert_eq!(acc, a * 2.0 as Float);
        assert!(RgbSpectrum::default().is_black());
    }
}
