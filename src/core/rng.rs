//! Pseudo-random number generation (PCG32).

use crate::core::base::Float;

pub const FLOAT_ONE_MINUS_EPSILON: Float = crate::core::base::ONE_MINUS_EPSILON;

const PCG32_DEFAULT_STATE: u64 = 0x853c_49e6_748f_ea9b;
const PCG32_DEFAULT_STREAM: u64 = 0xda3e_39cb_94b9_5bdb;
const PCG32_MULT: u64 = 0x5851_f42d_4c95_7f2d;

#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
    inc: u64,
}

impl Default for Rng {
    fn default() -> Self {
        Rng {
            state: PCG32_DEFAULT_STATE,
            inc: PCG32_DEFAULT_STREAM,
        }
    }
}

impl Rng {
    pub fn new(sequence_index: u64) -> Self {
        let mut rng = Rng {
            state: 0_u64,
            inc: (sequence_index << 1) | 1,
        };
        rng.uniform_uint32();
        rng.state = rng.state.wrapping_add(PCG32_DEFAULT_STATE);
        rng.uniform_uint32();
        rng
    }
    pub fn set_sequence(&mut self, sequence_index: u64) {
        *self = Rng::new(sequence_index);
    }
    pub fn uniform_uint32(&mut self) -> u32 {
        let oldstate: u64 = self.state;
        self.state = oldstate.wrapping_mul(PCG32_MULT).wrapping_add(self.inc);
        let xorshifted: u32 = (((oldstate >> 18) ^ oldstate) >> 27) as u32;
        let rot: u32 = (oldstate >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
    pub fn uniform_uint32_bounded(&mut self, b: u32) -> u32 {
        let threshold = b.wrapping_neg() % b;
        loop {
            let r = self.uniform_uint32();
            if r >= threshold {
                return r % b;
            }
        }
    }
    pub fn uniform_float(&mut self) -> Float {
        (self.uniform_uint32() as Float * hexf::hexf32!("0x1.0p-32")).min(FLOAT_ONE_MINUS_EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_in_unit_interval() {
        let mut rng = Rng::new(7);
        for _ in 0..1000 {
            let f = rng.uniform_float();
            assert!((0.0..1.0).contains(&f));
        }
    }

    #[test]
    fn sequences_are_independent() {
        let mut a = Rng::new(1);
        let mut b = Rng::new(2);
        let same = (0..16).all(|_| a.uniform_uint32() == b.uniform_uint32());
        assert!(!same);
    }
}
