pub mod allpass;
pub mod comb;
pub mod delay_line;
pub mod filter;
pub mod rng;
pub mod smoothing;

pub use allpass::AllpassDiffuser;
pub use comb::DampedComb;
pub use delay_line::DelayLine;
pub use filter::{Biquad, BiquadCoeffs};
pub use rng::Rng;
pub use smoothing::{LinearRamp, OnePole};
