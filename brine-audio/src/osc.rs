//! Basic waveform oscillators
//!
//! Naive (non-band-limited) shapes. Every tone in the engine is short,
//! enveloped, and mid-register, so aliasing from the bright shapes sits
//! below the noise beds; full PolyBLEP treatment would be unearned
//! complexity here.

use std::f32::consts::TAU;

/// Oscillator waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Triangle,
    Square,
    Saw,
}

impl Waveform {
    /// Sample the waveform at a normalized phase in [0, 1).
    #[inline]
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (phase * TAU).sin(),
            Waveform::Triangle => {
                // Rises 0..0.5, falls 0.5..1.
                if phase < 0.5 {
                    4.0 * phase - 1.0
                } else {
                    3.0 - 4.0 * phase
                }
            }
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Saw => 2.0 * phase - 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn all_waveforms_stay_in_range() {
        for wave in [Waveform::Sine, Waveform::Triangle, Waveform::Square, Waveform::Saw] {
            for i in 0..1000 {
                let s = wave.sample(i as f32 / 1000.0);
                assert!((-1.0..=1.0).contains(&s), "{wave:?} out of range: {s}");
            }
        }
    }

    #[test]
    fn triangle_peaks_at_half_phase() {
        assert_relative_eq!(Waveform::Triangle.sample(0.0), -1.0);
        assert_relative_eq!(Waveform::Triangle.sample(0.25), 0.0);
        assert_relative_eq!(Waveform::Triangle.sample(0.5), 1.0);
        assert_relative_eq!(Waveform::Triangle.sample(0.75), 0.0);
    }

    #[test]
    fn square_flips_at_half_phase() {
        assert_relative_eq!(Waveform::Square.sample(0.1), 1.0);
        assert_relative_eq!(Waveform::Square.sample(0.9), -1.0);
    }
}
