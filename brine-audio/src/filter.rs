//! Mono biquad filter (low-pass, high-pass, band-pass)

use std::f32::consts::PI;

/// Filter response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterKind {
    #[default]
    LowPass,
    HighPass,
    BandPass,
}

/// Static filter parameters carried by a voice spec.
#[derive(Debug, Clone, Copy)]
pub struct FilterSpec {
    pub kind: FilterKind,
    pub cutoff: f32,
    pub q: f32,
}

impl FilterSpec {
    pub fn low_pass(cutoff: f32, q: f32) -> Self {
        Self { kind: FilterKind::LowPass, cutoff, q }
    }

    pub fn high_pass(cutoff: f32, q: f32) -> Self {
        Self { kind: FilterKind::HighPass, cutoff, q }
    }

    pub fn band_pass(cutoff: f32, q: f32) -> Self {
        Self { kind: FilterKind::BandPass, cutoff, q }
    }
}

/// Mono biquad. Per-voice sources are mono; stereo comes from the final
/// bus fan-out.
#[derive(Debug, Clone)]
pub struct Biquad {
    sample_rate: f32,
    kind: FilterKind,
    cutoff: f32,
    q: f32,

    a0: f32,
    a1: f32,
    a2: f32,
    b1: f32,
    b2: f32,

    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    pub fn new(sample_rate: f32, spec: FilterSpec) -> Self {
        let mut f = Self {
            sample_rate,
            kind: spec.kind,
            cutoff: spec.cutoff,
            q: spec.q,
            a0: 1.0,
            a1: 0.0,
            a2: 0.0,
            b1: 0.0,
            b2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        };
        f.calculate_coefficients();
        f
    }

    /// Retune without resetting state. Used by the ambient wind layer
    /// whose center/Q glide continuously.
    pub fn set_params(&mut self, cutoff: f32, q: f32) {
        let cutoff = cutoff.clamp(10.0, 20_000.0);
        let q = q.clamp(0.05, 20.0);
        if (cutoff - self.cutoff).abs() < f32::EPSILON && (q - self.q).abs() < f32::EPSILON {
            return;
        }
        self.cutoff = cutoff;
        self.q = q;
        self.calculate_coefficients();
    }

    fn calculate_coefficients(&mut self) {
        let omega = 2.0 * PI * self.cutoff / self.sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * self.q);

        let (b0, b1, b2) = match self.kind {
            FilterKind::LowPass => {
                let b0 = (1.0 - cos_omega) / 2.0;
                (b0, 1.0 - cos_omega, b0)
            }
            FilterKind::HighPass => {
                let b0 = (1.0 + cos_omega) / 2.0;
                (b0, -(1.0 + cos_omega), b0)
            }
            FilterKind::BandPass => (alpha, 0.0, -alpha),
        };
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        self.a0 = b0 / a0;
        self.a1 = b1 / a0;
        self.a2 = b2 / a0;
        self.b1 = a1 / a0;
        self.b2 = a2 / a0;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.a0 * input + self.a1 * self.x1 + self.a2 * self.x2
            - self.b1 * self.y1
            - self.b2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn rms_through(filter: &mut Biquad, freq: f32, sample_rate: f32) -> f32 {
        let n = 4800;
        let mut sum = 0.0;
        for i in 0..n {
            let x = (TAU * freq * i as f32 / sample_rate).sin();
            let y = filter.process(x);
            // Skip the settling transient.
            if i >= n / 2 {
                sum += y * y;
            }
        }
        (sum / (n / 2) as f32).sqrt()
    }

    #[test]
    fn low_pass_attenuates_high_frequencies() {
        let sr = 48_000.0;
        let mut lp = Biquad::new(sr, FilterSpec::low_pass(200.0, 0.7));
        let low = rms_through(&mut lp, 50.0, sr);
        let mut lp = Biquad::new(sr, FilterSpec::low_pass(200.0, 0.7));
        let high = rms_through(&mut lp, 4_000.0, sr);
        assert!(low > high * 10.0, "low={low} high={high}");
    }

    #[test]
    fn band_pass_favors_center() {
        let sr = 48_000.0;
        let mut bp = Biquad::new(sr, FilterSpec::band_pass(1_600.0, 0.8));
        let center = rms_through(&mut bp, 1_600.0, sr);
        let mut bp = Biquad::new(sr, FilterSpec::band_pass(1_600.0, 0.8));
        let far = rms_through(&mut bp, 100.0, sr);
        assert!(center > far * 3.0, "center={center} far={far}");
    }

    #[test]
    fn retune_keeps_output_finite() {
        let sr = 48_000.0;
        let mut bp = Biquad::new(sr, FilterSpec::band_pass(1_200.0, 0.8));
        for i in 0..10_000 {
            bp.set_params(1_200.0 + i as f32 / 10.0, 0.8);
            let y = bp.process((TAU * 500.0 * i as f32 / sr).sin());
            assert!(y.is_finite());
        }
    }
}
