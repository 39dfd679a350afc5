//! Always-on ambient bed
//!
//! Three persistent layers mixed into the effects bus: a low-passed
//! brown-noise ocean with a slow swell, a band-passed white-noise wind,
//! and a deep sine storm undertone that only opens up in heavy weather.
//! All audible parameters are `Ramp`s so the mixing controller can glide
//! them without clicks.

use std::f32::consts::TAU;

use crate::filter::{Biquad, FilterSpec};
use crate::noise::{brown_noise, white_noise, Rng};
use crate::param::Ramp;

const OCEAN_BUFFER_SECS: f32 = 3.0;
const WIND_BUFFER_SECS: f32 = 2.0;

const OCEAN_LP_HZ: f32 = 200.0;
const OCEAN_LP_Q: f32 = 0.7;
const OCEAN_GAIN: f32 = 0.18;
const SWELL_RATE_HZ: f32 = 0.12;
const SWELL_DEPTH: f32 = 0.06;

const WIND_CENTER_HZ: f32 = 1_600.0;
const WIND_Q: f32 = 0.8;
const WIND_GAIN: f32 = 0.05;

const STORM_PITCH_HZ: f32 = 35.0;

/// Ambient parameter addressable by ramp commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbientParam {
    WindGain,
    WindCenter,
    WindQ,
    OceanGain,
    SwellDepth,
    SwellRate,
    StormGain,
    StormPitch,
}

pub(crate) struct AmbientBed {
    sample_rate: f32,

    ocean_buf: Vec<f32>,
    ocean_pos: usize,
    ocean_lp: Biquad,
    ocean_gain: Ramp,
    swell_depth: Ramp,
    swell_rate: Ramp,
    swell_phase: f32,

    wind_buf: Vec<f32>,
    wind_pos: usize,
    wind_bp: Biquad,
    wind_gain: Ramp,
    wind_center: Ramp,
    wind_q: Ramp,

    storm_phase: f32,
    storm_gain: Ramp,
    storm_pitch: Ramp,
}

impl AmbientBed {
    pub(crate) fn new(sample_rate: f32, rng: &mut Rng) -> Self {
        Self {
            sample_rate,
            ocean_buf: brown_noise(sample_rate, OCEAN_BUFFER_SECS, rng),
            ocean_pos: 0,
            ocean_lp: Biquad::new(sample_rate, FilterSpec::low_pass(OCEAN_LP_HZ, OCEAN_LP_Q)),
            ocean_gain: Ramp::new(OCEAN_GAIN),
            swell_depth: Ramp::new(SWELL_DEPTH),
            swell_rate: Ramp::new(SWELL_RATE_HZ),
            swell_phase: 0.0,
            wind_buf: white_noise(sample_rate, WIND_BUFFER_SECS, rng),
            wind_pos: 0,
            wind_bp: Biquad::new(sample_rate, FilterSpec::band_pass(WIND_CENTER_HZ, WIND_Q)),
            wind_gain: Ramp::new(WIND_GAIN),
            wind_center: Ramp::new(WIND_CENTER_HZ),
            wind_q: Ramp::new(WIND_Q),
            storm_phase: 0.0,
            storm_gain: Ramp::new(0.0),
            storm_pitch: Ramp::new(STORM_PITCH_HZ),
        }
    }

    pub(crate) fn set_param(&mut self, param: AmbientParam, now: u64, target: f32, frames: u64) {
        let ramp = match param {
            AmbientParam::WindGain => &mut self.wind_gain,
            AmbientParam::WindCenter => &mut self.wind_center,
            AmbientParam::WindQ => &mut self.wind_q,
            AmbientParam::OceanGain => &mut self.ocean_gain,
            AmbientParam::SwellDepth => &mut self.swell_depth,
            AmbientParam::SwellRate => &mut self.swell_rate,
            AmbientParam::StormGain => &mut self.storm_gain,
            AmbientParam::StormPitch => &mut self.storm_pitch,
        };
        ramp.set(now, target, frames);
    }

    /// Retune the gliding wind filter. Called once per output buffer;
    /// per-sample retuning would be wasted coefficient math.
    pub(crate) fn refresh_filters(&mut self, frame: u64) {
        self.wind_bp
            .set_params(self.wind_center.value_at(frame), self.wind_q.value_at(frame));
    }

    #[inline]
    pub(crate) fn sample(&mut self, frame: u64) -> f32 {
        // Ocean: looped brown noise under a fixed low-pass, amplitude
        // modulated by the swell LFO around the base gain.
        let raw = self.ocean_buf[self.ocean_pos];
        self.ocean_pos = (self.ocean_pos + 1) % self.ocean_buf.len();
        let swell = self.swell_depth.value_at(frame) * self.swell_phase.sin();
        self.swell_phase += TAU * self.swell_rate.value_at(frame) / self.sample_rate;
        if self.swell_phase >= TAU {
            self.swell_phase -= TAU;
        }
        let ocean =
            self.ocean_lp.process(raw) * (self.ocean_gain.value_at(frame) + swell).max(0.0);

        // Wind: looped white noise through the gliding band-pass.
        let raw = self.wind_buf[self.wind_pos];
        self.wind_pos = (self.wind_pos + 1) % self.wind_buf.len();
        let wind = self.wind_bp.process(raw) * self.wind_gain.value_at(frame);

        // Storm undertone: closed (gain 0) in fair weather.
        let storm = self.storm_phase.sin() * self.storm_gain.value_at(frame);
        self.storm_phase += TAU * self.storm_pitch.value_at(frame) / self.sample_rate;
        if self.storm_phase >= TAU {
            self.storm_phase -= TAU;
        }

        ocean + wind + storm
    }
}
