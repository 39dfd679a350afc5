//! One-shot effect recipes
//!
//! Every recipe is a pure function from a clock snapshot to a batch of
//! `VoiceSpec`s: build the layers, automate the envelopes against
//! absolute frames, pick a stop frame just past the envelope end, and
//! hand the specs back. The engine sends them to the renderer and
//! forgets them; nothing here touches shared state.
//!
//! Recipe shapes (layer counts, filter types, relative offsets) are
//! fixed per effect; call-time arguments and jitter only scale pitch,
//! level, and note count.

pub(crate) mod combat;
pub(crate) mod reward;
pub(crate) mod world;

use std::sync::Arc;

use crate::filter::FilterSpec;
use crate::noise::{brown_noise, white_noise, Rng};
use crate::osc::Waveform;
use crate::voice::{AutoPoint, SourceSpec, VoiceBus, VoiceSpec, GAIN_FLOOR};

/// Safety margin between an envelope's end and the voice's stop frame.
const STOP_MARGIN_SECS: f32 = 0.05;

/// Distance attenuation constants (world units).
const DIST_SCALE: f32 = 0.05;
const DIST_MIN: f32 = 1.0;
const VOL_MIN: f32 = 0.08;
const VOL_MAX: f32 = 1.0;

pub(crate) fn margin_frames(sample_rate: f32) -> u64 {
    (sample_rate * STOP_MARGIN_SECS) as u64
}

/// Inverse-distance volume, clamped so nearby hits don't blow out and
/// remote ones stay faintly audible.
pub(crate) fn distance_volume(distance: f32) -> f32 {
    (1.0 / (distance.abs() * DIST_SCALE).max(DIST_MIN)).clamp(VOL_MIN, VOL_MAX)
}

/// Independent ±20 % pitch jitter multiplier.
pub(crate) fn pitch_jitter(rng: &mut Rng) -> f32 {
    rng.range(0.8, 1.2)
}

/// A struck tone: optional linear attack to `peak`, then exponential
/// decay to the gain floor. The workhorse behind bells, chimes, notes,
/// and most tonal layers.
#[allow(clippy::too_many_arguments)]
pub(crate) fn tone_voice(
    now: u64,
    sample_rate: f32,
    wave: Waveform,
    freq: Vec<AutoPoint>,
    peak: f32,
    attack_secs: f32,
    decay_secs: f32,
    filter: Option<FilterSpec>,
    bus: VoiceBus,
) -> VoiceSpec {
    let attack = (sample_rate * attack_secs) as u64;
    let decay = ((sample_rate * decay_secs) as u64).max(1);
    let mut gain = Vec::with_capacity(3);
    if attack == 0 {
        gain.push(AutoPoint::step(now, peak));
    } else {
        gain.push(AutoPoint::step(now, 0.0));
        gain.push(AutoPoint::linear(now + attack, peak));
    }
    gain.push(AutoPoint::exponential(now + attack + decay, GAIN_FLOOR));
    let mut spec = VoiceSpec {
        id: None,
        source: SourceSpec::Osc { wave, freq },
        filter,
        gain,
        start_frame: now,
        stop_frame: 0,
        bus,
    };
    spec.stop_frame = spec.envelope_end() + margin_frames(sample_rate);
    spec
}

/// Fixed-frequency convenience wrapper around [`tone_voice`].
#[allow(clippy::too_many_arguments)]
pub(crate) fn simple_tone(
    now: u64,
    sample_rate: f32,
    wave: Waveform,
    hz: f32,
    peak: f32,
    attack_secs: f32,
    decay_secs: f32,
    bus: VoiceBus,
) -> VoiceSpec {
    tone_voice(
        now,
        sample_rate,
        wave,
        vec![AutoPoint::step(now, hz)],
        peak,
        attack_secs,
        decay_secs,
        None,
        bus,
    )
}

/// Noise color for [`noise_voice`].
#[derive(Clone, Copy)]
pub(crate) enum NoiseColor {
    White,
    Brown,
}

/// A one-shot noise burst with the same attack/decay envelope shape as
/// [`tone_voice`]. Buffer length covers the whole envelope.
#[allow(clippy::too_many_arguments)]
pub(crate) fn noise_voice(
    now: u64,
    sample_rate: f32,
    color: NoiseColor,
    peak: f32,
    attack_secs: f32,
    decay_secs: f32,
    filter: Option<FilterSpec>,
    rng: &mut Rng,
) -> VoiceSpec {
    let secs = attack_secs + decay_secs + STOP_MARGIN_SECS;
    let buffer = match color {
        NoiseColor::White => white_noise(sample_rate, secs, rng),
        NoiseColor::Brown => brown_noise(sample_rate, secs, rng),
    };
    let attack = (sample_rate * attack_secs) as u64;
    let decay = ((sample_rate * decay_secs) as u64).max(1);
    let mut gain = Vec::with_capacity(3);
    if attack == 0 {
        gain.push(AutoPoint::step(now, peak));
    } else {
        gain.push(AutoPoint::step(now, 0.0));
        gain.push(AutoPoint::linear(now + attack, peak));
    }
    gain.push(AutoPoint::exponential(now + attack + decay, GAIN_FLOOR));
    let mut spec = VoiceSpec {
        id: None,
        source: SourceSpec::Noise {
            buffer: Arc::new(buffer),
            looped: false,
        },
        filter,
        gain,
        start_frame: now,
        stop_frame: 0,
        bus: VoiceBus::Effects,
    };
    spec.stop_frame = spec.envelope_end() + margin_frames(sample_rate);
    spec
}

/// Sequencer note: fast strike, exponential ring-out over the note's
/// nominal duration, with the caller's pre-jittered frequency.
pub(crate) fn note_voice(
    start: u64,
    sample_rate: f32,
    wave: Waveform,
    hz: f32,
    peak: f32,
    ring_secs: f32,
) -> VoiceSpec {
    tone_voice(
        start,
        sample_rate,
        wave,
        vec![AutoPoint::step(start, hz)],
        peak,
        0.005,
        ring_secs,
        None,
        VoiceBus::Music,
    )
}
