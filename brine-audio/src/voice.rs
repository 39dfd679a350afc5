//! Ephemeral voices
//!
//! A voice is one source -> filter -> gain chain built for a single
//! scheduled sound: a one-shot effect layer, a sequencer note, or a
//! harbor bed. Every field is fixed at spawn time; the only mutation
//! after the fact is an early release (looping voices). A voice declares
//! its own stop frame at creation, which bounds its lifetime - the
//! renderer retires it there and no caller ever has to clean one up.

use std::sync::Arc;

use crate::filter::{Biquad, FilterSpec};
use crate::osc::Waveform;

/// Decay floor for exponential gain segments. Exponential ramps are
/// undefined at a zero target, so envelopes land here instead.
pub const GAIN_FLOOR: f32 = 1e-4;

/// How a parameter approaches the value of an automation point from the
/// previous point's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    /// Hold the previous value, then jump at this point's frame.
    Step,
    Linear,
    /// Geometric interpolation. Both endpoint values must be positive;
    /// falls back to linear when they are not.
    Exponential,
}

/// One automation breakpoint: `value` is reached at `frame` via `curve`.
#[derive(Debug, Clone, Copy)]
pub struct AutoPoint {
    pub frame: u64,
    pub value: f32,
    pub curve: Curve,
}

impl AutoPoint {
    pub fn step(frame: u64, value: f32) -> Self {
        Self { frame, value, curve: Curve::Step }
    }

    pub fn linear(frame: u64, value: f32) -> Self {
        Self { frame, value, curve: Curve::Linear }
    }

    pub fn exponential(frame: u64, value: f32) -> Self {
        Self { frame, value, curve: Curve::Exponential }
    }
}

/// Evaluate an automation curve at an absolute frame. Points must be
/// sorted by frame; before the first point the first value holds, after
/// the last the last value holds.
pub fn eval_points(points: &[AutoPoint], frame: u64) -> f32 {
    let Some(first) = points.first() else { return 0.0 };
    if frame <= first.frame {
        return first.value;
    }
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if frame >= b.frame {
            continue;
        }
        let span = (b.frame - a.frame) as f32;
        let t = (frame - a.frame) as f32 / span;
        return match b.curve {
            Curve::Step => a.value,
            Curve::Linear => a.value + (b.value - a.value) * t,
            Curve::Exponential => {
                if a.value > 0.0 && b.value > 0.0 {
                    a.value * (b.value / a.value).powf(t)
                } else {
                    a.value + (b.value - a.value) * t
                }
            }
        };
    }
    points.last().map(|p| p.value).unwrap_or(0.0)
}

/// Sound source for a voice.
#[derive(Debug, Clone)]
pub enum SourceSpec {
    /// Oscillator with frequency automation in Hz.
    Osc { wave: Waveform, freq: Vec<AutoPoint> },
    /// Pre-generated noise buffer, played once or looped.
    Noise { buffer: Arc<Vec<f32>>, looped: bool },
}

/// Which bus gain stage the voice routes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceBus {
    Effects,
    Music,
}

/// Complete description of a voice, built on the control side and sent
/// to the renderer. All times are absolute frames on the audio clock.
#[derive(Debug, Clone)]
pub struct VoiceSpec {
    /// Set only for voices that can be stopped externally (looping
    /// effects, harbor beds). Anonymous voices retire on their own.
    pub id: Option<u64>,
    pub source: SourceSpec,
    pub filter: Option<FilterSpec>,
    /// Gain automation. The envelope's last point bounds audibility;
    /// `stop_frame` must not be earlier.
    pub gain: Vec<AutoPoint>,
    pub start_frame: u64,
    pub stop_frame: u64,
    pub bus: VoiceBus,
}

impl VoiceSpec {
    /// End of the gain envelope, in frames.
    pub fn envelope_end(&self) -> u64 {
        self.gain.last().map(|p| p.frame).unwrap_or(self.start_frame)
    }
}

enum SourceState {
    Osc {
        wave: Waveform,
        phase: f32,
        freq: Vec<AutoPoint>,
    },
    Noise {
        buffer: Arc<Vec<f32>>,
        pos: usize,
        looped: bool,
    },
}

/// A live voice inside the renderer.
pub(crate) struct Voice {
    pub(crate) id: Option<u64>,
    source: SourceState,
    filter: Option<Biquad>,
    gain: Vec<AutoPoint>,
    start: u64,
    stop: u64,
    pub(crate) bus: VoiceBus,
}

impl Voice {
    pub(crate) fn from_spec(spec: VoiceSpec, sample_rate: f32) -> Self {
        let source = match spec.source {
            SourceSpec::Osc { wave, freq } => SourceState::Osc { wave, phase: 0.0, freq },
            SourceSpec::Noise { buffer, looped } => SourceState::Noise { buffer, pos: 0, looped },
        };
        Self {
            id: spec.id,
            source,
            filter: spec.filter.map(|f| Biquad::new(sample_rate, f)),
            gain: spec.gain,
            start: spec.start_frame,
            stop: spec.stop_frame,
            bus: spec.bus,
        }
    }

    pub(crate) fn finished(&self, frame: u64) -> bool {
        frame >= self.stop
    }

    /// Fade out from the current gain and retire shortly after. Used to
    /// stop looping voices; harmless on voices already fading.
    pub(crate) fn release(&mut self, now: u64, release_frames: u64) {
        let current = eval_points(&self.gain, now).max(GAIN_FLOOR);
        let end = now + release_frames.max(1);
        self.gain = vec![
            AutoPoint::step(now, current),
            AutoPoint::exponential(end, GAIN_FLOOR),
        ];
        self.stop = self.stop.min(end + 1);
    }

    #[inline]
    pub(crate) fn sample(&mut self, frame: u64, sample_rate: f32) -> f32 {
        if frame < self.start || frame >= self.stop {
            return 0.0;
        }
        let raw = match &mut self.source {
            SourceState::Osc { wave, phase, freq } => {
                let hz = eval_points(freq, frame);
                let s = wave.sample(*phase);
                *phase += hz / sample_rate;
                if *phase >= 1.0 {
                    *phase -= 1.0;
                }
                s
            }
            SourceState::Noise { buffer, pos, looped } => {
                if *pos >= buffer.len() {
                    if *looped && !buffer.is_empty() {
                        *pos = 0;
                    } else {
                        // Buffer naturally ended before the stop frame.
                        return 0.0;
                    }
                }
                let s = buffer[*pos];
                *pos += 1;
                s
            }
        };
        let shaped = match &mut self.filter {
            Some(f) => f.process(raw),
            None => raw,
        };
        shaped * eval_points(&self.gain, frame)
    }
}
