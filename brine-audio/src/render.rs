//! Render graph
//!
//! The `Renderer` lives behind a mutex shared between the audio-thread
//! command loop and the cpal stream callback. It owns the ambient bed,
//! the live voice list, and the three bus gain stages, counts frames,
//! and publishes the frame count as the audio clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::ambient::{AmbientBed, AmbientParam};
use crate::noise::Rng;
use crate::param::Ramp;
use crate::voice::{Voice, VoiceBus, VoiceSpec};

pub(crate) const DEFAULT_MASTER_VOLUME: f32 = 1.0;
pub(crate) const DEFAULT_EFFECTS_VOLUME: f32 = 1.0;
pub(crate) const DEFAULT_MUSIC_VOLUME: f32 = 0.85;

/// Bus gain stage addressable by ramp commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bus {
    Master,
    Effects,
    Music,
}

/// Commands applied to the renderer between output buffers.
pub(crate) enum RenderCommand {
    Spawn(VoiceSpec),
    /// Fade out a tagged looping voice. Unknown ids are ignored, so a
    /// second stop on the same voice is harmless.
    Release { id: u64, release_frames: u64 },
    BusRamp { bus: Bus, target: f32, frames: u64 },
    Ambient { param: AmbientParam, target: f32, frames: u64 },
}

pub(crate) struct Renderer {
    sample_rate: f32,
    frame: u64,
    clock: Arc<AtomicU64>,
    ambient: AmbientBed,
    voices: Vec<Voice>,
    master: Ramp,
    effects: Ramp,
    music: Ramp,
}

impl Renderer {
    pub(crate) fn new(sample_rate: f32, clock: Arc<AtomicU64>) -> Self {
        let mut rng = Rng::from_entropy();
        Self {
            sample_rate,
            frame: 0,
            clock,
            ambient: AmbientBed::new(sample_rate, &mut rng),
            voices: Vec::with_capacity(64),
            master: Ramp::new(DEFAULT_MASTER_VOLUME),
            effects: Ramp::new(DEFAULT_EFFECTS_VOLUME),
            music: Ramp::new(DEFAULT_MUSIC_VOLUME),
        }
    }

    pub(crate) fn apply(&mut self, cmd: RenderCommand) {
        match cmd {
            RenderCommand::Spawn(spec) => {
                self.voices.push(Voice::from_spec(spec, self.sample_rate));
            }
            RenderCommand::Release { id, release_frames } => {
                let now = self.frame;
                for voice in self.voices.iter_mut().filter(|v| v.id == Some(id)) {
                    voice.release(now, release_frames);
                }
            }
            RenderCommand::BusRamp { bus, target, frames } => {
                let ramp = match bus {
                    Bus::Master => &mut self.master,
                    Bus::Effects => &mut self.effects,
                    Bus::Music => &mut self.music,
                };
                ramp.set(self.frame, target, frames);
            }
            RenderCommand::Ambient { param, target, frames } => {
                self.ambient.set_param(param, self.frame, target, frames);
            }
        }
    }

    /// Fill an interleaved output buffer. Mono render fanned out to all
    /// channels.
    pub(crate) fn render(&mut self, output: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        self.ambient.refresh_filters(self.frame);
        for frame_out in output.chunks_mut(channels) {
            let frame = self.frame;
            let mut effects_sum = self.ambient.sample(frame);
            let mut music_sum = 0.0;
            for voice in &mut self.voices {
                let s = voice.sample(frame, self.sample_rate);
                match voice.bus {
                    VoiceBus::Effects => effects_sum += s,
                    VoiceBus::Music => music_sum += s,
                }
            }
            let mix = effects_sum * self.effects.value_at(frame)
                + music_sum * self.music.value_at(frame);
            let out = soft_clip(mix * self.master.value_at(frame));
            for slot in frame_out.iter_mut() {
                *slot = out;
            }
            self.frame += 1;
        }
        let frame = self.frame;
        self.voices.retain(|v| !v.finished(frame));
        self.clock.store(frame, Ordering::Release);
    }

    #[cfg(test)]
    pub(crate) fn voice_count(&self) -> usize {
        self.voices.len()
    }
}

/// Soft clipper: linear inside ±1, overshoot compressed into ±1.5.
#[inline]
fn soft_clip(x: f32) -> f32 {
    if x > 1.0 {
        let over = x - 1.0;
        1.0 + over / (1.0 + over * 2.0)
    } else if x < -1.0 {
        let over = -x - 1.0;
        -(1.0 + over / (1.0 + over * 2.0))
    } else {
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::{AutoPoint, SourceSpec, VoiceSpec};
    use crate::osc::Waveform;

    fn renderer() -> Renderer {
        Renderer::new(48_000.0, Arc::new(AtomicU64::new(0)))
    }

    fn tone(start: u64, stop: u64, bus: VoiceBus, id: Option<u64>) -> VoiceSpec {
        VoiceSpec {
            id,
            source: SourceSpec::Osc {
                wave: Waveform::Sine,
                freq: vec![AutoPoint::step(start, 440.0)],
            },
            filter: None,
            gain: vec![AutoPoint::step(start, 0.5)],
            start_frame: start,
            stop_frame: stop,
            bus,
        }
    }

    #[test]
    fn clock_advances_with_rendered_frames() {
        let clock = Arc::new(AtomicU64::new(0));
        let mut r = Renderer::new(48_000.0, clock.clone());
        let mut buf = vec![0.0f32; 512 * 2];
        r.render(&mut buf, 2);
        assert_eq!(clock.load(Ordering::Acquire), 512);
        r.render(&mut buf, 2);
        assert_eq!(clock.load(Ordering::Acquire), 1024);
    }

    #[test]
    fn voices_retire_at_their_stop_frame() {
        let mut r = renderer();
        r.apply(RenderCommand::Spawn(tone(0, 1_000, VoiceBus::Effects, None)));
        assert_eq!(r.voice_count(), 1);
        let mut buf = vec![0.0f32; 999];
        r.render(&mut buf, 1);
        assert_eq!(r.voice_count(), 1);
        let mut buf = vec![0.0f32; 2];
        r.render(&mut buf, 1);
        assert_eq!(r.voice_count(), 0);
    }

    #[test]
    fn release_of_unknown_id_is_ignored() {
        let mut r = renderer();
        r.apply(RenderCommand::Release { id: 99, release_frames: 100 });
        let mut buf = vec![0.0f32; 64];
        r.render(&mut buf, 1);
        assert_eq!(r.voice_count(), 0);
    }

    #[test]
    fn release_retires_a_looping_voice() {
        let mut r = renderer();
        r.apply(RenderCommand::Spawn(tone(0, u64::MAX, VoiceBus::Effects, Some(5))));
        let mut buf = vec![0.0f32; 256];
        r.render(&mut buf, 1);
        assert_eq!(r.voice_count(), 1);
        r.apply(RenderCommand::Release { id: 5, release_frames: 128 });
        let mut buf = vec![0.0f32; 512];
        r.render(&mut buf, 1);
        assert_eq!(r.voice_count(), 0);
    }

    #[test]
    fn music_bus_gain_scales_music_voices() {
        let mut r = renderer();
        // Silence the ambient bed to isolate the music voice.
        for param in [
            AmbientParam::OceanGain,
            AmbientParam::SwellDepth,
            AmbientParam::WindGain,
        ] {
            r.apply(RenderCommand::Ambient { param, target: 0.0, frames: 1 });
        }
        r.apply(RenderCommand::BusRamp { bus: Bus::Music, target: 0.0, frames: 1 });
        r.apply(RenderCommand::Spawn(tone(10, u64::MAX, VoiceBus::Music, Some(1))));
        let mut buf = vec![0.0f32; 4_800];
        r.render(&mut buf, 1);
        let muted_peak = buf.iter().skip(100).fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(muted_peak < 1e-3, "music bus at zero still audible: {muted_peak}");

        r.apply(RenderCommand::BusRamp { bus: Bus::Music, target: 1.0, frames: 1 });
        let mut buf = vec![0.0f32; 4_800];
        r.render(&mut buf, 1);
        let peak = buf.iter().skip(100).fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.2, "music voice inaudible after raising bus: {peak}");
    }

    #[test]
    fn output_is_bounded_under_heavy_load() {
        let mut r = renderer();
        for i in 0..40 {
            r.apply(RenderCommand::Spawn(tone(0, u64::MAX, VoiceBus::Effects, Some(i))));
        }
        let mut buf = vec![0.0f32; 2_048];
        r.render(&mut buf, 1);
        for s in &buf {
            assert!(s.is_finite());
            assert!(s.abs() <= 1.5, "clipped output escaped limiter: {s}");
        }
    }
}
