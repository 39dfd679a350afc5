//! Mode-aware music sequencer
//!
//! Pure side of the score: mode resolution and bar construction. Each
//! mode owns a tempo, a rotation of fixed eight-note melody bars, and a
//! timbre. A bar is rendered as eight note voices pinned to absolute
//! audio-clock frames from one snapshot; the wall-clock re-arm delay is
//! returned alongside so the engine's coarse timer can schedule the next
//! bar. Nothing in this module touches shared state.

use std::time::Duration;

use crate::noise::Rng;
use crate::osc::Waveform;
use crate::sfx::note_voice;
use crate::voice::VoiceSpec;

pub const NOTES_PER_BAR: usize = 8;

/// Scripted-event flavors, each with its own score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    GhostFleet,
    TideSurge,
    Festival,
}

/// Raw mode flags as set by the game. More than one can be raised at a
/// time; [`ModeFlags::resolve`] picks the one that plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct ModeFlags {
    pub boss: bool,
    pub port: bool,
    pub event: Option<EventKind>,
}

/// The resolved, single active mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Port,
    Boss,
    Event(EventKind),
}

impl ModeFlags {
    /// Fixed cascade: scripted event over boss over port over normal.
    pub(crate) fn resolve(self) -> Mode {
        if let Some(kind) = self.event {
            Mode::Event(kind)
        } else if self.boss {
            Mode::Boss
        } else if self.port {
            Mode::Port
        } else {
            Mode::Normal
        }
    }
}

/// Melody bars as MIDI note numbers, 0 marking a rest.
type Bar = [u8; NOTES_PER_BAR];

struct ModeProfile {
    bpm: f32,
    wave: Waveform,
    peak: f32,
    banks: &'static [Bar],
}

const NORMAL_BANKS: &[Bar] = &[
    [62, 0, 65, 0, 67, 65, 0, 62],
    [62, 0, 65, 67, 69, 0, 67, 65],
    [60, 0, 62, 0, 65, 62, 0, 60],
];

const PORT_BANKS: &[Bar] = &[
    [67, 0, 0, 71, 0, 0, 74, 0],
    [66, 0, 0, 69, 0, 0, 71, 0],
];

const BOSS_BANKS: &[Bar] = &[
    [57, 57, 60, 57, 58, 57, 60, 62],
    [57, 57, 60, 57, 56, 57, 53, 57],
];

const GHOST_BANKS: &[Bar] = &[
    [58, 0, 61, 0, 64, 0, 61, 0],
    [57, 0, 60, 0, 63, 0, 60, 0],
];

const TIDE_BANKS: &[Bar] = &[[64, 66, 67, 69, 67, 66, 64, 62]];

const FESTIVAL_BANKS: &[Bar] = &[
    [72, 0, 76, 72, 77, 76, 74, 72],
    [72, 74, 76, 77, 79, 77, 76, 74],
];

fn profile(mode: Mode) -> ModeProfile {
    match mode {
        Mode::Normal => ModeProfile {
            bpm: 84.0,
            wave: Waveform::Triangle,
            peak: 0.12,
            banks: NORMAL_BANKS,
        },
        Mode::Port => ModeProfile {
            bpm: 66.0,
            wave: Waveform::Sine,
            peak: 0.10,
            banks: PORT_BANKS,
        },
        Mode::Boss => ModeProfile {
            bpm: 140.0,
            wave: Waveform::Saw,
            peak: 0.14,
            banks: BOSS_BANKS,
        },
        Mode::Event(EventKind::GhostFleet) => ModeProfile {
            bpm: 72.0,
            wave: Waveform::Triangle,
            peak: 0.11,
            banks: GHOST_BANKS,
        },
        Mode::Event(EventKind::TideSurge) => ModeProfile {
            bpm: 104.0,
            wave: Waveform::Triangle,
            peak: 0.13,
            banks: TIDE_BANKS,
        },
        Mode::Event(EventKind::Festival) => ModeProfile {
            bpm: 126.0,
            wave: Waveform::Square,
            peak: 0.10,
            banks: FESTIVAL_BANKS,
        },
    }
}

pub(crate) fn midi_to_hz(note: u8) -> f32 {
    440.0 * 2f32.powf((note as f32 - 69.0) / 12.0)
}

/// Build one bar of the active mode's score. Notes are scheduled at
/// `now + i * eighth` on the audio clock with slight per-note detune;
/// rests emit nothing. Returns the voices plus the bar's nominal
/// wall-clock duration for the coarse re-arm timer.
pub(crate) fn bar_voices(
    mode: Mode,
    bar_index: usize,
    now: u64,
    sample_rate: f32,
    rng: &mut Rng,
) -> (Vec<VoiceSpec>, Duration) {
    let p = profile(mode);
    let bar = &p.banks[bar_index % p.banks.len()];
    let eighth_secs = 60.0 / p.bpm / 2.0;
    let eighth_frames = (sample_rate * eighth_secs) as u64;

    let mut voices = Vec::with_capacity(NOTES_PER_BAR);
    for (i, &note) in bar.iter().enumerate() {
        if note == 0 {
            continue;
        }
        let hz = midi_to_hz(note) * rng.range(0.99, 1.01);
        voices.push(note_voice(
            now + i as u64 * eighth_frames,
            sample_rate,
            p.wave,
            hz,
            p.peak,
            eighth_secs * 1.8,
        ));
    }
    (
        voices,
        Duration::from_secs_f32(eighth_secs * NOTES_PER_BAR as f32),
    )
}
