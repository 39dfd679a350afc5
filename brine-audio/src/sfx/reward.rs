//! Reward and score effects: loot, combos, charge-ups, fanfares.

use crate::filter::FilterSpec;
use crate::noise::Rng;
use crate::osc::Waveform;
use crate::voice::{AutoPoint, VoiceBus, VoiceSpec};

use super::{noise_voice, simple_tone, tone_voice, NoiseColor};

/// Bright pentatonic ladder the jingle climbs.
const JINGLE_HZ: [f32; 7] = [1_318.5, 1_568.0, 1_760.0, 2_093.0, 2_349.3, 2_637.0, 2_793.8];

const COMBO_MAX: u32 = 10;
const NEPTUNE_MAX: u32 = 12;

/// Coins hitting the deck. Combo level drives note count and pace:
/// `min(4 + (level-1)/3, 7)` notes, `max(0.03, 0.09 - level*0.006)` s
/// apart, with a sparkle layer from level 5 up.
pub(crate) fn coin_jingle(now: u64, sr: f32, combo_level: u32, rng: &mut Rng) -> Vec<VoiceSpec> {
    let level = combo_level.clamp(1, COMBO_MAX);
    let count = (4 + (level - 1) / 3).min(7) as usize;
    let spacing_secs = (0.09 - level as f32 * 0.006).max(0.03);
    let spacing = (sr * spacing_secs) as u64;

    let mut voices = Vec::with_capacity(count + 1);
    for (i, &hz) in JINGLE_HZ.iter().take(count).enumerate() {
        let j = rng.range(0.98, 1.02);
        voices.push(simple_tone(
            now + i as u64 * spacing,
            sr,
            Waveform::Triangle,
            hz * j,
            0.18,
            0.002,
            0.12,
            VoiceBus::Effects,
        ));
    }
    if level >= 5 {
        voices.push(noise_voice(
            now,
            sr,
            NoiseColor::White,
            0.08,
            0.01,
            0.3,
            Some(FilterSpec::high_pass(6_000.0, 0.7)),
            rng,
        ));
    }
    voices
}

/// Single confirmation tone whose pitch rises with the combo level.
pub(crate) fn combo_tone(now: u64, sr: f32, level: u32, rng: &mut Rng) -> Vec<VoiceSpec> {
    let level = level.clamp(1, COMBO_MAX);
    let j = rng.range(0.99, 1.01);
    // One semitone per level above a 440 Hz base.
    let hz = 440.0 * 2f32.powf((level - 1) as f32 / 12.0) * j;
    vec![simple_tone(
        now,
        sr,
        Waveform::Triangle,
        hz,
        0.25,
        0.005,
        0.15,
        VoiceBus::Effects,
    )]
}

/// Neptune's-favor charge-up: layered saws sweeping upward, wider and
/// louder as the charge level grows.
pub(crate) fn neptune_charge(now: u64, sr: f32, level: u32, rng: &mut Rng) -> Vec<VoiceSpec> {
    let level = level.clamp(1, NEPTUNE_MAX);
    let lift = 1.0 + 0.1 * level as f32;
    let sweep_end = now + (sr * 0.5) as u64;
    let mut voices = Vec::with_capacity(3);
    for (detune, peak) in [(1.0f32, 0.2), (0.995, 0.12), (1.007, 0.12)] {
        let j = rng.range(0.99, 1.01);
        voices.push(tone_voice(
            now,
            sr,
            Waveform::Saw,
            vec![
                AutoPoint::step(now, 110.0 * lift * detune * j),
                AutoPoint::exponential(sweep_end, 330.0 * lift * detune * j),
            ],
            peak * (0.7 + 0.3 * level as f32 / NEPTUNE_MAX as f32),
            0.05,
            0.45,
            Some(FilterSpec::low_pass(2_400.0, 0.7)),
            VoiceBus::Effects,
        ));
    }
    voices
}

/// Two-note quest acknowledgment.
pub(crate) fn quest_chime(now: u64, sr: f32, rng: &mut Rng) -> Vec<VoiceSpec> {
    let j = rng.range(0.99, 1.01);
    let gap = (sr * 0.12) as u64;
    vec![
        simple_tone(now, sr, Waveform::Sine, 880.0 * j, 0.3, 0.005, 0.4, VoiceBus::Effects),
        simple_tone(
            now + gap,
            sr,
            Waveform::Sine,
            1_174.7 * j,
            0.3,
            0.005,
            0.55,
            VoiceBus::Effects,
        ),
    ]
}

/// Four-note victory arpeggio with a held final chord tone and a bright
/// crash under it.
pub(crate) fn victory_fanfare(now: u64, sr: f32, rng: &mut Rng) -> Vec<VoiceSpec> {
    const ARP_HZ: [f32; 4] = [523.25, 659.25, 784.0, 1_046.5];
    let j = rng.range(0.99, 1.01);
    let gap = (sr * 0.12) as u64;
    let mut voices = Vec::with_capacity(5);
    for (i, &hz) in ARP_HZ.iter().enumerate() {
        let last = i == ARP_HZ.len() - 1;
        voices.push(simple_tone(
            now + i as u64 * gap,
            sr,
            Waveform::Square,
            hz * j,
            if last { 0.3 } else { 0.22 },
            0.005,
            if last { 0.6 } else { 0.14 },
            VoiceBus::Effects,
        ));
    }
    voices.push(noise_voice(
        now + 3 * gap,
        sr,
        NoiseColor::White,
        0.12,
        0.0,
        0.5,
        Some(FilterSpec::high_pass(5_000.0, 0.7)),
        rng,
    ));
    voices
}
