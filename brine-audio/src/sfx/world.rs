//! World and interface effects: water, rigging, signals, UI feedback.

use std::sync::Arc;

use crate::filter::FilterSpec;
use crate::noise::{brown_noise, Rng};
use crate::osc::Waveform;
use crate::voice::{AutoPoint, SourceSpec, VoiceBus, VoiceSpec, GAIN_FLOOR};

use super::{margin_frames, noise_voice, pitch_jitter, simple_tone, tone_voice, NoiseColor};

/// Something heavy hitting the water.
pub(crate) fn splash(now: u64, sr: f32, rng: &mut Rng) -> Vec<VoiceSpec> {
    let j = pitch_jitter(rng);
    vec![noise_voice(
        now,
        sr,
        NoiseColor::White,
        0.45,
        0.01,
        0.3,
        Some(FilterSpec::low_pass(1_200.0 * j, 0.7)),
        rng,
    )]
}

/// Ship's bell: fundamental plus one inharmonic partial, long ring.
pub(crate) fn ship_bell(now: u64, sr: f32, rng: &mut Rng) -> Vec<VoiceSpec> {
    let j = rng.range(0.98, 1.02);
    let hz = 660.0 * j;
    vec![
        simple_tone(now, sr, Waveform::Sine, hz, 0.35, 0.0, 0.8, VoiceBus::Effects),
        simple_tone(now, sr, Waveform::Sine, hz * 2.76, 0.12, 0.0, 0.4, VoiceBus::Effects),
    ]
}

/// Signal fire roaring to life: a slow whoosh with crackle on top.
pub(crate) fn signal_fire(now: u64, sr: f32, rng: &mut Rng) -> Vec<VoiceSpec> {
    vec![
        noise_voice(
            now,
            sr,
            NoiseColor::White,
            0.4,
            0.15,
            0.45,
            Some(FilterSpec::band_pass(600.0, 0.5)),
            rng,
        ),
        noise_voice(
            now,
            sr,
            NoiseColor::White,
            0.15,
            0.05,
            0.3,
            Some(FilterSpec::high_pass(4_000.0, 0.7)),
            rng,
        ),
    ]
}

/// Ghost-fleet wail: two slightly detuned triangle sweeps gliding down.
pub(crate) fn ghost_wail(now: u64, sr: f32, rng: &mut Rng) -> Vec<VoiceSpec> {
    let j = rng.range(0.95, 1.05);
    let sweep_end = now + (sr * 1.2) as u64;
    let mut voices = Vec::with_capacity(2);
    for detune in [1.0f32, 1.012] {
        voices.push(tone_voice(
            now,
            sr,
            Waveform::Triangle,
            vec![
                AutoPoint::step(now, 320.0 * j * detune),
                AutoPoint::linear(sweep_end, 180.0 * j * detune),
            ],
            0.3,
            0.3,
            0.9,
            Some(FilterSpec::low_pass(1_000.0, 0.7)),
            VoiceBus::Effects,
        ));
    }
    voices
}

/// Canvas cracking taut in a gust.
pub(crate) fn sail_snap(now: u64, sr: f32, rng: &mut Rng) -> Vec<VoiceSpec> {
    let j = pitch_jitter(rng);
    vec![noise_voice(
        now,
        sr,
        NoiseColor::White,
        0.55,
        0.0,
        0.05,
        Some(FilterSpec::high_pass(1_500.0 * j, 0.7)),
        rng,
    )]
}

/// Short dry tick for menu interaction.
pub(crate) fn ui_click(now: u64, sr: f32, _rng: &mut Rng) -> Vec<VoiceSpec> {
    vec![simple_tone(
        now,
        sr,
        Waveform::Square,
        1_800.0,
        0.15,
        0.0,
        0.025,
        VoiceBus::Effects,
    )]
}

/// Single gull chirp used by the harbor bed's recurring timer: a fast
/// downward triangle blip.
pub(crate) fn gull_chirp(now: u64, sr: f32, rng: &mut Rng) -> Vec<VoiceSpec> {
    let j = pitch_jitter(rng);
    let glide_end = now + (sr * 0.09) as u64;
    vec![tone_voice(
        now,
        sr,
        Waveform::Triangle,
        vec![
            AutoPoint::step(now, 2_400.0 * j),
            AutoPoint::linear(glide_end, 1_700.0 * j),
        ],
        0.12,
        0.01,
        0.12,
        None,
        VoiceBus::Effects,
    )]
}

/// Harbor beds: lapping water and a quieter distant murmur, both as
/// looping tagged voices that fade in and hold until released.
pub(crate) fn harbor_beds(
    now: u64,
    sr: f32,
    water_id: u64,
    murmur_id: u64,
    rng: &mut Rng,
) -> Vec<VoiceSpec> {
    let fade = (sr * 0.8) as u64;
    let bed = |id: u64, secs: f32, gain: f32, filter: FilterSpec, rng: &mut Rng| VoiceSpec {
        id: Some(id),
        source: SourceSpec::Noise {
            buffer: Arc::new(brown_noise(sr, secs, rng)),
            looped: true,
        },
        filter: Some(filter),
        gain: vec![
            AutoPoint::step(now, GAIN_FLOOR),
            AutoPoint::linear(now + fade, gain),
        ],
        start_frame: now,
        stop_frame: u64::MAX - margin_frames(sr),
        bus: VoiceBus::Effects,
    };
    vec![
        bed(water_id, 2.5, 0.05, FilterSpec::low_pass(500.0, 0.7), rng),
        bed(murmur_id, 3.0, 0.025, FilterSpec::band_pass(350.0, 0.6), rng),
    ]
}

/// Looping whirlpool swirl behind the stop handle: band-passed brown
/// churn that fades in and circles until released.
pub(crate) fn whirlpool_swirl(now: u64, sr: f32, id: u64, rng: &mut Rng) -> Vec<VoiceSpec> {
    let fade = (sr * 0.3) as u64;
    vec![VoiceSpec {
        id: Some(id),
        source: SourceSpec::Noise {
            buffer: Arc::new(brown_noise(sr, 2.0, rng)),
            looped: true,
        },
        filter: Some(FilterSpec::band_pass(400.0, 1.2)),
        gain: vec![
            AutoPoint::step(now, GAIN_FLOOR),
            AutoPoint::linear(now + fade, 0.3),
        ],
        start_frame: now,
        stop_frame: u64::MAX - margin_frames(sr),
        bus: VoiceBus::Effects,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    #[test]
    fn ghost_wail_glides_downward() {
        let mut rng = Rng::new(31);
        let voices = ghost_wail(0, SR, &mut rng);
        assert_eq!(voices.len(), 2);
        for v in &voices {
            let SourceSpec::Osc { freq, .. } = &v.source else {
                panic!("wail layers are oscillators");
            };
            assert!(freq.first().map(|p| p.value) > freq.last().map(|p| p.value));
        }
    }

    #[test]
    fn harbor_beds_loop_and_carry_ids() {
        let mut rng = Rng::new(32);
        let beds = harbor_beds(1_000, SR, 7, 8, &mut rng);
        assert_eq!(beds.len(), 2);
        assert_eq!(beds[0].id, Some(7));
        assert_eq!(beds[1].id, Some(8));
        for bed in &beds {
            let SourceSpec::Noise { looped, .. } = &bed.source else {
                panic!("beds are noise sources");
            };
            assert!(looped);
            // Fade-in starts at the floor, never at zero.
            assert!(bed.gain[0].value > 0.0);
        }
        // Lapping water sits above the murmur.
        let top = |v: &VoiceSpec| v.gain.last().map(|p| p.value).unwrap_or(0.0);
        assert!(top(&beds[0]) > top(&beds[1]));
    }

    #[test]
    fn whirlpool_is_a_single_tagged_loop() {
        let mut rng = Rng::new(33);
        let voices = whirlpool_swirl(0, SR, 42, &mut rng);
        assert_eq!(voices.len(), 1);
        assert_eq!(voices[0].id, Some(42));
    }
}
