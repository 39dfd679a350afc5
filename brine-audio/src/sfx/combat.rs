//! Combat effects: cannon fire, impacts, explosions, alarms, hull damage.

use crate::filter::FilterSpec;
use crate::noise::Rng;
use crate::osc::Waveform;
use crate::voice::{VoiceBus, VoiceSpec};

use super::{distance_volume, noise_voice, pitch_jitter, simple_tone, NoiseColor};

/// Muzzle blast: a deep filtered boom with a short bright crack on top.
pub(crate) fn cannon_fire(now: u64, sr: f32, rng: &mut Rng) -> Vec<VoiceSpec> {
    let j = pitch_jitter(rng);
    vec![
        noise_voice(
            now,
            sr,
            NoiseColor::Brown,
            0.9,
            0.0,
            0.35,
            Some(FilterSpec::low_pass(400.0 * j, 0.7)),
            rng,
        ),
        noise_voice(
            now,
            sr,
            NoiseColor::White,
            0.5,
            0.0,
            0.07,
            Some(FilterSpec::high_pass(2_000.0 * j, 0.7)),
            rng,
        ),
    ]
}

/// Shot landing at a known range: thud plus debris spray, both scaled
/// by distance attenuation.
pub(crate) fn cannon_impact(now: u64, sr: f32, distance: f32, rng: &mut Rng) -> Vec<VoiceSpec> {
    let vol = distance_volume(distance);
    let j = pitch_jitter(rng);
    vec![
        noise_voice(
            now,
            sr,
            NoiseColor::Brown,
            0.8 * vol,
            0.0,
            0.25,
            Some(FilterSpec::low_pass(300.0 * j, 0.7)),
            rng,
        ),
        noise_voice(
            now,
            sr,
            NoiseColor::White,
            0.3 * vol,
            0.01,
            0.15,
            Some(FilterSpec::band_pass(1_200.0 * j, 1.0)),
            rng,
        ),
    ]
}

/// Full explosion at a world position, heard from the listener's
/// position. Three layers: deep blast, mid-band body, high sizzle.
pub(crate) fn explosion(
    now: u64,
    sr: f32,
    position: (f32, f32),
    listener: (f32, f32),
    rng: &mut Rng,
) -> Vec<VoiceSpec> {
    let dx = position.0 - listener.0;
    let dy = position.1 - listener.1;
    let vol = distance_volume((dx * dx + dy * dy).sqrt());
    let j = pitch_jitter(rng);
    vec![
        noise_voice(
            now,
            sr,
            NoiseColor::Brown,
            vol,
            0.0,
            0.7,
            Some(FilterSpec::low_pass(150.0 * j, 0.7)),
            rng,
        ),
        noise_voice(
            now,
            sr,
            NoiseColor::Brown,
            0.4 * vol,
            0.0,
            0.3,
            Some(FilterSpec::band_pass(600.0 * j, 0.8)),
            rng,
        ),
        noise_voice(
            now,
            sr,
            NoiseColor::White,
            0.2 * vol,
            0.02,
            0.45,
            Some(FilterSpec::high_pass(3_000.0, 0.7)),
            rng,
        ),
    ]
}

/// Urgent ship's alarm: three double-strikes of a harsh square pair.
pub(crate) fn alarm_bell(now: u64, sr: f32, rng: &mut Rng) -> Vec<VoiceSpec> {
    let j = rng.range(0.97, 1.03);
    let repeat = (sr * 0.18) as u64;
    let mut voices = Vec::with_capacity(6);
    for i in 0..3u64 {
        let start = now + i * repeat;
        voices.push(simple_tone(
            start,
            sr,
            Waveform::Square,
            880.0 * j,
            0.22,
            0.0,
            0.1,
            VoiceBus::Effects,
        ));
        voices.push(simple_tone(
            start,
            sr,
            Waveform::Square,
            1_320.0 * j,
            0.1,
            0.0,
            0.08,
            VoiceBus::Effects,
        ));
    }
    voices
}

/// Timbers giving way: a resonant mid crack over a low body thump.
pub(crate) fn hull_crack(now: u64, sr: f32, rng: &mut Rng) -> Vec<VoiceSpec> {
    let j = pitch_jitter(rng);
    vec![
        noise_voice(
            now,
            sr,
            NoiseColor::White,
            0.6,
            0.0,
            0.12,
            Some(FilterSpec::band_pass(900.0 * j, 2.0)),
            rng,
        ),
        simple_tone(now, sr, Waveform::Sine, 80.0 * j, 0.5, 0.0, 0.2, VoiceBus::Effects),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    #[test]
    fn cannon_fire_layers_start_together() {
        let mut rng = Rng::new(21);
        let voices = cannon_fire(9_999, SR, &mut rng);
        assert_eq!(voices.len(), 2);
        for v in &voices {
            assert_eq!(v.start_frame, 9_999);
            assert!(v.stop_frame > v.envelope_end());
            assert_eq!(v.bus, VoiceBus::Effects);
        }
    }

    #[test]
    fn explosion_attenuates_with_range() {
        let mut rng = Rng::new(22);
        let near = explosion(0, SR, (0.0, 0.0), (0.0, 0.0), &mut rng);
        let far = explosion(0, SR, (5_000.0, 0.0), (0.0, 0.0), &mut rng);
        let peak = |vs: &[VoiceSpec]| {
            vs.iter()
                .flat_map(|v| v.gain.iter())
                .fold(0.0f32, |m, p| m.max(p.value))
        };
        assert!(peak(&near) > peak(&far) * 3.0);
    }

    #[test]
    fn alarm_repeats_strictly_in_order() {
        let mut rng = Rng::new(23);
        let voices = alarm_bell(0, SR, &mut rng);
        assert_eq!(voices.len(), 6);
        let mut starts: Vec<u64> = voices.iter().map(|v| v.start_frame).collect();
        starts.dedup();
        assert_eq!(starts.len(), 3);
        assert!(starts.windows(2).all(|w| w[0] < w[1]));
    }
}
