//! Dynamic mixing controller
//!
//! Pure mapping from game state (weather intensity, ship speed, direct
//! wind override) to ambient-layer ramp targets. Setters store clamped
//! scalars; target computation is always a fresh function of the stored
//! state, so repeated calls recompute rather than compound.

use crate::ambient::AmbientParam;

/// Ramp lengths for the two controller inputs.
pub(crate) const WEATHER_RAMP_SECS: f32 = 0.5;
pub(crate) const SPEED_RAMP_SECS: f32 = 0.3;

#[derive(Debug, Clone, Copy)]
pub(crate) struct MixState {
    weather: f32,
    speed: f32,
    /// Direct wind-gain base override; cleared by the next weather set.
    wind_override: Option<f32>,
}

impl MixState {
    pub(crate) fn new() -> Self {
        Self {
            weather: 0.0,
            speed: 0.0,
            wind_override: None,
        }
    }

    pub(crate) fn set_weather_intensity(&mut self, x: f32) {
        self.weather = x.clamp(0.0, 1.0);
        self.wind_override = None;
    }

    pub(crate) fn set_speed_factor(&mut self, x: f32) {
        self.speed = x.clamp(0.0, 1.0);
    }

    pub(crate) fn set_wind_intensity(&mut self, x: f32) {
        self.wind_override = Some(x.clamp(0.0, 1.0));
    }

    /// Wind base gain from weather (or its override), plus a speed
    /// boost. Recomputed from stored state on every call.
    pub(crate) fn wind_gain(&self) -> f32 {
        let base = self.wind_override.unwrap_or(self.weather);
        0.05 + 0.3 * base + 0.1 * self.speed
    }

    pub(crate) fn wind_center(&self) -> f32 {
        1_200.0 + 1_400.0 * self.speed
    }

    /// Ambient targets driven by the weather scalar. Wind gain is not in
    /// this list because it also folds in speed; see [`Self::wind_gain`].
    pub(crate) fn weather_targets(&self) -> [(AmbientParam, f32); 6] {
        let x = self.weather;
        [
            (AmbientParam::WindQ, (0.8 - 0.4 * x).max(0.2)),
            (AmbientParam::OceanGain, 0.12 + 0.2 * x),
            (AmbientParam::SwellDepth, 0.04 + 0.12 * x),
            (AmbientParam::SwellRate, 0.1 + 0.15 * x),
            (AmbientParam::StormGain, ((x - 0.3) / 0.7).max(0.0) * 0.12),
            (AmbientParam::StormPitch, 45.0 - 15.0 * x),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn target(state: &MixState, param: AmbientParam) -> f32 {
        state
            .weather_targets()
            .iter()
            .find(|(p, _)| *p == param)
            .map(|(_, v)| *v)
            .unwrap_or_else(|| panic!("missing target for {param:?}"))
    }

    #[test]
    fn calm_weather_baseline() {
        let mut m = MixState::new();
        m.set_weather_intensity(0.0);
        assert_relative_eq!(m.wind_gain(), 0.05);
        assert_relative_eq!(target(&m, AmbientParam::OceanGain), 0.12);
        assert_relative_eq!(target(&m, AmbientParam::StormGain), 0.0);
        assert_relative_eq!(target(&m, AmbientParam::StormPitch), 45.0);
        assert_relative_eq!(target(&m, AmbientParam::WindQ), 0.8);
    }

    #[test]
    fn full_storm_targets() {
        let mut m = MixState::new();
        m.set_weather_intensity(1.0);
        assert_relative_eq!(m.wind_gain(), 0.35);
        assert_relative_eq!(target(&m, AmbientParam::OceanGain), 0.32);
        assert_relative_eq!(target(&m, AmbientParam::SwellDepth), 0.16);
        assert_relative_eq!(target(&m, AmbientParam::SwellRate), 0.25);
        assert_relative_eq!(target(&m, AmbientParam::StormGain), 0.12);
        assert_relative_eq!(target(&m, AmbientParam::StormPitch), 30.0);
        assert_relative_eq!(target(&m, AmbientParam::WindQ), 0.4);
    }

    #[test]
    fn storm_gain_has_a_threshold() {
        let mut m = MixState::new();
        m.set_weather_intensity(0.3);
        assert_relative_eq!(target(&m, AmbientParam::StormGain), 0.0);
        m.set_weather_intensity(0.65);
        assert_relative_eq!(target(&m, AmbientParam::StormGain), 0.06, max_relative = 1e-4);
    }

    #[test]
    fn speed_boost_recomputes_instead_of_compounding() {
        let mut m = MixState::new();
        m.set_weather_intensity(0.5);
        m.set_speed_factor(1.0);
        let once = m.wind_gain();
        m.set_speed_factor(1.0);
        m.set_speed_factor(1.0);
        assert_relative_eq!(m.wind_gain(), once);
        assert_relative_eq!(once, 0.05 + 0.15 + 0.1);
        assert_relative_eq!(m.wind_center(), 2_600.0);
    }

    #[test]
    fn wind_override_wins_until_the_next_weather_change() {
        let mut m = MixState::new();
        m.set_weather_intensity(0.2);
        m.set_wind_intensity(1.0);
        assert_relative_eq!(m.wind_gain(), 0.35);
        m.set_weather_intensity(0.2);
        assert_relative_eq!(m.wind_gain(), 0.11);
    }

    #[test]
    fn inputs_are_clamped() {
        let mut m = MixState::new();
        m.set_weather_intensity(7.0);
        m.set_speed_factor(-3.0);
        assert_relative_eq!(m.wind_gain(), 0.35);
        m.set_weather_intensity(-1.0);
        assert_relative_eq!(m.wind_gain(), 0.05);
    }
}
