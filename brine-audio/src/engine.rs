//! Engine facade
//!
//! `AudioEngine` is the surface the game calls: one-shot effects,
//! continuous parameter setters, mode selectors, volume and mute, all
//! safe to call at any time. `init()` is tried once; if the backend
//! cannot start, the engine stays permanently disabled and every call
//! becomes a no-op rather than an error the game has to handle.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use crate::ambient::AmbientParam;
use crate::backend::{Backend, ControlLink};
use crate::mixing::{MixState, SPEED_RAMP_SECS, WEATHER_RAMP_SECS};
use crate::noise::Rng;
use crate::render::{
    Bus, RenderCommand, DEFAULT_EFFECTS_VOLUME, DEFAULT_MASTER_VOLUME, DEFAULT_MUSIC_VOLUME,
};
use crate::sequencer::{bar_voices, EventKind, Mode, ModeFlags};
use crate::sfx::{combat, reward, world};
use crate::timer::TimerTask;
use crate::voice::VoiceSpec;

/// Volume ramp length for volume/mute changes.
const VOLUME_RAMP_SECS: f32 = 0.05;
/// Fade used when stopping looping effects and harbor beds.
const LOOP_RELEASE_SECS: f32 = 0.4;
const HARBOR_FADE_SECS: f32 = 0.8;

enum BackendSlot {
    Uninit,
    Running(Backend),
    /// Backend start failed once; the engine stays silent for good.
    Failed,
    Disposed,
}

#[derive(Default)]
struct SequencerState {
    flags: ModeFlags,
    bar: usize,
    /// Bumped on every mode change and on teardown; a timer callback
    /// carrying a stale generation aborts instead of scheduling.
    generation: u64,
    running: bool,
    pending: Option<TimerTask>,
}

#[derive(Default)]
struct HarborState {
    active: bool,
    generation: u64,
    water_id: Option<u64>,
    murmur_id: Option<u64>,
    chirp: Option<TimerTask>,
}

/// Control-side volume model. The master bus carries mute; music and
/// effects volumes are orthogonal to it.
struct VolumeState {
    master: f32,
    music: f32,
    effects: f32,
    muted: bool,
    pre_mute: f32,
}

impl VolumeState {
    fn new() -> Self {
        Self {
            master: DEFAULT_MASTER_VOLUME,
            music: DEFAULT_MUSIC_VOLUME,
            effects: DEFAULT_EFFECTS_VOLUME,
            muted: false,
            pre_mute: DEFAULT_MASTER_VOLUME,
        }
    }

    /// Returns the master-bus target to ramp to.
    fn set_master(&mut self, v: f32) -> f32 {
        let v = v.clamp(0.0, 1.0);
        if self.muted {
            // Remember the request; it takes effect on unmute.
            self.pre_mute = v;
            0.0
        } else {
            self.master = v;
            self.pre_mute = v;
            v
        }
    }

    fn master(&self) -> f32 {
        if self.muted {
            self.pre_mute
        } else {
            self.master
        }
    }

    /// Flip mute, returning the new master-bus target. Unmute restores
    /// the exact pre-mute volume.
    fn toggle_mute(&mut self) -> f32 {
        if self.muted {
            self.muted = false;
            self.master = self.pre_mute;
            self.master
        } else {
            self.muted = true;
            self.pre_mute = self.master;
            self.master = 0.0;
            0.0
        }
    }
}

struct EngineShared {
    link: Mutex<Option<ControlLink>>,
    sequencer: Mutex<SequencerState>,
    harbor: Mutex<HarborState>,
    mix: Mutex<MixState>,
    volume: Mutex<VolumeState>,
    rng: Mutex<Rng>,
    next_voice_id: AtomicU64,
}

impl EngineShared {
    fn link(&self) -> Option<ControlLink> {
        self.link.lock().clone()
    }
}

pub struct AudioEngine {
    shared: Arc<EngineShared>,
    backend: Mutex<BackendSlot>,
}

impl AudioEngine {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(EngineShared {
                link: Mutex::new(None),
                sequencer: Mutex::new(SequencerState::default()),
                harbor: Mutex::new(HarborState::default()),
                mix: Mutex::new(MixState::new()),
                volume: Mutex::new(VolumeState::new()),
                rng: Mutex::new(Rng::from_entropy()),
                next_voice_id: AtomicU64::new(1),
            }),
            backend: Mutex::new(BackendSlot::Uninit),
        }
    }

    /// Start the audio backend and the score. Idempotent: repeat calls,
    /// calls after a failed start, and calls after `dispose` all no-op.
    /// Backend failure is logged and swallowed; the engine then runs
    /// disabled forever.
    pub fn init(&self) {
        let mut slot = self.backend.lock();
        if !matches!(*slot, BackendSlot::Uninit) {
            return;
        }
        match Backend::start() {
            Ok(backend) => {
                *self.shared.link.lock() = Some(backend.link());
                *slot = BackendSlot::Running(backend);
                drop(slot);
                let generation = {
                    let mut seq = self.shared.sequencer.lock();
                    seq.running = true;
                    seq.generation += 1;
                    seq.bar = 0;
                    seq.generation
                };
                schedule_bar(&self.shared, generation);
            }
            Err(e) => {
                tracing::warn!(error = %e, "audio backend unavailable, engine disabled");
                *slot = BackendSlot::Failed;
            }
        }
    }

    /// Tear everything down: cancel timers, drop the command link, stop
    /// the audio thread. Every later call on the engine is a no-op.
    pub fn dispose(&self) {
        {
            let mut seq = self.shared.sequencer.lock();
            seq.running = false;
            seq.generation += 1;
            drop(seq.pending.take());
        }
        {
            let mut harbor = self.shared.harbor.lock();
            harbor.active = false;
            harbor.generation += 1;
            drop(harbor.chirp.take());
        }
        *self.shared.link.lock() = None;
        let slot = {
            let mut slot = self.backend.lock();
            std::mem::replace(&mut *slot, BackendSlot::Disposed)
        };
        if let BackendSlot::Running(backend) = slot {
            backend.stop();
            tracing::debug!("audio engine disposed");
        }
    }

    // ----- one-shot effects -----

    pub fn play_cannon_fire(&self) {
        self.play(|now, sr, rng| combat::cannon_fire(now, sr, rng));
    }

    pub fn play_cannon_impact(&self, distance: f32) {
        self.play(|now, sr, rng| combat::cannon_impact(now, sr, distance, rng));
    }

    pub fn play_explosion(&self, position: (f32, f32), listener_position: (f32, f32)) {
        self.play(|now, sr, rng| combat::explosion(now, sr, position, listener_position, rng));
    }

    pub fn play_alarm_bell(&self) {
        self.play(|now, sr, rng| combat::alarm_bell(now, sr, rng));
    }

    pub fn play_hull_crack(&self) {
        self.play(|now, sr, rng| combat::hull_crack(now, sr, rng));
    }

    pub fn play_splash(&self) {
        self.play(|now, sr, rng| world::splash(now, sr, rng));
    }

    pub fn play_ship_bell(&self) {
        self.play(|now, sr, rng| world::ship_bell(now, sr, rng));
    }

    pub fn play_signal_fire(&self) {
        self.play(|now, sr, rng| world::signal_fire(now, sr, rng));
    }

    pub fn play_ghost_wail(&self) {
        self.play(|now, sr, rng| world::ghost_wail(now, sr, rng));
    }

    pub fn play_sail_snap(&self) {
        self.play(|now, sr, rng| world::sail_snap(now, sr, rng));
    }

    pub fn play_ui_click(&self) {
        self.play(|now, sr, rng| world::ui_click(now, sr, rng));
    }

    pub fn play_coin_jingle(&self, combo_level: u32) {
        self.play(|now, sr, rng| reward::coin_jingle(now, sr, combo_level, rng));
    }

    pub fn play_combo_tone(&self, level: u32) {
        self.play(|now, sr, rng| reward::combo_tone(now, sr, level, rng));
    }

    pub fn play_neptune_charge(&self, level: u32) {
        self.play(|now, sr, rng| reward::neptune_charge(now, sr, level, rng));
    }

    pub fn play_quest_chime(&self) {
        self.play(|now, sr, rng| reward::quest_chime(now, sr, rng));
    }

    pub fn play_victory_fanfare(&self) {
        self.play(|now, sr, rng| reward::victory_fanfare(now, sr, rng));
    }

    /// Start the looping whirlpool swirl, returning a stop handle. On a
    /// disabled engine the handle is inert.
    pub fn play_whirlpool_swirl(&self) -> WhirlpoolHandle {
        let Some(link) = self.shared.link() else {
            return WhirlpoolHandle::inert();
        };
        let id = self.shared.next_voice_id.fetch_add(1, Ordering::Relaxed);
        let voices = {
            let mut rng = self.shared.rng.lock();
            world::whirlpool_swirl(link.now(), link.sample_rate(), id, &mut rng)
        };
        for spec in voices {
            link.send(RenderCommand::Spawn(spec));
        }
        WhirlpoolHandle {
            link: Some(link),
            id,
            stopped: AtomicBool::new(false),
        }
    }

    // ----- harbor ambience -----

    /// Start the harbor bed (lapping water, murmur, recurring gulls).
    /// Idempotent while already playing.
    pub fn play_port_ambience(&self) {
        let Some(link) = self.shared.link() else { return };
        let generation = {
            let mut harbor = self.shared.harbor.lock();
            if harbor.active {
                return;
            }
            harbor.active = true;
            harbor.generation += 1;
            let water = self.shared.next_voice_id.fetch_add(1, Ordering::Relaxed);
            let murmur = self.shared.next_voice_id.fetch_add(1, Ordering::Relaxed);
            harbor.water_id = Some(water);
            harbor.murmur_id = Some(murmur);
            let beds = {
                let mut rng = self.shared.rng.lock();
                world::harbor_beds(link.now(), link.sample_rate(), water, murmur, &mut rng)
            };
            for spec in beds {
                link.send(RenderCommand::Spawn(spec));
            }
            harbor.generation
        };
        arm_chirp(&self.shared, generation);
    }

    /// Fade the harbor bed out and cancel the gull timer. Safe when the
    /// bed is not playing.
    pub fn stop_port_ambience(&self) {
        let Some(link) = self.shared.link() else { return };
        let mut harbor = self.shared.harbor.lock();
        if !harbor.active {
            return;
        }
        harbor.active = false;
        harbor.generation += 1;
        harbor.chirp = None;
        let release_frames = link.frames(HARBOR_FADE_SECS);
        for id in [harbor.water_id.take(), harbor.murmur_id.take()]
            .into_iter()
            .flatten()
        {
            link.send(RenderCommand::Release { id, release_frames });
        }
    }

    // ----- music modes -----

    pub fn set_boss_mode(&self, active: bool) {
        self.update_modes(|flags| flags.boss = active);
    }

    pub fn set_port_mode(&self, active: bool) {
        self.update_modes(|flags| flags.port = active);
    }

    pub fn set_event_mode(&self, event: Option<EventKind>) {
        self.update_modes(|flags| flags.event = event);
    }

    /// The mode the sequencer is currently playing, after cascade
    /// resolution.
    pub fn music_mode(&self) -> Mode {
        self.shared.sequencer.lock().flags.resolve()
    }

    fn update_modes(&self, mutate: impl FnOnce(&mut ModeFlags)) {
        let generation = {
            let mut seq = self.shared.sequencer.lock();
            if !seq.running {
                // Remember the flags anyway so the state is right if the
                // game toggles modes before init.
                mutate(&mut seq.flags);
                return;
            }
            let before = seq.flags.resolve();
            mutate(&mut seq.flags);
            let after = seq.flags.resolve();
            if before == after {
                return;
            }
            tracing::debug!(mode = ?after, "music mode changed");
            seq.generation += 1;
            seq.bar = 0;
            // Dropping the slot cancels the pending bar timer.
            seq.pending = None;
            seq.generation
        };
        schedule_bar(&self.shared, generation);
    }

    // ----- mixing -----

    pub fn set_weather_intensity(&self, intensity: f32) {
        let Some(link) = self.shared.link() else { return };
        let (targets, wind_gain) = {
            let mut mix = self.shared.mix.lock();
            mix.set_weather_intensity(intensity);
            (mix.weather_targets(), mix.wind_gain())
        };
        let frames = link.frames(WEATHER_RAMP_SECS);
        for (param, target) in targets {
            link.send(RenderCommand::Ambient { param, target, frames });
        }
        link.send(RenderCommand::Ambient {
            param: AmbientParam::WindGain,
            target: wind_gain,
            frames,
        });
    }

    pub fn set_speed_factor(&self, factor: f32) {
        let Some(link) = self.shared.link() else { return };
        let (center, wind_gain) = {
            let mut mix = self.shared.mix.lock();
            mix.set_speed_factor(factor);
            (mix.wind_center(), mix.wind_gain())
        };
        let frames = link.frames(SPEED_RAMP_SECS);
        link.send(RenderCommand::Ambient {
            param: AmbientParam::WindCenter,
            target: center,
            frames,
        });
        link.send(RenderCommand::Ambient {
            param: AmbientParam::WindGain,
            target: wind_gain,
            frames,
        });
    }

    pub fn set_wind_intensity(&self, intensity: f32) {
        let Some(link) = self.shared.link() else { return };
        let wind_gain = {
            let mut mix = self.shared.mix.lock();
            mix.set_wind_intensity(intensity);
            mix.wind_gain()
        };
        link.send(RenderCommand::Ambient {
            param: AmbientParam::WindGain,
            target: wind_gain,
            frames: link.frames(WEATHER_RAMP_SECS),
        });
    }

    // ----- volume -----

    pub fn set_master_volume(&self, volume: f32) {
        let target = self.shared.volume.lock().set_master(volume);
        self.bus_ramp(Bus::Master, target);
    }

    /// Overall volume, identical to the master control.
    pub fn set_volume(&self, volume: f32) {
        self.set_master_volume(volume);
    }

    pub fn volume(&self) -> f32 {
        self.master_volume()
    }

    pub fn set_music_volume(&self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        self.shared.volume.lock().music = volume;
        self.bus_ramp(Bus::Music, volume);
    }

    pub fn set_sfx_volume(&self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        self.shared.volume.lock().effects = volume;
        self.bus_ramp(Bus::Effects, volume);
    }

    pub fn master_volume(&self) -> f32 {
        self.shared.volume.lock().master()
    }

    pub fn music_volume(&self) -> f32 {
        self.shared.volume.lock().music
    }

    pub fn sfx_volume(&self) -> f32 {
        self.shared.volume.lock().effects
    }

    pub fn toggle_mute(&self) {
        let target = self.shared.volume.lock().toggle_mute();
        self.bus_ramp(Bus::Master, target);
    }

    pub fn is_muted(&self) -> bool {
        self.shared.volume.lock().muted
    }

    // ----- plumbing -----

    fn play<F>(&self, recipe: F)
    where
        F: FnOnce(u64, f32, &mut Rng) -> Vec<VoiceSpec>,
    {
        let Some(link) = self.shared.link() else { return };
        let voices = {
            let mut rng = self.shared.rng.lock();
            recipe(link.now(), link.sample_rate(), &mut rng)
        };
        for spec in voices {
            link.send(RenderCommand::Spawn(spec));
        }
    }

    fn bus_ramp(&self, bus: Bus, target: f32) {
        let Some(link) = self.shared.link() else { return };
        link.send(RenderCommand::BusRamp {
            bus,
            target,
            frames: link.frames(VOLUME_RAMP_SECS),
        });
    }
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Stop handle for the looping whirlpool effect. Stopping twice, or
/// stopping a handle from a disabled engine, does nothing.
pub struct WhirlpoolHandle {
    link: Option<ControlLink>,
    id: u64,
    stopped: AtomicBool,
}

impl WhirlpoolHandle {
    fn inert() -> Self {
        Self {
            link: None,
            id: 0,
            stopped: AtomicBool::new(true),
        }
    }

    pub fn stop(&self) {
        let Some(link) = &self.link else { return };
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        link.send(RenderCommand::Release {
            id: self.id,
            release_frames: link.frames(LOOP_RELEASE_SECS),
        });
    }
}

/// Emit the current bar at the audio clock's position, then arm the
/// coarse timer that computes the next bar. The generation token closes
/// the race between a firing timer and a concurrent mode change.
fn schedule_bar(shared: &Arc<EngineShared>, generation: u64) {
    let Some(link) = shared.link() else { return };
    let (mode, bar) = {
        let seq = shared.sequencer.lock();
        if !seq.running || seq.generation != generation {
            return;
        }
        (seq.flags.resolve(), seq.bar)
    };
    let (voices, bar_len) = {
        let mut rng = shared.rng.lock();
        bar_voices(mode, bar, link.now(), link.sample_rate(), &mut rng)
    };
    for spec in voices {
        link.send(RenderCommand::Spawn(spec));
    }

    let weak = Arc::downgrade(shared);
    let timer = TimerTask::spawn(bar_len, move || {
        if let Some(shared) = weak.upgrade() {
            schedule_bar(&shared, generation);
        }
    });
    let mut seq = shared.sequencer.lock();
    if seq.running && seq.generation == generation {
        seq.bar = bar + 1;
        seq.pending = Some(timer);
    }
    // Otherwise the mode changed while we rendered; dropping the fresh
    // timer cancels it and the new generation owns the schedule.
}

/// Arm the next randomly delayed gull chirp; each firing re-arms until
/// the harbor generation moves on.
fn arm_chirp(shared: &Arc<EngineShared>, generation: u64) {
    let delay = {
        let mut rng = shared.rng.lock();
        Duration::from_secs_f32(rng.range(2.0, 5.0))
    };
    let weak: Weak<EngineShared> = Arc::downgrade(shared);
    let timer = TimerTask::spawn(delay, move || {
        let Some(shared) = weak.upgrade() else { return };
        {
            let harbor = shared.harbor.lock();
            if !harbor.active || harbor.generation != generation {
                return;
            }
        }
        if let Some(link) = shared.link() {
            let voices = {
                let mut rng = shared.rng.lock();
                world::gull_chirp(link.now(), link.sample_rate(), &mut rng)
            };
            for spec in voices {
                link.send(RenderCommand::Spawn(spec));
            }
        }
        arm_chirp(&shared, generation);
    });
    let mut harbor = shared.harbor.lock();
    if harbor.active && harbor.generation == generation {
        harbor.chirp = Some(timer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::Receiver;

    const SR: f32 = 48_000.0;

    /// Engine wired to a captured command channel instead of a device.
    fn test_engine() -> (AudioEngine, Receiver<RenderCommand>) {
        let engine = AudioEngine::new();
        let (link, rx) = ControlLink::test_pair(SR);
        *engine.shared.link.lock() = Some(link);
        engine.shared.sequencer.lock().running = true;
        (engine, rx)
    }

    fn drain(rx: &Receiver<RenderCommand>) -> Vec<RenderCommand> {
        let mut out = Vec::new();
        while let Ok(cmd) = rx.try_recv() {
            out.push(cmd);
        }
        out
    }

    fn spawn_count(cmds: &[RenderCommand]) -> usize {
        cmds.iter()
            .filter(|c| matches!(c, RenderCommand::Spawn(_)))
            .count()
    }

    #[test]
    fn disabled_engine_ignores_everything() {
        let engine = AudioEngine::new();
        engine.play_cannon_fire();
        engine.play_explosion((10.0, 0.0), (0.0, 0.0));
        engine.play_coin_jingle(7);
        engine.set_weather_intensity(0.8);
        engine.set_boss_mode(true);
        engine.play_port_ambience();
        engine.stop_port_ambience();
        engine.toggle_mute();
        let handle = engine.play_whirlpool_swirl();
        handle.stop();
        handle.stop();
        engine.dispose();
        engine.dispose();
    }

    #[test]
    fn dispose_cancels_timers_and_silences_the_engine() {
        let (engine, rx) = test_engine();
        engine.set_boss_mode(true);
        engine.play_port_ambience();
        drain(&rx);
        assert!(engine.shared.sequencer.lock().pending.is_some());
        assert!(engine.shared.harbor.lock().chirp.is_some());

        engine.dispose();
        assert!(engine.shared.sequencer.lock().pending.is_none());
        assert!(engine.shared.harbor.lock().chirp.is_none());
        assert!(engine.shared.link().is_none());

        // Nothing reaches the renderer once torn down.
        engine.play_cannon_fire();
        engine.set_weather_intensity(1.0);
        engine.set_port_mode(true);
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn init_after_dispose_stays_disabled() {
        let engine = AudioEngine::new();
        engine.dispose();
        engine.init();
        assert!(engine.shared.link().is_none());
    }

    #[test]
    fn one_shot_sends_spawns() {
        let (engine, rx) = test_engine();
        engine.play_cannon_fire();
        assert_eq!(spawn_count(&drain(&rx)), 2);
        engine.play_coin_jingle(10);
        assert_eq!(spawn_count(&drain(&rx)), 8);
    }

    #[test]
    fn mode_change_emits_a_bar_and_noop_when_masked() {
        let (engine, rx) = test_engine();
        engine.set_boss_mode(true);
        let cmds = drain(&rx);
        // Boss bank bar 0 has no rests.
        assert_eq!(spawn_count(&cmds), 8);

        // Port raised under boss: resolved mode unchanged, nothing sent,
        // generation untouched.
        let generation = engine.shared.sequencer.lock().generation;
        engine.set_port_mode(true);
        assert!(drain(&rx).is_empty());
        assert_eq!(engine.shared.sequencer.lock().generation, generation);

        // Boss released: port becomes audible from bar 0.
        engine.set_boss_mode(false);
        assert!(spawn_count(&drain(&rx)) > 0);
        assert_eq!(engine.shared.sequencer.lock().bar, 1);
    }

    #[test]
    fn event_mode_overrides_boss() {
        let (engine, rx) = test_engine();
        engine.set_boss_mode(true);
        drain(&rx);
        engine.set_event_mode(Some(EventKind::GhostFleet));
        assert_eq!(engine.music_mode(), Mode::Event(EventKind::GhostFleet));
        // Ghost bar 0 has four notes between the rests.
        assert_eq!(spawn_count(&drain(&rx)), 4);
        engine.set_boss_mode(false);
        // Still in the event: boss flag change is masked.
        assert!(drain(&rx).is_empty());
        assert_eq!(engine.music_mode(), Mode::Event(EventKind::GhostFleet));
    }

    #[test]
    fn harbor_is_idempotent_and_stops_cleanly() {
        let (engine, rx) = test_engine();
        engine.play_port_ambience();
        assert_eq!(spawn_count(&drain(&rx)), 2);
        engine.play_port_ambience();
        assert!(drain(&rx).is_empty());

        engine.stop_port_ambience();
        let cmds = drain(&rx);
        let releases = cmds
            .iter()
            .filter(|c| matches!(c, RenderCommand::Release { .. }))
            .count();
        assert_eq!(releases, 2);

        engine.stop_port_ambience();
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn whirlpool_stop_sends_exactly_one_release() {
        let (engine, rx) = test_engine();
        let handle = engine.play_whirlpool_swirl();
        assert_eq!(spawn_count(&drain(&rx)), 1);
        handle.stop();
        handle.stop();
        handle.stop();
        let releases = drain(&rx)
            .iter()
            .filter(|c| matches!(c, RenderCommand::Release { .. }))
            .count();
        assert_eq!(releases, 1);
    }

    #[test]
    fn weather_setter_ramps_all_ambient_targets() {
        let (engine, rx) = test_engine();
        engine.set_weather_intensity(0.6);
        let cmds = drain(&rx);
        // Six weather-driven params plus the recomputed wind gain.
        assert_eq!(cmds.len(), 7);
        for cmd in &cmds {
            let RenderCommand::Ambient { frames, .. } = cmd else {
                panic!("weather must only ramp ambient params");
            };
            assert_eq!(*frames, (SR * WEATHER_RAMP_SECS) as u64);
        }
    }

    #[test]
    fn speed_setter_moves_center_and_recomputes_gain() {
        let (engine, rx) = test_engine();
        engine.set_weather_intensity(0.5);
        drain(&rx);
        engine.set_speed_factor(1.0);
        let cmds = drain(&rx);
        assert_eq!(cmds.len(), 2);
        let gain = cmds.iter().find_map(|c| match c {
            RenderCommand::Ambient {
                param: AmbientParam::WindGain,
                target,
                ..
            } => Some(*target),
            _ => None,
        });
        assert_eq!(gain, Some(0.05 + 0.15 + 0.1));
    }

    #[test]
    fn mute_round_trip_restores_exact_volume() {
        let (engine, rx) = test_engine();
        engine.set_master_volume(0.37);
        assert_eq!(engine.master_volume(), 0.37);
        engine.toggle_mute();
        assert!(engine.is_muted());
        // Logical volume survives the mute.
        assert_eq!(engine.master_volume(), 0.37);
        engine.toggle_mute();
        assert!(!engine.is_muted());
        assert_eq!(engine.master_volume(), 0.37);

        let targets: Vec<f32> = drain(&rx)
            .iter()
            .filter_map(|c| match c {
                RenderCommand::BusRamp {
                    bus: Bus::Master,
                    target,
                    ..
                } => Some(*target),
                _ => None,
            })
            .collect();
        assert_eq!(targets, vec![0.37, 0.0, 0.37]);
    }

    #[test]
    fn volume_set_while_muted_applies_on_unmute() {
        let (engine, rx) = test_engine();
        engine.toggle_mute();
        engine.set_master_volume(0.6);
        drain(&rx);
        engine.toggle_mute();
        let last = drain(&rx).into_iter().rev().find_map(|c| match c {
            RenderCommand::BusRamp {
                bus: Bus::Master,
                target,
                ..
            } => Some(target),
            _ => None,
        });
        assert_eq!(last, Some(0.6));
        assert_eq!(engine.master_volume(), 0.6);
    }

    #[test]
    fn music_and_sfx_volumes_are_clamped_and_independent() {
        let (engine, rx) = test_engine();
        engine.set_music_volume(4.0);
        engine.set_sfx_volume(-2.0);
        assert_eq!(engine.music_volume(), 1.0);
        assert_eq!(engine.sfx_volume(), 0.0);
        engine.toggle_mute();
        // Mute touches the master bus only.
        assert_eq!(engine.music_volume(), 1.0);
        drain(&rx);
    }
}
