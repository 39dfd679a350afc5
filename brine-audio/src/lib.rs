//! Procedural audio engine for Brine - ambience, effects, and score
//!
//! Everything the game hears is synthesized at runtime:
//! - Ambient bed: ocean swell, wind, and storm layers driven by weather
//! - One-shot effects: cannon fire, splashes, jingles, fanfares
//! - Sequencer: a mode-aware looping score (normal/port/boss/events)
//! - Mixing: weather and speed mapped onto the ambient layers
//!
//! The public surface is the [`AudioEngine`] facade. It is safe to call
//! before, during, and after a failed or absent `init()`; a missing
//! audio backend disables the engine instead of erroring.

mod ambient;
mod backend;
mod engine;
mod filter;
mod mixing;
mod noise;
mod osc;
mod param;
mod render;
mod sequencer;
mod sfx;
mod timer;
mod voice;

pub use backend::BackendError;
pub use engine::{AudioEngine, WhirlpoolHandle};
pub use sequencer::{EventKind, Mode};
