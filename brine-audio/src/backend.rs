//! cpal backend
//!
//! `Backend::start` spins up a dedicated audio thread that owns the cpal
//! stream (cpal streams are not `Send`, so the thread that builds one
//! keeps it). The stream callback renders from a shared `Renderer` via
//! `try_lock`, emitting silence if the command loop holds the lock; the
//! command loop drains `RenderCommand`s into the renderer until told to
//! shut down. Startup success or failure comes back over a one-shot
//! handshake channel.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use thiserror::Error;

use crate::render::{RenderCommand, Renderer};

const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);
const COMMAND_POLL: Duration = Duration::from_millis(2);

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no default output device")]
    NoDevice,
    #[error("unsupported output config: {0}")]
    Config(String),
    #[error("failed to build output stream: {0}")]
    Stream(String),
    #[error("failed to start output stream: {0}")]
    Play(String),
    #[error("audio thread did not report readiness in time")]
    StartupTimeout,
}

/// Read side of the audio clock: frames rendered so far, plus the
/// stream's sample rate for time conversions.
#[derive(Clone)]
pub(crate) struct AudioClock {
    frames: Arc<AtomicU64>,
    sample_rate: f32,
}

impl AudioClock {
    pub(crate) fn now_frame(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    pub(crate) fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Convert a duration in seconds to a frame count, at least one.
    pub(crate) fn frames(&self, secs: f32) -> u64 {
        ((self.sample_rate * secs.max(0.0)).round() as u64).max(1)
    }
}

/// Control-side handle: clock access plus the command channel into the
/// renderer. Cheap to clone; loses its effect once the backend stops.
#[derive(Clone)]
pub(crate) struct ControlLink {
    tx: Sender<RenderCommand>,
    clock: AudioClock,
}

impl ControlLink {
    pub(crate) fn now(&self) -> u64 {
        self.clock.now_frame()
    }

    pub(crate) fn sample_rate(&self) -> f32 {
        self.clock.sample_rate()
    }

    pub(crate) fn frames(&self, secs: f32) -> u64 {
        self.clock.frames(secs)
    }

    /// Send a command to the renderer. A dead receiver means the backend
    /// is shutting down; the command is then moot.
    pub(crate) fn send(&self, cmd: RenderCommand) {
        let _ = self.tx.send(cmd);
    }

    #[cfg(test)]
    pub(crate) fn test_pair(sample_rate: f32) -> (Self, Receiver<RenderCommand>) {
        let (tx, rx) = unbounded();
        let link = Self {
            tx,
            clock: AudioClock {
                frames: Arc::new(AtomicU64::new(0)),
                sample_rate,
            },
        };
        (link, rx)
    }
}

pub(crate) struct Backend {
    link: ControlLink,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Backend {
    /// Open the default output device and start rendering. Blocks until
    /// the audio thread reports success or failure.
    pub(crate) fn start() -> Result<Backend, BackendError> {
        let (cmd_tx, cmd_rx) = unbounded();
        let (ready_tx, ready_rx) = bounded(1);
        let frames = Arc::new(AtomicU64::new(0));
        let shutdown = Arc::new(AtomicBool::new(false));

        let thread = {
            let frames = frames.clone();
            let shutdown = shutdown.clone();
            thread::Builder::new()
                .name("brine-audio".into())
                .spawn(move || audio_thread(cmd_rx, frames, shutdown, ready_tx))
                .map_err(|e| BackendError::Stream(e.to_string()))?
        };

        let sample_rate = match ready_rx.recv_timeout(STARTUP_TIMEOUT) {
            Ok(Ok(rate)) => rate,
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                shutdown.store(true, Ordering::Release);
                return Err(BackendError::StartupTimeout);
            }
        };

        tracing::debug!(sample_rate, "audio backend running");
        Ok(Backend {
            link: ControlLink {
                tx: cmd_tx,
                clock: AudioClock { frames, sample_rate },
            },
            shutdown,
            thread: Some(thread),
        })
    }

    pub(crate) fn link(&self) -> ControlLink {
        self.link.clone()
    }

    /// Stop the stream and join the audio thread.
    pub(crate) fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Backend {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

fn audio_thread(
    commands: Receiver<RenderCommand>,
    frames: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
    ready: Sender<Result<f32, BackendError>>,
) {
    let (stream, renderer, sample_rate) = match open_stream(frames) {
        Ok(parts) => parts,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    if let Err(e) = stream.play() {
        let _ = ready.send(Err(BackendError::Play(e.to_string())));
        return;
    }
    let _ = ready.send(Ok(sample_rate));

    while !shutdown.load(Ordering::Acquire) {
        match commands.recv_timeout(COMMAND_POLL) {
            Ok(cmd) => {
                let mut r = renderer.lock();
                r.apply(cmd);
                // Batch whatever else is already queued under one lock.
                while let Ok(cmd) = commands.try_recv() {
                    r.apply(cmd);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    drop(stream);
}

type StreamParts = (cpal::Stream, Arc<Mutex<Renderer>>, f32);

fn open_stream(frames: Arc<AtomicU64>) -> Result<StreamParts, BackendError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(BackendError::NoDevice)?;
    let config = device
        .default_output_config()
        .map_err(|e| BackendError::Config(e.to_string()))?;
    if config.sample_format() != SampleFormat::F32 {
        return Err(BackendError::Config(format!(
            "expected f32 output, device offers {:?}",
            config.sample_format()
        )));
    }

    let channels = config.channels() as usize;
    let sample_rate = config.sample_rate().0 as f32;
    let renderer = Arc::new(Mutex::new(Renderer::new(sample_rate, frames)));

    let callback_renderer = renderer.clone();
    let stream = device
        .build_output_stream(
            &config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                // Never block the real-time callback; a held lock means
                // one quiet buffer, not a glitching stall.
                match callback_renderer.try_lock() {
                    Some(mut r) => r.render(data, channels),
                    None => data.fill(0.0),
                }
            },
            |err| tracing::warn!(%err, "output stream error"),
            None,
        )
        .map_err(|e| BackendError::Stream(e.to_string()))?;

    Ok((stream, renderer, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_converts_seconds_to_frames() {
        let clock = AudioClock {
            frames: Arc::new(AtomicU64::new(0)),
            sample_rate: 48_000.0,
        };
        assert_eq!(clock.frames(0.05), 2_400);
        assert_eq!(clock.frames(1.0), 48_000);
        // Never zero, so ramps always move.
        assert_eq!(clock.frames(0.0), 1);
        assert_eq!(clock.frames(-1.0), 1);
    }

    #[test]
    fn link_sends_survive_a_dropped_receiver() {
        let (link, rx) = ControlLink::test_pair(48_000.0);
        drop(rx);
        // Must not panic once the audio side is gone.
        link.send(RenderCommand::BusRamp {
            bus: crate::render::Bus::Master,
            target: 0.5,
            frames: 100,
        });
    }
}
