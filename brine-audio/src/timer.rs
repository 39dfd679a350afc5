//! Cancellable one-shot timers
//!
//! Coarse scheduling (bar advances, harbor chirp re-arms) runs on short
//! lived threads parked in `recv_timeout`. Cancelling is a send on the
//! channel; dropping the handle cancels too, so replacing a stored timer
//! with a new one implicitly disarms the old.

use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};

/// Handle to a pending one-shot callback.
pub struct TimerTask {
    cancel_tx: Sender<()>,
}

impl TimerTask {
    /// Run `f` after `delay` unless cancelled first.
    pub fn spawn<F>(delay: Duration, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = bounded::<()>(1);
        thread::spawn(move || {
            // Only a timeout means "fire". A message or a disconnect
            // both mean the timer was cancelled.
            if let Err(RecvTimeoutError::Timeout) = cancel_rx.recv_timeout(delay) {
                f();
            }
        });
        Self { cancel_tx }
    }

    pub fn cancel(&self) {
        let _ = self.cancel_tx.try_send(());
    }
}

impl Drop for TimerTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
