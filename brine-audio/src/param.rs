//! Frame-scheduled ramp parameters
//!
//! Every long-lived mutable parameter in the render graph (bus gains,
//! ambient layer gains, filter centers) is a `Ramp`: writes schedule a
//! linear glide to a target over a number of frames instead of jumping,
//! so concurrent setters compose as a sequence of ramp targets and never
//! click.

/// A scalar parameter that moves linearly toward a target over a
/// scheduled frame interval.
#[derive(Debug, Clone, Copy)]
pub struct Ramp {
    from: f32,
    to: f32,
    start_frame: u64,
    end_frame: u64,
}

impl Ramp {
    /// Create a ramp holding a constant value.
    pub fn new(value: f32) -> Self {
        Self {
            from: value,
            to: value,
            start_frame: 0,
            end_frame: 0,
        }
    }

    /// Schedule a glide from the current value (as of `now`) to `target`
    /// over `frames` frames. A zero duration is bumped to one frame so
    /// the value still changes on the next sample.
    pub fn set(&mut self, now: u64, target: f32, frames: u64) {
        self.from = self.value_at(now);
        self.to = target;
        self.start_frame = now;
        self.end_frame = now + frames.max(1);
    }

    /// Value at an absolute frame position.
    pub fn value_at(&self, frame: u64) -> f32 {
        if frame >= self.end_frame {
            self.to
        } else if frame <= self.start_frame {
            self.from
        } else {
            let span = (self.end_frame - self.start_frame) as f32;
            let t = (frame - self.start_frame) as f32 / span;
            self.from + (self.to - self.from) * t
        }
    }

}
