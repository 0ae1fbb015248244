//! The frame loop: step, render, repeat until stopped.
//!
//! A decorative background runs for the lifetime of its host view, so the
//! loop has no natural end. Rather than a self-rescheduling callback, the
//! loop is an explicit driver: it runs an [`Effect`] against a [`Surface`]
//! until an external [`StopHandle`] fires or an optional frame budget
//! runs out, which is what makes the loop testable without a live display.

use crate::effect::Effect;
use crate::error::EffectError;
use crate::surface::Surface;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cancellation signal for a running [`Driver`].
///
/// Cheap to clone and safe to trigger from another thread. Once stopped,
/// the driver exits before the next frame begins.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Requests the driver stop before its next frame.
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A run-until-stopped frame loop.
///
/// Each frame is `step()` then `render()` then the caller's `on_frame`
/// callback. With no frame budget and no stop request the loop runs
/// indefinitely, so callers that want an end must hold a [`StopHandle`]
/// or pass `max_frames`.
#[derive(Debug)]
pub struct Driver {
    stop: Arc<AtomicBool>,
    frame_interval: Option<Duration>,
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver {
    /// Creates a driver with no pacing: frames run back to back.
    pub fn new() -> Self {
        Self {
            stop: Arc::new(AtomicBool::new(false)),
            frame_interval: None,
        }
    }

    /// Sleeps `interval` after each frame, standing in for the display
    /// refresh when the loop drives a visible surface.
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = Some(interval);
        self
    }

    /// Returns a handle that can stop this driver's `run` call.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop))
    }

    /// Runs the loop until stopped or `max_frames` frames have completed.
    ///
    /// `on_frame` receives the zero-based index of each completed frame.
    /// Returns the number of frames run, or the first `step()` error.
    pub fn run<F>(
        &self,
        effect: &mut dyn Effect,
        surface: &mut dyn Surface,
        max_frames: Option<u64>,
        mut on_frame: F,
    ) -> Result<u64, EffectError>
    where
        F: FnMut(u64),
    {
        let mut frame = 0u64;
        while !self.stop.load(Ordering::Relaxed) && max_frames.map_or(true, |max| frame < max) {
            effect.step()?;
            effect.render(surface);
            on_frame(frame);
            frame += 1;
            if let Some(interval) = self.frame_interval {
                std::thread::sleep(interval);
            }
        }
        Ok(frame)
    }
}
