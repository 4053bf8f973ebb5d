//! Per-frame callbacks for the rotation animation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Called with the time elapsed since the previous frame.
pub type FrameCallback = Box<dyn FnMut(Duration) + Send>;

/// Source of animation frames.
pub trait FrameScheduler: Send + Sync {
    /// Start delivering frames to `on_frame` until the handle is stopped.
    fn start(&self, on_frame: FrameCallback) -> FrameHandle;
}

/// A running frame loop. Stops on [`FrameHandle::stop`] or drop.
#[derive(Debug)]
pub struct FrameHandle {
    active: Arc<AtomicBool>,
    task:   Option<JoinHandle<()>>,
}

impl FrameHandle {
    fn new(active: Arc<AtomicBool>, task: Option<JoinHandle<()>>) -> Self {
        Self { active, task }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// No frame is delivered after this returns.
    pub fn stop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for FrameHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Frames from a tokio interval, roughly 60 per second by default.
#[derive(Debug, Clone)]
pub struct IntervalScheduler {
    period: Duration,
}

impl Default for IntervalScheduler {
    fn default() -> Self {
        Self::new(Duration::from_millis(16))
    }
}

impl IntervalScheduler {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }
}

impl FrameScheduler for IntervalScheduler {
    /// Outside a tokio runtime no frames can be delivered and the returned
    /// handle is already inactive.
    fn start(&self, mut on_frame: FrameCallback) -> FrameHandle {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no tokio runtime, frame loop not started");
            return FrameHandle::new(Arc::new(AtomicBool::new(false)), None);
        };
        let active = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&active);
        let period = self.period;

        let task = handle.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately
            interval.tick().await;
            let mut last = Instant::now();
            loop {
                interval.tick().await;
                if !flag.load(Ordering::SeqCst) {
                    break;
                }
                let now = Instant::now();
                on_frame(now - last);
                last = now;
            }
        });

        FrameHandle::new(active, Some(task))
    }
}

/// Frames delivered by hand through [`ManualScheduler::tick`].
#[derive(Clone, Default)]
pub struct ManualScheduler {
    slot: Arc<Mutex<Option<(Arc<AtomicBool>, FrameCallback)>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one frame. Returns `false` when no loop is running.
    pub fn tick(&self, delta: Duration) -> bool {
        // the callback runs unlocked so it may start or stop loops itself
        let taken = self.slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        match taken {
            Some((active, mut callback)) if active.load(Ordering::SeqCst) => {
                callback(delta);
                let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
                if slot.is_none() {
                    *slot = Some((active, callback));
                }
                true
            }
            _ => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|(active, _)| active.load(Ordering::SeqCst))
    }
}

impl FrameScheduler for ManualScheduler {
    fn start(&self, on_frame: FrameCallback) -> FrameHandle {
        let active = Arc::new(AtomicBool::new(true));
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((Arc::clone(&active), on_frame));
        FrameHandle::new(active, None)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use super::*;

    #[test]
    fn test_manual_scheduler_stops() {
        let scheduler = ManualScheduler::new();
        let frames = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&frames);
        let mut handle = scheduler.start(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(scheduler.tick(Duration::from_millis(16)));
        assert!(scheduler.tick(Duration::from_millis(16)));
        handle.stop();
        assert!(!scheduler.tick(Duration::from_millis(16)));
        assert!(!scheduler.is_running());
        assert_eq!(frames.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_interval_scheduler_without_runtime() {
        let scheduler = IntervalScheduler::default();
        let handle = scheduler.start(Box::new(|_| {}));
        assert!(!handle.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_scheduler_reports_elapsed() {
        let scheduler = IntervalScheduler::new(Duration::from_millis(10));
        let total = Arc::new(Mutex::new(Duration::ZERO));
        let sink = Arc::clone(&total);
        let handle = scheduler.start(Box::new(move |delta| {
            *sink.lock().unwrap() += delta;
        }));

        tokio::time::sleep(Duration::from_millis(105)).await;
        drop(handle);
        let seen = *total.lock().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(seen >= Duration::from_millis(90) && seen <= Duration::from_millis(105));
        assert_eq!(*total.lock().unwrap(), seen);
    }
}
