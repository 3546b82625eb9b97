use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;
use tracing::{info, instrument};

use crate::error::{MonitorError, Result};
use crate::sweep::{Monitor, Trigger};

/// Default time between scheduled sweeps
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(120);

/// Observable lifecycle of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

impl SchedulerState {
    fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }
}

enum Lifecycle {
    Idle,
    Running {
        shutdown: oneshot::Sender<()>,
        handle: JoinHandle<()>,
    },
    Stopped,
}

impl Lifecycle {
    fn state(&self) -> SchedulerState {
        match self {
            Self::Idle => SchedulerState::Idle,
            Self::Running { .. } => SchedulerState::Running,
            Self::Stopped => SchedulerState::Stopped,
        }
    }
}

/// Runs a full sweep every `period`, first one `period` after `start()`.
///
/// Each tick spawns its sweep, so a slow sweep never delays the next tick
/// or `stop()`. Stopping cancels the timer; sweeps already in flight run
/// to completion on their own.
pub struct Scheduler {
    monitor: Arc<Monitor>,
    period: Duration,
    lifecycle: Mutex<Lifecycle>,
}

impl Scheduler {
    pub fn new(monitor: Arc<Monitor>, period: Duration) -> Self {
        Self {
            monitor,
            period,
            lifecycle: Mutex::new(Lifecycle::Idle),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.lifecycle.lock().state()
    }

    /// Arm the timer. Valid only once, from `Idle`.
    #[instrument(skip(self), fields(period_secs = self.period.as_secs()))]
    pub fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        if !matches!(*lifecycle, Lifecycle::Idle) {
            return Err(MonitorError::InvalidTransition {
                from: lifecycle.state().as_str(),
                to: SchedulerState::Running.as_str(),
            });
        }

        let (shutdown, mut shutdown_rx) = oneshot::channel();
        let monitor = self.monitor.clone();
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = IntervalStream::new(interval);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    Some(_) = ticks.next() => {
                        info!("running scheduled sweep");
                        let monitor = monitor.clone();
                        tokio::spawn(async move {
                            monitor.sweep_all(Trigger::Scheduled).await;
                        });
                    }
                }
            }
        });

        *lifecycle = Lifecycle::Running { shutdown, handle };
        info!("scheduler started");
        Ok(())
    }

    /// Cancel the timer and wait for its task to exit. Valid once.
    pub async fn stop(&self) -> Result<()> {
        let previous = std::mem::replace(&mut *self.lifecycle.lock(), Lifecycle::Stopped);

        match previous {
            Lifecycle::Running { shutdown, handle } => {
                // The loop may already be gone; the join below covers both
                let _ = shutdown.send(());
                let _ = handle.await;
                info!("scheduler stopped");
                Ok(())
            }
            Lifecycle::Idle => {
                info!("scheduler stopped before it was started");
                Ok(())
            }
            Lifecycle::Stopped => Err(MonitorError::InvalidTransition {
                from: SchedulerState::Stopped.as_str(),
                to: SchedulerState::Stopped.as_str(),
            }),
        }
    }
}
