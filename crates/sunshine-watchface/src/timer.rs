//! Interactive-mode redraw timer.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::engine::{EngineEvent, EngineHandle};

/// Delay until the next whole period boundary: `period - (now % period)`.
///
/// Always in `1..=period` milliseconds, so a late tick realigns on the next one.
pub fn next_tick_delay(now_millis: i64, period_millis: u64) -> Duration {
    let period = period_millis.max(1) as i64;
    let remainder = now_millis.rem_euclid(period);
    Duration::from_millis((period - remainder) as u64)
}

struct Pending {
    token: CancellationToken,
    task: JoinHandle<()>,
}

/// Posts [`EngineEvent::UpdateTime`] to the engine once per period.
///
/// The engine holds the only `UpdateTimer`; stopping it cancels the
/// scheduled task before returning. Each start gets a new generation so
/// ticks already queued by an earlier run can be told apart.
pub struct UpdateTimer {
    inbox: EngineHandle,
    clock: Arc<dyn Clock>,
    period_millis: u64,
    generation: u64,
    pending: Option<Pending>,
}

impl UpdateTimer {
    pub fn new(inbox: EngineHandle, clock: Arc<dyn Clock>, period_millis: u64) -> Self {
        Self {
            inbox,
            clock,
            period_millis,
            generation: 0,
            pending: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    /// Generation of the current run. Ticks carrying any other value are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cancel any pending tick, then tick now and on every period boundary.
    pub fn restart(&mut self) {
        self.stop();
        self.generation += 1;

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let inbox = self.inbox.clone();
        let clock = Arc::clone(&self.clock);
        let period = self.period_millis;
        let generation = self.generation;

        let task = tokio::spawn(async move {
            loop {
                if !inbox.send(EngineEvent::UpdateTime(generation)) {
                    break;
                }
                let delay = next_tick_delay(clock.now_millis(), period);
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        });

        tracing::trace!(generation, "Update timer started");
        self.pending = Some(Pending { token, task });
    }

    pub fn stop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.token.cancel();
            pending.task.abort();
            tracing::trace!(generation = self.generation, "Update timer stopped");
        }
    }
}

impl Drop for UpdateTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
