pub mod guard;

pub use guard::{CycleGuard, CyclePermit};

use crate::reconcile::Reconciler;
use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Runs reconcile cycles on a fixed interval, never more than one at a time
pub struct Scheduler {
    reconciler: Arc<Reconciler>,
    interval: Duration,
    guard: CycleGuard,
}

impl Scheduler {
    pub fn new(reconciler: Arc<Reconciler>, interval: Duration) -> Self {
        Self {
            reconciler,
            interval,
            guard: CycleGuard::new(),
        }
    }

    pub fn guard(&self) -> CycleGuard {
        self.guard.clone()
    }

    /// Tick until `shutdown` resolves or a cycle fails.
    ///
    /// The first cycle starts one interval from now, or immediately with
    /// `run_now`. A cycle still running at shutdown is waited for.
    pub async fn run<F>(self, run_now: bool, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let start = if run_now {
            Instant::now()
        } else {
            Instant::now() + self.interval
        };
        let mut ticker = tokio::time::interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let (fatal_tx, mut fatal_rx) = mpsc::channel::<anyhow::Error>(1);
        let mut in_flight: Option<JoinHandle<()>> = None;

        tracing::info!(
            "Watching {:?}, converting every {:?}",
            self.reconciler.settings().watch_root,
            self.interval
        );

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested");
                    break;
                }

                Some(err) = fatal_rx.recv() => {
                    return Err(err);
                }

                _ = ticker.tick() => {
                    if let Some(handle) = self.start_cycle(fatal_tx.clone()) {
                        in_flight = Some(handle);
                    }
                }
            }
        }

        if let Some(handle) = in_flight {
            if !handle.is_finished() {
                tracing::info!("Waiting for the running cycle to finish");
            }
            handle.await.context("Cycle task failed")?;
        }

        match fatal_rx.try_recv() {
            Ok(err) => Err(err),
            Err(_) => Ok(()),
        }
    }

    /// Start a cycle on a blocking thread unless one is already running.
    fn start_cycle(&self, fatal_tx: mpsc::Sender<anyhow::Error>) -> Option<JoinHandle<()>> {
        let Some(permit) = self.guard.try_acquire() else {
            tracing::debug!("Previous cycle still running, skipping tick");
            return None;
        };

        let reconciler = Arc::clone(&self.reconciler);
        Some(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            if let Err(e) = reconciler.run_cycle() {
                tracing::error!("Cycle failed: {:#}", e);
                let _ = fatal_tx.blocking_send(e);
            }
        }))
    }
}
