use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use common::actors::{Actor, ActorType, ControlMessage, stop_requested};
use storage::{LogBuffer, SignalStore};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{error::FetchError, traits::SignalSource};

pub const CONNECTION_ERROR_LINE: &str = "Connection Error: Retrying...";
/// The supervisor hears about a failure streak every this many failed polls.
pub const FAILURE_REPORT_EVERY: u32 = 3;

/// What a single poll cycle did to the store and log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The store now holds this many signals.
    Synced(usize),
    /// Backend answered with a non-success status; store untouched.
    Rejected(u16),
    /// Transport or decode failure; store untouched.
    Failed(String),
}

impl PollOutcome {
    fn failure(&self) -> Option<String> {
        match self {
            Self::Synced(_) => None,
            Self::Rejected(code) => Some(format!("HTTP {}", code)),
            Self::Failed(reason) => Some(reason.clone()),
        }
    }
}

/// Pulls the signal list on a fixed cadence and is the only writer of the
/// store and the log.
///
/// Fetches never overlap: the next tick is not taken until the current fetch
/// has resolved, and ticks missed meanwhile are skipped.
pub struct SignalPoller {
    id: Uuid,
    source: Arc<dyn SignalSource>,
    store: Arc<SignalStore>,
    log: Arc<LogBuffer>,
    period: Duration,
}

#[async_trait]
impl Actor for SignalPoller {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> ActorType {
        ActorType::SignalPoller
    }

    async fn run(
        &mut self,
        supervisor_tx: mpsc::Sender<ControlMessage>,
        shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let heartbeat_handle = self.spawn_heartbeat(supervisor_tx.clone());

        info!("Starting signal poller, period {:?}", self.period);
        self.poll_loop(shutdown, Some(&supervisor_tx)).await;
        heartbeat_handle.abort();

        if supervisor_tx
            .send(ControlMessage::Shutdown(self.id))
            .await
            .is_err()
        {
            debug!("Supervisor already gone, skipping shutdown notice");
        }
        Ok(())
    }
}

impl SignalPoller {
    pub fn new(
        source: Arc<dyn SignalSource>,
        store: Arc<SignalStore>,
        log: Arc<LogBuffer>,
        period: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            store,
            log,
            period,
        }
    }

    /// One fetch attempt. All mutations happen after the fetch resolves, with
    /// no await in between, so a cancelled attempt leaves no trace.
    pub async fn poll_once(&self) -> PollOutcome {
        match self.source.fetch_signals().await {
            Ok(signals) => {
                let count = signals.len();
                self.store.set_signals(signals);
                self.log.append(format!("Sync: {} active signals", count));
                PollOutcome::Synced(count)
            }
            Err(FetchError::Status(code)) => {
                warn!("Signal backend answered HTTP {}, keeping last snapshot", code);
                self.log.append(format!("Backend Error: HTTP {}", code));
                PollOutcome::Rejected(code)
            }
            Err(e) => {
                warn!("Signal fetch failed: {}", e);
                self.log.append(CONNECTION_ERROR_LINE);
                PollOutcome::Failed(e.to_string())
            }
        }
    }

    /// Polls immediately, then once per period, until `shutdown` turns true
    /// or its sender goes away. An in-flight fetch is dropped on shutdown.
    pub async fn run_until(&self, shutdown: watch::Receiver<bool>) {
        self.poll_loop(shutdown, None).await;
    }

    async fn poll_loop(
        &self,
        mut shutdown: watch::Receiver<bool>,
        reporter: Option<&mpsc::Sender<ControlMessage>>,
    ) {
        let stopped = *shutdown.borrow();
        if stopped {
            return;
        }
        self.store.set_connected(true);

        let mut ticker = time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut cycle: u64 = 0;
        let mut failed_in_a_row: u32 = 0;

        loop {
            tokio::select! {
                biased;
                _ = stop_requested(&mut shutdown) => break,
                _ = ticker.tick() => {}
            }

            cycle += 1;
            tokio::select! {
                biased;
                _ = stop_requested(&mut shutdown) => break,
                outcome = self.poll_once() => {
                    debug!("Poll cycle {} finished: {:?}", cycle, outcome);
                    match outcome.failure() {
                        None => failed_in_a_row = 0,
                        Some(reason) => {
                            failed_in_a_row += 1;
                            if failed_in_a_row % FAILURE_REPORT_EVERY == 0 {
                                self.report_failures(reporter, failed_in_a_row, &reason);
                            }
                        }
                    }
                }
            }
        }

        info!("Signal poller stopped after {} cycles", cycle);
    }

    fn report_failures(
        &self,
        reporter: Option<&mpsc::Sender<ControlMessage>>,
        streak: u32,
        reason: &str,
    ) {
        let Some(tx) = reporter else {
            return;
        };
        let message = format!("{} polls failed in a row, last: {}", streak, reason);
        // a full channel drops the report rather than delaying the next poll
        if let Err(e) = tx.try_send(ControlMessage::Error(self.id, message)) {
            debug!("Could not report failure streak: {}", e);
        }
    }

    /// Runs the poller on its own task.
    pub fn spawn(self) -> PollerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move { self.run_until(shutdown_rx).await });

        PollerHandle {
            shutdown_tx,
            task: Some(task),
        }
    }
}

/// Owner of a spawned poll loop. Dropping it aborts the loop.
pub struct PollerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Stops the loop and waits for it. Once this returns the poller will not
    /// touch the store or the log again.
    pub async fn shutdown(mut self) {
        self.shutdown_tx.send_replace(true);

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Signal poller task ended abnormally: {}", e);
                }
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
