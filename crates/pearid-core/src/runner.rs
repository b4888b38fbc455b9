//! Single-flight cycle runner.
//!
//! One task owns the [`TrustGate`] and runs cycles one at a time. Triggers
//! that arrive while a cycle is in flight collapse into a single queued
//! re-run.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use crate::defaults::EVENT_CHANNEL_CAPACITY;
use crate::error::{Error, Result};
use crate::gate::{CycleOutcome, TrustGate};
use crate::tree::{ContentTree, NodeId};

/// Event emitted by the runner.
#[derive(Debug, Clone)]
pub enum GateEvent {
    /// Runner started.
    RunnerStarted,
    /// A cycle began.
    CycleStarted { cycle: u64 },
    /// A cycle finished.
    CycleFinished { cycle: u64, outcome: CycleOutcome },
    /// Runner stopped.
    RunnerStopped,
}

/// Handle for controlling a running gate.
pub struct GateHandle {
    trigger: Arc<Notify>,
    watched: watch::Receiver<HashSet<NodeId>>,
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<GateEvent>,
    task: JoinHandle<()>,
}

impl GateHandle {
    /// Request a cycle. Coalesces with any other pending request.
    pub fn trigger(&self) {
        self.trigger.notify_one();
    }

    /// Report that `node` changed. Starts a cycle only for watched nodes.
    pub fn notify_changed(&self, node: NodeId) -> bool {
        let watched = self.watched.borrow().contains(&node);
        if watched {
            self.trigger();
        } else {
            debug!(node = %node, "Change on unwatched node ignored");
        }
        watched
    }

    /// Nodes watched after the most recent cycle.
    pub fn watched(&self) -> HashSet<NodeId> {
        self.watched.borrow().clone()
    }

    /// Get a receiver for gate events.
    pub fn events(&self) -> broadcast::Receiver<GateEvent> {
        self.event_rx.resubscribe()
    }

    /// Stop after the current cycle and wait for the task to exit.
    pub async fn shutdown(self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))?;
        self.task
            .await
            .map_err(|e| Error::Internal(format!("Gate task failed: {e}")))
    }
}

/// Drives a [`TrustGate`] over a shared document.
pub struct GateRunner<D> {
    gate: TrustGate,
    document: Arc<Mutex<D>>,
    event_tx: broadcast::Sender<GateEvent>,
}

impl<D> GateRunner<D>
where
    D: ContentTree + Send + 'static,
{
    pub fn new(gate: TrustGate, document: Arc<Mutex<D>>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            gate,
            document,
            event_tx,
        }
    }

    /// Subscribe before [`start`](Self::start) to see the initial cycle.
    pub fn events(&self) -> broadcast::Receiver<GateEvent> {
        self.event_tx.subscribe()
    }

    /// Spawn the runner. The first cycle starts immediately.
    pub fn start(self) -> GateHandle {
        let trigger = Arc::new(Notify::new());
        let (watch_tx, watched) = watch::channel(HashSet::new());
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        let task = tokio::spawn(self.run(trigger.clone(), watch_tx, shutdown_rx));

        GateHandle {
            trigger,
            watched,
            shutdown_tx,
            event_rx,
            task,
        }
    }

    #[instrument(skip_all)]
    async fn run(
        mut self,
        trigger: Arc<Notify>,
        watch_tx: watch::Sender<HashSet<NodeId>>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        info!("Gate runner started");
        let _ = self.event_tx.send(GateEvent::RunnerStarted);
        self.publish_watched(&watch_tx).await;

        let mut cycle = 0u64;
        loop {
            cycle += 1;
            self.run_once(cycle, &watch_tx).await;

            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Gate runner received shutdown signal");
                    break;
                }
                _ = trigger.notified() => {}
            }
        }

        let _ = self.event_tx.send(GateEvent::RunnerStopped);
        info!("Gate runner stopped");
    }

    async fn publish_watched(&self, watch_tx: &watch::Sender<HashSet<NodeId>>) {
        let document = self.document.lock().await;
        let watched: HashSet<NodeId> = self.gate.watched_nodes(&*document).into_iter().collect();
        watch_tx.send_replace(watched);
    }

    async fn run_once(&mut self, cycle: u64, watch_tx: &watch::Sender<HashSet<NodeId>>) {
        let _ = self.event_tx.send(GateEvent::CycleStarted { cycle });

        let mut document = self.document.lock().await;
        let outcome = self.gate.run_cycle(&mut *document).await;
        let watched: HashSet<NodeId> = self.gate.watched_nodes(&*document).into_iter().collect();
        debug!(cycle, watched = watched.len(), "Watch set refreshed");
        // Publish before the host can edit again.
        watch_tx.send_replace(watched);
        drop(document);

        let _ = self.event_tx.send(GateEvent::CycleFinished { cycle, outcome });
    }
}
