//! # Persistence Writer
//!
//! Writes cart snapshots to storage, one at a time, in the order the actor
//! produced them.
//!
//! ## Writer Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Persistence Writer Flow                           │
//! │                                                                         │
//! │  CartActor ── Persist{rev 7} ──┐                                       │
//! │  CartActor ── Persist{rev 8} ──┤   FIFO (mpsc)                         │
//! │  caller    ── Flush(tx) ───────┤                                       │
//! │                                ▼                                       │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  1. Take next message                                          │   │
//! │  │  2. Coalesce: drain queued Persist up to the next Flush,       │   │
//! │  │     keep only the newest revision                              │   │
//! │  │  3. storage.set(key, payload)                                  │   │
//! │  │     └─ error → sleep(backoff) → retry, up to max_attempts      │   │
//! │  │     └─ exhausted → error! + broadcast PersistFailure           │   │
//! │  │  4. Answer any Flush that was queued behind the write          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  A revision is never written after a higher one.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::PersistenceSettings;
use crate::error::{StoreError, StoreResult};
use crate::storage::SharedStorage;

// =============================================================================
// Failure Reports
// =============================================================================

/// What the store was doing when storage failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedOperation {
    /// Reading the persisted cart at startup.
    Hydrate,
    /// Writing a snapshot.
    Persist,
}

/// A storage failure the store gave up on.
///
/// In-memory state is never rolled back; the next successful write carries
/// the full cart and supersedes the lost one.
#[derive(Debug, Clone, Serialize)]
pub struct PersistFailure {
    pub store_id: Uuid,
    pub key: String,
    pub operation: FailedOperation,
    /// Revision of the snapshot that was not written (0 for hydration).
    pub revision: u64,
    pub attempts: u32,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

// =============================================================================
// Messages
// =============================================================================

/// A cart state ready to be written.
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    pub revision: u64,
    pub payload: String,
}

pub(crate) enum WriterMessage {
    Persist(Snapshot),
    /// Answered once every snapshot queued before it has been handled.
    Flush(oneshot::Sender<()>),
}

/// Sending side of the writer queue, held by the cart actor.
#[derive(Clone)]
pub(crate) struct WriterHandle {
    tx: mpsc::Sender<WriterMessage>,
}

impl WriterHandle {
    pub async fn persist(&self, snapshot: Snapshot) -> StoreResult<()> {
        self.tx
            .send(WriterMessage::Persist(snapshot))
            .await
            .map_err(|_| StoreError::ChannelError("Writer queue closed".into()))
    }

    pub async fn flush(&self, reply: oneshot::Sender<()>) -> StoreResult<()> {
        self.tx
            .send(WriterMessage::Flush(reply))
            .await
            .map_err(|_| StoreError::ChannelError("Writer queue closed".into()))
    }
}

// =============================================================================
// Persist Writer
// =============================================================================

pub(crate) struct PersistWriter {
    store_id: Uuid,
    key: String,
    storage: SharedStorage,
    settings: PersistenceSettings,
    rx: mpsc::Receiver<WriterMessage>,
    failures: broadcast::Sender<PersistFailure>,

    /// Highest revision handed to storage so far.
    last_revision: u64,
}

impl PersistWriter {
    pub fn new(
        store_id: Uuid,
        key: String,
        storage: SharedStorage,
        settings: PersistenceSettings,
        failures: broadcast::Sender<PersistFailure>,
    ) -> (Self, WriterHandle) {
        let (tx, rx) = mpsc::channel(settings.queue_capacity.max(1));

        let writer = PersistWriter {
            store_id,
            key,
            storage,
            settings,
            rx,
            failures,
            last_revision: 0,
        };

        (writer, WriterHandle { tx })
    }

    /// Runs until every [`WriterHandle`] is dropped and the queue is empty.
    pub async fn run(mut self) {
        debug!(store_id = %self.store_id, "Persistence writer starting");

        while let Some(message) = self.rx.recv().await {
            match message {
                WriterMessage::Persist(snapshot) => {
                    let (snapshot, flushes) = self.coalesce(snapshot);
                    self.write(snapshot).await;
                    for reply in flushes {
                        let _ = reply.send(());
                    }
                }
                WriterMessage::Flush(reply) => {
                    let _ = reply.send(());
                }
            }
        }

        info!(
            store_id = %self.store_id,
            last_revision = self.last_revision,
            "Persistence writer stopped"
        );
    }

    /// Drains queued snapshots up to the next flush and keeps the newest.
    fn coalesce(&mut self, first: Snapshot) -> (Snapshot, Vec<oneshot::Sender<()>>) {
        let mut latest = first;
        let mut flushes = Vec::new();

        if !self.settings.coalesce_writes {
            return (latest, flushes);
        }

        let mut skipped = 0usize;
        while let Ok(message) = self.rx.try_recv() {
            match message {
                WriterMessage::Persist(next) => {
                    skipped += 1;
                    latest = next;
                }
                WriterMessage::Flush(reply) => {
                    flushes.push(reply);
                    break;
                }
            }
        }

        if skipped > 0 {
            debug!(
                store_id = %self.store_id,
                skipped,
                revision = latest.revision,
                "Coalesced queued snapshots"
            );
        }

        (latest, flushes)
    }

    /// Writes one snapshot, retrying with exponential backoff.
    async fn write(&mut self, snapshot: Snapshot) {
        if snapshot.revision < self.last_revision {
            warn!(
                store_id = %self.store_id,
                revision = snapshot.revision,
                last_revision = self.last_revision,
                "Skipping stale snapshot"
            );
            return;
        }
        self.last_revision = snapshot.revision;

        let mut backoff = self.create_backoff();
        let mut attempts = 0u32;

        loop {
            attempts += 1;

            let err = match self.storage.set(&self.key, &snapshot.payload).await {
                Ok(()) => {
                    debug!(
                        store_id = %self.store_id,
                        revision = snapshot.revision,
                        attempts,
                        "Snapshot persisted"
                    );
                    return;
                }
                Err(e) => e,
            };

            let retry_in = if attempts < self.settings.max_attempts {
                backoff.next_backoff()
            } else {
                None
            };

            let Some(delay) = retry_in else {
                self.report(&snapshot, attempts, &err);
                return;
            };

            warn!(
                store_id = %self.store_id,
                revision = snapshot.revision,
                attempt = attempts,
                ?delay,
                error = %err,
                "Persist failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn report(&self, snapshot: &Snapshot, attempts: u32, err: &StoreError) {
        error!(
            store_id = %self.store_id,
            key = %self.key,
            revision = snapshot.revision,
            attempts,
            error = %err,
            "Giving up on cart snapshot"
        );

        // No receivers is fine: nobody is listening for failures.
        let _ = self.failures.send(PersistFailure {
            store_id: self.store_id,
            key: self.key.clone(),
            operation: FailedOperation::Persist,
            revision: snapshot.revision,
            attempts,
            error: err.to_string(),
            failed_at: Utc::now(),
        });
    }

    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.settings.initial_backoff(),
            max_interval: self.settings.max_backoff(),
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}
