//! # Cart Store
//!
//! The cart actor owns the [`Cart`]. Every mutation is a message on one
//! bounded queue and is applied by one task, so callers on different tasks
//! can never overwrite each other's changes.
//!
//! ## Actor Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         CartActor::run                                  │
//! │                                                                         │
//! │  1. Hydrate ── storage.get(key)                                        │
//! │        ├─ Some(blob) ─► Cart::from_json ─► Loaded{items, dropped}      │
//! │        ├─ None ───────────────────────────► Empty                      │
//! │        └─ Err / undecodable ─► warn! + report ─► Failed (cart empty)   │
//! │                                                                         │
//! │  2. Command loop (commands sent during hydration wait here)            │
//! │        Add / Increment / Decrement / Remove / Clear                    │
//! │          └─ ok ─► revision += 1 ─► watch::send ─► writer.persist       │
//! │          └─ err ─► reply only (cart untouched, nothing persisted)      │
//! │        Flush ─► forwarded to the writer queue behind prior snapshots   │
//! │        Shutdown ─► close queue, drain, stop writer, reply              │
//! │                                                                         │
//! │  3. Queue closed ─► drop writer handle ─► await writer ─► exit         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use basket_core::{Cart, CartTotals, LineItem, Product};
use chrono::Utc;

use crate::error::{StoreError, StoreResult};
use crate::storage::SharedStorage;
use crate::writer::{FailedOperation, PersistFailure, Snapshot, WriterHandle};

// =============================================================================
// Hydration Status
// =============================================================================

/// Outcome of the startup read of the persisted cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HydrationStatus {
    /// The actor has not finished reading storage yet.
    Pending,
    /// A persisted cart was found and applied.
    Loaded { items: usize, dropped: usize },
    /// Nothing was stored under the key.
    Empty,
    /// Storage could not be read or the blob was not a cart. The cart
    /// started empty.
    Failed { reason: String },
}

impl HydrationStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, HydrationStatus::Pending)
    }
}

// =============================================================================
// Commands
// =============================================================================

type Reply<T> = oneshot::Sender<StoreResult<T>>;

pub(crate) enum CartCommand {
    Add { product: Product, reply: Reply<LineItem> },
    Increment { id: String, reply: Reply<LineItem> },
    Decrement { id: String, reply: Reply<Option<LineItem>> },
    Remove { id: String, reply: Reply<LineItem> },
    Clear { reply: Reply<()> },
    Flush { reply: oneshot::Sender<()> },
    Shutdown { reply: oneshot::Sender<()> },
}

// =============================================================================
// Cart Handle
// =============================================================================

/// Cloneable access to one cart store.
///
/// Mutations go through the actor; reads come straight from the latest
/// published snapshot, which already reflects every mutation whose call has
/// returned.
#[derive(Clone)]
pub struct CartHandle {
    store_id: Uuid,
    commands: mpsc::Sender<CartCommand>,
    state: watch::Receiver<Cart>,
    hydration: watch::Receiver<HydrationStatus>,
    failures: broadcast::Sender<PersistFailure>,
}

impl std::fmt::Debug for CartHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartHandle")
            .field("store_id", &self.store_id)
            .field("closed", &self.commands.is_closed())
            .finish()
    }
}

impl CartHandle {
    pub fn store_id(&self) -> Uuid {
        self.store_id
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds a product with quantity 1, or increments it if already present.
    pub async fn add_to_cart(&self, product: Product) -> StoreResult<LineItem> {
        self.request(|reply| CartCommand::Add { product, reply }).await?
    }

    /// Increases the item's quantity by one.
    ///
    /// Fails with `ItemNotFound` (and changes nothing) if the id is absent.
    pub async fn increment(&self, id: impl Into<String>) -> StoreResult<LineItem> {
        let id = id.into();
        self.request(|reply| CartCommand::Increment { id, reply }).await?
    }

    /// Decreases the item's quantity by one.
    ///
    /// Returns `None` when the quantity reached zero and the entry was removed.
    pub async fn decrement(&self, id: impl Into<String>) -> StoreResult<Option<LineItem>> {
        let id = id.into();
        self.request(|reply| CartCommand::Decrement { id, reply }).await?
    }

    /// Removes the item regardless of quantity.
    pub async fn remove(&self, id: impl Into<String>) -> StoreResult<LineItem> {
        let id = id.into();
        self.request(|reply| CartCommand::Remove { id, reply }).await?
    }

    pub async fn clear(&self) -> StoreResult<()> {
        self.request(|reply| CartCommand::Clear { reply }).await?
    }

    /// Resolves once every write submitted before this call has been
    /// attempted to completion (persisted, or reported as a failure).
    pub async fn flush(&self) -> StoreResult<()> {
        self.request(|reply| CartCommand::Flush { reply }).await
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Snapshot of the line items in display order.
    pub fn items(&self) -> Vec<LineItem> {
        self.state.borrow().items().to_vec()
    }

    pub fn cart(&self) -> Cart {
        self.state.borrow().clone()
    }

    pub fn totals(&self) -> CartTotals {
        self.state.borrow().totals()
    }

    /// Receiver notified every time the cart changes, hydration included.
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.state.clone()
    }

    /// Receiver for storage failures the store gave up on.
    ///
    /// Only failures sent after this call are received. A hydration failure
    /// usually happens first; use [`CartProvider::failures`] or
    /// [`wait_hydrated`](Self::wait_hydrated) to observe it.
    ///
    /// [`CartProvider::failures`]: crate::CartProvider::failures
    pub fn failures(&self) -> broadcast::Receiver<PersistFailure> {
        self.failures.subscribe()
    }

    pub fn hydration_status(&self) -> HydrationStatus {
        self.hydration.borrow().clone()
    }

    /// Waits until the startup read has finished and returns its outcome.
    pub async fn wait_hydrated(&self) -> StoreResult<HydrationStatus> {
        let mut rx = self.hydration.clone();
        let status = rx
            .wait_for(|status| !status.is_pending())
            .await
            .map_err(|_| StoreError::StoreClosed)?;
        Ok((*status).clone())
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    pub(crate) async fn shutdown(&self) -> StoreResult<()> {
        self.request(|reply| CartCommand::Shutdown { reply }).await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> CartCommand,
    ) -> StoreResult<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(command(tx))
            .await
            .map_err(|_| StoreError::StoreClosed)?;
        rx.await.map_err(|_| StoreError::StoreClosed)
    }
}

// =============================================================================
// Cart Actor
// =============================================================================

pub(crate) struct CartActor {
    store_id: Uuid,
    key: String,
    storage: SharedStorage,
    cart: Cart,
    revision: u64,
    commands: mpsc::Receiver<CartCommand>,
    state_tx: watch::Sender<Cart>,
    hydration_tx: watch::Sender<HydrationStatus>,
    failures: broadcast::Sender<PersistFailure>,
    writer: Option<WriterHandle>,
    writer_task: Option<JoinHandle<()>>,
    shutdown_replies: Vec<oneshot::Sender<()>>,
}

impl CartActor {
    /// Creates the actor and the first handle to it.
    pub fn new(
        store_id: Uuid,
        key: String,
        storage: SharedStorage,
        queue_capacity: usize,
        writer: WriterHandle,
        writer_task: JoinHandle<()>,
        failures: broadcast::Sender<PersistFailure>,
    ) -> (Self, CartHandle) {
        let (commands_tx, commands) = mpsc::channel(queue_capacity);
        let (state_tx, state_rx) = watch::channel(Cart::new());
        let (hydration_tx, hydration_rx) = watch::channel(HydrationStatus::Pending);

        let actor = CartActor {
            store_id,
            key,
            storage,
            cart: Cart::new(),
            revision: 0,
            commands,
            state_tx,
            hydration_tx,
            failures: failures.clone(),
            writer: Some(writer),
            writer_task: Some(writer_task),
            shutdown_replies: Vec::new(),
        };

        let handle = CartHandle {
            store_id,
            commands: commands_tx,
            state: state_rx,
            hydration: hydration_rx,
            failures,
        };

        (actor, handle)
    }

    pub async fn run(mut self) {
        info!(store_id = %self.store_id, key = %self.key, "Cart store starting");

        self.hydrate().await;

        while let Some(command) = self.commands.recv().await {
            self.handle(command).await;
        }

        self.stop_writer().await;

        info!(
            store_id = %self.store_id,
            revision = self.revision,
            "Cart store stopped"
        );

        for reply in self.shutdown_replies.drain(..) {
            let _ = reply.send(());
        }
    }

    // =========================================================================
    // Hydration
    // =========================================================================

    async fn hydrate(&mut self) {
        let status = match self.storage.get(&self.key).await {
            Ok(None) => {
                debug!(store_id = %self.store_id, "No persisted cart");
                HydrationStatus::Empty
            }
            Ok(Some(blob)) => match Cart::from_json(&blob) {
                Ok(decoded) => {
                    if decoded.dropped > 0 {
                        warn!(
                            store_id = %self.store_id,
                            dropped = decoded.dropped,
                            "Dropped invalid entries from persisted cart"
                        );
                    }
                    if decoded.clamped > 0 {
                        warn!(
                            store_id = %self.store_id,
                            clamped = decoded.clamped,
                            "Lowered persisted quantities to the per-item limit"
                        );
                    }
                    let items = decoded.cart.len();
                    self.cart = decoded.cart;
                    self.state_tx.send_replace(self.cart.clone());
                    info!(store_id = %self.store_id, items, "Cart hydrated");
                    HydrationStatus::Loaded {
                        items,
                        dropped: decoded.dropped,
                    }
                }
                Err(e) => self.hydration_failed(StoreError::from(e)),
            },
            Err(e) => self.hydration_failed(e),
        };

        self.hydration_tx.send_replace(status);
    }

    fn hydration_failed(&self, err: StoreError) -> HydrationStatus {
        warn!(
            store_id = %self.store_id,
            key = %self.key,
            error = %err,
            "Could not hydrate cart, starting empty"
        );

        let _ = self.failures.send(PersistFailure {
            store_id: self.store_id,
            key: self.key.clone(),
            operation: FailedOperation::Hydrate,
            revision: 0,
            attempts: 1,
            error: err.to_string(),
            failed_at: Utc::now(),
        });

        HydrationStatus::Failed {
            reason: err.to_string(),
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    async fn handle(&mut self, command: CartCommand) {
        match command {
            CartCommand::Add { product, reply } => {
                let result = self.cart.add(&product).map_err(StoreError::from);
                if result.is_ok() {
                    self.commit("add", &product.id).await;
                }
                let _ = reply.send(result);
            }
            CartCommand::Increment { id, reply } => {
                let result = self.cart.increment(&id).map_err(StoreError::from);
                if result.is_ok() {
                    self.commit("increment", &id).await;
                }
                let _ = reply.send(result);
            }
            CartCommand::Decrement { id, reply } => {
                let result = self.cart.decrement(&id).map_err(StoreError::from);
                if result.is_ok() {
                    self.commit("decrement", &id).await;
                }
                let _ = reply.send(result);
            }
            CartCommand::Remove { id, reply } => {
                let result = self.cart.remove(&id).map_err(StoreError::from);
                if result.is_ok() {
                    self.commit("remove", &id).await;
                }
                let _ = reply.send(result);
            }
            CartCommand::Clear { reply } => {
                self.cart.clear();
                self.commit("clear", "").await;
                let _ = reply.send(Ok(()));
            }
            CartCommand::Flush { reply } => match self.writer {
                Some(ref writer) => {
                    if let Err(e) = writer.flush(reply).await {
                        warn!(store_id = %self.store_id, error = %e, "Flush not queued");
                    }
                }
                None => {
                    let _ = reply.send(());
                }
            },
            CartCommand::Shutdown { reply } => {
                debug!(store_id = %self.store_id, "Shutdown requested");
                self.shutdown_replies.push(reply);
                self.commands.close();
            }
        }
    }

    /// Publishes the mutated cart and queues it for persistence.
    async fn commit(&mut self, op: &'static str, item_id: &str) {
        self.revision += 1;
        self.state_tx.send_replace(self.cart.clone());

        debug!(
            store_id = %self.store_id,
            op,
            item_id,
            revision = self.revision,
            items = self.cart.len(),
            "Cart updated"
        );

        let payload = match self.cart.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(store_id = %self.store_id, error = %e, "Could not encode cart");
                return;
            }
        };

        if let Some(ref writer) = self.writer {
            let snapshot = Snapshot {
                revision: self.revision,
                payload,
            };
            if let Err(e) = writer.persist(snapshot).await {
                warn!(store_id = %self.store_id, error = %e, "Snapshot not queued");
            }
        }
    }

    async fn stop_writer(&mut self) {
        // Dropping the last writer handle lets the writer drain and exit.
        self.writer.take();
        if let Some(task) = self.writer_task.take() {
            if let Err(e) = task.await {
                warn!(store_id = %self.store_id, error = %e, "Persistence writer panicked");
            }
        }
    }
}
