//! # Cart Provider
//!
//! Owns one cart store and defines the region of execution in which
//! [`use_cart`] resolves to it.
//!
//! ## Scope Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  provider.scope(async {                                                │
//! │      let cart = use_cart()?;        ◄── Ok(handle)                     │
//! │      cart.add_to_cart(p).await?;                                       │
//! │                                                                         │
//! │      tokio::spawn(async {                                              │
//! │          use_cart()                 ◄── Err(ScopeMisuse): the scope    │
//! │      });                                is per task, not inherited     │
//! │  }).await;                                                             │
//! │                                                                         │
//! │  use_cart()                         ◄── Err(ScopeMisuse)               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Spawned tasks take a cloned [`CartHandle`] or enter their own scope.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::storage::{self, KeyValueStorage};
use crate::store::{CartActor, CartHandle};
use crate::writer::{PersistFailure, PersistWriter};

tokio::task_local! {
    static ACTIVE_CART: CartHandle;
}

/// Returns the cart of the innermost enclosing provider scope.
///
/// ## Errors
/// `ScopeMisuse` when called outside [`CartProvider::scope`] or
/// [`CartProvider::scope_sync`].
pub fn use_cart() -> StoreResult<CartHandle> {
    ACTIVE_CART
        .try_with(CartHandle::clone)
        .map_err(|_| StoreError::ScopeMisuse)
}

/// Owner of one cart store instance.
///
/// Dropping the provider without [`shutdown`](Self::shutdown) leaves the
/// store running until every [`CartHandle`] is gone; queued snapshots are
/// still written.
pub struct CartProvider {
    handle: CartHandle,
    actor_task: JoinHandle<()>,

    /// Subscribed before the store task starts, so it holds a hydration
    /// failure even if the read fails before anyone calls `failures()`.
    startup_failures: Mutex<Option<broadcast::Receiver<PersistFailure>>>,
}

impl CartProvider {
    /// Starts a store over `storage`. Must be called inside a tokio runtime.
    ///
    /// Returns immediately; hydration runs on the store's task. Commands
    /// issued before it finishes are applied on top of the hydrated cart.
    ///
    /// A `queue_capacity` of 0 is treated as 1; [`open`](Self::open) rejects
    /// it through [`StoreConfig::validate`].
    pub fn new(storage: Arc<dyn KeyValueStorage>, config: &StoreConfig) -> Self {
        let store_id = Uuid::new_v4();
        let key = config.storage.key.clone();
        let mut persistence = config.persistence.clone();
        persistence.queue_capacity = persistence.queue_capacity.max(1);
        let queue_capacity = persistence.queue_capacity;

        let (failures, startup_failures) = broadcast::channel(queue_capacity);

        let (writer, writer_handle) = PersistWriter::new(
            store_id,
            key.clone(),
            storage.clone(),
            persistence,
            failures.clone(),
        );
        let writer_task = tokio::spawn(writer.run());

        let (actor, handle) = CartActor::new(
            store_id,
            key,
            storage,
            queue_capacity,
            writer_handle,
            writer_task,
            failures,
        );
        let actor_task = tokio::spawn(actor.run());

        info!(store_id = %store_id, "Cart provider created");

        CartProvider {
            handle,
            actor_task,
            startup_failures: Mutex::new(Some(startup_failures)),
        }
    }

    /// Opens the configured storage backend and starts a store over it.
    pub async fn open(config: &StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let storage = storage::open(config).await?;
        Ok(Self::new(storage, config))
    }

    /// A handle to this provider's store, usable outside any scope.
    pub fn handle(&self) -> CartHandle {
        self.handle.clone()
    }

    pub fn store_id(&self) -> Uuid {
        self.handle.store_id()
    }

    /// Receiver for storage failures, hydration included.
    ///
    /// The first call returns a receiver that was subscribed before the
    /// store started, so a failed startup read is always delivered to it.
    /// Later calls behave like [`CartHandle::failures`].
    pub fn failures(&self) -> broadcast::Receiver<PersistFailure> {
        let early = self
            .startup_failures
            .lock()
            .ok()
            .and_then(|mut slot| slot.take());
        early.unwrap_or_else(|| self.handle.failures())
    }

    /// Runs `fut` with this provider's cart as the active one.
    pub async fn scope<F: Future>(&self, fut: F) -> F::Output {
        ACTIVE_CART.scope(self.handle.clone(), fut).await
    }

    /// Runs `f` synchronously with this provider's cart as the active one.
    pub fn scope_sync<R>(&self, f: impl FnOnce() -> R) -> R {
        ACTIVE_CART.sync_scope(self.handle.clone(), f)
    }

    /// Stops accepting commands, applies those already queued, writes the
    /// final snapshot, and waits for both tasks to exit.
    ///
    /// Other handles fail with `StoreClosed` afterwards.
    pub async fn shutdown(self) -> StoreResult<()> {
        let store_id = self.store_id();
        info!(store_id = %store_id, "Shutting down cart provider");

        match self.handle.shutdown().await {
            Ok(()) | Err(StoreError::StoreClosed) => {}
            Err(e) => return Err(e),
        }

        if let Err(e) = self.actor_task.await {
            warn!(store_id = %store_id, error = %e, "Cart store task panicked");
            return Err(StoreError::ChannelError(e.to_string()));
        }

        Ok(())
    }
}
