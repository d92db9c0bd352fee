//! End-to-end behavior of the cart store over the in-memory backend.

use std::sync::Arc;
use std::time::Duration;

use basket_core::{Cart, Money, Product, DEFAULT_STORAGE_KEY};
use basket_store::{
    use_cart, CartProvider, FailedOperation, HydrationStatus, MemoryStorage, PersistenceSettings,
    StoreConfig, StoreError,
};

fn shoe() -> Product {
    Product::new("p1", "Running Shoe", "https://img/p1.png", Money::from_cents(4999))
}

fn product(id: &str) -> Product {
    Product::new(id, format!("Product {}", id), "https://img/x.png", Money::from_cents(100))
}

fn fast_config() -> StoreConfig {
    StoreConfig {
        persistence: PersistenceSettings {
            queue_capacity: 64,
            max_attempts: 3,
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
            coalesce_writes: true,
        },
        ..StoreConfig::default()
    }
}

fn start(storage: &Arc<MemoryStorage>) -> CartProvider {
    CartProvider::new(storage.clone(), &fast_config())
}

async fn persisted(storage: &MemoryStorage) -> Cart {
    let blob = storage.value(DEFAULT_STORAGE_KEY).await.unwrap();
    Cart::from_json(&blob).unwrap().cart
}

#[tokio::test]
async fn add_to_fresh_cart_creates_single_entry() {
    let storage = Arc::new(MemoryStorage::new());
    let provider = start(&storage);
    let cart = provider.handle();

    let item = cart.add_to_cart(shoe()).await.unwrap();

    assert_eq!(item.id, "p1");
    assert_eq!(item.quantity, 1);
    assert_eq!(cart.items(), vec![item]);
}

#[tokio::test]
async fn add_increment_decrement_scenario() {
    let storage = Arc::new(MemoryStorage::new());
    let provider = start(&storage);
    let cart = provider.handle();

    cart.add_to_cart(shoe()).await.unwrap();
    assert_eq!(cart.increment("p1").await.unwrap().quantity, 2);

    let after_first = cart.decrement("p1").await.unwrap().unwrap();
    assert_eq!(after_first.quantity, 1);

    assert_eq!(cart.decrement("p1").await.unwrap(), None);
    assert!(cart.items().is_empty());

    cart.flush().await.unwrap();
    assert_eq!(
        storage.value(DEFAULT_STORAGE_KEY).await.as_deref(),
        Some("[]")
    );
}

#[tokio::test]
async fn increment_leaves_other_items_unchanged() {
    let storage = Arc::new(MemoryStorage::new());
    let provider = start(&storage);
    let cart = provider.handle();

    cart.add_to_cart(product("a")).await.unwrap();
    cart.add_to_cart(product("b")).await.unwrap();
    cart.increment("b").await.unwrap();

    let items = cart.items();
    assert_eq!(items[0].id, "a");
    assert_eq!(items[0].quantity, 1);
    assert_eq!(items[1].id, "b");
    assert_eq!(items[1].quantity, 2);
}

#[tokio::test]
async fn re_adding_an_item_increments_it() {
    let storage = Arc::new(MemoryStorage::new());
    let provider = start(&storage);
    let cart = provider.handle();

    cart.add_to_cart(shoe()).await.unwrap();
    let renamed = Product::new("p1", "Other title", "other", Money::from_cents(1));
    let item = cart.add_to_cart(renamed).await.unwrap();

    assert_eq!(item.quantity, 2);
    assert_eq!(item.title, "Running Shoe");
    assert_eq!(item.price, Money::from_cents(4999));
    assert_eq!(cart.items().len(), 1);
}

#[tokio::test]
async fn missing_item_is_reported_and_nothing_is_persisted() {
    let storage = Arc::new(MemoryStorage::new());
    let provider = start(&storage);
    let cart = provider.handle();

    cart.add_to_cart(shoe()).await.unwrap();
    cart.flush().await.unwrap();
    let writes_before = storage.write_count().await;
    let before = cart.cart();

    let err = cart.increment("missing-id").await.unwrap_err();
    assert!(err.is_item_not_found());
    let err = cart.decrement("missing-id").await.unwrap_err();
    assert!(err.is_item_not_found());

    cart.flush().await.unwrap();
    assert_eq!(cart.cart(), before);
    assert_eq!(storage.write_count().await, writes_before);
}

#[tokio::test]
async fn use_cart_resolves_inside_scope_only() {
    let storage = Arc::new(MemoryStorage::new());
    let provider = start(&storage);

    assert!(matches!(use_cart(), Err(StoreError::ScopeMisuse)));

    let quantity = provider
        .scope(async {
            let cart = use_cart()?;
            cart.add_to_cart(shoe()).await?;
            cart.increment("p1").await.map(|item| item.quantity)
        })
        .await
        .unwrap();
    assert_eq!(quantity, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_increments_are_not_lost() {
    const N: i64 = 50;

    let storage = Arc::new(MemoryStorage::new());
    let provider = start(&storage);
    let cart = provider.handle();
    cart.add_to_cart(shoe()).await.unwrap();

    let tasks: Vec<_> = (0..N)
        .map(|_| {
            let cart = cart.clone();
            tokio::spawn(async move { cart.increment("p1").await })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(cart.items()[0].quantity, 1 + N);

    cart.flush().await.unwrap();
    assert_eq!(persisted(&storage).await.get("p1").unwrap().quantity, 1 + N);
}

#[tokio::test]
async fn flush_leaves_latest_snapshot_in_storage() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set_write_delay(Some(Duration::from_millis(5))).await;
    let provider = start(&storage);
    let cart = provider.handle();

    for id in ["a", "b", "c", "d"] {
        cart.add_to_cart(product(id)).await.unwrap();
    }
    cart.increment("c").await.unwrap();
    cart.remove("a").await.unwrap();
    cart.flush().await.unwrap();

    assert_eq!(persisted(&storage).await, cart.cart());
}

#[tokio::test]
async fn writes_land_in_submission_order_without_coalescing() {
    let storage = Arc::new(MemoryStorage::new());
    let mut config = fast_config();
    config.persistence.coalesce_writes = false;
    let provider = CartProvider::new(storage.clone(), &config);
    let cart = provider.handle();

    cart.add_to_cart(shoe()).await.unwrap();
    cart.increment("p1").await.unwrap();
    cart.increment("p1").await.unwrap();
    cart.flush().await.unwrap();

    let quantities: Vec<i64> = storage
        .writes()
        .await
        .iter()
        .map(|(_, blob)| Cart::from_json(blob).unwrap().cart.get("p1").unwrap().quantity)
        .collect();
    assert_eq!(quantities, vec![1, 2, 3]);
}

#[tokio::test]
async fn failing_storage_reports_failure_and_keeps_state() {
    let storage = Arc::new(MemoryStorage::new());
    let provider = start(&storage);
    let cart = provider.handle();
    cart.wait_hydrated().await.unwrap();
    let mut failures = cart.failures();

    storage.fail_next_writes(3);
    let item = cart.add_to_cart(shoe()).await.unwrap();
    cart.flush().await.unwrap();

    let failure = failures.recv().await.unwrap();
    assert_eq!(failure.operation, FailedOperation::Persist);
    assert_eq!(failure.store_id, cart.store_id());
    assert_eq!(failure.key, DEFAULT_STORAGE_KEY);
    assert_eq!(failure.revision, 1);
    assert_eq!(failure.attempts, 3);

    assert_eq!(cart.items(), vec![item]);
    assert_eq!(storage.value(DEFAULT_STORAGE_KEY).await, None);

    // The next successful write carries the full cart.
    cart.increment("p1").await.unwrap();
    cart.flush().await.unwrap();
    assert_eq!(persisted(&storage).await.get("p1").unwrap().quantity, 2);
}

#[tokio::test]
async fn transient_write_failure_is_retried() {
    let storage = Arc::new(MemoryStorage::new());
    let provider = start(&storage);
    let cart = provider.handle();
    cart.wait_hydrated().await.unwrap();
    let mut failures = cart.failures();

    storage.fail_next_writes(2);
    cart.add_to_cart(shoe()).await.unwrap();
    cart.flush().await.unwrap();

    assert_eq!(persisted(&storage).await.len(), 1);
    assert!(failures.try_recv().is_err());
}

#[tokio::test]
async fn persisted_cart_hydrates_to_equal_sequence() {
    let storage = Arc::new(MemoryStorage::new());

    let original = {
        let provider = start(&storage);
        let cart = provider.handle();
        cart.add_to_cart(product("x")).await.unwrap();
        cart.add_to_cart(product("y")).await.unwrap();
        cart.increment("x").await.unwrap();
        let items = cart.items();
        provider.shutdown().await.unwrap();
        items
    };

    let provider = start(&storage);
    let cart = provider.handle();
    assert_eq!(
        cart.wait_hydrated().await.unwrap(),
        HydrationStatus::Loaded { items: 2, dropped: 0 }
    );
    assert_eq!(cart.items(), original);
}

#[tokio::test]
async fn lenient_hydration_drops_invalid_entries() {
    let blob = r#"[
        {"id":"p1","title":"Shoe","image_url":"u","price":100,"quantity":2},
        {},
        {"id":"p2","title":"Hat","image_url":"u","price":50,"quantity":0},
        {"id":"p1","title":"Dup","image_url":"u","price":1,"quantity":9},
        {"id":"p3","title":"Sock","image_url":"u","price":25,"quantity":1}
    ]"#;
    let storage = Arc::new(MemoryStorage::with_entry(DEFAULT_STORAGE_KEY, blob));
    let provider = start(&storage);
    let cart = provider.handle();

    assert_eq!(
        cart.wait_hydrated().await.unwrap(),
        HydrationStatus::Loaded { items: 2, dropped: 3 }
    );

    let ids: Vec<String> = cart.items().into_iter().map(|i| i.id).collect();
    assert_eq!(ids, vec!["p1", "p3"]);
    assert_eq!(cart.items()[0].quantity, 2);
}

#[tokio::test]
async fn legacy_blob_with_fractional_prices_hydrates_intact() {
    let blob = r#"[
        {"id":"1","title":"Camiseta","image_url":"u","price":179.9,"quantity":2},
        {"id":"2","title":"","image_url":"u","price":20,"quantity":1200}
    ]"#;
    let storage = Arc::new(MemoryStorage::with_entry(DEFAULT_STORAGE_KEY, blob));
    let provider = start(&storage);
    let cart = provider.handle();

    assert_eq!(
        cart.wait_hydrated().await.unwrap(),
        HydrationStatus::Loaded { items: 2, dropped: 0 }
    );

    let items = cart.items();
    assert_eq!(items[0].price, Money::from_cents(17990));
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[1].title, "");
    assert_eq!(items[1].quantity, basket_core::MAX_ITEM_QUANTITY);

    // The next write keeps the prices in the shape they were read in.
    cart.increment("1").await.unwrap();
    cart.flush().await.unwrap();
    let blob = storage.value(DEFAULT_STORAGE_KEY).await.unwrap();
    assert!(blob.contains(r#""price":179.9"#));
    assert_eq!(persisted(&storage).await.get("1").unwrap().quantity, 3);
}

#[tokio::test]
async fn undecodable_blob_starts_empty() {
    let storage = Arc::new(MemoryStorage::with_entry(DEFAULT_STORAGE_KEY, "not json"));
    let provider = start(&storage);
    let mut failures = provider.failures();
    let cart = provider.handle();

    let status = cart.wait_hydrated().await.unwrap();
    assert!(matches!(status, HydrationStatus::Failed { .. }));
    assert!(cart.items().is_empty());

    let failure = failures.recv().await.unwrap();
    assert_eq!(failure.operation, FailedOperation::Hydrate);
    assert_eq!(failure.key, DEFAULT_STORAGE_KEY);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn hydration_failure_reaches_provider_failures_on_multi_thread_runtime() {
    let storage = Arc::new(MemoryStorage::new());
    storage.fail_reads(true);
    let provider = start(&storage);

    // Subscribed only after hydration has finished.
    provider.handle().wait_hydrated().await.unwrap();
    let mut failures = provider.failures();

    let failure = failures.recv().await.unwrap();
    assert_eq!(failure.operation, FailedOperation::Hydrate);
    assert_eq!(failure.revision, 0);
}

#[tokio::test]
async fn zero_queue_capacity_does_not_panic() {
    let storage = Arc::new(MemoryStorage::new());
    let mut config = fast_config();
    config.persistence.queue_capacity = 0;
    let provider = CartProvider::new(storage.clone(), &config);
    let cart = provider.handle();

    cart.add_to_cart(shoe()).await.unwrap();
    cart.flush().await.unwrap();

    assert_eq!(persisted(&storage).await.len(), 1);
}

#[tokio::test]
async fn read_failure_starts_empty_and_store_stays_usable() {
    let storage = Arc::new(MemoryStorage::with_entry(DEFAULT_STORAGE_KEY, "[]"));
    storage.fail_reads(true);
    let provider = start(&storage);
    let cart = provider.handle();

    let status = cart.wait_hydrated().await.unwrap();
    assert!(matches!(status, HydrationStatus::Failed { ref reason } if reason.contains("injected")));

    cart.add_to_cart(shoe()).await.unwrap();
    cart.flush().await.unwrap();
    assert_eq!(persisted(&storage).await.len(), 1);
}

#[tokio::test]
async fn missing_key_hydrates_empty() {
    let storage = Arc::new(MemoryStorage::new());
    let provider = start(&storage);

    assert_eq!(
        provider.handle().wait_hydrated().await.unwrap(),
        HydrationStatus::Empty
    );
}

#[tokio::test]
async fn commands_issued_before_hydration_apply_on_top() {
    let blob = r#"[{"id":"p1","title":"Shoe","image_url":"u","price":100,"quantity":2}]"#;
    let storage = Arc::new(MemoryStorage::with_entry(DEFAULT_STORAGE_KEY, blob));
    let provider = start(&storage);
    let cart = provider.handle();

    // Sent immediately, before the actor has necessarily read storage.
    let item = cart.increment("p1").await.unwrap();
    assert_eq!(item.quantity, 3);
}

#[tokio::test]
async fn subscribers_see_every_change() {
    let storage = Arc::new(MemoryStorage::new());
    let provider = start(&storage);
    let cart = provider.handle();
    cart.wait_hydrated().await.unwrap();

    let mut rx = cart.subscribe();
    rx.borrow_and_update();

    cart.add_to_cart(shoe()).await.unwrap();
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().len(), 1);

    cart.clear().await.unwrap();
    rx.changed().await.unwrap();
    assert!(rx.borrow().is_empty());
}

#[tokio::test]
async fn totals_track_cart() {
    let storage = Arc::new(MemoryStorage::new());
    let provider = start(&storage);
    let cart = provider.handle();

    cart.add_to_cart(shoe()).await.unwrap();
    cart.increment("p1").await.unwrap();
    cart.add_to_cart(product("b")).await.unwrap();

    let totals = cart.totals();
    assert_eq!(totals.item_count, 2);
    assert_eq!(totals.total_quantity, 3);
    assert_eq!(totals.subtotal, Money::from_cents(2 * 4999 + 100));
}

#[tokio::test]
async fn shutdown_drains_queued_commands() {
    let storage = Arc::new(MemoryStorage::new());
    let provider = start(&storage);
    let cart = provider.handle();

    let background = {
        let cart = cart.clone();
        tokio::spawn(async move {
            cart.add_to_cart(shoe()).await.unwrap();
            cart.increment("p1").await.unwrap();
        })
    };
    background.await.unwrap();

    provider.shutdown().await.unwrap();

    assert_eq!(persisted(&storage).await.get("p1").unwrap().quantity, 2);
    assert!(matches!(cart.clear().await, Err(StoreError::StoreClosed)));
}
