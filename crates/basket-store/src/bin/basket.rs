//! # basket CLI
//!
//! Runs one cart command against the configured storage backend and prints
//! the resulting cart.
//!
//! ## Usage
//! ```bash
//! # Show the persisted cart
//! cargo run -p basket-store --bin basket -- list
//!
//! # Add a product (price in cents), then bump it
//! cargo run -p basket-store --bin basket -- add p1 "Running Shoe" https://img/p1.png 4999
//! cargo run -p basket-store --bin basket -- inc p1
//!
//! # Use a specific config file
//! cargo run -p basket-store --bin basket -- --config ./basket.toml totals
//! ```
//!
//! Logs go to stderr (`RUST_LOG`, default `info,basket=debug,sqlx=warn`).

use std::env;
use std::path::PathBuf;

use basket_core::{Money, Product};
use basket_store::{
    CartHandle, CartProvider, FailedOperation, HydrationStatus, StorageBackend, StoreConfig,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// One parsed CLI command.
#[derive(Debug)]
enum Command {
    List,
    Add(Product),
    Inc(String),
    Dec(String),
    Remove(String),
    Clear,
    Totals,
}

const USAGE: &str = "\
Usage: basket [--config PATH] <COMMAND>

Commands:
  list                                  Show the cart
  add ID TITLE IMAGE_URL PRICE_CENTS    Add a product (or increment it)
  inc ID                                Increase quantity by one
  dec ID                                Decrease quantity by one (removes at zero)
  remove ID                             Remove an item
  clear                                 Empty the cart
  totals                                Show item count, quantity and subtotal

Options:
  -c, --config <PATH>   Config file (default: <config_dir>/basket.toml)
  -h, --help            Show this help message";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();

    let mut config_path: Option<PathBuf> = None;
    let mut rest: Vec<String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                let path = args.get(i + 1).ok_or("--config requires a path")?;
                config_path = Some(PathBuf::from(path));
                i += 1;
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                return Ok(());
            }
            _ => rest.push(args[i].clone()),
        }
        i += 1;
    }

    let command = match parse_command(&rest) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("error: {}", message);
            eprintln!();
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    let config = StoreConfig::load(config_path)?;
    if config.storage.backend == StorageBackend::Memory {
        warn!("Using the memory backend: changes are not kept after this command");
    }

    let provider = CartProvider::open(&config).await?;
    let mut failures = provider.failures();
    let cart = provider.handle();

    match cart.wait_hydrated().await? {
        HydrationStatus::Failed { reason } => warn!(%reason, "Started with an empty cart"),
        status => info!(?status, "Cart loaded"),
    }

    let outcome = run(&cart, command).await;

    cart.flush().await?;
    provider.shutdown().await?;

    while let Ok(failure) = failures.try_recv() {
        match failure.operation {
            FailedOperation::Hydrate => {
                eprintln!("warning: saved cart could not be read: {}", failure.error)
            }
            FailedOperation::Persist => eprintln!(
                "warning: revision {} was not saved after {} attempts: {}",
                failure.revision, failure.attempts, failure.error
            ),
        }
    }

    outcome
}

fn parse_command(args: &[String]) -> Result<Command, String> {
    let (name, params) = args.split_first().ok_or("missing command")?;

    let one_id = |cmd: &str| -> Result<String, String> {
        match params {
            [id] => Ok(id.clone()),
            _ => Err(format!("{} takes exactly one ID", cmd)),
        }
    };

    match name.as_str() {
        "list" => Ok(Command::List),
        "totals" => Ok(Command::Totals),
        "clear" => Ok(Command::Clear),
        "inc" => one_id("inc").map(Command::Inc),
        "dec" => one_id("dec").map(Command::Dec),
        "remove" => one_id("remove").map(Command::Remove),
        "add" => match params {
            [id, title, image_url, price] => {
                let cents: i64 = price
                    .parse()
                    .map_err(|_| format!("invalid PRICE_CENTS: {}", price))?;
                Ok(Command::Add(Product::new(
                    id.as_str(),
                    title.as_str(),
                    image_url.as_str(),
                    Money::from_cents(cents),
                )))
            }
            _ => Err("add takes ID TITLE IMAGE_URL PRICE_CENTS".to_string()),
        },
        other => Err(format!("unknown command: {}", other)),
    }
}

async fn run(cart: &CartHandle, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::List => {}
        Command::Totals => {
            let totals = cart.totals();
            println!("Items:    {}", totals.item_count);
            println!("Quantity: {}", totals.total_quantity);
            println!("Subtotal: {}", totals.subtotal);
            return Ok(());
        }
        Command::Add(product) => {
            let item = cart.add_to_cart(product).await?;
            println!("✓ {} × {}", item.id, item.quantity);
        }
        Command::Inc(id) => {
            let item = cart.increment(id).await?;
            println!("✓ {} × {}", item.id, item.quantity);
        }
        Command::Dec(id) => match cart.decrement(id.clone()).await? {
            Some(item) => println!("✓ {} × {}", item.id, item.quantity),
            None => println!("✓ {} removed", id),
        },
        Command::Remove(id) => {
            let item = cart.remove(id).await?;
            println!("✓ {} removed", item.id);
        }
        Command::Clear => {
            cart.clear().await?;
            println!("✓ Cart cleared");
        }
    }

    print_cart(cart);
    Ok(())
}

fn print_cart(cart: &CartHandle) {
    let items = cart.items();
    if items.is_empty() {
        println!("(cart is empty)");
        return;
    }

    println!();
    for item in &items {
        println!(
            "{:<16} {:<32} {:>4} × {:>10} = {:>10}",
            item.id,
            item.title,
            item.quantity,
            item.price.to_string(),
            item.line_total().to_string()
        );
    }
    println!("{:>79}", format!("Subtotal: {}", cart.totals().subtotal));
}

/// Initializes the tracing subscriber, writing to stderr.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=basket_store=trace` - Trace the store only
/// - Default: `info,basket=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,basket=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
