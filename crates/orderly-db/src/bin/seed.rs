//! # Seed Data Generator
//!
//! Populates the database with demo users, products and orders.
//!
//! ## Usage
//! ```bash
//! # 50 users, 200 products, 1,000 orders (default)
//! cargo run -p orderly-db --bin seed
//!
//! # Custom amounts
//! cargo run -p orderly-db --bin seed -- --users 500 --products 2000 --orders 20000
//!
//! # Specify database path, with storage logs
//! RUST_LOG=orderly_db=debug cargo run -p orderly-db --bin seed -- --db ./data/orderly.db
//! ```
//!
//! ## Generated Data
//! Data is deterministic: the same arguments always produce the same rows.
//! - Users: `{First} {Last}` with a unique `first.last.N@example.com`
//! - Products: `{Adjective} {Noun}` priced $1.99 - $249.99 with 0 - 120 in stock
//! - Orders: placed through `OrderManager`, so stock limits apply and some
//!   placements are rejected with `INSUFFICIENT_STOCK`

use std::env;
use std::time::Instant;

use orderly_core::{
    FailureKind, Money, NewProduct, NewUser, PageRequest, TopProduct, DEFAULT_SPEND_THRESHOLD,
};
use orderly_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Grace", "Alan", "Barbara", "Edsger", "Frances", "Donald", "Margaret", "Ken", "Radia",
    "Dennis", "Hedy", "Linus", "Katherine", "Niklaus", "Karen",
];

const LAST_NAMES: &[&str] = &[
    "Lovelace", "Hopper", "Turing", "Liskov", "Dijkstra", "Allen", "Knuth", "Hamilton", "Thompson",
    "Perlman", "Ritchie", "Lamarr", "Torvalds", "Johnson", "Wirth", "Jones",
];

const ADJECTIVES: &[&str] = &[
    "Walnut", "Steel", "Linen", "Ceramic", "Copper", "Oak", "Glass", "Leather", "Bamboo", "Wool",
];

const NOUNS: &[&str] = &[
    "Desk Lamp", "Mug", "Notebook", "Chair", "Shelf", "Kettle", "Backpack", "Clock", "Planter",
    "Blanket", "Tray", "Stool",
];

struct Args {
    db_path: String,
    users: usize,
    products: usize,
    orders: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Some(args) = parse_args() else {
        return Ok(());
    };

    println!("🌱 Orderly Seed Data Generator");
    println!("==============================");
    println!("Database: {}", args.db_path);
    println!("Users:    {}", args.users);
    println!("Products: {}", args.products);
    println!("Orders:   {}", args.orders);
    println!();

    let mut config = DbConfig::from_env()?;
    config.database_path = args.db_path.clone().into();
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing data
    let existing = db.users().count().await? + db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} users and products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        db.close().await;
        return Ok(());
    }

    let start = Instant::now();

    let mut user_ids = Vec::with_capacity(args.users);
    for seed in 0..args.users {
        match db.users().insert(&generate_user(seed)).await {
            Ok(user) => user_ids.push(user.id),
            Err(e) => warn!(seed, error = %e, "Failed to insert user"),
        }
    }
    println!("✓ Generated {} users", user_ids.len());

    let mut products = Vec::with_capacity(args.products);
    for seed in 0..args.products {
        match db.products().insert(&generate_product(seed)).await {
            Ok(product) => products.push((product.id, product.price())),
            Err(e) => warn!(seed, error = %e, "Failed to insert product"),
        }
    }
    println!("✓ Generated {} products", products.len());

    if user_ids.is_empty() || products.is_empty() {
        println!("⚠ Nothing to order");
        db.close().await;
        return Ok(());
    }

    println!();
    println!("Placing orders...");

    let manager = db.order_manager();
    let mut placed = 0;
    let mut out_of_stock = 0;
    let mut failed = 0;
    let mut revenue = Money::zero();

    for i in 0..args.orders {
        let user_id = user_ids[(i * 7) % user_ids.len()];
        let (product_id, price) = products[(i * 13 + i / 5) % products.len()];
        let quantity = 1 + (i % 4) as i64;

        let outcome = manager.place_order(user_id, product_id, quantity).await;
        if outcome.success {
            placed += 1;
            revenue += price * quantity;
        } else if outcome.is(FailureKind::InsufficientStock) {
            out_of_stock += 1;
        } else {
            failed += 1;
        }

        if (i + 1) % 1000 == 0 {
            println!("  Processed {} orders...", i + 1);
        }
    }

    let elapsed = start.elapsed();
    info!(
        placed,
        out_of_stock,
        failed,
        revenue_cents = revenue.cents(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Seed complete"
    );

    println!();
    println!("✓ Placed {} orders in {:?}", placed, elapsed);
    println!("  Revenue: {}", revenue);
    println!("  Rejected (insufficient stock): {}", out_of_stock);
    if failed > 0 {
        println!("  ⚠ Failed: {}", failed);
    }

    // Sanity check the analytical layer
    println!();
    println!("Verifying analytics...");
    let sample = PageRequest::first(3)?;

    let pairs = db.analytics().cross_combination(None, sample).await?;
    if let Some(pair) = pairs.data.first() {
        println!(
            "  Combinations: {} (first: {} / {} at {})",
            pairs.metadata.total_records,
            pair.user_name,
            pair.product_name,
            pair.price()
        );
    }

    let spenders = db
        .analytics()
        .users_above_threshold(DEFAULT_SPEND_THRESHOLD, sample)
        .await?;
    println!(
        "  Users above {}: {}",
        DEFAULT_SPEND_THRESHOLD, spenders.metadata.total_records
    );
    if let Some(biggest) = spenders.data.first() {
        println!("  Biggest spender: {} ({})", biggest.user_name, biggest.total_spent());
    }

    let top = db.analytics().top_product_per_user(sample).await?;
    let shown: Money = top.data.iter().map(TopProduct::total_value).sum();
    println!("  Top products (first {}, {} total):", sample.page_size(), shown);
    println!("{}", serde_json::to_string_pretty(&top)?);

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Parses command line arguments. Returns `None` when help was printed.
fn parse_args() -> Option<Args> {
    let argv: Vec<String> = env::args().collect();

    let mut args = Args {
        db_path: String::from("./orderly_dev.db"),
        users: 50,
        products: 200,
        orders: 1000,
    };

    let mut i = 1;
    while i < argv.len() {
        let value = argv.get(i + 1);
        match argv[i].as_str() {
            "--db" | "-d" => {
                if let Some(v) = value {
                    args.db_path = v.clone();
                    i += 1;
                }
            }
            "--users" | "-u" => {
                if let Some(v) = value {
                    args.users = v.parse().unwrap_or(args.users);
                    i += 1;
                }
            }
            "--products" | "-p" => {
                if let Some(v) = value {
                    args.products = v.parse().unwrap_or(args.products);
                    i += 1;
                }
            }
            "--orders" | "-o" => {
                if let Some(v) = value {
                    args.orders = v.parse().unwrap_or(args.orders);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Orderly Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>        Database file path (default: ./orderly_dev.db)");
                println!("  -u, --users <N>        Number of users (default: 50)");
                println!("  -p, --products <N>     Number of products (default: 200)");
                println!("  -o, --orders <N>       Number of order placements (default: 1000)");
                println!("  -h, --help             Show this help message");
                println!();
                println!("Pool and timeout settings are read from ORDERLY_* variables.");
                return None;
            }
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    Some(args)
}

fn generate_user(seed: usize) -> NewUser {
    let first = FIRST_NAMES[seed % FIRST_NAMES.len()];
    let last = LAST_NAMES[(seed / FIRST_NAMES.len() + seed) % LAST_NAMES.len()];

    NewUser::new(
        format!("{} {}", first, last),
        format!("{}.{}.{}@example.com", first, last, seed).to_lowercase(),
    )
}

fn generate_product(seed: usize) -> NewProduct {
    let adjective = ADJECTIVES[seed % ADJECTIVES.len()];
    let noun = NOUNS[(seed / ADJECTIVES.len()) % NOUNS.len()];

    // $1.99 - $249.99
    let price_cents = 199 + ((seed * 37) % 24_800) as i64;

    // 0 - 120 units
    let stock = ((seed * 53) % 121) as i64;

    NewProduct::new(format!("{} {}", adjective, noun), Money::from_cents(price_cents), stock)
}
