//! # Seed Data Generator
//!
//! Populates the database with the two sample orders used throughout
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database file
//! cargo run -p shop-db --bin seed
//!
//! # Specify database path
//! cargo run -p shop-db --bin seed -- --db ./data/shop.db
//! ```
//!
//! ## Generated Data
//! - userA (Seoul): JPA BOOK 10000 ×1 + JPA BOOK2 20000 ×2
//! - userB (Jinju): SPRING BOOK 20000 ×3 + SPRING BOOK2 40000 ×4
//!
//! Orders go through the real `create_order` path, so the seeded items
//! end up with their stock already debited.

use std::env;

use shop_core::{Address, Item, Member};
use shop_db::{Database, DbConfig, OrderLine};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let db_path = parse_db_path().unwrap_or_else(|| "./shop.db".to_string());

    tracing::info!(path = %db_path, "Seeding database");

    let db = match Database::new(DbConfig::new(&db_path)).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(error = %e, "Failed to open database");
            std::process::exit(1);
        }
    };

    if let Err(e) = seed(&db).await {
        tracing::error!(error = %e, "Seeding failed");
        std::process::exit(1);
    }

    tracing::info!("Seed complete");
}

/// Parses `--db <path>` from the command line.
fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1).cloned())
}

async fn seed(db: &Database) -> shop_db::DbResult<()> {
    seed_member_order(
        db,
        Member::new("userA", Address::new("Seoul", "1", "111")),
        [
            (Item::book("JPA BOOK", 10_000, 100, "kim", "11111"), 1),
            (Item::book("JPA BOOK2", 20_000, 100, "kim", "22222"), 2),
        ],
    )
    .await?;

    seed_member_order(
        db,
        Member::new("userB", Address::new("Jinju", "2", "22222")),
        [
            (Item::book("SPRING BOOK", 20_000, 200, "lee", "33333"), 3),
            (Item::book("SPRING BOOK2", 40_000, 300, "lee", "44444"), 4),
        ],
    )
    .await?;

    Ok(())
}

/// Inserts one member with their items, then places one order for the
/// given counts at the items' current prices.
async fn seed_member_order(
    db: &Database,
    member: Member,
    items: [(Item, i64); 2],
) -> shop_db::DbResult<()> {
    db.members().insert(&member).await?;

    let mut lines = Vec::new();
    for (item, count) in &items {
        db.items().insert(item).await?;
        lines.push(OrderLine {
            item_id: item.id.clone(),
            order_price: item.price,
            count: *count,
        });
    }

    let order_id = db.orders().create_order(&member.id, &lines).await?;
    tracing::info!(member = %member.name, order_id = %order_id, "Seeded order");

    Ok(())
}
