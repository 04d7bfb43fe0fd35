//! End-to-end tests for the order aggregate: transactional create/cancel
//! and the retrieval strategy family, all against an in-memory SQLite
//! database.

use shop_core::{Address, CoreError, Item, Member, OrderStatus};
use shop_db::{Database, DbConfig, DbError, FetchShape, OrderLine, OrderSearch, Page};

const ALL_SHAPES: [FetchShape; 6] = [
    FetchShape::NaiveGraph,
    FetchShape::JoinFetchCollection,
    FetchShape::JoinFetchBatched,
    FetchShape::Projection,
    FetchShape::ProjectionBatched,
    FetchShape::FlatProjection,
];

const PAGEABLE_SHAPES: [FetchShape; 4] = [
    FetchShape::NaiveGraph,
    FetchShape::JoinFetchBatched,
    FetchShape::Projection,
    FetchShape::ProjectionBatched,
];

async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// Inserts a member with two stocked books and places one order:
/// book1 × count1 and book2 × count2 at the items' current prices.
async fn place_order(
    db: &Database,
    name: &str,
    address: Address,
    books: [(&str, i64, i64); 2],
    counts: [i64; 2],
) -> (Member, Item, Item, String) {
    let member = Member::new(name, address);
    db.members().insert(&member).await.unwrap();

    let book1 = Item::book(books[0].0, books[0].1, books[0].2, "kim", "11111");
    let book2 = Item::book(books[1].0, books[1].1, books[1].2, "kim", "22222");
    db.items().insert(&book1).await.unwrap();
    db.items().insert(&book2).await.unwrap();

    let lines = vec![
        OrderLine {
            item_id: book1.id.clone(),
            order_price: book1.price,
            count: counts[0],
        },
        OrderLine {
            item_id: book2.id.clone(),
            order_price: book2.price,
            count: counts[1],
        },
    ];
    let order_id = db.orders().create_order(&member.id, &lines).await.unwrap();

    (member, book1, book2, order_id)
}

/// The canonical fixture: userA in Seoul ordering JPA BOOK ×1 and
/// JPA BOOK2 ×2, both starting at stock 100.
async fn user_a_order(db: &Database) -> (Member, Item, Item, String) {
    place_order(
        db,
        "userA",
        Address::new("Seoul", "1", "111"),
        [("JPA BOOK", 10_000, 100), ("JPA BOOK2", 20_000, 100)],
        [1, 2],
    )
    .await
}

async fn stock_of(db: &Database, item_id: &str) -> i64 {
    db.items()
        .get_by_id(item_id)
        .await
        .unwrap()
        .unwrap()
        .stock_quantity
}

// =============================================================================
// Create / Cancel
// =============================================================================

#[tokio::test]
async fn create_order_debits_stock_and_computes_total() {
    let db = test_db().await;
    let (_, book1, book2, order_id) = user_a_order(&db).await;

    let order = db.orders().get_by_id(&order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Order);
    assert_eq!(order.total_price(), 50_000);
    assert_eq!(order.order_items.len(), 2);
    assert_eq!(order.delivery.address, Address::new("Seoul", "1", "111"));

    assert_eq!(stock_of(&db, &book1.id).await, 99);
    assert_eq!(stock_of(&db, &book2.id).await, 98);
}

#[tokio::test]
async fn create_order_is_all_or_nothing_when_a_later_debit_fails() {
    let db = test_db().await;

    let member = Member::new("userA", Address::new("Seoul", "1", "111"));
    db.members().insert(&member).await.unwrap();

    let plenty = Item::book("JPA BOOK", 10_000, 100, "kim", "11111");
    let scarce = Item::book("JPA BOOK2", 20_000, 1, "kim", "22222");
    db.items().insert(&plenty).await.unwrap();
    db.items().insert(&scarce).await.unwrap();

    let lines = vec![
        OrderLine {
            item_id: plenty.id.clone(),
            order_price: 10_000,
            count: 5,
        },
        OrderLine {
            item_id: scarce.id.clone(),
            order_price: 20_000,
            count: 2,
        },
    ];
    let err = db.orders().create_order(&member.id, &lines).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::InsufficientStock { .. })
    ));

    // The first debit succeeded inside the transaction, then rolled back:
    // both items show unchanged stock and no order was persisted
    assert_eq!(stock_of(&db, &plenty.id).await, 100);
    assert_eq!(stock_of(&db, &scarce.id).await, 1);
    assert!(db
        .orders()
        .load_orders(&OrderSearch::any(), FetchShape::NaiveGraph, None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn create_order_rejects_unknown_member_item_and_empty_lines() {
    let db = test_db().await;

    let member = Member::new("userA", Address::new("Seoul", "1", "111"));
    db.members().insert(&member).await.unwrap();

    let err = db.orders().create_order(&member.id, &[]).await.unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::EmptyOrder)));

    let line = OrderLine {
        item_id: "missing-item".to_string(),
        order_price: 1_000,
        count: 1,
    };
    let err = db
        .orders()
        .create_order(&member.id, std::slice::from_ref(&line))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));

    let err = db
        .orders()
        .create_order("missing-member", std::slice::from_ref(&line))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));
}

#[tokio::test]
async fn cancel_restores_stock_and_flips_status() {
    let db = test_db().await;
    let (_, book1, book2, order_id) = user_a_order(&db).await;

    db.orders().cancel_order(&order_id).await.unwrap();

    let order = db.orders().get_by_id(&order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Cancel);
    assert_eq!(stock_of(&db, &book1.id).await, 100);
    assert_eq!(stock_of(&db, &book2.id).await, 100);

    // Cancelled orders retain their historical total
    assert_eq!(order.total_price(), 50_000);
}

#[tokio::test]
async fn cancel_is_rejected_once_delivery_completed() {
    let db = test_db().await;
    let (_, book1, _, order_id) = user_a_order(&db).await;

    sqlx::query("UPDATE deliveries SET status = 'COMP' WHERE order_id = ?1")
        .bind(&order_id)
        .execute(db.pool())
        .await
        .unwrap();

    let err = db.orders().cancel_order(&order_id).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::DeliveryCompleted { .. })
    ));

    let order = db.orders().get_by_id(&order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Order);
    assert_eq!(stock_of(&db, &book1.id).await, 99);
}

#[tokio::test]
async fn cancelling_twice_never_credits_stock_twice() {
    let db = test_db().await;
    let (_, book1, book2, order_id) = user_a_order(&db).await;

    db.orders().cancel_order(&order_id).await.unwrap();
    db.orders().cancel_order(&order_id).await.unwrap();

    assert_eq!(stock_of(&db, &book1.id).await, 100);
    assert_eq!(stock_of(&db, &book2.id).await, 100);
}

#[tokio::test]
async fn cancel_unknown_order_is_not_found() {
    let db = test_db().await;
    let err = db.orders().cancel_order("missing").await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));
}

// =============================================================================
// Retrieval Strategies
// =============================================================================

async fn two_order_fixture(db: &Database) {
    user_a_order(db).await;
    place_order(
        db,
        "userB",
        Address::new("Jinju", "2", "22222"),
        [("SPRING BOOK", 20_000, 200), ("SPRING BOOK2", 40_000, 300)],
        [3, 4],
    )
    .await;
}

#[tokio::test]
async fn all_strategies_agree_on_the_unpaged_result() {
    let db = test_db().await;
    two_order_fixture(&db).await;

    let reference = db
        .orders()
        .load_orders(&OrderSearch::any(), FetchShape::NaiveGraph, None)
        .await
        .unwrap();
    assert_eq!(reference.len(), 2);
    assert_eq!(reference[0].member_name, "userA");
    assert_eq!(reference[0].order_items.len(), 2);
    assert_eq!(reference[0].order_items[0].item_name, "JPA BOOK");
    assert_eq!(reference[0].order_items[1].item_name, "JPA BOOK2");
    assert_eq!(reference[1].member_name, "userB");

    for shape in ALL_SHAPES {
        let views = db
            .orders()
            .load_orders(&OrderSearch::any(), shape, None)
            .await
            .unwrap();
        assert_eq!(views, reference, "shape {shape:?} diverged");
    }
}

#[tokio::test]
async fn pageable_strategies_agree_per_page() {
    let db = test_db().await;
    two_order_fixture(&db).await;

    for page in [Page::new(0, 1), Page::new(1, 1)] {
        let reference = db
            .orders()
            .load_orders(&OrderSearch::any(), FetchShape::NaiveGraph, Some(page))
            .await
            .unwrap();
        assert_eq!(reference.len(), 1);

        for shape in PAGEABLE_SHAPES {
            let views = db
                .orders()
                .load_orders(&OrderSearch::any(), shape, Some(page))
                .await
                .unwrap();
            assert_eq!(views, reference, "shape {shape:?} diverged on {page:?}");
        }
    }

    // The two windows cover the set without overlap
    let first = db
        .orders()
        .load_orders(&OrderSearch::any(), FetchShape::Projection, Some(Page::new(0, 1)))
        .await
        .unwrap();
    let second = db
        .orders()
        .load_orders(&OrderSearch::any(), FetchShape::Projection, Some(Page::new(1, 1)))
        .await
        .unwrap();
    assert_ne!(first[0].order_id, second[0].order_id);
}

#[tokio::test]
async fn duplicating_strategies_reject_pagination() {
    let db = test_db().await;
    two_order_fixture(&db).await;

    for shape in [FetchShape::JoinFetchCollection, FetchShape::FlatProjection] {
        let err = db
            .orders()
            .load_orders(&OrderSearch::any(), shape, Some(Page::new(0, 1)))
            .await
            .unwrap_err();
        assert!(
            matches!(err, DbError::PaginationUnsupported { shape: s } if s == shape),
            "shape {shape:?} should reject pagination"
        );
    }
}

#[tokio::test]
async fn batched_children_work_with_tiny_batch_size() {
    let db = test_db().await;
    two_order_fixture(&db).await;

    let reference = db
        .orders()
        .load_orders(&OrderSearch::any(), FetchShape::NaiveGraph, None)
        .await
        .unwrap();

    // batch_size 1 forces one IN query per order; results must not change
    let views = db
        .orders()
        .with_batch_size(1)
        .load_orders(&OrderSearch::any(), FetchShape::JoinFetchBatched, None)
        .await
        .unwrap();
    assert_eq!(views, reference);
}

#[tokio::test]
async fn filters_apply_across_strategies() {
    let db = test_db().await;
    two_order_fixture(&db).await;

    // Cancel userA's order, then filter by status
    let user_a_orders = db
        .orders()
        .load_orders(
            &OrderSearch::any().member_name("userA"),
            FetchShape::ProjectionBatched,
            None,
        )
        .await
        .unwrap();
    assert_eq!(user_a_orders.len(), 1);
    db.orders()
        .cancel_order(&user_a_orders[0].order_id)
        .await
        .unwrap();

    for shape in ALL_SHAPES {
        let cancelled = db
            .orders()
            .load_orders(&OrderSearch::any().status(OrderStatus::Cancel), shape, None)
            .await
            .unwrap();
        assert_eq!(cancelled.len(), 1, "shape {shape:?}");
        assert_eq!(cancelled[0].member_name, "userA");

        let live = db
            .orders()
            .load_orders(&OrderSearch::any().status(OrderStatus::Order), shape, None)
            .await
            .unwrap();
        assert_eq!(live.len(), 1, "shape {shape:?}");
        assert_eq!(live[0].member_name, "userB");
    }

    // Substring member-name match
    let by_name = db
        .orders()
        .load_orders(
            &OrderSearch::any().member_name("serB"),
            FetchShape::FlatProjection,
            None,
        )
        .await
        .unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].member_name, "userB");
}

#[tokio::test]
async fn empty_result_sets_are_fine_for_every_strategy() {
    let db = test_db().await;

    for shape in ALL_SHAPES {
        let views = db
            .orders()
            .load_orders(&OrderSearch::any(), shape, None)
            .await
            .unwrap();
        assert!(views.is_empty(), "shape {shape:?}");
    }
}

// =============================================================================
// Derived Back-Reference
// =============================================================================

#[tokio::test]
async fn member_orders_are_a_derived_query_view() {
    let db = test_db().await;
    let (member, _, _, order_id) = user_a_order(&db).await;

    let orders = db.orders().find_by_member(&member.id).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, order_id);
    assert_eq!(orders[0].member_id, member.id);

    assert!(db.orders().find_by_member("missing").await.unwrap().is_empty());
}
