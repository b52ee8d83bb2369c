//! Integration tests for `PgTripStore`.
//!
//! These require a running PostgreSQL instance with the migrations in
//! `migrations/` applied. Set `TEST_DATABASE_URL` and run with
//! `cargo test --test trip_store_integration -- --ignored`.

use matcher_core::ports::{
    ExtendTripCommit, NewTripCommit, TripPassengerInput, TripStore,
};
use matcher_core::pool::PoolStatus;
use matcher_trips::db::{create_pool, DatabaseConfig};
use matcher_trips::PgTripStore;
use sqlx::PgPool;

async fn test_pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set to run matcher_trips integration tests");
    create_pool(&DatabaseConfig {
        url,
        ..Default::default()
    })
    .await
    .expect("connect to test database")
}

async fn seed_users(pool: &PgPool, user_ids: &[&str]) {
    for id in user_ids {
        sqlx::query("INSERT INTO users (user_id) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(id)
            .execute(pool)
            .await
            .unwrap();
    }
}

fn passenger(user_id: &str, price: f64) -> TripPassengerInput {
    TripPassengerInput {
        user_id: user_id.to_string(),
        passenger_count: 1,
        luggage_units: 1,
        issued_price: price,
    }
}

#[tokio::test]
#[ignore]
async fn commit_new_trip_creates_trip_and_ride_requests() {
    let pool = test_pool().await;
    seed_users(&pool, &["rider-a", "rider-b"]).await;
    let store = PgTripStore::new(pool);

    let snapshot = store
        .commit_new_trip(NewTripCommit {
            trip_id: "TRIPTEST1".to_string(),
            status: PoolStatus::Active,
            fare_each: 18.0,
            passenger_count: 2,
            luggage_units: 2,
            passengers: vec![passenger("rider-a", 22.0), passenger("rider-b", 18.0)],
        })
        .await
        .unwrap()
        .expect("new trip commits");

    assert_eq!(snapshot.trip_id, "TRIPTEST1");
    assert_eq!(snapshot.status, "ACTIVE");
    assert_eq!(snapshot.ride_requests.len(), 2);
}

#[tokio::test]
#[ignore]
async fn commit_new_trip_returns_none_for_unknown_user() {
    let pool = test_pool().await;
    let store = PgTripStore::new(pool);

    let snapshot = store
        .commit_new_trip(NewTripCommit {
            trip_id: "TRIPTEST2".to_string(),
            status: PoolStatus::Waiting,
            fare_each: 10.0,
            passenger_count: 1,
            luggage_units: 1,
            passengers: vec![passenger("nobody", 10.0)],
        })
        .await
        .unwrap();

    assert!(snapshot.is_none());
}

#[tokio::test]
#[ignore]
async fn commit_extend_trip_adds_caller_and_updates_fare() {
    let pool = test_pool().await;
    seed_users(&pool, &["rider-c", "rider-d"]).await;
    let store = PgTripStore::new(pool);

    store
        .commit_new_trip(NewTripCommit {
            trip_id: "TRIPTEST3".to_string(),
            status: PoolStatus::Waiting,
            fare_each: 20.0,
            passenger_count: 1,
            luggage_units: 1,
            passengers: vec![passenger("rider-c", 20.0)],
        })
        .await
        .unwrap()
        .expect("seed trip commits");

    let snapshot = store
        .commit_extend_trip(ExtendTripCommit {
            trip_id: "TRIPTEST3".to_string(),
            caller: passenger("rider-d", 14.0),
            status: PoolStatus::Active,
            fare_each: 14.0,
            passenger_count: 2,
            luggage_units: 2,
            backfill_members: vec![],
        })
        .await
        .unwrap()
        .expect("extend commits");

    assert_eq!(snapshot.status, "ACTIVE");
    assert_eq!(snapshot.fare_each, 14.0);
    assert_eq!(snapshot.ride_requests.len(), 2);
    assert!(snapshot.ride_requests.iter().all(|r| r.status == "ACTIVE"));
}

#[tokio::test]
#[ignore]
async fn cancel_trip_marks_status_cancelled() {
    let pool = test_pool().await;
    seed_users(&pool, &["rider-e"]).await;
    let store = PgTripStore::new(pool);

    store
        .commit_new_trip(NewTripCommit {
            trip_id: "TRIPTEST4".to_string(),
            status: PoolStatus::Waiting,
            fare_each: 9.0,
            passenger_count: 1,
            luggage_units: 1,
            passengers: vec![passenger("rider-e", 9.0)],
        })
        .await
        .unwrap();

    store.cancel_trip("TRIPTEST4").await.unwrap();
}
