//! Ports the Matching Engine is programmed against. Adapter crates
//! (`matcher_pool`, `matcher_trips`, `matcher_bus`) provide the
//! implementations; `matcher_core`'s own tests use simple in-memory doubles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pool::{PoolEntry, PoolStatus};

#[derive(Debug, Error)]
#[error("pool store error: {0}")]
pub struct PoolError(pub String);

#[derive(Debug, Error)]
#[error("trip store error: {0}")]
pub struct TripStoreError(pub String);

/// The shared lex-ordered set plus per-entry metadata.
///
/// `zrem`'s return value (count actually removed) is the pairing commit
/// discriminator: a batched removal of both members that returns `2` is the
/// linearization point for a match; anything less means a concurrent
/// worker won the race first.
#[async_trait]
pub trait PoolStore: Send + Sync {
    async fn put_meta(&self, entry_id: &str, entry: &PoolEntry) -> Result<(), PoolError>;
    async fn get_meta(&self, entry_id: &str) -> Result<Option<PoolEntry>, PoolError>;
    async fn del_meta(&self, entry_ids: &[String]) -> Result<(), PoolError>;

    async fn zadd(&self, member: &str) -> Result<(), PoolError>;

    /// Batched removal; returns the number of members actually removed.
    async fn zrem(&self, members: &[String]) -> Result<usize, PoolError>;

    /// Inclusive `min`, exclusive `max`, natural lex order unless
    /// `reverse` is set.
    async fn zrange_lex(
        &self,
        min: &str,
        max: &str,
        reverse: bool,
        limit: usize,
    ) -> Result<Vec<String>, PoolError>;

    /// Full-range scan, used only for cleanup by suffix.
    async fn zscan_all(&self) -> Result<Vec<String>, PoolError>;
}

/// One passenger's contribution to a trip commit.
#[derive(Debug, Clone)]
pub struct TripPassengerInput {
    pub user_id: String,
    pub passenger_count: u32,
    pub luggage_units: u32,
    pub issued_price: f64,
}

/// Input to the new-trip commit path: peer was an individual.
#[derive(Debug, Clone)]
pub struct NewTripCommit {
    pub trip_id: String,
    pub status: PoolStatus,
    pub fare_each: f64,
    pub passenger_count: u32,
    pub luggage_units: u32,
    pub passengers: Vec<TripPassengerInput>,
}

/// Input to the extend-trip commit path: peer was already a trip.
/// `backfill_members` is only consulted if the `Trip` row named by
/// `trip_id` turns out to be missing from the durable store, in which case
/// the implementation falls back to the new-trip path for it.
#[derive(Debug, Clone)]
pub struct ExtendTripCommit {
    pub trip_id: String,
    pub caller: TripPassengerInput,
    pub status: PoolStatus,
    pub fare_each: f64,
    pub passenger_count: u32,
    pub luggage_units: u32,
    pub backfill_members: Vec<TripPassengerInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideRequestSnapshot {
    pub user_id: String,
    pub no_of_passengers: u32,
    pub luggage_capacity: u32,
    pub issued_price: f64,
    pub status: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripSnapshot {
    pub trip_id: String,
    pub status: String,
    pub fare_each: f64,
    pub no_of_passengers: u32,
    pub total_luggage: u32,
    pub cab_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub ride_requests: Vec<RideRequestSnapshot>,
}

/// The durable transactional relational store.
///
/// Both commit methods run inside a single interactive transaction and
/// return `Ok(None)` exactly when the caller user does not exist — the
/// pool-side commit has already happened by the time this is called, so
/// `None` is not itself an error, just an instruction to the engine to
/// return a result with `trip: None`.
#[async_trait]
pub trait TripStore: Send + Sync {
    async fn commit_new_trip(
        &self,
        input: NewTripCommit,
    ) -> Result<Option<TripSnapshot>, TripStoreError>;

    async fn commit_extend_trip(
        &self,
        input: ExtendTripCommit,
    ) -> Result<Option<TripSnapshot>, TripStoreError>;

    /// Cancel a trip that collapsed back below two members.
    async fn cancel_trip(&self, trip_id: &str) -> Result<(), TripStoreError>;
}

/// The two notification payload shapes the core produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NotificationPayload {
    #[serde(rename = "RIDE_MATCHED")]
    RideMatched { trip: TripSnapshot },
    #[serde(rename = "RIDER_LEFT")]
    RiderLeft {
        trip_id: String,
        cancelled_user_id: String,
        updated_trip: Option<TripSnapshot>,
    },
}

/// Topic-per-passenger publish channel.
///
/// The engine only ever calls `publish`, fire-and-forget, from inside the
/// commit path that already succeeded — a publish failure is logged by the
/// adapter and never propagated back to the engine. Building the subscriber
/// side is out of scope for this crate; adapters expose it separately for
/// whatever transport they wrap.
#[async_trait]
pub trait NotificationBus: Send + Sync {
    async fn publish(&self, topic: &str, payload: NotificationPayload);
}
