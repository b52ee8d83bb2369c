//! # Route-Pooling Matcher — core
//!
//! The algorithmic heart of the airport cab-pooling matcher: a geometric-to-
//! lexicographic route reduction, the pool's entry/trip shapes, the matching
//! engine's scan and capacity rules, and pricing. This crate has no I/O of
//! its own; it defines the ports (`PoolStore`, `TripStore`, `NotificationBus`)
//! that adapter crates implement, and the `MatchingEngine` that drives them.
//!
//! ## Modules
//!
//! - [`spatial`]: H3-based geographic indexing and distance.
//! - [`signature`]: route signatures (cell concatenation) and lex member
//!   strings.
//! - [`indexer`]: the Route Indexer, turning a destination into a signature.
//! - [`pool`]: pool entry/trip metadata shapes.
//! - [`pricing`]: fare calculation and the pooling discount.
//! - [`engine`]: the Matching Engine's scan, capacity check and commit.
//! - [`error`]: public and internal error kinds.
//! - [`config`]: engine tunables, extended by `matcher_service::config::MatcherConfig`.
//! - [`ports`]: the `PoolStore`, `TripStore`, `NotificationBus` traits.

pub mod config;
pub mod engine;
pub mod error;
pub mod indexer;
pub mod ports;
pub mod pool;
pub mod pricing;
pub mod signature;
pub mod spatial;

pub use config::EngineConfig;
pub use engine::{MatchOutcome, MatchingEngine};
pub use error::{IndexerError, MatchError};
pub use indexer::{ComputedRoute, RouteIndexer};
pub use pool::{PassengerMeta, PoolEntry, PoolStatus, TripMember, TripMeta};
pub use ports::{NotificationBus, NotificationPayload, PoolStore, TripStore};
pub use signature::RouteSignature;
