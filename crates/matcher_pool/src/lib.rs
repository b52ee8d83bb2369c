//! Pool Store adapters.
//!
//! `RedisPoolStore` backs the lex-ordered member set with a Redis sorted set
//! (every member scored `0`, so lexicographic order is the only order that
//! matters) and per-entry metadata with plain string keys. `InMemoryPoolStore`
//! is the `tokio::sync::Mutex`-guarded test double used by `matcher_core` and
//! `matcher_dispatcher`'s test suites, where standing up Redis isn't worth it.

mod in_memory;
mod redis_store;

pub use in_memory::InMemoryPoolStore;
pub use redis_store::{PoolStoreConfig, RedisPoolStore};
