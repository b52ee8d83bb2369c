//! Notification Bus adapters.
//!
//! `RedisNotificationBus` publishes fire-and-forget over Redis pub/sub;
//! publish failures are logged and swallowed, never surfaced to the caller,
//! since the engine only ever calls `publish` after its own commit already
//! succeeded. `RecordingNotificationBus` is the in-process double used by
//! `matcher_core` and `matcher_dispatcher` tests to assert on what would have
//! been announced.

mod recording;
mod redis_bus;

pub use recording::RecordingNotificationBus;
pub use redis_bus::{BusConfig, RedisNotificationBus};
