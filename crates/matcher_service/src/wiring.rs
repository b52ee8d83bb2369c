//! Wires every adapter crate into a running `WorkerPool`.

use std::sync::Arc;
use std::time::Duration;

use matcher_bus::{BusConfig, RedisNotificationBus};
use matcher_core::engine::MatchingEngine;
use matcher_core::indexer::RouteIndexer;
use matcher_dispatcher::WorkerPool;
use matcher_pool::{PoolStoreConfig, RedisPoolStore};
use matcher_trips::db::{create_pool, DatabaseConfig};
use matcher_trips::PgTripStore;

use crate::config::MatcherConfig;

/// Connects every adapter and starts a `WorkerPool` fronting the engine they
/// compose. Returns once all workers have signalled readiness.
pub async fn start(config: &MatcherConfig) -> anyhow::Result<WorkerPool> {
    let pool_store = RedisPoolStore::connect(PoolStoreConfig {
        url: config.pool.url.clone(),
        pool_key: config.pool.pool_key.clone(),
    })
    .await
    .map_err(|e| anyhow::anyhow!("pool store connect failed: {e}"))?;

    let db_pool = create_pool(&DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        connect_timeout_secs: config.database.connect_timeout_secs,
        idle_timeout_secs: config.database.idle_timeout_secs,
    })
    .await?;
    let trip_store = PgTripStore::new(db_pool);

    let bus = RedisNotificationBus::connect(BusConfig {
        url: config.bus.url.clone(),
    })
    .await?;

    let indexer = RouteIndexer::new(
        reqwest::Client::new(),
        config.routing.api_url.clone(),
        config.engine.origin_lat,
        config.engine.origin_lng,
        config.engine.h3_resolution(),
        Duration::from_secs(config.routing.request_timeout_secs),
    );

    let engine = Arc::new(MatchingEngine::new(
        config.engine,
        indexer,
        Arc::new(pool_store),
        Arc::new(trip_store),
        Arc::new(bus),
    ));

    let workers = WorkerPool::start(
        engine,
        config.dispatcher.worker_pool_size,
        config.dispatcher.queue_capacity,
        Duration::from_secs(config.dispatcher.startup_timeout_secs),
    )
    .await
    .map_err(|e| anyhow::anyhow!("worker pool failed to start: {e}"))?;

    Ok(workers)
}
