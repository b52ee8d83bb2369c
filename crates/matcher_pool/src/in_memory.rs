use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use matcher_core::ports::{PoolError, PoolStore};
use matcher_core::pool::PoolEntry;
use tokio::sync::Mutex;

/// In-memory `PoolStore` double: a `BTreeSet` gives the same lex ordering a
/// Redis sorted set of equal-score members would, without needing a running
/// Redis for engine/dispatcher unit tests.
#[derive(Default)]
pub struct InMemoryPoolStore {
    members: Mutex<BTreeSet<String>>,
    meta: Mutex<HashMap<String, PoolEntry>>,
}

impl InMemoryPoolStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PoolStore for InMemoryPoolStore {
    async fn put_meta(&self, entry_id: &str, entry: &PoolEntry) -> Result<(), PoolError> {
        self.meta
            .lock()
            .await
            .insert(entry_id.to_string(), entry.clone());
        Ok(())
    }

    async fn get_meta(&self, entry_id: &str) -> Result<Option<PoolEntry>, PoolError> {
        Ok(self.meta.lock().await.get(entry_id).cloned())
    }

    async fn del_meta(&self, entry_ids: &[String]) -> Result<(), PoolError> {
        let mut meta = self.meta.lock().await;
        for id in entry_ids {
            meta.remove(id);
        }
        Ok(())
    }

    async fn zadd(&self, member: &str) -> Result<(), PoolError> {
        self.members.lock().await.insert(member.to_string());
        Ok(())
    }

    async fn zrem(&self, members: &[String]) -> Result<usize, PoolError> {
        let mut set = self.members.lock().await;
        let mut removed = 0;
        for m in members {
            if set.remove(m) {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn zrange_lex(
        &self,
        min: &str,
        max: &str,
        reverse: bool,
        limit: usize,
    ) -> Result<Vec<String>, PoolError> {
        let set = self.members.lock().await;
        let mut matches: Vec<String> = set
            .iter()
            .filter(|m| m.as_str() >= min && (max.is_empty() || m.as_str() < max))
            .cloned()
            .collect();
        if reverse {
            matches.reverse();
        }
        matches.truncate(limit);
        Ok(matches)
    }

    async fn zscan_all(&self) -> Result<Vec<String>, PoolError> {
        Ok(self.members.lock().await.iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matcher_core::pool::PassengerMeta;
    use matcher_core::signature::RouteSignature;

    fn sig(s: &str) -> RouteSignature {
        RouteSignature::parse(s.repeat(matcher_core::signature::CELL_WIDTH)).unwrap()
    }

    fn passenger(id: &str) -> PoolEntry {
        PoolEntry::Passenger(PassengerMeta {
            user_id: id.to_string(),
            route_signature: sig("A"),
            passenger_count: 1,
            luggage_units: 1,
            issued_price: 10.0,
        })
    }

    #[tokio::test]
    async fn zrange_lex_is_inclusive_min_exclusive_max() {
        let store = InMemoryPoolStore::new();
        for m in ["a", "b", "c", "d"] {
            store.zadd(m).await.unwrap();
        }
        let found = store.zrange_lex("b", "d", false, 10).await.unwrap();
        assert_eq!(found, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn zrem_reports_actual_removed_count() {
        let store = InMemoryPoolStore::new();
        store.zadd("x").await.unwrap();
        let removed = store
            .zrem(&["x".to_string(), "y".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn put_and_get_meta_round_trips() {
        let store = InMemoryPoolStore::new();
        let entry = passenger("rider-9");
        store.put_meta("rider-9", &entry).await.unwrap();
        let fetched = store.get_meta("rider-9").await.unwrap();
        assert_eq!(fetched, Some(entry));
        assert_eq!(store.get_meta("missing").await.unwrap(), None);
    }
}
