//! The Matching Engine: the part of the system that turns a newly-arrived
//! rider's route signature into either a committed trip or a continued
//! wait in the pool.
//!
//! One `MatchingEngine` is shared (via `Arc`) across every dispatcher worker;
//! it holds no per-call mutable state of its own. All state lives behind the
//! `PoolStore`/`TripStore`/`NotificationBus` ports, which is what lets the
//! pairing commit (`PoolStore::zrem` returning `2`) double as the whole
//! algorithm's linearization point without an engine-held lock.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::MatchError;
use crate::indexer::RouteIndexer;
use crate::pool::{PassengerMeta, PoolEntry, PoolStatus, TripMember, TripMeta};
use crate::ports::{
    ExtendTripCommit, NewTripCommit, NotificationBus, NotificationPayload, PoolStore,
    TripPassengerInput, TripSnapshot, TripStore,
};
use crate::pricing::{self, PriceAnchor};
use crate::signature::{is_trip_entry_id, member_string, parse_member, RouteSignature};

/// The durably-recorded half of a commit. `trip` is `None` exactly when the
/// pool-side pairing succeeded but the Trip Store transaction didn't — the
/// match still happened, it just isn't reflected in the durable store yet.
#[derive(Debug, Clone)]
pub struct CommittedMatch {
    pub trip_id: String,
    pub trip: Option<TripSnapshot>,
}

/// Result of a single `match_rider` call.
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    /// No acceptable peer existed; the caller was registered and is waiting.
    None,
    /// Paired via step 1a or 1b: an exact superset or subset route match.
    Direct {
        peer: String,
        committed: CommittedMatch,
    },
    /// Paired via step 2: the peer's destination was reachable with an
    /// acceptable detour rather than lying exactly along the route.
    BestDetour {
        peer: String,
        detour_m: f64,
        split_cell: String,
        committed: CommittedMatch,
    },
}

impl MatchOutcome {
    pub fn committed(&self) -> Option<&CommittedMatch> {
        match self {
            MatchOutcome::None => None,
            MatchOutcome::Direct { committed, .. } => Some(committed),
            MatchOutcome::BestDetour { committed, .. } => Some(committed),
        }
    }
}

/// Exclusive upper bound sentinel for lex range scans: higher than any
/// character a hex cell id or entry id can contain.
const HIGH_SENTINEL: char = '\u{10FFFF}';

pub struct MatchingEngine {
    config: EngineConfig,
    indexer: RouteIndexer,
    pool: Arc<dyn PoolStore>,
    trips: Arc<dyn TripStore>,
    bus: Arc<dyn NotificationBus>,
}

impl MatchingEngine {
    pub fn new(
        config: EngineConfig,
        indexer: RouteIndexer,
        pool: Arc<dyn PoolStore>,
        trips: Arc<dyn TripStore>,
        bus: Arc<dyn NotificationBus>,
    ) -> Self {
        Self {
            config,
            indexer,
            pool,
            trips,
            bus,
        }
    }

    /// Run the full matching algorithm for a newly-arrived rider. Always
    /// registers the caller in the pool first, even if no match is
    /// eventually found (step 0).
    pub async fn match_rider(
        &self,
        user_id: &str,
        destination_lat: f64,
        destination_lng: f64,
        passenger_count: u32,
        luggage_units: u32,
    ) -> Result<MatchOutcome, MatchError> {
        if passenger_count > self.config.max_passengers || luggage_units > self.config.luggage_capacity {
            return Err(MatchError::RequestExceedsCapacity);
        }

        let route = self
            .indexer
            .compute_route(destination_lat, destination_lng)
            .await?;

        let caller = PassengerMeta {
            user_id: user_id.to_string(),
            route_signature: route.route_signature.clone(),
            passenger_count,
            luggage_units,
            issued_price: pricing::base_price(route.total_km, self.config.rate_per_km),
        };

        // Step 0: self-registration, unconditional.
        self.pool
            .put_meta(user_id, &PoolEntry::Passenger(caller.clone()))
            .await
            .map_err(|e| {
                warn!(error = %e, "pool put_meta failed during self-registration");
                MatchError::PoolUnavailable
            })?;
        self.pool
            .zadd(&member_string(&route.route_signature, user_id))
            .await
            .map_err(|e| {
                warn!(error = %e, "pool zadd failed during self-registration");
                MatchError::PoolUnavailable
            })?;

        let (supersets, neighbours) = self
            .scan_neighbourhood(&route.route_signature, user_id)
            .await?;

        // Step 1a: superset scan. Every member here already begins with the
        // caller's own signature by construction of the range query.
        for (_, peer_id) in &supersets {
            if let Some(committed) = self.try_commit_pair(user_id, &caller, peer_id).await? {
                self.announce(user_id, &committed).await;
                return Ok(MatchOutcome::Direct {
                    peer: peer_id.clone(),
                    committed,
                });
            }
        }

        // Step 1b: subset scan over the same predecessor/successor
        // neighbourhood, trip entries excluded.
        for (peer_sig, peer_id) in &neighbours {
            if is_trip_entry_id(peer_id) {
                continue;
            }
            if !peer_sig.is_prefix_of(&route.route_signature) {
                continue;
            }
            if let Some(committed) = self.try_commit_pair(user_id, &caller, peer_id).await? {
                self.announce(user_id, &committed).await;
                return Ok(MatchOutcome::Direct {
                    peer: peer_id.clone(),
                    committed,
                });
            }
        }

        // Step 2: best-detour scan over the same neighbourhood. Commits the
        // first candidate whose detour beats the running minimum and passes
        // the capacity check — not necessarily the global best.
        let mut best_seen = self.config.detour_max_m;
        for (peer_sig, peer_id) in &neighbours {
            if is_trip_entry_id(peer_id) {
                continue;
            }
            let k = route.route_signature.common_prefix_cell_count(peer_sig);
            if k == 0 {
                continue;
            }
            let Some(split_cell) = route.route_signature.split_cell(k) else {
                continue;
            };
            let peer_dest = peer_sig.destination_cell();

            let detour_m = match self.indexer.detour_distance_m(split_cell, peer_dest).await {
                Ok(d) => d,
                Err(e) => {
                    warn!(error = %e, peer = %peer_id, "detour lookup failed, skipping candidate");
                    continue;
                }
            };

            if detour_m < best_seen {
                best_seen = detour_m;
                let split_cell = split_cell.to_string();
                if let Some(committed) = self.try_commit_pair(user_id, &caller, peer_id).await? {
                    self.announce(user_id, &committed).await;
                    return Ok(MatchOutcome::BestDetour {
                        peer: peer_id.clone(),
                        detour_m,
                        split_cell,
                        committed,
                    });
                }
            }
        }

        info!(user = %user_id, "no acceptable peer found, caller left waiting");
        Ok(MatchOutcome::None)
    }

    /// Fetch the two neighbourhoods step 1a/1b/2 scan over:
    /// the superset range `[route, route\xFF)` (step 1a), and up to
    /// `neighbour_scan_limit` lex-predecessors plus lex-successors of
    /// `route` (steps 1b/2), self entries excluded from both.
    async fn scan_neighbourhood(
        &self,
        route: &RouteSignature,
        user_id: &str,
    ) -> Result<(Vec<(RouteSignature, String)>, Vec<(RouteSignature, String)>), MatchError> {
        let limit = self.config.neighbour_scan_limit;
        let high = format!("{route}{HIGH_SENTINEL}");

        let superset_members = self
            .pool
            .zrange_lex(route.as_str(), &high, false, limit)
            .await
            .map_err(|e| {
                warn!(error = %e, "pool zrange_lex (superset) failed");
                MatchError::PoolUnavailable
            })?;

        let predecessor_members = self
            .pool
            .zrange_lex("", route.as_str(), true, limit)
            .await
            .map_err(|e| {
                warn!(error = %e, "pool zrange_lex (predecessor) failed");
                MatchError::PoolUnavailable
            })?;

        let parse_exclude_self = |members: Vec<String>| -> Vec<(RouteSignature, String)> {
            members
                .into_iter()
                .filter_map(|m| parse_member(&m))
                .filter(|(_, id)| *id != user_id)
                .map(|(sig, id)| (sig, id.to_string()))
                .collect()
        };

        let supersets = parse_exclude_self(superset_members.clone());
        let mut neighbours = parse_exclude_self(predecessor_members);
        neighbours.extend(parse_exclude_self(superset_members));

        Ok((supersets, neighbours))
    }

    /// Attempt to pair `caller` with the pool entry named `peer_id`.
    /// Returns `Ok(None)` for any of the internal, non-fatal skip conditions
    /// (`StaleCandidate`, `CapacityExceeded`, lost commit race) — the caller
    /// simply moves on to the next candidate.
    async fn try_commit_pair(
        &self,
        caller_id: &str,
        caller: &PassengerMeta,
        peer_id: &str,
    ) -> Result<Option<CommittedMatch>, MatchError> {
        let Some(peer_entry) = self.pool.get_meta(peer_id).await.map_err(|e| {
            warn!(error = %e, "pool get_meta failed during pairing attempt");
            MatchError::PoolUnavailable
        })?
        else {
            // StaleCandidate: the member string was still in the lex set
            // but its metadata was already gone (raced away by another
            // worker, or mid-cleanup).
            return Ok(None);
        };

        let new_passenger_count = peer_entry.passenger_count() + caller.passenger_count;
        let new_luggage_units = peer_entry.luggage_units() + caller.luggage_units;
        if new_passenger_count > self.config.max_passengers
            || new_luggage_units > self.config.luggage_capacity
        {
            // CapacityExceeded: skip, try the next candidate.
            return Ok(None);
        }
        let sealed = new_passenger_count == self.config.max_passengers
            || new_luggage_units == self.config.luggage_capacity;

        let caller_member = member_string(&caller.route_signature, caller_id);
        let peer_member = member_string(peer_entry.route_signature(), peer_id);
        let removed = self
            .pool
            .zrem(&[caller_member, peer_member])
            .await
            .map_err(|e| {
                warn!(error = %e, "pool zrem failed during commit attempt");
                MatchError::PoolUnavailable
            })?;
        if removed != 2 {
            // Lost the race: another worker already claimed one of these
            // two members. Not an error, just a skip.
            return Ok(None);
        }
        self.pool
            .del_meta(&[caller_id.to_string(), peer_id.to_string()])
            .await
            .map_err(|e| {
                warn!(error = %e, "pool del_meta failed after commit");
                MatchError::PoolUnavailable
            })?;

        let is_new_trip = matches!(peer_entry, PoolEntry::Passenger(_));
        let trip_id = match &peer_entry {
            PoolEntry::Trip(t) => t.trip_id.clone(),
            PoolEntry::Passenger(_) => TripMeta::new_trip_id(),
        };

        let extended_sig = caller
            .route_signature
            .longer_of(peer_entry.route_signature())
            .clone();

        if !sealed {
            self.pool
                .zadd(&member_string(&extended_sig, &trip_id))
                .await
                .map_err(|e| {
                    warn!(error = %e, "pool zadd failed for extended trip membership");
                    MatchError::PoolUnavailable
                })?;
        }

        let peer_price = peer_entry.issued_price();
        let new_price = pricing::joined_price(
            PriceAnchor::Peer,
            peer_price,
            caller.issued_price,
            self.config.pool_discount_factor,
        );

        let prior_members: Vec<TripMember> = match &peer_entry {
            PoolEntry::Trip(t) => t.members.clone(),
            PoolEntry::Passenger(p) => vec![TripMember::from(p)],
        };
        let mut members: Vec<TripMember> = prior_members
            .iter()
            .cloned()
            .map(|m| TripMember {
                issued_price: new_price,
                ..m
            })
            .collect();
        members.push(TripMember {
            user_id: caller_id.to_string(),
            passenger_count: caller.passenger_count,
            luggage_units: caller.luggage_units,
            issued_price: new_price,
        });

        let status = if sealed {
            PoolStatus::Active
        } else {
            PoolStatus::Waiting
        };

        let trip_meta = TripMeta {
            trip_id: trip_id.clone(),
            route_signature: extended_sig,
            passenger_count: new_passenger_count,
            luggage_units: new_luggage_units,
            status,
            members: members.clone(),
        };
        self.pool
            .put_meta(&trip_id, &PoolEntry::Trip(trip_meta))
            .await
            .map_err(|e| {
                warn!(error = %e, "pool put_meta failed for trip metadata");
                MatchError::PoolUnavailable
            })?;

        let durable_result = if is_new_trip {
            let passengers = prior_members
                .iter()
                .chain(std::iter::once(&TripMember {
                    user_id: caller_id.to_string(),
                    passenger_count: caller.passenger_count,
                    luggage_units: caller.luggage_units,
                    issued_price: new_price,
                }))
                .map(|m| TripPassengerInput {
                    user_id: m.user_id.clone(),
                    passenger_count: m.passenger_count,
                    luggage_units: m.luggage_units,
                    issued_price: new_price,
                })
                .collect();
            self.trips
                .commit_new_trip(NewTripCommit {
                    trip_id: trip_id.clone(),
                    status,
                    fare_each: new_price,
                    passenger_count: new_passenger_count,
                    luggage_units: new_luggage_units,
                    passengers,
                })
                .await
        } else {
            let backfill_members = prior_members
                .iter()
                .map(|m| TripPassengerInput {
                    user_id: m.user_id.clone(),
                    passenger_count: m.passenger_count,
                    luggage_units: m.luggage_units,
                    issued_price: new_price,
                })
                .collect();
            self.trips
                .commit_extend_trip(ExtendTripCommit {
                    trip_id: trip_id.clone(),
                    caller: TripPassengerInput {
                        user_id: caller_id.to_string(),
                        passenger_count: caller.passenger_count,
                        luggage_units: caller.luggage_units,
                        issued_price: new_price,
                    },
                    status,
                    fare_each: new_price,
                    passenger_count: new_passenger_count,
                    luggage_units: new_luggage_units,
                    backfill_members,
                })
                .await
        };

        let trip = match durable_result {
            Ok(Some(snapshot)) => Some(snapshot),
            Ok(None) => {
                warn!(trip_id = %trip_id, "caller user absent from durable store, commit skipped");
                None
            }
            Err(e) => {
                warn!(error = %e, trip_id = %trip_id, "durable commit failed after pool commit");
                None
            }
        };

        Ok(Some(CommittedMatch { trip_id, trip }))
    }

    /// Notify every pre-existing trip member of a successful pairing. The
    /// caller learns the outcome synchronously via the return value of
    /// `match_rider`; only the other side needs the async notification.
    /// Skipped when the durable commit itself failed, since the payload
    /// requires a durable snapshot to attach.
    async fn announce(&self, caller_id: &str, committed: &CommittedMatch) {
        let Some(trip) = &committed.trip else {
            return;
        };
        for request in &trip.ride_requests {
            if request.user_id == caller_id {
                continue;
            }
            self.bus
                .publish(
                    &request.user_id,
                    NotificationPayload::RideMatched { trip: trip.clone() },
                )
                .await;
        }
    }

    /// Remove a waiting passenger from the pool entirely. A no-op if the
    /// user isn't currently waiting (removal is idempotent).
    pub async fn remove_from_pool(&self, user_id: &str) -> Result<(), MatchError> {
        let members = self.pool.zscan_all().await.map_err(|e| {
            warn!(error = %e, "pool zscan_all failed during remove_from_pool");
            MatchError::PoolUnavailable
        })?;

        let matching: Vec<String> = members
            .into_iter()
            .filter(|m| {
                parse_member(m)
                    .map(|(_, id)| id == user_id)
                    .unwrap_or(false)
            })
            .collect();

        if matching.is_empty() {
            return Ok(());
        }

        self.pool.zrem(&matching).await.map_err(|e| {
            warn!(error = %e, "pool zrem failed during remove_from_pool");
            MatchError::PoolUnavailable
        })?;
        self.pool
            .del_meta(&[user_id.to_string()])
            .await
            .map_err(|e| {
                warn!(error = %e, "pool del_meta failed during remove_from_pool");
                MatchError::PoolUnavailable
            })?;
        Ok(())
    }

    /// Remove a rider from a forming or sealed trip. If the trip collapses
    /// below two members it is deleted from the pool and cancelled in the
    /// durable store; otherwise the shrunken trip metadata is written back
    /// in place. Returns the notification payload the caller (dispatcher)
    /// should publish to any remaining member, or `None` if `user_id`
    /// wasn't part of any trip.
    pub async fn remove_from_trip(
        &self,
        user_id: &str,
    ) -> Result<Option<NotificationPayload>, MatchError> {
        let members = self.pool.zscan_all().await.map_err(|e| {
            warn!(error = %e, "pool zscan_all failed during remove_from_trip");
            MatchError::PoolUnavailable
        })?;

        for member in &members {
            let Some((_, entry_id)) = parse_member(member) else {
                continue;
            };
            if !is_trip_entry_id(entry_id) {
                continue;
            }
            let Some(PoolEntry::Trip(mut trip)) =
                self.pool.get_meta(entry_id).await.map_err(|e| {
                    warn!(error = %e, "pool get_meta failed during remove_from_trip");
                    MatchError::PoolUnavailable
                })?
            else {
                continue;
            };
            if !trip.members.iter().any(|m| m.user_id == user_id) {
                continue;
            }

            trip.members.retain(|m| m.user_id != user_id);
            trip.passenger_count = trip.members.iter().map(|m| m.passenger_count).sum();
            trip.luggage_units = trip.members.iter().map(|m| m.luggage_units).sum();

            if trip.members.len() < 2 {
                self.pool.zrem(&[member.clone()]).await.map_err(|e| {
                    warn!(error = %e, "pool zrem failed collapsing trip");
                    MatchError::PoolUnavailable
                })?;
                self.pool
                    .del_meta(&[entry_id.to_string()])
                    .await
                    .map_err(|e| {
                        warn!(error = %e, "pool del_meta failed collapsing trip");
                        MatchError::PoolUnavailable
                    })?;
                if let Err(e) = self.trips.cancel_trip(entry_id).await {
                    warn!(error = %e, trip_id = %entry_id, "durable trip cancel failed");
                }
                return Ok(Some(NotificationPayload::RiderLeft {
                    trip_id: entry_id.to_string(),
                    cancelled_user_id: user_id.to_string(),
                    updated_trip: None,
                }));
            }

            self.pool
                .put_meta(entry_id, &PoolEntry::Trip(trip))
                .await
                .map_err(|e| {
                    warn!(error = %e, "pool put_meta failed shrinking trip");
                    MatchError::PoolUnavailable
                })?;
            return Ok(Some(NotificationPayload::RiderLeft {
                trip_id: entry_id.to_string(),
                cancelled_user_id: user_id.to_string(),
                updated_trip: None,
            }));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap, HashSet};
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::ports::{PoolError, RideRequestSnapshot, TripStoreError};
    use crate::signature::CELL_WIDTH;

    #[derive(Default)]
    struct TestPool {
        members: StdMutex<BTreeSet<String>>,
        meta: StdMutex<HashMap<String, PoolEntry>>,
    }

    #[async_trait]
    impl PoolStore for TestPool {
        async fn put_meta(&self, entry_id: &str, entry: &PoolEntry) -> Result<(), PoolError> {
            self.meta
                .lock()
                .unwrap()
                .insert(entry_id.to_string(), entry.clone());
            Ok(())
        }

        async fn get_meta(&self, entry_id: &str) -> Result<Option<PoolEntry>, PoolError> {
            Ok(self.meta.lock().unwrap().get(entry_id).cloned())
        }

        async fn del_meta(&self, entry_ids: &[String]) -> Result<(), PoolError> {
            let mut meta = self.meta.lock().unwrap();
            for id in entry_ids {
                meta.remove(id);
            }
            Ok(())
        }

        async fn zadd(&self, member: &str) -> Result<(), PoolError> {
            self.members.lock().unwrap().insert(member.to_string());
            Ok(())
        }

        async fn zrem(&self, members: &[String]) -> Result<usize, PoolError> {
            let mut set = self.members.lock().unwrap();
            Ok(members.iter().filter(|m| set.remove(*m)).count())
        }

        async fn zrange_lex(
            &self,
            min: &str,
            max: &str,
            reverse: bool,
            limit: usize,
        ) -> Result<Vec<String>, PoolError> {
            let set = self.members.lock().unwrap();
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
            Ok(self.members.lock().unwrap().iter().cloned().collect())
        }
    }

    #[derive(Default)]
    struct TestTrips {
        known_users: StdMutex<HashSet<String>>,
        cancelled: StdMutex<Vec<String>>,
    }

    impl TestTrips {
        fn with_users(users: &[&str]) -> Self {
            Self {
                known_users: StdMutex::new(users.iter().map(|u| u.to_string()).collect()),
                cancelled: StdMutex::new(Vec::new()),
            }
        }

        fn snapshot_for(trip_id: &str, fare_each: f64, passengers: &[TripPassengerInput]) -> TripSnapshot {
            TripSnapshot {
                trip_id: trip_id.to_string(),
                status: "ACTIVE".to_string(),
                fare_each,
                no_of_passengers: passengers.iter().map(|p| p.passenger_count).sum(),
                total_luggage: passengers.iter().map(|p| p.luggage_units).sum(),
                cab_id: None,
                created_at: Utc::now(),
                ride_requests: passengers
                    .iter()
                    .map(|p| RideRequestSnapshot {
                        user_id: p.user_id.clone(),
                        no_of_passengers: p.passenger_count,
                        luggage_capacity: p.luggage_units,
                        issued_price: p.issued_price,
                        status: "ACTIVE".to_string(),
                        joined_at: Utc::now(),
                    })
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl TripStore for TestTrips {
        async fn commit_new_trip(
            &self,
            input: NewTripCommit,
        ) -> Result<Option<TripSnapshot>, TripStoreError> {
            let known = self.known_users.lock().unwrap();
            if input.passengers.iter().any(|p| !known.contains(&p.user_id)) {
                return Ok(None);
            }
            Ok(Some(Self::snapshot_for(
                &input.trip_id,
                input.fare_each,
                &input.passengers,
            )))
        }

        async fn commit_extend_trip(
            &self,
            input: ExtendTripCommit,
        ) -> Result<Option<TripSnapshot>, TripStoreError> {
            let known = self.known_users.lock().unwrap();
            if !known.contains(&input.caller.user_id) {
                return Ok(None);
            }
            let mut passengers = input.backfill_members.clone();
            passengers.push(input.caller.clone());
            Ok(Some(Self::snapshot_for(
                &input.trip_id,
                input.fare_each,
                &passengers,
            )))
        }

        async fn cancel_trip(&self, trip_id: &str) -> Result<(), TripStoreError> {
            self.cancelled.lock().unwrap().push(trip_id.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct TestBus {
        published: StdMutex<Vec<(String, NotificationPayload)>>,
    }

    #[async_trait]
    impl NotificationBus for TestBus {
        async fn publish(&self, topic: &str, payload: NotificationPayload) {
            self.published
                .lock()
                .unwrap()
                .push((topic.to_string(), payload));
        }
    }

    fn engine(pool: Arc<TestPool>, trips: Arc<TestTrips>, bus: Arc<TestBus>) -> MatchingEngine {
        MatchingEngine {
            config: EngineConfig::default(),
            indexer: RouteIndexer::new(
                reqwest::Client::new(),
                "http://example.invalid/directions",
                1.0,
                1.0,
                h3o::Resolution::Nine,
                std::time::Duration::from_secs(5),
            ),
            pool,
            trips,
            bus,
        }
    }

    fn sig(cell_char: char) -> RouteSignature {
        RouteSignature::parse(cell_char.to_string().repeat(CELL_WIDTH)).unwrap()
    }

    fn passenger(user_id: &str, sig: RouteSignature, price: f64) -> PassengerMeta {
        PassengerMeta {
            user_id: user_id.to_string(),
            route_signature: sig,
            passenger_count: 1,
            luggage_units: 1,
            issued_price: price,
        }
    }

    #[tokio::test]
    async fn try_commit_pair_pairs_two_solo_passengers_into_a_new_trip() {
        let pool = Arc::new(TestPool::default());
        let trips = Arc::new(TestTrips::with_users(&["rider-a", "rider-b"]));
        let bus = Arc::new(TestBus::default());

        let peer_sig = sig('B');
        let peer = passenger("rider-b", peer_sig.clone(), 20.0);
        pool.put_meta("rider-b", &PoolEntry::Passenger(peer.clone()))
            .await
            .unwrap();
        pool.zadd(&member_string(&peer_sig, "rider-b"))
            .await
            .unwrap();

        let engine = engine(pool.clone(), trips, bus);
        let caller_sig = sig('B');
        let caller = passenger("rider-a", caller_sig, 20.0);

        let committed = engine
            .try_commit_pair("rider-a", &caller, "rider-b")
            .await
            .unwrap()
            .expect("pairing should commit");

        assert!(committed.trip.is_some());
        let trip = committed.trip.unwrap();
        assert_eq!(trip.ride_requests.len(), 2);
        // Peer-anchored discount: the joined price should be cheaper than
        // either party's solo price.
        assert!(trip.fare_each < 20.0);
        assert!(pool.zscan_all().await.unwrap().len() <= 1);
    }

    #[tokio::test]
    async fn try_commit_pair_skips_when_capacity_would_be_exceeded() {
        let pool = Arc::new(TestPool::default());
        let trips = Arc::new(TestTrips::with_users(&["rider-a", "rider-b"]));
        let bus = Arc::new(TestBus::default());

        let peer_sig = sig('C');
        let mut peer = passenger("rider-b", peer_sig.clone(), 20.0);
        peer.passenger_count = 3; // already at MAX_PASSENGERS default (3)
        pool.put_meta("rider-b", &PoolEntry::Passenger(peer))
            .await
            .unwrap();
        pool.zadd(&member_string(&peer_sig, "rider-b"))
            .await
            .unwrap();

        let engine = engine(pool.clone(), trips, bus);
        let caller = passenger("rider-a", sig('C'), 20.0);

        let committed = engine
            .try_commit_pair("rider-a", &caller, "rider-b")
            .await
            .unwrap();
        assert!(committed.is_none());
        // Neither member should have been removed from the pool.
        assert_eq!(pool.zscan_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn try_commit_pair_skips_stale_candidate() {
        let pool = Arc::new(TestPool::default());
        let trips = Arc::new(TestTrips::with_users(&["rider-a"]));
        let bus = Arc::new(TestBus::default());
        let engine = engine(pool, trips, bus);

        let caller = passenger("rider-a", sig('D'), 10.0);
        let committed = engine
            .try_commit_pair("rider-a", &caller, "ghost")
            .await
            .unwrap();
        assert!(committed.is_none());
    }

    #[tokio::test]
    async fn remove_from_pool_is_idempotent() {
        let pool = Arc::new(TestPool::default());
        let trips = Arc::new(TestTrips::default());
        let bus = Arc::new(TestBus::default());
        let engine = engine(pool, trips, bus);

        engine.remove_from_pool("nobody-waiting").await.unwrap();
    }

    #[tokio::test]
    async fn remove_from_trip_collapses_trip_below_two_members() {
        let pool = Arc::new(TestPool::default());
        let trips = Arc::new(TestTrips::default());
        let bus = Arc::new(TestBus::default());

        let trip_sig = sig('E');
        let trip_meta = TripMeta {
            trip_id: "TRIPX".to_string(),
            route_signature: trip_sig.clone(),
            passenger_count: 2,
            luggage_units: 2,
            status: PoolStatus::Active,
            members: vec![
                TripMember {
                    user_id: "rider-a".to_string(),
                    passenger_count: 1,
                    luggage_units: 1,
                    issued_price: 15.0,
                },
                TripMember {
                    user_id: "rider-b".to_string(),
                    passenger_count: 1,
                    luggage_units: 1,
                    issued_price: 15.0,
                },
            ],
        };
        pool.put_meta("TRIPX", &PoolEntry::Trip(trip_meta))
            .await
            .unwrap();
        pool.zadd(&member_string(&trip_sig, "TRIPX")).await.unwrap();

        let engine = engine(pool.clone(), trips.clone(), bus);
        let payload = engine
            .remove_from_trip("rider-a")
            .await
            .unwrap()
            .expect("rider-a was part of a trip");

        match payload {
            NotificationPayload::RiderLeft {
                cancelled_user_id,
                updated_trip,
                ..
            } => {
                assert_eq!(cancelled_user_id, "rider-a");
                assert!(updated_trip.is_none());
            }
            _ => panic!("expected RiderLeft"),
        }
        assert!(pool.get_meta("TRIPX").await.unwrap().is_none());
        assert_eq!(trips.cancelled.lock().unwrap().len(), 1);
    }
}
