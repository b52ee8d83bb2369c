//! Durable Trip Store: a `sqlx`/Postgres repository running every multi-row
//! write inside a single interactive transaction, so a trip's rows and its
//! ride-requests never observe a half-committed state.

pub mod db;
mod entities;
mod repository;

use async_trait::async_trait;
use matcher_core::ports::{
    ExtendTripCommit, NewTripCommit, TripPassengerInput, TripSnapshot, TripStore, TripStoreError,
};
use matcher_core::pool::PoolStatus;
use sqlx::PgPool;
use tracing::{error, warn};

use entities::assemble_snapshot;
use repository::TripRepository;

fn status_str(status: PoolStatus) -> &'static str {
    match status {
        PoolStatus::Waiting => "WAITING",
        PoolStatus::Active => "ACTIVE",
    }
}

pub struct PgTripStore {
    pool: PgPool,
}

impl PgTripStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_passengers(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        trip_id: &str,
        status: &str,
        passengers: &[TripPassengerInput],
    ) -> Result<(), sqlx::Error> {
        for p in passengers {
            TripRepository::insert_ride_request(
                tx,
                trip_id,
                &p.user_id,
                p.passenger_count as i32,
                p.luggage_units as i32,
                p.issued_price,
                status,
            )
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl TripStore for PgTripStore {
    async fn commit_new_trip(
        &self,
        input: NewTripCommit,
    ) -> Result<Option<TripSnapshot>, TripStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| TripStoreError(format!("begin tx: {e}")))?;

        let user_ids: Vec<String> = input.passengers.iter().map(|p| p.user_id.clone()).collect();
        let all_exist = TripRepository::users_exist(&mut tx, &user_ids)
            .await
            .map_err(|e| TripStoreError(format!("users_exist: {e}")))?;
        if !all_exist {
            warn!(trip_id = %input.trip_id, "commit_new_trip: one or more users do not exist");
            return Ok(None);
        }

        let status = status_str(input.status);
        let cab_id = TripRepository::select_available_cab(
            &mut tx,
            input.passenger_count as i32,
            input.luggage_units as i32,
        )
        .await
        .map_err(|e| TripStoreError(format!("select_available_cab: {e}")))?;

        TripRepository::insert_trip(
            &mut tx,
            &input.trip_id,
            status,
            input.fare_each,
            input.passenger_count as i32,
            input.luggage_units as i32,
            cab_id.as_deref(),
        )
        .await
        .map_err(|e| TripStoreError(format!("insert_trip: {e}")))?;

        Self::insert_passengers(&mut tx, &input.trip_id, status, &input.passengers)
            .await
            .map_err(|e| TripStoreError(format!("insert_passengers: {e}")))?;

        let snapshot = TripRepository::fetch_snapshot(&mut tx, &input.trip_id)
            .await
            .map_err(|e| TripStoreError(format!("fetch_snapshot: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| TripStoreError(format!("commit tx: {e}")))?;

        Ok(snapshot.map(|(trip, rides)| assemble_snapshot(trip, rides)))
    }

    async fn commit_extend_trip(
        &self,
        input: ExtendTripCommit,
    ) -> Result<Option<TripSnapshot>, TripStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| TripStoreError(format!("begin tx: {e}")))?;

        let caller_exists = TripRepository::users_exist(
            &mut tx,
            std::slice::from_ref(&input.caller.user_id),
        )
        .await
        .map_err(|e| TripStoreError(format!("users_exist: {e}")))?;
        if !caller_exists {
            warn!(trip_id = %input.trip_id, caller = %input.caller.user_id, "commit_extend_trip: caller does not exist");
            return Ok(None);
        }

        let status = status_str(input.status);
        let existing = TripRepository::find_trip(&mut tx, &input.trip_id)
            .await
            .map_err(|e| TripStoreError(format!("find_trip: {e}")))?;

        match existing {
            Some(_) => {
                TripRepository::update_trip_aggregates(
                    &mut tx,
                    &input.trip_id,
                    status,
                    input.fare_each,
                    input.passenger_count as i32,
                    input.luggage_units as i32,
                )
                .await
                .map_err(|e| TripStoreError(format!("update_trip_aggregates: {e}")))?;

                TripRepository::cascade_status_to_ride_requests(&mut tx, &input.trip_id, status)
                    .await
                    .map_err(|e| TripStoreError(format!("cascade_status: {e}")))?;

                TripRepository::insert_ride_request(
                    &mut tx,
                    &input.trip_id,
                    &input.caller.user_id,
                    input.caller.passenger_count as i32,
                    input.caller.luggage_units as i32,
                    input.caller.issued_price,
                    status,
                )
                .await
                .map_err(|e| TripStoreError(format!("insert caller ride_request: {e}")))?;
            }
            None => {
                error!(
                    trip_id = %input.trip_id,
                    "commit_extend_trip: trip missing from durable store, backfilling from pool state"
                );
                let cab_id = TripRepository::select_available_cab(
                    &mut tx,
                    input.passenger_count as i32,
                    input.luggage_units as i32,
                )
                .await
                .map_err(|e| TripStoreError(format!("select_available_cab: {e}")))?;

                TripRepository::insert_trip(
                    &mut tx,
                    &input.trip_id,
                    status,
                    input.fare_each,
                    input.passenger_count as i32,
                    input.luggage_units as i32,
                    cab_id.as_deref(),
                )
                .await
                .map_err(|e| TripStoreError(format!("insert_trip (backfill): {e}")))?;

                let mut all = input.backfill_members.clone();
                all.push(input.caller.clone());
                Self::insert_passengers(&mut tx, &input.trip_id, status, &all)
                    .await
                    .map_err(|e| TripStoreError(format!("insert_passengers (backfill): {e}")))?;
            }
        }

        let snapshot = TripRepository::fetch_snapshot(&mut tx, &input.trip_id)
            .await
            .map_err(|e| TripStoreError(format!("fetch_snapshot: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| TripStoreError(format!("commit tx: {e}")))?;

        Ok(snapshot.map(|(trip, rides)| assemble_snapshot(trip, rides)))
    }

    async fn cancel_trip(&self, trip_id: &str) -> Result<(), TripStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| TripStoreError(format!("begin tx: {e}")))?;
        TripRepository::mark_cancelled(&mut tx, trip_id)
            .await
            .map_err(|e| TripStoreError(format!("mark_cancelled: {e}")))?;
        tx.commit()
            .await
            .map_err(|e| TripStoreError(format!("commit tx: {e}")))?;
        Ok(())
    }
}
