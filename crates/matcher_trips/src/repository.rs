//! Low-level trip/ride-request queries, each taking an open transaction so
//! the commit paths in `lib.rs` can compose them into one atomic unit.

use sqlx::{Postgres, Transaction};

use crate::entities::{RideRequestRow, TripRow};

pub struct TripRepository;

impl TripRepository {
    pub async fn users_exist(
        tx: &mut Transaction<'_, Postgres>,
        user_ids: &[String],
    ) -> Result<bool, sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(true);
        }
        let found: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE user_id = ANY($1)",
        )
        .bind(user_ids)
        .fetch_one(&mut **tx)
        .await?;
        Ok(found as usize == user_ids.len())
    }

    /// Picks any cab with enough seats and luggage room that isn't already
    /// assigned to a live trip. Locks the row so two concurrent commits
    /// can't both claim it.
    pub async fn select_available_cab(
        tx: &mut Transaction<'_, Postgres>,
        seats: i32,
        luggage: i32,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT c.cab_id
            FROM cabs c
            WHERE c.seat_capacity >= $1
              AND c.luggage_capacity >= $2
              AND NOT EXISTS (
                  SELECT 1 FROM trips t
                  WHERE t.cab_id = c.cab_id AND t.status <> 'CANCELLED'
              )
            ORDER BY c.cab_id
            LIMIT 1
            FOR UPDATE OF c SKIP LOCKED
            "#,
        )
        .bind(seats)
        .bind(luggage)
        .fetch_optional(&mut **tx)
        .await
    }

    pub async fn insert_trip(
        tx: &mut Transaction<'_, Postgres>,
        trip_id: &str,
        status: &str,
        fare_each: f64,
        passenger_count: i32,
        luggage_units: i32,
        cab_id: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO trips (trip_id, status, fare_each, no_of_passengers, total_luggage, cab_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(trip_id)
        .bind(status)
        .bind(fare_each)
        .bind(passenger_count)
        .bind(luggage_units)
        .bind(cab_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn update_trip_aggregates(
        tx: &mut Transaction<'_, Postgres>,
        trip_id: &str,
        status: &str,
        fare_each: f64,
        passenger_count: i32,
        luggage_units: i32,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE trips
            SET status = $2, fare_each = $3, no_of_passengers = $4, total_luggage = $5
            WHERE trip_id = $1
            "#,
        )
        .bind(trip_id)
        .bind(status)
        .bind(fare_each)
        .bind(passenger_count)
        .bind(luggage_units)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn cascade_status_to_ride_requests(
        tx: &mut Transaction<'_, Postgres>,
        trip_id: &str,
        status: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE ride_requests SET status = $2 WHERE trip_id = $1")
            .bind(trip_id)
            .bind(status)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    pub async fn insert_ride_request(
        tx: &mut Transaction<'_, Postgres>,
        trip_id: &str,
        user_id: &str,
        no_of_passengers: i32,
        luggage_capacity: i32,
        issued_price: f64,
        status: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO ride_requests
                (trip_id, user_id, no_of_passengers, luggage_capacity, issued_price, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (trip_id, user_id) DO UPDATE SET
                no_of_passengers = EXCLUDED.no_of_passengers,
                luggage_capacity = EXCLUDED.luggage_capacity,
                issued_price = EXCLUDED.issued_price,
                status = EXCLUDED.status
            "#,
        )
        .bind(trip_id)
        .bind(user_id)
        .bind(no_of_passengers)
        .bind(luggage_capacity)
        .bind(issued_price)
        .bind(status)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn find_trip(
        tx: &mut Transaction<'_, Postgres>,
        trip_id: &str,
    ) -> Result<Option<TripRow>, sqlx::Error> {
        sqlx::query_as::<_, TripRow>(
            r#"
            SELECT trip_id, status, fare_each, no_of_passengers, total_luggage, cab_id, created_at
            FROM trips
            WHERE trip_id = $1
            FOR UPDATE
            "#,
        )
        .bind(trip_id)
        .fetch_optional(&mut **tx)
        .await
    }

    pub async fn fetch_snapshot(
        tx: &mut Transaction<'_, Postgres>,
        trip_id: &str,
    ) -> Result<Option<(TripRow, Vec<RideRequestRow>)>, sqlx::Error> {
        let trip = sqlx::query_as::<_, TripRow>(
            r#"
            SELECT trip_id, status, fare_each, no_of_passengers, total_luggage, cab_id, created_at
            FROM trips
            WHERE trip_id = $1
            "#,
        )
        .bind(trip_id)
        .fetch_optional(&mut **tx)
        .await?;

        let Some(trip) = trip else {
            return Ok(None);
        };

        let ride_requests = sqlx::query_as::<_, RideRequestRow>(
            r#"
            SELECT user_id, no_of_passengers, luggage_capacity, issued_price, status, joined_at
            FROM ride_requests
            WHERE trip_id = $1
            ORDER BY joined_at
            "#,
        )
        .bind(trip_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(Some((trip, ride_requests)))
    }

    pub async fn mark_cancelled(
        tx: &mut Transaction<'_, Postgres>,
        trip_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE trips SET status = 'CANCELLED' WHERE trip_id = $1")
            .bind(trip_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}
