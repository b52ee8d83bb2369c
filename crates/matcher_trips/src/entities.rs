//! Database row mappings for the trip schema.

use chrono::{DateTime, Utc};
use matcher_core::ports::{RideRequestSnapshot, TripSnapshot};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct TripRow {
    pub trip_id: String,
    pub status: String,
    pub fare_each: f64,
    pub no_of_passengers: i32,
    pub total_luggage: i32,
    pub cab_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct RideRequestRow {
    pub user_id: String,
    pub no_of_passengers: i32,
    pub luggage_capacity: i32,
    pub issued_price: f64,
    pub status: String,
    pub joined_at: DateTime<Utc>,
}

impl From<RideRequestRow> for RideRequestSnapshot {
    fn from(row: RideRequestRow) -> Self {
        RideRequestSnapshot {
            user_id: row.user_id,
            no_of_passengers: row.no_of_passengers as u32,
            luggage_capacity: row.luggage_capacity as u32,
            issued_price: row.issued_price,
            status: row.status,
            joined_at: row.joined_at,
        }
    }
}

pub fn assemble_snapshot(trip: TripRow, ride_requests: Vec<RideRequestRow>) -> TripSnapshot {
    TripSnapshot {
        trip_id: trip.trip_id,
        status: trip.status,
        fare_each: trip.fare_each,
        no_of_passengers: trip.no_of_passengers as u32,
        total_luggage: trip.total_luggage as u32,
        cab_id: trip.cab_id,
        created_at: trip.created_at,
        ride_requests: ride_requests.into_iter().map(Into::into).collect(),
    }
}
