//! Pool entry shapes.
//!
//! A pool entry is either a lone waiting passenger or a forming/sealed
//! trip. The shape is an explicit tagged enum rather than inferred from
//! field presence, and the `TRIP` entry-id prefix convention is enforced at
//! construction, never guessed at from the value later.

use serde::{Deserialize, Serialize};

use crate::signature::{is_trip_entry_id, RouteSignature, TRIP_ID_PREFIX};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolStatus {
    Waiting,
    Active,
}

/// Metadata for a single waiting passenger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassengerMeta {
    pub user_id: String,
    pub route_signature: RouteSignature,
    pub passenger_count: u32,
    pub luggage_units: u32,
    pub issued_price: f64,
}

/// A trip member's original metadata, retained on the trip entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripMember {
    pub user_id: String,
    pub passenger_count: u32,
    pub luggage_units: u32,
    pub issued_price: f64,
}

impl From<&PassengerMeta> for TripMember {
    fn from(p: &PassengerMeta) -> Self {
        Self {
            user_id: p.user_id.clone(),
            passenger_count: p.passenger_count,
            luggage_units: p.luggage_units,
            issued_price: p.issued_price,
        }
    }
}

/// Metadata for a forming or sealed trip entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripMeta {
    pub trip_id: String,
    pub route_signature: RouteSignature,
    pub passenger_count: u32,
    pub luggage_units: u32,
    pub status: PoolStatus,
    pub members: Vec<TripMember>,
}

impl TripMeta {
    pub fn new_trip_id() -> String {
        format!("{TRIP_ID_PREFIX}{}", uuid::Uuid::new_v4())
    }
}

/// A pool entry is either a lone waiting passenger or a forming/sealed
/// trip. Shape is never inferred from field presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PoolEntry {
    Passenger(PassengerMeta),
    Trip(TripMeta),
}

impl PoolEntry {
    pub fn entry_id(&self) -> &str {
        match self {
            PoolEntry::Passenger(p) => &p.user_id,
            PoolEntry::Trip(t) => &t.trip_id,
        }
    }

    pub fn route_signature(&self) -> &RouteSignature {
        match self {
            PoolEntry::Passenger(p) => &p.route_signature,
            PoolEntry::Trip(t) => &t.route_signature,
        }
    }

    pub fn passenger_count(&self) -> u32 {
        match self {
            PoolEntry::Passenger(p) => p.passenger_count,
            PoolEntry::Trip(t) => t.passenger_count,
        }
    }

    pub fn luggage_units(&self) -> u32 {
        match self {
            PoolEntry::Passenger(p) => p.luggage_units,
            PoolEntry::Trip(t) => t.luggage_units,
        }
    }

    pub fn issued_price(&self) -> f64 {
        match self {
            PoolEntry::Passenger(p) => p.issued_price,
            PoolEntry::Trip(t) => t.members.last().map(|m| m.issued_price).unwrap_or(0.0),
        }
    }

    pub fn is_trip(&self) -> bool {
        matches!(self, PoolEntry::Trip(_)) || is_trip_entry_id(self.entry_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig() -> RouteSignature {
        RouteSignature::parse("A".repeat(crate::signature::CELL_WIDTH)).unwrap()
    }

    #[test]
    fn passenger_entry_id_is_bare_user_id() {
        let p = PoolEntry::Passenger(PassengerMeta {
            user_id: "rider-1".into(),
            route_signature: sig(),
            passenger_count: 1,
            luggage_units: 1,
            issued_price: 10.0,
        });
        assert_eq!(p.entry_id(), "rider-1");
        assert!(!p.is_trip());
    }

    #[test]
    fn trip_entry_id_carries_prefix() {
        let id = TripMeta::new_trip_id();
        assert!(id.starts_with(TRIP_ID_PREFIX));
        let t = PoolEntry::Trip(TripMeta {
            trip_id: id.clone(),
            route_signature: sig(),
            passenger_count: 2,
            luggage_units: 2,
            status: PoolStatus::Waiting,
            members: vec![],
        });
        assert_eq!(t.entry_id(), id);
        assert!(t.is_trip());
    }
}
