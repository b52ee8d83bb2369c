//! Engine tunables, with their documented defaults.
//!
//! This struct is the engine-facing subset of configuration; it is embedded
//! in `matcher_service::config::MatcherConfig`, which adds the routing API,
//! pool/trip store and bus connection settings and loads everything via the
//! `config` crate the way the other web-service crates in this workspace do.

use serde::{Deserialize, Serialize};

fn default_origin_lat() -> f64 {
    0.0
}
fn default_origin_lng() -> f64 {
    0.0
}
fn default_hex_resolution() -> u8 {
    9
}
fn default_rate_per_km() -> f64 {
    10.0
}
fn default_pool_discount_factor() -> f64 {
    0.30
}
fn default_max_passengers() -> u32 {
    3
}
fn default_luggage_capacity() -> u32 {
    4
}
fn default_detour_max_m() -> f64 {
    3000.0
}
fn default_neighbour_scan_limit() -> usize {
    5
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Latitude of the single well-known origin (the airport).
    #[serde(default = "default_origin_lat")]
    pub origin_lat: f64,
    /// Longitude of the single well-known origin (the airport).
    #[serde(default = "default_origin_lng")]
    pub origin_lng: f64,
    /// H3 resolution governing cell width; passed straight to the indexing
    /// library.
    #[serde(default = "default_hex_resolution")]
    pub hex_resolution: u8,
    /// Base price per kilometre.
    #[serde(default = "default_rate_per_km")]
    pub rate_per_km: f64,
    /// Multiplier applied on each pairing join event.
    #[serde(default = "default_pool_discount_factor")]
    pub pool_discount_factor: f64,
    /// Cap on passengers per trip.
    #[serde(default = "default_max_passengers")]
    pub max_passengers: u32,
    /// Cap on luggage units per trip.
    #[serde(default = "default_luggage_capacity")]
    pub luggage_capacity: u32,
    /// Step-2 detour threshold in metres.
    #[serde(default = "default_detour_max_m")]
    pub detour_max_m: f64,
    /// Per-direction lex scan cap for predecessor/successor scans.
    #[serde(default = "default_neighbour_scan_limit")]
    pub neighbour_scan_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            origin_lat: default_origin_lat(),
            origin_lng: default_origin_lng(),
            hex_resolution: default_hex_resolution(),
            rate_per_km: default_rate_per_km(),
            pool_discount_factor: default_pool_discount_factor(),
            max_passengers: default_max_passengers(),
            luggage_capacity: default_luggage_capacity(),
            detour_max_m: default_detour_max_m(),
            neighbour_scan_limit: default_neighbour_scan_limit(),
        }
    }
}

impl EngineConfig {
    pub fn h3_resolution(&self) -> h3o::Resolution {
        h3o::Resolution::try_from(self.hex_resolution)
            .unwrap_or_else(|_| panic!("invalid hex_resolution {}", self.hex_resolution))
    }
}
