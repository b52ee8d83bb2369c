//! Spatial operations: H3-based geographic indexing and distance calculations.
//!
//! `GeoIndex` wraps an H3 resolution; cached Haversine distance and a
//! grid-path helper support the Route Indexer's gap-fill step.

use std::num::NonZeroUsize;
use std::sync::{Mutex, OnceLock};

use h3o::{CellIndex, LatLng, Resolution};
use lru::LruCache;

#[derive(Debug, Clone, Copy)]
pub struct GeoIndex {
    resolution: Resolution,
}

impl GeoIndex {
    pub fn new(resolution: Resolution) -> Self {
        Self { resolution }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Map a lat/lng point to its hex cell at this index's resolution.
    pub fn cell_for(&self, lat: f64, lng: f64) -> Result<CellIndex, h3o::error::InvalidLatLng> {
        Ok(LatLng::new(lat, lng)?.to_cell(self.resolution))
    }

    pub fn grid_disk(&self, origin: CellIndex, k: u32) -> Vec<CellIndex> {
        debug_assert_eq!(
            origin.resolution(),
            self.resolution,
            "origin resolution must match GeoIndex resolution"
        );
        origin.grid_disk::<Vec<_>>(k)
    }
}

impl Default for GeoIndex {
    fn default() -> Self {
        Self {
            resolution: Resolution::Nine,
        }
    }
}

/// Uncached distance calculation (internal use).
fn distance_km_between_cells_uncached(a: CellIndex, b: CellIndex) -> f64 {
    let a: LatLng = a.into();
    let b: LatLng = b.into();
    let (lat1, lon1) = (a.lat().to_radians(), a.lng().to_radians());
    let (lat2, lon2) = (b.lat().to_radians(), b.lng().to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    6371.0 * c
}

/// Global distance cache (10,000 entries, ~160KB memory).
fn get_distance_cache() -> &'static Mutex<LruCache<(CellIndex, CellIndex), f64>> {
    static CACHE: OnceLock<Mutex<LruCache<(CellIndex, CellIndex), f64>>> = OnceLock::new();
    CACHE.get_or_init(|| {
        Mutex::new(LruCache::new(
            NonZeroUsize::new(10_000).expect("cache size must be non-zero"),
        ))
    })
}

/// Calculate distance between two H3 cells with LRU caching.
pub fn distance_km_between_cells(a: CellIndex, b: CellIndex) -> f64 {
    let key = if a < b { (a, b) } else { (b, a) };
    let mut cache = get_distance_cache().lock().unwrap();
    *cache.get_or_insert(key, || distance_km_between_cells_uncached(key.0, key.1))
}

/// Shortest grid-path between two cells, inclusive of both endpoints.
///
/// Used by the Route Indexer to splice contiguous cells between waypoints
/// that H3 at this resolution doesn't already connect.
/// Returns `None` if H3 cannot compute a local IJ path between the cells
/// (e.g. they cross a base-cell pentagon boundary); callers fall back to
/// just appending `to` directly.
pub fn grid_path_cells(from: CellIndex, to: CellIndex) -> Option<Vec<CellIndex>> {
    if from == to {
        return Some(vec![from]);
    }
    from.grid_path_cells(to).ok()?.collect::<Result<Vec<_>, _>>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_disk_returns_neighbors_within_k() {
        let geo = GeoIndex::new(Resolution::Ten);
        let origin = CellIndex::try_from(0x8a1fb46622dffff).expect("valid cell");
        let cells = geo.grid_disk(origin, 1);

        assert!(cells.contains(&origin));
        for cell in cells {
            let distance = origin.grid_distance(cell).expect("grid distance");
            assert!(distance <= 1);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let a = CellIndex::try_from(0x8a1fb46622dffff).expect("valid cell");
        let b = *a.grid_disk::<Vec<_>>(2).last().expect("neighbor");
        assert_eq!(distance_km_between_cells(a, b), distance_km_between_cells(b, a));
    }
}
