//! Route Indexer: turns a destination lat/lng into a route signature by
//! calling the external road-routing API, mapping waypoints to hex cells,
//! and gap-filling the result into a spatially contiguous sequence.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::IndexerError;
use crate::signature::RouteSignature;
use crate::spatial::{grid_path_cells, GeoIndex};

/// Output of a successful `compute_route` call.
#[derive(Debug, Clone)]
pub struct ComputedRoute {
    pub destination_cell: String,
    pub route_signature: RouteSignature,
    pub cells: Vec<String>,
    pub total_km: f64,
}

// ---------------------------------------------------------------------------
// Routing API wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct DirectionsRequest {
    origin: LatLngPoint,
    destination: LatLngPoint,
    #[serde(rename = "travelMode")]
    travel_mode: &'static str,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
struct LatLngPoint {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    routes: Vec<ApiRoute>,
}

#[derive(Debug, Deserialize)]
struct ApiRoute {
    legs: Vec<ApiLeg>,
    #[serde(rename = "distanceMeters")]
    distance_meters: f64,
}

#[derive(Debug, Deserialize)]
struct ApiLeg {
    steps: Vec<ApiStep>,
}

#[derive(Debug, Deserialize)]
struct ApiStep {
    #[serde(rename = "startLocation")]
    start_location: ApiLocation,
    #[serde(rename = "endLocation")]
    end_location: ApiLocation,
}

#[derive(Debug, Deserialize)]
struct ApiLocation {
    #[serde(rename = "latLng")]
    lat_lng: LatLngPoint,
}

/// The Route Indexer.
pub struct RouteIndexer {
    client: reqwest::Client,
    routing_api_url: String,
    origin: LatLngPoint,
    geo: GeoIndex,
    request_timeout: Duration,
}

impl RouteIndexer {
    pub fn new(
        client: reqwest::Client,
        routing_api_url: impl Into<String>,
        origin_lat: f64,
        origin_lng: f64,
        resolution: h3o::Resolution,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client,
            routing_api_url: routing_api_url.into(),
            origin: LatLngPoint {
                lat: origin_lat,
                lng: origin_lng,
            },
            geo: GeoIndex::new(resolution),
            request_timeout,
        }
    }

    /// Compute the route signature from the origin to `(lat, lng)`.
    pub async fn compute_route(&self, lat: f64, lng: f64) -> Result<ComputedRoute, IndexerError> {
        let destination = LatLngPoint { lat, lng };
        let started = std::time::Instant::now();

        let response = tokio::time::timeout(
            self.request_timeout,
            self.client
                .post(&self.routing_api_url)
                .json(&DirectionsRequest {
                    origin: self.origin,
                    destination,
                    travel_mode: "DRIVE",
                })
                .send(),
        )
        .await
        .map_err(|_| IndexerError::Timeout)?
        .map_err(|e| IndexerError::RoutingApiUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IndexerError::RoutingApiUnavailable(format!(
                "status {}",
                response.status()
            )));
        }

        let body: DirectionsResponse = response
            .json()
            .await
            .map_err(|e| IndexerError::RoutingApiUnavailable(e.to_string()))?;

        let route = body.routes.first().ok_or(IndexerError::NoRouteFound)?;

        // Step 2: flatten step start/end coordinates into ordered waypoints.
        let mut waypoints = Vec::new();
        for leg in &route.legs {
            for step in &leg.steps {
                waypoints.push(step.start_location.lat_lng);
                waypoints.push(step.end_location.lat_lng);
            }
        }
        if waypoints.is_empty() {
            return Err(IndexerError::NoRouteFound);
        }

        let raw_cells: Vec<h3o::CellIndex> = waypoints
            .iter()
            .map(|p| {
                self.geo
                    .cell_for(p.lat, p.lng)
                    .map_err(|e| IndexerError::RoutingApiUnavailable(e.to_string()))
            })
            .collect::<Result<_, _>>()?;

        // Step 3: de-duplicate consecutive equal cells.
        let mut deduped: Vec<h3o::CellIndex> = Vec::with_capacity(raw_cells.len());
        for cell in raw_cells {
            if deduped.last() != Some(&cell) {
                deduped.push(cell);
            }
        }

        // Step 4: gap-fill each adjacent pair with the shortest grid path,
        // splicing cells in while skipping ones already appended.
        let mut seen = std::collections::HashSet::new();
        let mut cells: Vec<h3o::CellIndex> = Vec::with_capacity(deduped.len());
        for window in deduped.windows(2) {
            let (from, to) = (window[0], window[1]);
            if cells.is_empty() {
                cells.push(from);
                seen.insert(from);
            }
            let path = grid_path_cells(from, to).unwrap_or_else(|| vec![from, to]);
            for cell in path.into_iter().skip(1) {
                if seen.insert(cell) {
                    cells.push(cell);
                }
            }
        }
        if cells.is_empty() {
            // Single-waypoint (or all-duplicate) route: just the one cell.
            cells.push(deduped[0]);
        }

        // Step 5: append the destination cell if it isn't already the tail.
        let dest_cell = self
            .geo
            .cell_for(lat, lng)
            .map_err(|e| IndexerError::RoutingApiUnavailable(e.to_string()))?;
        if cells.last() != Some(&dest_cell) {
            cells.push(dest_cell);
        }

        let cell_strings: Vec<String> = cells.iter().map(|c| c.to_string()).collect();
        let route_signature = RouteSignature::from_cells(&cell_strings);

        debug!(
            cell_count = cell_strings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "computed route signature"
        );

        Ok(ComputedRoute {
            destination_cell: cell_strings.last().cloned().unwrap_or_default(),
            route_signature,
            cells: cell_strings,
            total_km: route.distance_meters / 1000.0,
        })
    }

    /// Driving distance in metres between two already-computed cells,
    /// converted to lat/lng centres first. Reuses the same routing API;
    /// failures propagate as `IndexerError` and cause the caller to skip
    /// the candidate, not treat it as a hard failure, since a detour
    /// candidate is optional by definition.
    pub async fn detour_distance_m(
        &self,
        from_cell: &str,
        to_cell: &str,
    ) -> Result<f64, IndexerError> {
        let from = parse_cell(from_cell)?;
        let to = parse_cell(to_cell)?;
        let from_ll: h3o::LatLng = from.into();
        let to_ll: h3o::LatLng = to.into();

        let route = self.compute_route_between(from_ll, to_ll).await?;
        Ok(route.distance_meters)
    }

    async fn compute_route_between(
        &self,
        from: h3o::LatLng,
        to: h3o::LatLng,
    ) -> Result<ApiRoute, IndexerError> {
        let response = tokio::time::timeout(
            self.request_timeout,
            self.client
                .post(&self.routing_api_url)
                .json(&DirectionsRequest {
                    origin: LatLngPoint {
                        lat: from.lat(),
                        lng: from.lng(),
                    },
                    destination: LatLngPoint {
                        lat: to.lat(),
                        lng: to.lng(),
                    },
                    travel_mode: "DRIVE",
                })
                .send(),
        )
        .await
        .map_err(|_| IndexerError::Timeout)?
        .map_err(|e| IndexerError::RoutingApiUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IndexerError::RoutingApiUnavailable(format!(
                "status {}",
                response.status()
            )));
        }

        let body: DirectionsResponse = response
            .json()
            .await
            .map_err(|e| IndexerError::RoutingApiUnavailable(e.to_string()))?;

        body.routes.into_iter().next().ok_or_else(|| {
            warn!("detour lookup returned no route");
            IndexerError::NoRouteFound
        })
    }
}

fn parse_cell(cell: &str) -> Result<h3o::CellIndex, IndexerError> {
    cell.parse::<h3o::CellIndex>()
        .map_err(|_| IndexerError::RoutingApiUnavailable(format!("invalid cell id {cell}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_cell_string() {
        let cell = h3o::CellIndex::try_from(0x8a1fb46622dffff).expect("valid cell");
        let s = cell.to_string();
        let parsed = parse_cell(&s).expect("parses back");
        assert_eq!(parsed, cell);
    }
}
