//! Fuel-position optimizer
//!
//! Picks where a loose fuel stop goes in a route. Every insertion point after
//! the origin is routed (distance only) and the one whose cumulative mileage up
//! to the fuel stop lands closest to the ideal refuelling distance wins.

use std::sync::Arc;

use futures::future::join_all;

use crate::clients::{DirectionsGateway, GatewayError};
use crate::config::HosPolicy;
use crate::models::{Coordinate, RouteOptions};

/// Chosen insertion point of the fuel stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuelPlacement {
    /// Index of the fuel stop in the final coordinate list.
    pub index: usize,
    pub cumulative_miles: f64,
    pub deviation_miles: f64,
}

#[derive(Clone)]
pub struct FuelPositionOptimizer {
    gateway: Arc<dyn DirectionsGateway>,
    policy: HosPolicy,
}

impl FuelPositionOptimizer {
    pub fn new(gateway: Arc<dyn DirectionsGateway>, policy: HosPolicy) -> Self {
        Self { gateway, policy }
    }

    /// Best index for `fuel` within `base`, or `None` when no candidate could
    /// be routed.
    pub async fn choose_position(
        &self,
        base: &[Coordinate],
        fuel: Coordinate,
    ) -> Option<FuelPlacement> {
        if base.len() < 2 {
            return None;
        }

        let requests = (1..base.len()).map(|index| {
            let mut coordinates = base.to_vec();
            coordinates.insert(index, fuel);
            async move {
                let result = self
                    .cumulative_miles(&coordinates, index)
                    .await;
                (index, result)
            }
        });

        let mut candidates = Vec::with_capacity(base.len() - 1);
        for (index, result) in join_all(requests).await {
            match result {
                Ok(miles) => candidates.push((index, miles)),
                Err(e) => log::warn!("⚠️ Fuel candidate at index {} skipped: {}", index, e),
            }
        }

        let placement = select_best(&candidates, self.policy.optimal_fuel_distance_miles());
        match placement {
            Some(p) => log::info!(
                "⛽ Fuel stop placed at index {} ({:.1} mi, {:.1} mi off ideal)",
                p.index,
                p.cumulative_miles,
                p.deviation_miles
            ),
            None => log::warn!("⚠️ No fuel candidate could be routed; keeping original order"),
        }
        placement
    }

    /// Miles driven before reaching the coordinate at `index`.
    async fn cumulative_miles(
        &self,
        coordinates: &[Coordinate],
        index: usize,
    ) -> Result<f64, GatewayError> {
        let response = self
            .gateway
            .get_route(coordinates, RouteOptions::distance_only())
            .await?;

        let legs = response.legs();
        if legs.len() < index {
            return Err(GatewayError::Parse(format!(
                "route has {} legs, candidate needs {}",
                legs.len(),
                index
            )));
        }

        let meters: f64 = legs[..index].iter().map(|leg| leg.distance).sum();
        Ok(self.policy.meters_to_miles(meters))
    }
}

/// Candidate `(index, cumulative_miles)` closest to `optimal_miles`. Ties keep
/// the earliest candidate.
pub fn select_best(candidates: &[(usize, f64)], optimal_miles: f64) -> Option<FuelPlacement> {
    let mut best: Option<FuelPlacement> = None;
    for &(index, cumulative_miles) in candidates {
        let deviation_miles = (cumulative_miles - optimal_miles).abs();
        if best.map_or(true, |current| deviation_miles < current.deviation_miles) {
            best = Some(FuelPlacement {
                index,
                cumulative_miles,
                deviation_miles,
            });
        }
    }
    best
}
