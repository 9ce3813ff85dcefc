//! In-memory trip storage, used when no database is configured and in tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::TripRepository;
use crate::models::{Coordinate, CoordinateKey, Location, TripAggregate};
use crate::utils::errors::AppResult;

#[derive(Debug, Clone, Default)]
pub struct InMemoryTripRepository {
    trips: Arc<RwLock<HashMap<Uuid, TripAggregate>>>,
    locations: Arc<RwLock<HashMap<CoordinateKey, Location>>>,
}

impl InMemoryTripRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn location_count(&self) -> usize {
        self.locations.read().await.len()
    }
}

#[async_trait]
impl TripRepository for InMemoryTripRepository {
    async fn find_trip(&self, trip_id: Uuid) -> AppResult<Option<TripAggregate>> {
        Ok(self.trips.read().await.get(&trip_id).cloned())
    }

    async fn list_trips(&self, owner_id: Option<Uuid>) -> AppResult<Vec<TripAggregate>> {
        let trips = self.trips.read().await;
        let mut listed: Vec<TripAggregate> = trips
            .values()
            .filter(|aggregate| owner_id.map_or(true, |owner| aggregate.trip.owner_id == Some(owner)))
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.trip.created_at.cmp(&a.trip.created_at));
        Ok(listed)
    }

    async fn save(&self, aggregate: &TripAggregate) -> AppResult<()> {
        let mut stored = aggregate.clone();
        stored.sort();
        self.trips.write().await.insert(stored.id(), stored);
        Ok(())
    }

    async fn delete_trip(&self, trip_id: Uuid) -> AppResult<bool> {
        Ok(self.trips.write().await.remove(&trip_id).is_some())
    }

    async fn get_or_create_location(
        &self,
        coordinate: Coordinate,
        street_name: Option<String>,
    ) -> AppResult<Location> {
        let mut locations = self.locations.write().await;
        let location = locations
            .entry(coordinate.key())
            .or_insert_with(|| Location::new(coordinate, street_name));
        Ok(location.clone())
    }
}
