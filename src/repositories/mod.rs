//! Trip storage
//!
//! [`TripRepository`] persists whole [`TripAggregate`]s. `save` is atomic: the
//! trip, its stops and its log sheets are written together or not at all.

pub mod memory;
pub mod queries;
pub mod trip_repository;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Coordinate, Location, TripAggregate};
use crate::utils::errors::AppResult;

pub use memory::InMemoryTripRepository;
pub use trip_repository::PgTripRepository;

#[async_trait]
pub trait TripRepository: Send + Sync {
    async fn find_trip(&self, trip_id: Uuid) -> AppResult<Option<TripAggregate>>;

    /// Trips newest first, optionally restricted to one owner.
    async fn list_trips(&self, owner_id: Option<Uuid>) -> AppResult<Vec<TripAggregate>>;

    /// Insert or replace the aggregate.
    async fn save(&self, aggregate: &TripAggregate) -> AppResult<()>;

    /// `false` when the trip did not exist.
    async fn delete_trip(&self, trip_id: Uuid) -> AppResult<bool>;

    /// The stored location for `coordinate`, created on first use. An
    /// existing location keeps its original street name.
    async fn get_or_create_location(
        &self,
        coordinate: Coordinate,
        street_name: Option<String>,
    ) -> AppResult<Location>;
}
