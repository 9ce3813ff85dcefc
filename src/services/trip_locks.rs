//! Per-trip locks
//!
//! Mutations of one trip run one at a time: the guard is held across the whole
//! load, mutate and save cycle. Different trips never contend.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct TripLocks {
    locks: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl TripLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `trip_id`.
    pub async fn acquire(&self, trip_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Entries nobody holds or waits on only cost memory.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(trip_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_trip_is_serialized() {
        let locks = TripLocks::new();
        let trip_id = Uuid::new_v4();

        let guard = locks.acquire(trip_id).await;
        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire(trip_id)).await;
        assert!(second.is_err());

        drop(guard);
        let third = tokio::time::timeout(Duration::from_millis(50), locks.acquire(trip_id)).await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn test_different_trips_do_not_contend() {
        let locks = TripLocks::new();
        let _first = locks.acquire(Uuid::new_v4()).await;
        let second =
            tokio::time::timeout(Duration::from_millis(50), locks.acquire(Uuid::new_v4())).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_released_locks_are_pruned() {
        let locks = TripLocks::new();
        for _ in 0..5 {
            let _guard = locks.acquire(Uuid::new_v4()).await;
        }
        let _held = locks.acquire(Uuid::new_v4()).await;
        assert_eq!(locks.tracked().await, 1);
    }
}
