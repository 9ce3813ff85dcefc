//! Shared application state
//!
//! Handed to every axum handler. Both services share one set of trip locks so
//! log sheet edits and trip mutations never interleave.

use std::sync::Arc;

use crate::clients::DirectionsGateway;
use crate::config::{EnvironmentConfig, HosPolicy};
use crate::repositories::TripRepository;
use crate::services::{LogSheetService, TripLocks, TripService};

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub trips: Arc<TripService>,
    pub log_sheets: Arc<LogSheetService>,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        policy: HosPolicy,
        repository: Arc<dyn TripRepository>,
        gateway: Arc<dyn DirectionsGateway>,
    ) -> Self {
        let locks = TripLocks::new();
        Self {
            config,
            trips: Arc::new(TripService::new(
                repository.clone(),
                gateway,
                policy,
                locks.clone(),
            )),
            log_sheets: Arc::new(LogSheetService::new(repository, locks)),
        }
    }
}
