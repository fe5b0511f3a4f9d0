//! Shared application state for Axum routers.

use std::sync::Arc;

use ember_engagement::EngagementService;
use ember_storage::InMemoryStorage;

/// Storage backend used by the API.
///
/// Currently the in-memory transactional engine; a SQL-backed
/// implementation of the same traits would slot in here.
pub type ApiStorage = InMemoryStorage;

/// Shared handle to the engagement counter service.
pub type SharedService = Arc<EngagementService<ApiStorage>>;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend (post seeding, health probes).
    pub storage: Arc<ApiStorage>,
    /// Engagement counter service - the only component that mutates
    /// post counters.
    pub service: SharedService,
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Assemble state over a storage backend.
    pub fn new(storage: Arc<ApiStorage>) -> Self {
        let service = Arc::new(EngagementService::new(Arc::clone(&storage)));
        Self {
            storage,
            service,
            start_time: std::time::Instant::now(),
        }
    }
}

// Use macro to reduce boilerplate for FromRef implementations
crate::impl_from_ref!(Arc<ApiStorage>, storage);
crate::impl_from_ref!(SharedService, service);
crate::impl_from_ref!(std::time::Instant, start_time);
