//! Ember API - HTTP Controller Layer
//!
//! Maps the engagement verbs (like/unlike, burn/unburn, stats) onto the
//! engagement counter service. The caller's identity arrives from the
//! upstream authentication collaborator via the `x-ember-user-id`
//! header; post rows are seeded by the post-management collaborator (or
//! the `dev`-feature routes when running stand-alone).

pub mod config;
pub mod error;
pub mod macros;
pub mod middleware;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod state;

// Re-export commonly used types
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{CallerIdentity, CALLER_USER_ID_HEADER};
pub use routes::create_api_router;
pub use state::{ApiStorage, AppState, SharedService};
