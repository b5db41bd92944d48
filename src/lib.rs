pub mod api_client;
pub mod auth;
pub mod banners;
pub mod catalog;
pub mod comments;
pub mod config;
pub mod draft;
pub mod error;
pub mod filters;
pub mod manage;
pub mod models;
pub mod notifications;
pub mod session;
pub mod upload;
pub mod workflow;

pub use crate::api_client::ApiClient;
pub use crate::config::{ApiConfig, Endpoints};
pub use crate::error::{ApiError, ApiResult};
pub use crate::workflow::CatalogSession;

/// What a controller operation did. Failures have already been reported
/// through the notification queue by the time this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
    /// Nothing to do (no target, blank input) or superseded by a newer call.
    Skipped,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure)
    }
}
