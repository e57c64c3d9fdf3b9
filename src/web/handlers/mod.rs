//! API handlers.

pub mod probe;
pub mod supplement;

pub use probe::*;
pub use supplement::*;

use crate::service::SupplementService;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The supplement pipeline.
    pub service: SupplementService,
}

impl AppState {
    /// Create a new application state.
    pub fn new(service: SupplementService) -> Self {
        Self { service }
    }
}
