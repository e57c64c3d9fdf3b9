//! Web API module for bookfeed.
//!
//! Serves the supplement endpoint, the connectivity probe and a health
//! check over HTTP with permissive CORS.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
