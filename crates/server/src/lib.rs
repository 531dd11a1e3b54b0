//! HTTP API server for the emboss resigning service.
//!
//! This crate provides the HTTP surface:
//! - Multipart signing requests
//! - OTA install manifest generation
//! - Artifact listing, download and deletion
//! - Signing-tool health probe

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
