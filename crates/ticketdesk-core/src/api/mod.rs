//! REST API client module for the ticket system.
//!
//! This module provides the `ApiClient` for registering, logging in,
//! resetting passwords and making bearer-authenticated requests.

pub mod client;
pub mod error;

pub use client::{ApiClient, DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use error::ApiError;
