//! Core library for ticketdesk.
//!
//! Client-side authentication for the ticket system: the API client, the
//! session model (token persistence, decode, three-state status), the route
//! guard, the account forms and the role-aware dashboard model. The terminal
//! front end lives in `ticketdesk-tui`.

pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod forms;
pub mod guard;
pub mod models;
pub mod route;
pub mod service;

pub use api::{ApiClient, ApiError};
pub use auth::{IdentitySource, Session, SessionStatus};
pub use config::Config;
pub use guard::{GuardDecision, RouteGuard};
pub use route::Route;
pub use service::{AuthService, RegistrationOutcome, ServiceError};
