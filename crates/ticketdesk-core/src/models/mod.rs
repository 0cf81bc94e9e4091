//! Data models for the ticket system API.
//!
//! - `User`, `Role`: authenticated identity and its role
//! - `Ticket`: tickets listed on the dashboard
//! - Request/response bodies for the authentication endpoints

pub mod ticket;
pub mod user;

pub use ticket::Ticket;
pub use user::{
    LoginRequest, LoginResponse, RegisterRequest, ResetPasswordRequest, Role, User,
};
