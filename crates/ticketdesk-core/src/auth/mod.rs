//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `Session`: token plus derived identity, with a three-state status
//! - `TokenStore`: the single persisted token slot (file, keychain, memory)
//! - `token`: client-side JWT payload decoding and expiry checks
//!
//! The token is the source of truth; the identity is always derived from it.

pub mod session;
pub mod storage;
pub mod token;

pub use session::{IdentitySource, Session, SessionError, SessionStatus};
pub use storage::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore};
pub use token::{TokenClaims, TokenError};
