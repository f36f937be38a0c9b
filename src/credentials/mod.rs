//! Login-time credential checking
//!
//! The gate itself never sees passwords. This module backs the login
//! endpoint: look the user up, verify the password hash, and hand the
//! resulting [`Principal`](crate::principal::Principal) to the token issuer.

pub mod authenticator;
pub mod hasher;
pub mod store;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GateError;
use crate::principal::Role;

pub use authenticator::LoginAuthenticator;
pub use hasher::{BcryptPasswordHasher, PasswordHasher};
pub use store::InMemoryUserStore;

/// Stored account record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDetails {
    pub username: String,
    /// Encoded hash, never the plain password
    pub password_hash: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

/// Source of account records.
#[async_trait]
pub trait UserDetailsLookup: Send + Sync {
    /// `Ok(None)` when no such user exists
    async fn find_by_username(&self, username: &str) -> Result<Option<UserDetails>, GateError>;
}
