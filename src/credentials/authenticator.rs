//! Username/password authentication for the login endpoint

use std::sync::Arc;

use tracing::{debug, info};

use super::{PasswordHasher, UserDetailsLookup};
use crate::error::GateError;
use crate::principal::Principal;

const DUMMY_PASSWORD: &str = "timing-equaliser";

/// Checks a username/password pair against the account store.
///
/// Unknown users and wrong passwords fail identically with
/// [`GateError::BadCredentials`], and both pay for one hash verification.
pub struct LoginAuthenticator {
    users: Arc<dyn UserDetailsLookup>,
    hasher: Arc<dyn PasswordHasher>,
    dummy_hash: String,
}

impl LoginAuthenticator {
    pub fn new(
        users: Arc<dyn UserDetailsLookup>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Result<Self, GateError> {
        let dummy_hash = hasher.hash(DUMMY_PASSWORD)?;
        Ok(Self {
            users,
            hasher,
            dummy_hash,
        })
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Principal, GateError> {
        let user = self.users.find_by_username(username).await?;

        let hash = match &user {
            Some(details) => details.password_hash.clone(),
            None => self.dummy_hash.clone(),
        };

        let hasher = Arc::clone(&self.hasher);
        let password = password.to_owned();
        let matched = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| GateError::Internal(anyhow::anyhow!("password check aborted: {e}")))?;

        match (user, matched) {
            (Some(details), Ok(true)) => {
                debug!(username = %details.username, "Login succeeded");
                Ok(Principal::new(details.username, details.roles))
            }
            (_, Err(err)) => {
                info!(username = %username, error = %err, "Login rejected, stored hash unusable");
                Err(GateError::BadCredentials)
            }
            _ => {
                info!(username = %username, "Login rejected");
                Err(GateError::BadCredentials)
            }
        }
    }
}
