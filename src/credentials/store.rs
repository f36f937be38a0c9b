//! In-memory account store

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use parking_lot::RwLock;

use super::{UserDetails, UserDetailsLookup};
use crate::error::GateError;

/// Accounts held in a map keyed by username
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserDetails>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = UserDetails>) -> Self {
        let store = Self::new();
        for user in users {
            store.insert(user);
        }
        store
    }

    /// Load a JSON array of [`UserDetails`]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, GateError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading users file {}", path.display()))?;
        let users: Vec<UserDetails> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing users file {}", path.display()))?;
        Ok(Self::with_users(users))
    }

    /// Insert or replace an account
    pub fn insert(&self, user: UserDetails) {
        self.users.write().insert(user.username.clone(), user);
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

#[async_trait]
impl UserDetailsLookup for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserDetails>, GateError> {
        Ok(self.users.read().get(username).cloned())
    }
}
