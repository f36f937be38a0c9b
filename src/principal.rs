//! Request-scoped authenticated identity

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GateError;

const ROLE_PREFIX: &str = "ROLE_";

/// A granted role. `ROLE_ADMIN` and `ADMIN` name the same role.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Role(String);

impl Role {
    pub fn new(name: &str) -> Self {
        let name = name.trim();
        Role(name.strip_prefix(ROLE_PREFIX).unwrap_or(name).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Authority string with the conventional `ROLE_` prefix
    pub fn authority(&self) -> String {
        format!("{ROLE_PREFIX}{}", self.0)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::new(&value)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity resolved for one request.
///
/// Created by the token validator or the login step and dropped with the
/// request; never cached or shared between requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    subject: String,
    roles: BTreeSet<Role>,
}

impl Principal {
    pub fn new(subject: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            subject: subject.into(),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    /// Capability check for use at the handler boundary.
    pub fn require_role(&self, role: &Role) -> Result<(), GateError> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(GateError::RoleInsufficient {
                required: role.to_string(),
            })
        }
    }
}
