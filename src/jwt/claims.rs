use serde::{Deserialize, Serialize};

use crate::principal::{Principal, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl Claims {
    /// Expired once `now` reaches `exp + leeway`
    pub fn is_expired_at(&self, now: i64, leeway: i64) -> bool {
        now >= self.exp.saturating_add(leeway)
    }

    pub fn is_active_at(&self, now: i64, leeway: i64) -> bool {
        self.nbf.map_or(true, |nbf| now.saturating_add(leeway) >= nbf)
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    pub fn to_principal(&self) -> Principal {
        Principal::new(self.sub.clone(), self.roles.iter().cloned())
    }
}
