//! Token Validator
//!
//! A pure function of (raw token, current time, trusted key material).

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::GateError;
use crate::jwt::keys::KeyResolver;
use crate::jwt::token::{ClaimChecks, Token, Unvalidated, Verified};
use crate::principal::Principal;

/// Why a token was not accepted. Each reason is distinguishable even though
/// all of them surface as 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenRejection {
    Missing,
    Malformed,
    Expired,
    SignatureInvalid,
}

impl TokenRejection {
    /// Classify a validator error; `None` for errors that are not token
    /// rejections (key store outages and the like)
    pub fn of(err: &GateError) -> Option<Self> {
        match err {
            GateError::TokenMissing => Some(Self::Missing),
            GateError::TokenMalformed { .. } => Some(Self::Malformed),
            GateError::TokenExpired { .. } => Some(Self::Expired),
            GateError::TokenSignatureInvalid => Some(Self::SignatureInvalid),
            _ => None,
        }
    }
}

/// JWT validator bound to one set of trusted keys
pub struct TokenValidator {
    keys: Arc<dyn KeyResolver>,
    issuer: Option<String>,
    leeway_seconds: i64,
}

impl TokenValidator {
    pub fn new(keys: Arc<dyn KeyResolver>) -> Self {
        Self {
            keys,
            issuer: None,
            leeway_seconds: 0,
        }
    }

    /// Require tokens to carry this `iss`
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Tolerated clock skew for `exp` and `nbf`
    pub fn with_leeway(mut self, seconds: i64) -> Self {
        self.leeway_seconds = seconds.max(0);
        self
    }

    /// Run the full type-state pipeline.
    pub fn validate_token(&self, raw: &str, now: DateTime<Utc>) -> Result<Token<Verified>, GateError> {
        if raw.trim().is_empty() {
            return Err(GateError::TokenMissing);
        }

        let unvalidated = Token::<Unvalidated>::parse(raw)?;
        let signed = unvalidated.verify_signature(self.keys.as_ref())?;
        signed.validate_claims(&ClaimChecks {
            now: now.timestamp(),
            leeway: self.leeway_seconds,
            issuer: self.issuer.as_deref(),
        })
    }

    /// Validate and extract the principal.
    pub fn validate(&self, raw: &str, now: DateTime<Utc>) -> Result<Principal, GateError> {
        self.validate_token(raw, now)?.into_principal()
    }
}
