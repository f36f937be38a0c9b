//! HMAC token issuance for the login step.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use crate::error::GateError;
use crate::jwt::claims::Claims;
use crate::principal::Principal;

/// Issued bearer token with its lifetime
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs tokens with a shared HMAC secret
pub struct TokenIssuer {
    key: EncodingKey,
    algorithm: Algorithm,
    ttl: Duration,
    issuer: Option<String>,
}

impl TokenIssuer {
    pub fn hmac(secret: &[u8], algorithm: Algorithm, ttl: Duration) -> Result<Self, GateError> {
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(GateError::KeyStore {
                reason: format!("{algorithm:?} is not an HMAC algorithm"),
            });
        }
        Ok(Self {
            key: EncodingKey::from_secret(secret),
            algorithm,
            ttl,
            issuer: None,
        })
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `principal`, valid from `now` for the configured TTL
    pub fn issue(&self, principal: &Principal, now: DateTime<Utc>) -> Result<IssuedToken, GateError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| GateError::Internal(anyhow::anyhow!("token expiry out of range")))?;
        let claims = Claims {
            sub: principal.subject().to_string(),
            roles: principal.roles().iter().cloned().collect(),
            exp: expires_at.timestamp(),
            iat: Some(now.timestamp()),
            nbf: None,
            iss: self.issuer.clone(),
        };
        self.sign(&claims).map(|token| IssuedToken { token, expires_at })
    }

    /// Sign arbitrary claims
    pub fn sign(&self, claims: &Claims) -> Result<String, GateError> {
        let header = Header::new(self.algorithm);
        encode(&header, claims, &self.key)
            .map_err(|e| GateError::Internal(anyhow::anyhow!("token signing failed: {e}")))
    }
}
