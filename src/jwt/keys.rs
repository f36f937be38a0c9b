//! Trusted signing material
//!
//! Key lookups run on the request path and must never perform I/O.

use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, Header};

use crate::error::GateError;

/// Resolves the verification key for a token header.
pub trait KeyResolver: Send + Sync {
    /// Algorithms this resolver accepts
    fn algorithms(&self) -> &[Algorithm];

    /// Key for the header's `kid`, from memory only.
    fn resolve(&self, header: &Header) -> Result<Arc<DecodingKey>, GateError>;
}

/// A single shared HMAC secret.
pub struct StaticKey {
    key: Arc<DecodingKey>,
    algorithms: [Algorithm; 1],
}

impl StaticKey {
    /// HMAC secret for one of HS256/HS384/HS512
    pub fn hmac(secret: &[u8], algorithm: Algorithm) -> Result<Self, GateError> {
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(GateError::KeyStore {
                reason: format!("{algorithm:?} is not an HMAC algorithm"),
            });
        }
        if secret.len() < 32 {
            return Err(GateError::KeyStore {
                reason: "HMAC secret must be at least 32 bytes".to_string(),
            });
        }
        Ok(Self {
            key: Arc::new(DecodingKey::from_secret(secret)),
            algorithms: [algorithm],
        })
    }
}

impl KeyResolver for StaticKey {
    fn algorithms(&self) -> &[Algorithm] {
        &self.algorithms
    }

    fn resolve(&self, _header: &Header) -> Result<Arc<DecodingKey>, GateError> {
        Ok(Arc::clone(&self.key))
    }
}
