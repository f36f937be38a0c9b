//! Type-State JWT Token with compile-time validation guarantees
//!
//! Claims can only be turned into a [`Principal`] once the token has passed
//! signature verification and the time checks.

use std::marker::PhantomData;

use jsonwebtoken::{decode, decode_header, Algorithm, Header, Validation};

use crate::error::GateError;
use crate::jwt::claims::Claims;
use crate::jwt::keys::KeyResolver;
use crate::principal::Principal;

// ============================================================================
// Sealed Trait Pattern for Token States
// ============================================================================

mod private {
    pub trait Sealed {}
}

/// Marker trait for token validation states
pub trait TokenState: private::Sealed {
    fn state_name() -> &'static str;
}

/// Header parsed, nothing verified
#[derive(Debug)]
pub struct Unvalidated;
impl private::Sealed for Unvalidated {}
impl TokenState for Unvalidated {
    fn state_name() -> &'static str {
        "Unvalidated"
    }
}

/// Signature verified against trusted key material
#[derive(Debug)]
pub struct SignatureVerified;
impl private::Sealed for SignatureVerified {}
impl TokenState for SignatureVerified {
    fn state_name() -> &'static str {
        "SignatureVerified"
    }
}

/// Signature, time window and issuer verified
#[derive(Debug)]
pub struct Verified;
impl private::Sealed for Verified {}
impl TokenState for Verified {
    fn state_name() -> &'static str {
        "Verified"
    }
}

// ============================================================================
// Type-State Token Wrapper
// ============================================================================

/// Time and issuer constraints applied after signature verification.
#[derive(Debug, Clone, Default)]
pub struct ClaimChecks<'a> {
    /// Current unix time in seconds
    pub now: i64,
    /// Allowed clock skew in seconds
    pub leeway: i64,
    /// Required `iss`, if any
    pub issuer: Option<&'a str>,
}

#[derive(Debug)]
pub struct Token<State: TokenState> {
    raw: String,
    header: Header,
    claims: Option<Claims>,
    _state: PhantomData<State>,
}

impl Token<Unvalidated> {
    /// Parse the header of a compact JWT.
    pub fn parse(raw: &str) -> Result<Self, GateError> {
        if raw.split('.').count() != 3 {
            return Err(GateError::TokenMalformed {
                reason: "expected three dot-separated segments".to_string(),
            });
        }

        let header = decode_header(raw).map_err(|e| GateError::TokenMalformed {
            reason: format!("invalid header: {}", crate::error::sanitize_message(&e.to_string())),
        })?;

        Ok(Token {
            raw: raw.to_string(),
            header,
            claims: None,
            _state: PhantomData,
        })
    }

    pub fn kid(&self) -> Option<&str> {
        self.header.kid.as_deref()
    }

    pub fn algorithm(&self) -> Algorithm {
        self.header.alg
    }

    /// Verify the signature and decode the claims.
    ///
    /// Time-based claims are left to [`Token::validate_claims`], so a forged
    /// token reports a signature failure even when it is also expired.
    ///
    /// HMAC tags are checked by `jsonwebtoken`, which verifies through
    /// `ring::hmac::verify` and so compares in constant time.
    pub fn verify_signature(
        self,
        keys: &dyn KeyResolver,
    ) -> Result<Token<SignatureVerified>, GateError> {
        if !keys.algorithms().contains(&self.header.alg) {
            return Err(GateError::TokenSignatureInvalid);
        }

        let key = keys.resolve(&self.header)?;

        let mut validation = Validation::new(self.header.alg);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let token_data = decode::<Claims>(&self.raw, &key, &validation)?;

        if token_data.claims.sub.trim().is_empty() {
            return Err(GateError::TokenMalformed {
                reason: "empty subject".to_string(),
            });
        }

        Ok(Token {
            raw: self.raw,
            header: self.header,
            claims: Some(token_data.claims),
            _state: PhantomData,
        })
    }
}

impl Token<SignatureVerified> {
    /// Check the validity window and issuer.
    pub fn validate_claims(self, checks: &ClaimChecks<'_>) -> Result<Token<Verified>, GateError> {
        let claims = self.claims.as_ref().ok_or_else(|| GateError::TokenMalformed {
            reason: "claims not available".to_string(),
        })?;

        if !claims.is_active_at(checks.now, checks.leeway) {
            return Err(GateError::TokenMalformed {
                reason: "not yet valid".to_string(),
            });
        }

        if claims.is_expired_at(checks.now, checks.leeway) {
            return Err(GateError::TokenExpired {
                expired_at: chrono::DateTime::from_timestamp(claims.exp, 0).unwrap_or_default(),
            });
        }

        if let Some(expected) = checks.issuer {
            if claims.iss.as_deref() != Some(expected) {
                return Err(GateError::TokenSignatureInvalid);
            }
        }

        Ok(Token {
            raw: self.raw,
            header: self.header,
            claims: self.claims,
            _state: PhantomData,
        })
    }

    /// Read-only look at claims whose signature is trusted but whose
    /// validity window has not been checked
    pub fn peek_claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }
}

impl Token<Verified> {
    /// Claims of a fully verified token
    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    /// Consume the token into the request principal
    pub fn into_principal(self) -> Result<Principal, GateError> {
        self.claims
            .map(|claims| claims.to_principal())
            .ok_or_else(|| GateError::TokenMalformed {
                reason: "claims not available".to_string(),
            })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn header(&self) -> &Header {
        &self.header
    }
}

impl<S: TokenState> Token<S> {
    pub fn state_name(&self) -> &'static str {
        S::state_name()
    }
}
