pub mod claims;
pub mod issuer;
pub mod jwk_cache;
pub mod keys;
pub mod token;
pub mod validator;

pub use claims::Claims;
pub use issuer::{IssuedToken, TokenIssuer};
pub use jwk_cache::{Jwk, JwkCache, Jwks};
pub use keys::{KeyResolver, StaticKey};
pub use token::{ClaimChecks, SignatureVerified, Token, TokenState, Unvalidated, Verified};
pub use validator::{TokenRejection, TokenValidator};
