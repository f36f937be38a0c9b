//! Password encoding

use crate::error::GateError;

/// One-way password encoder.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, GateError>;

    /// `Ok(false)` on mismatch; `Err` only when the stored hash is unusable.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, GateError>;
}

/// bcrypt with a configurable work factor
#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    pub const DEFAULT_COST: u32 = 10;

    pub fn new(cost: u32) -> Result<Self, GateError> {
        if !(4..=31).contains(&cost) {
            return Err(GateError::Internal(anyhow::anyhow!(
                "bcrypt cost must be between 4 and 31, got {cost}"
            )));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self {
            cost: Self::DEFAULT_COST,
        }
    }
}

impl PasswordHasher for BcryptPasswordHasher {
    fn hash(&self, password: &str) -> Result<String, GateError> {
        bcrypt::hash(password, self.cost)
            .map_err(|e| GateError::Internal(anyhow::anyhow!("bcrypt hash failed: {e}")))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, GateError> {
        bcrypt::verify(password, hash)
            .map_err(|e| GateError::Internal(anyhow::anyhow!("stored hash unusable: {e}")))
    }
}
