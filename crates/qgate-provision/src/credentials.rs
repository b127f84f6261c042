//! Restricted principal credentials.
//!
//! The secret is never serialized, never formatted and never logged. Callers
//! that need the value (to open the restricted pool) use [`Credential::expose`].

use rand::Rng;
use rand::distr::Alphanumeric;
use std::fmt;

const CREDENTIAL_LENGTH: usize = 32;

/// A restricted-principal password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Fresh random alphanumeric secret.
    pub fn generate() -> Self {
        let secret: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(CREDENTIAL_LENGTH)
            .map(char::from)
            .collect();
        Self(secret)
    }

    /// Wrap an externally supplied secret.
    pub fn from_secret(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}
