//! # Capability Tokens
//!
//! Binds a secret key to a statement's text so that only statements this
//! process rendered links for can be replayed.
//!
//! ## Invariants
//! - Tokens are deterministic for a given (key, statement, algorithm)
//! - Validation recomputes the token and compares in constant time
//!
//! The token carries no nonce or expiry. A token seen once stays valid for
//! as long as the key is unchanged.

mod errors;

pub use errors::{CapabilityError, CapabilityResult};

use std::fmt;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Separator between key and statement in the SHA-1 preimage
const TOKEN_SEPARATOR: &str = ":";

/// Secret provisioned out of band by the deployment
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);

impl SecretKey {
    /// Build a key, treating blank input as "not provisioned"
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Build a key from optional configuration
    pub fn from_optional(raw: Option<&str>) -> Option<Self> {
        raw.and_then(Self::new)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(**redacted**)")
    }
}

/// Digest used to derive tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenAlgorithm {
    /// `hex(SHA1(key ":" sql))`
    #[default]
    Sha1,
    /// `hex(HMAC-SHA256(key, sql))`
    HmacSha256,
}

impl TokenAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenAlgorithm::Sha1 => "sha1",
            TokenAlgorithm::HmacSha256 => "hmac-sha256",
        }
    }
}

impl FromStr for TokenAlgorithm {
    type Err = CapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" => Ok(TokenAlgorithm::Sha1),
            "hmac-sha256" | "hmac_sha256" => Ok(TokenAlgorithm::HmacSha256),
            other => Err(CapabilityError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Hex digest authorizing replay of one statement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CapabilityToken(String);

impl CapabilityToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CapabilityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the capability token for `sql` under `secret`
pub fn compute_token(
    secret: &SecretKey,
    sql: &str,
    algorithm: TokenAlgorithm,
) -> CapabilityResult<CapabilityToken> {
    let digest = match algorithm {
        TokenAlgorithm::Sha1 => {
            let mut hasher = Sha1::new();
            hasher.update(secret.expose().as_bytes());
            hasher.update(TOKEN_SEPARATOR.as_bytes());
            hasher.update(sql.as_bytes());
            hex::encode(hasher.finalize())
        }
        TokenAlgorithm::HmacSha256 => {
            let mut mac = HmacSha256::new_from_slice(secret.expose().as_bytes())
                .map_err(|_| CapabilityError::InvalidKey(algorithm.as_str()))?;
            mac.update(sql.as_bytes());
            hex::encode(mac.finalize().into_bytes())
        }
    };
    Ok(CapabilityToken(digest))
}

/// Recompute and compare against a presented token
///
/// Hex case and surrounding whitespace in `presented` are ignored.
pub fn validate_token(
    secret: &SecretKey,
    sql: &str,
    presented: &str,
    algorithm: TokenAlgorithm,
) -> CapabilityResult<bool> {
    let expected = compute_token(secret, sql, algorithm)?;
    let presented = presented.trim().to_ascii_lowercase();
    Ok(expected.as_str().as_bytes().ct_eq(presented.as_bytes()).into())
}

/// Key plus algorithm, shared by the panel (token issue) and the
/// dispatcher (token check)
#[derive(Debug, Clone)]
pub struct CapabilityValidator {
    secret: SecretKey,
    algorithm: TokenAlgorithm,
}

impl CapabilityValidator {
    pub fn new(secret: SecretKey, algorithm: TokenAlgorithm) -> Self {
        Self { secret, algorithm }
    }

    /// Validator with the reference SHA-1 scheme
    pub fn sha1(secret: SecretKey) -> Self {
        Self::new(secret, TokenAlgorithm::Sha1)
    }

    pub fn algorithm(&self) -> TokenAlgorithm {
        self.algorithm
    }

    pub fn token_for(&self, sql: &str) -> CapabilityResult<CapabilityToken> {
        compute_token(&self.secret, sql, self.algorithm)
    }

    pub fn is_valid(&self, sql: &str, presented: &str) -> CapabilityResult<bool> {
        validate_token(&self.secret, sql, presented, self.algorithm)
    }

    /// Like [`is_valid`](Self::is_valid) but a mismatch is an error
    pub fn authorize(&self, sql: &str, presented: &str) -> CapabilityResult<()> {
        if self.is_valid(sql, presented)? {
            Ok(())
        } else {
            Err(CapabilityError::TokenMismatch)
        }
    }
}
