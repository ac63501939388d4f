//! Claims-based identity attached to a request context.

use serde::{Deserialize, Serialize};

/// Well-known claim types.
pub mod claim_types {
    /// The subject (user id) claim.
    pub const SUBJECT: &str = "sub";
    /// The tenant claim.
    pub const TENANT: &str = "tenant_id";
}

/// A single identity claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// The claim type (e.g. "sub").
    pub claim_type: String,
    /// The claim value.
    pub value: String,
}

impl Claim {
    /// Creates a new claim.
    #[must_use]
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// An authenticated principal described by its claims.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsPrincipal {
    /// The claims, in insertion order.
    #[serde(default)]
    pub claims: Vec<Claim>,
    /// How the principal was authenticated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_type: Option<String>,
}

impl ClaimsPrincipal {
    /// Creates a principal from claims.
    #[must_use]
    pub fn new(claims: Vec<Claim>) -> Self {
        Self {
            claims,
            authentication_type: None,
        }
    }

    /// Sets the authentication type.
    #[must_use]
    pub fn with_authentication_type(mut self, authentication_type: impl Into<String>) -> Self {
        self.authentication_type = Some(authentication_type.into());
        self
    }

    /// Adds a claim.
    #[must_use]
    pub fn with_claim(mut self, claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.push(Claim::new(claim_type, value));
        self
    }

    /// Returns the value of the first claim of `claim_type`.
    #[must_use]
    pub fn find_first(&self, claim_type: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.claim_type == claim_type)
            .map(|c| c.value.as_str())
    }

    /// Returns true if an authentication type is set.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authentication_type.is_some()
    }
}
