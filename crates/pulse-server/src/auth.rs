//! Bearer-credential validation for gated routes.
//!
//! [`AuthGate`] verifies HS256-signed tokens against a shared secret and
//! produces a fixed-shape [`Identity`] -- never a raw claims bag. When
//! auth is disabled by configuration the gate reports itself disabled and
//! gated routes are open (standalone/dev mode); when enabled, a missing
//! or invalid credential is refused, never downgraded to anonymous
//! access.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use pulse_types::Identity;
use serde::Deserialize;

/// Errors produced by credential validation.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No credential was supplied on a gated path.
    #[error("missing bearer credential")]
    MissingCredential,

    /// The credential failed verification (bad signature, expired,
    /// not yet valid, or garbled).
    #[error("invalid credential: {0}")]
    InvalidCredential(#[from] jsonwebtoken::errors::Error),
}

/// Token claims as the issuer lays them out.
///
/// Only the fields the service cares about are read; everything else in
/// the token is ignored. Registered claims (`exp`, `nbf`) are validated
/// by the decoder itself.
#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: String,
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    provider: String,
}

/// Verifies bearer credentials and answers role checks.
pub struct AuthGate {
    enabled: bool,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthGate {
    /// Builds a gate for the given mode and shared HS256 secret.
    pub fn new(enabled: bool, secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_nbf = true;
        Self {
            enabled,
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Whether gated routes require a credential.
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Verifies `token` and returns the caller's identity.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredential`] when the signature, `exp`,
    /// or `nbf` check fails or the token is malformed.
    pub fn validate_credential(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;
        let subject = if claims.user_id.is_empty() {
            claims.sub
        } else {
            claims.user_id
        };
        Ok(Identity {
            subject,
            email: claims.email,
            name: claims.name,
            roles: claims.roles,
            provider: claims.provider,
        })
    }

    /// True when `identity` holds at least one of `required` (logical OR).
    pub fn authorize(identity: &Identity, required: &[&str]) -> bool {
        identity.has_any_role(required)
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}
