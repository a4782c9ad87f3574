//! The fixed-shape identity record produced by credential validation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// An authenticated caller, as extracted from a verified bearer token.
///
/// Deliberately a closed record rather than a claims bag: every field the
/// service cares about is named here, and nothing else survives validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Identity {
    /// Stable subject identifier assigned by the token issuer.
    pub subject: String,
    /// Email address recorded at sign-in.
    pub email: String,
    /// Display name recorded at sign-in.
    pub name: String,
    /// Granted roles; authorization checks require at least one match.
    pub roles: Vec<String>,
    /// Identity provider that vouched for this user.
    pub provider: String,
}

impl Identity {
    /// True when this identity holds at least one of `required` (logical OR).
    ///
    /// An empty `required` set matches nothing.
    pub fn has_any_role(&self, required: &[&str]) -> bool {
        self.roles
            .iter()
            .any(|role| required.iter().any(|r| role == r))
    }
}
