//! Static API credentials.

use std::fmt;

/// API identifier and secret sent with every request.
///
/// Credentials are immutable once created. Their `Debug` output is redacted
/// so they never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_id: String,
    api_secret: String,
}

impl Credentials {
    /// Creates credentials from an API identifier and secret.
    pub fn new(api_id: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_id: api_id.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Value of the `x-api-id` header.
    pub(crate) fn api_id(&self) -> &str {
        &self.api_id
    }

    /// Value of the `x-api-secret` header.
    pub(crate) fn api_secret(&self) -> &str {
        &self.api_secret
    }

    /// Whether either half of the credentials is empty.
    pub fn is_incomplete(&self) -> bool {
        self.api_id.trim().is_empty() || self.api_secret.trim().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_id", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .finish()
    }
}
