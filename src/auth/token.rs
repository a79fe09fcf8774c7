use serde::{Deserialize, Serialize};

/// Access/refresh token pair issued by the API.
///
/// A pair is only usable when both halves are present; a pair with an empty
/// field is treated as no session at all.
///
/// # Example
/// ```
/// use ignite::auth::CredentialPair;
///
/// let pair = CredentialPair::new("access", "refresh");
/// assert!(pair.is_complete());
/// assert_eq!(pair.bearer(), "Bearer access");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl CredentialPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.access_token.trim().is_empty() && !self.refresh_token.trim().is_empty()
    }

    /// `Authorization` header value for the access token.
    pub fn bearer(&self) -> String {
        bearer(&self.access_token)
    }
}

pub(crate) fn bearer(access_token: &str) -> String {
    format!("Bearer {access_token}")
}
