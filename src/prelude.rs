//! Convenience re-exports for common use.

pub use crate::auth::{
    CredentialPair, FileTokenStore, RefreshCoordinator, SessionOwner, TokenStore,
};
pub use crate::config::ClientConfig;
pub use crate::error::{ApiError, RefreshError, Result};
pub use crate::http::{ApiClient, ApiRequest, ApiResponse, Outcome};
pub use crate::resources::IgniteApi;
