//! Credential storage and transparent access token refresh.

pub mod coordinator;
pub mod error;
pub mod session;
pub mod store;
pub mod token;

pub use coordinator::{PendingRequest, RefreshCoordinator, TokenRejection};
pub use error::AuthError;
pub use session::SessionOwner;
pub use store::{FileTokenStore, TokenStore, TokenStoreConfig};
pub use token::CredentialPair;
