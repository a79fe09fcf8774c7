//! API client for the Ignite Gym backend.
//!
//! Wraps an HTTP transport with a response pipeline that transparently
//! refreshes an expired access token: concurrent requests rejected for the
//! same expiry share a single refresh call and are replayed with the new
//! credentials, and an unrecoverable session triggers one sign-out.
//!
//! # Quick Start
//!
//! ```no_run
//! use ignite::prelude::*;
//!
//! # async fn example() -> ignite::error::Result<()> {
//! let config = ClientConfig::from_env()?;
//! let api = IgniteApi::from_config(&config)?;
//! let _refresh = api.enable_token_refresh(|| eprintln!("session expired"));
//!
//! api.sign_in("ana@example.com", "secret123").await?;
//! for section in api.history().await? {
//!     println!("{}: {} exercises", section.title, section.data.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod prelude;
pub mod resources;

#[cfg(feature = "cli")]
pub mod cli;
