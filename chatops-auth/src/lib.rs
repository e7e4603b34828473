//! # ChatOps Auth
//!
//! Credential verification and account-store connection lifecycle for the
//! ChatOps cloud-automation API. The web front-end and route handlers call in
//! through two contracts: "authenticate this request" and "give me a working
//! store handle".
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │                AuthGuard                  │
//! │   extract bearer → verify → resolve       │
//! ├─────────────────────┬─────────────────────┤
//! │  CredentialCodec    │  IdentityResolver   │
//! │  (HS256, expiry)    │  (Account→Identity) │
//! │                     ├─────────────────────┤
//! │                     │  ConnectionCache    │
//! │                     │  (one shared handle)│
//! ├─────────────────────┴─────────────────────┤
//! │      AccountStore: Delta Lake | memory    │
//! └───────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatops_auth::{AuthConfig, AuthGuard, AuthRequest, Endpoint};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let guard = AuthGuard::new(AuthConfig::from_env()?)?;
//!
//!     let request = AuthRequest::bearer("eyJhbGciOiJIUzI1NiJ9...");
//!     let outcome = guard.authenticate(&request).await;
//!     let response = Endpoint::Me.render(&outcome);
//!     println!("{} {}", response.status_code, response.body);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Single connection**: concurrent first requests share one connect attempt
//! - **Self-healing**: a failed connect clears the cache so the next request retries
//! - **Classified rejections**: every failure maps to one [`RejectionKind`]
//! - **Safe projection**: stored cloud secrets never reach an [`Identity`]

pub mod config;
pub mod connection;
pub mod credential;
pub mod error;
pub mod guard;
pub mod identity;
pub mod response;
pub mod store;

// Re-exports for convenience
pub use config::AuthConfig;
pub use connection::{CacheState, ConnectionCache};
pub use credential::{Claims, CredentialCodec};
pub use error::{AuthError, RejectionKind, Result};
pub use guard::{AuthGuard, AuthRequest, AuthStage};
pub use identity::{Account, CloudCredentialsView, Identity, IdentityResolver};
pub use response::{AuthResponse, Endpoint};
pub use store::{AccountStore, Connector, StoreHandle};
