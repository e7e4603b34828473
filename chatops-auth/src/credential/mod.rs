//! Credential module — signed, expiring bearer tokens
//!
//! Verification is a pure function of the token, the shared secret, and
//! the current time; nothing here touches the account store.

pub mod codec;
pub mod types;

pub use codec::CredentialCodec;
pub use types::{Claims, TokenClaims};
