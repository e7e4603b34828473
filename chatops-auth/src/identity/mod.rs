//! Identity module — account records and their public projection

pub mod resolver;
pub mod types;

pub use resolver::IdentityResolver;
pub use types::{Account, CloudCredentialsView, Identity, StoredCloudCredentials};
