//! Response rendering for the HTTP layer
//!
//! The guard returns typed outcomes; this module turns them into the status
//! codes and JSON bodies the web front-end already depends on. Each endpoint
//! keeps its historical body shape.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AuthError, RejectionKind, Result};
use crate::identity::Identity;

pub const MSG_USER_NOT_FOUND: &str = "User not found";
pub const MSG_INTERNAL: &str = "Internal server error";
pub const MSG_ACCOUNT_DELETED: &str = "Account deleted successfully";

/// Transport-neutral response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub status_code: u16,
    pub body: Value,
}

impl AuthResponse {
    pub fn new(status_code: u16, body: Value) -> Self {
        Self { status_code, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.body.to_string().into_bytes()
    }
}

/// Endpoints backed by the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `GET /api/auth/check`
    Check,
    /// `GET /api/auth/me`
    Me,
    /// `GET /api/user/credentials`
    Credentials,
    /// `DELETE /api/user`
    DeleteAccount,
}

impl Endpoint {
    /// Render a guard outcome for this endpoint
    pub fn render(self, outcome: &Result<Identity>) -> AuthResponse {
        match (self, outcome) {
            (Self::Check, Ok(identity)) => AuthResponse::ok(json!({
                "success": true,
                "user": {
                    "id": identity.id,
                    "name": identity.name,
                    "email": identity.email,
                },
            })),
            (Self::Me, Ok(identity)) => AuthResponse::ok(json!({
                "name": identity.name,
                "email": identity.email,
                "awsCredentials": identity.aws_credentials,
            })),
            (Self::Credentials, Ok(identity)) => AuthResponse::ok(json!({
                "awsCredentials": identity.aws_credentials,
            })),
            (Self::DeleteAccount, Ok(_)) => {
                AuthResponse::ok(json!({ "message": MSG_ACCOUNT_DELETED }))
            }
            (endpoint, Err(err)) => endpoint.render_error(err),
        }
    }

    fn uses_legacy_shape(self) -> bool {
        matches!(self, Self::Credentials | Self::DeleteAccount)
    }

    fn render_error(self, err: &AuthError) -> AuthResponse {
        let kind = err.kind();
        match kind {
            RejectionKind::NoCredential
            | RejectionKind::MalformedCredential
            | RejectionKind::InvalidSignature
            | RejectionKind::Expired => {
                let message = unauthenticated_message(kind);
                let body = if self.uses_legacy_shape() {
                    json!({ "message": message })
                } else {
                    json!({ "success": false, "message": message, "isAuthenticated": false })
                };
                AuthResponse::new(kind.status_code(), body)
            }
            RejectionKind::AccountNotFound => {
                AuthResponse::new(kind.status_code(), json!({ "message": MSG_USER_NOT_FOUND }))
            }
            RejectionKind::StoreUnavailable | RejectionKind::Internal => {
                AuthResponse::new(500, json!({ "message": MSG_INTERNAL }))
            }
        }
    }
}

fn unauthenticated_message(kind: RejectionKind) -> &'static str {
    match kind {
        RejectionKind::NoCredential => "No token provided",
        RejectionKind::Expired => "Token expired",
        _ => "Invalid token",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::CloudCredentialsView;

    fn alice() -> Identity {
        Identity {
            id: "u1".into(),
            name: "Alice".into(),
            email: "alice@example.com".into(),
            aws_credentials: CloudCredentialsView::default(),
        }
    }

    #[test]
    fn test_check_success_shape() {
        let resp = Endpoint::Check.render(&Ok(alice()));
        assert_eq!(resp.status_code, 200);
        assert_eq!(
            resp.body,
            json!({ "success": true, "user": { "id": "u1", "name": "Alice", "email": "alice@example.com" } })
        );
    }

    #[test]
    fn test_me_success_shape() {
        let resp = Endpoint::Me.render(&Ok(alice()));
        assert_eq!(
            resp.body,
            json!({
                "name": "Alice",
                "email": "alice@example.com",
                "awsCredentials": { "accessKey": null, "secretKey": null, "region": "us-east-1" },
            })
        );
    }

    #[test]
    fn test_unauthenticated_shapes() {
        let resp = Endpoint::Check.render(&Err(AuthError::Expired));
        assert_eq!(resp.status_code, 401);
        assert_eq!(
            resp.body,
            json!({ "success": false, "message": "Token expired", "isAuthenticated": false })
        );

        let legacy = Endpoint::DeleteAccount.render(&Err(AuthError::NoCredential));
        assert_eq!(legacy.status_code, 401);
        assert_eq!(legacy.body, json!({ "message": "No token provided" }));

        let legacy = Endpoint::Credentials.render(&Err(AuthError::InvalidSignature));
        assert_eq!(legacy.body, json!({ "message": "Invalid token" }));
    }

    #[test]
    fn test_not_found_and_internal() {
        let resp = Endpoint::Me.render(&Err(AuthError::AccountNotFound("u1".into())));
        assert_eq!(resp.status_code, 404);
        assert_eq!(resp.body, json!({ "message": "User not found" }));

        for err in [
            AuthError::StoreUnavailable("down".into()),
            AuthError::Internal("boom".into()),
            AuthError::Config("bad".into()),
        ] {
            let resp = Endpoint::Check.render(&Err(err));
            assert_eq!(resp.status_code, 500);
            assert_eq!(resp.body, json!({ "message": "Internal server error" }));
        }
    }

    #[test]
    fn test_delete_success() {
        let resp = Endpoint::DeleteAccount.render(&Ok(alice()));
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.body, json!({ "message": "Account deleted successfully" }));
    }
}
