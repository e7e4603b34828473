// HTTP front for chatops-auth using Axum
// Renders guard outcomes for the web front-end; all auth logic lives in the library.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chatops_auth::{AuthConfig, AuthGuard, AuthRequest, AuthResponse, Endpoint};

/// Convert axum headers to the guard's request view
fn to_auth_request(headers: &HeaderMap) -> AuthRequest {
    AuthRequest::from_headers(
        headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string()))),
    )
}

/// Convert an AuthResponse to axum::Response
fn from_auth_response(resp: AuthResponse) -> Response {
    let status = StatusCode::from_u16(resp.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(resp.body)).into_response()
}

async fn check(State(guard): State<AuthGuard>, headers: HeaderMap) -> Response {
    let outcome = guard.authenticate(&to_auth_request(&headers)).await;
    from_auth_response(Endpoint::Check.render(&outcome))
}

async fn me(State(guard): State<AuthGuard>, headers: HeaderMap) -> Response {
    let outcome = guard.authenticate(&to_auth_request(&headers)).await;
    from_auth_response(Endpoint::Me.render(&outcome))
}

async fn credentials(State(guard): State<AuthGuard>, headers: HeaderMap) -> Response {
    let outcome = guard.authenticate(&to_auth_request(&headers)).await;
    from_auth_response(Endpoint::Credentials.render(&outcome))
}

async fn delete_account(State(guard): State<AuthGuard>, headers: HeaderMap) -> Response {
    let outcome = guard.delete_account(&to_auth_request(&headers)).await;
    from_auth_response(Endpoint::DeleteAccount.render(&outcome))
}

async fn health_check(State(guard): State<AuthGuard>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "store": format!("{:?}", guard.connections().state()),
        })),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatops_auth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Missing store URI or secret is fatal here, never per request.
    let config = AuthConfig::from_env().map_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        e
    })?;
    let guard = AuthGuard::new(config)?;

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/check", get(check))
        .route("/api/auth/me", get(me))
        .route("/api/user/credentials", get(credentials))
        .route("/api/user", delete(delete_account))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(guard);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr = format!("0.0.0.0:{port}");
    tracing::info!(%addr, "chatops-auth listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
