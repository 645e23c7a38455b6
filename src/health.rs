//! HTTP liveness check.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tracing::{info, instrument};

/// Body returned by the liveness route.
pub const LIVENESS_BODY: &str = "Success";

/// Builds the router: `GET /` answers `200 Success`, everything else is 404.
#[instrument]
pub fn router() -> Router {
    Router::new().route("/", get(liveness)).layer(
        ServiceBuilder::new().map_request(|req: Request<Body>| {
            info!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }),
    )
}

async fn liveness() -> (StatusCode, &'static str) {
    (StatusCode::OK, LIVENESS_BODY)
}

/// Serves [`router`] on `host:port` until the process is stopped.
///
/// # Errors
///
/// Returns an I/O error if the address cannot be bound.
#[instrument]
pub async fn serve(host: &str, port: u16) -> std::io::Result<()> {
    let listener = TcpListener::bind((host, port)).await?;
    info!(addr = %listener.local_addr()?, "Liveness server ready");
    axum::serve(listener, router()).await
}
