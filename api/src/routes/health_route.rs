//! GET /health - liveness only; dependencies are not probed.

/// Handler: GET /health
pub async fn health() -> &'static str {
    "ok"
}
