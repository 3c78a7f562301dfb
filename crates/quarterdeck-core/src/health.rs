use axum::http::StatusCode;

/// Handler for `GET /healthz` — liveness only, no dependency checks.
/// Readiness is service-specific; each service wires its own `/readyz`.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn healthz_returns_200() {
        assert_eq!(healthz().await, StatusCode::OK);
    }
}
