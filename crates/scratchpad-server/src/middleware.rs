//! Request interceptor: captures one audit event per completed request.
//!
//! The event is built after the inner handler produced its response, so it
//! carries the final status. The append itself runs on the blocking pool and
//! the response is returned without waiting for it; a failed append never
//! changes what the client sees.

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use scratchpad_audit::AuditEvent;
use std::net::SocketAddr;
use std::time::Instant;

use crate::state::AppState;

/// Identity recorded when the peer address is not known.
pub const UNKNOWN_REMOTE: &str = "unknown";

/// Axum middleware recording every request in the evidence store.
pub async fn capture(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let started_at = state.clock().now();
    let timer = Instant::now();

    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let remote = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| UNKNOWN_REMOTE.to_string());

    let response = next.run(req).await;

    let elapsed_ms = u64::try_from(timer.elapsed().as_millis()).unwrap_or(u64::MAX);
    let event = AuditEvent::builder(started_at, method, path)
        .remote_identity(remote)
        .status(response.status().as_u16())
        .duration_ms(elapsed_ms)
        .build();
    tracing::debug!(target: "scratchpad_audit", %event, "request captured");

    let writer = state.audit();
    tokio::task::spawn_blocking(move || writer.record(&event));

    response
}
