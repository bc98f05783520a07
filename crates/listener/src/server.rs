//! The webhook HTTP endpoint.
//!
//! One route, one contract: `POST /api/webhooks` answers exactly one status
//! per delivery — 200 when the routed handler succeeds, 400 for
//! unrecognized or malformed events, 401 for signature failures, 500 when a
//! handler fails (which makes the platform redeliver).

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use tracing::{info, warn};
use uuid::Uuid;

use classroom::DeliveryId;

use crate::dispatch::{decode_event, Dispatcher};
use crate::error::ListenerError;
use crate::signature::{self, SIGNATURE_HEADER};

const EVENT_TYPE_HEADER: &str = "x-github-event";
const DELIVERY_HEADER: &str = "x-github-delivery";

#[derive(Clone)]
struct WebhookState {
    dispatcher: Arc<Dispatcher>,
    secret: Arc<str>,
}

/// Builds the webhook router.
pub fn router(dispatcher: Arc<Dispatcher>, secret: impl Into<Arc<str>>) -> Router {
    Router::new()
        .route("/api/webhooks", post(receive))
        .with_state(WebhookState {
            dispatcher,
            secret: secret.into(),
        })
}

/// Binds `addr` and serves webhook deliveries until the task is aborted.
pub async fn serve(
    addr: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    secret: impl Into<Arc<str>>,
) -> std::io::Result<()> {
    let app = router(dispatcher, secret);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "webhook listener bound");
    axum::serve(listener, app).await
}

async fn receive(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match process(&state, &headers, &body).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => {
            warn!(error = %err, "webhook delivery rejected");
            err.into_response()
        }
    }
}

async fn process(
    state: &WebhookState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), ListenerError> {
    let signature_header = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    signature::verify(&state.secret, body, signature_header)?;

    let label = headers
        .get(EVENT_TYPE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(ListenerError::MissingEventType)?;

    let delivery = headers
        .get(DELIVERY_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
        .map(DeliveryId::from_uuid)
        .unwrap_or_else(DeliveryId::new_random);

    let event = decode_event(label, body)?;
    state.dispatcher.dispatch(delivery, event).await
}
