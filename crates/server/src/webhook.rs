use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use secrecy::SecretString;
use serde::Deserialize;

use dhobi_bot::Dispatcher;
use dhobi_whatsapp::{verify_subscription, VerifyRequest, WebhookEnvelope};

#[derive(Clone)]
pub struct WebhookState {
    pub dispatcher: Arc<Dispatcher>,
    pub verify_token: SecretString,
}

/// Meta's subscription handshake parameters arrive dot-prefixed.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

pub fn router(state: WebhookState) -> Router {
    Router::new().route("/webhook", get(verify).post(receive)).with_state(state)
}

/// GET /webhook: echo the challenge when the verify token matches, 403
/// otherwise.
pub async fn verify(
    State(state): State<WebhookState>,
    Query(params): Query<VerifyParams>,
) -> Response {
    let request = VerifyRequest {
        mode: params.mode,
        token: params.token,
        challenge: params.challenge,
    };

    match verify_subscription(&request, &state.verify_token) {
        Some(challenge) => {
            tracing::info!(
                event_name = "webhook.verified",
                correlation_id = "handshake",
                "webhook subscription verified"
            );
            (StatusCode::OK, challenge).into_response()
        }
        None => StatusCode::FORBIDDEN.into_response(),
    }
}

/// POST /webhook: decode and dispatch one delivery. Payloads without a text
/// message are acknowledged as no-ops. A failed dispatch answers 500 so the
/// provider redelivers; a finalized order is never silently dropped.
pub async fn receive(
    State(state): State<WebhookState>,
    Json(payload): Json<serde_json::Value>,
) -> StatusCode {
    let message = serde_json::from_value::<WebhookEnvelope>(payload)
        .ok()
        .and_then(|envelope| envelope.first_text_message());

    let Some(message) = message else {
        tracing::debug!(
            event_name = "webhook.no_message",
            "delivery without a text message acknowledged"
        );
        return StatusCode::OK;
    };

    match state.dispatcher.dispatch(&message.sender, &message.text).await {
        Ok(outcome) => {
            tracing::debug!(
                event_name = "webhook.dispatched",
                user_id = %message.sender,
                outcome = ?outcome,
                "delivery handled"
            );
            StatusCode::OK
        }
        Err(error) => {
            tracing::error!(
                event_name = "webhook.dispatch_failed",
                user_id = %message.sender,
                error = %error,
                "delivery failed; provider should redeliver"
            );
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
