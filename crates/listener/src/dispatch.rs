//! Event decoding and dispatch.
//!
//! Decoding turns (event-type label, raw body) into the domain's tagged
//! [`WebhookEvent`]; dispatch routes a decoded event to exactly one handler.
//! Dispatch itself is a pure routing decision — every side effect belongs to
//! the handler it routes to.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use classroom::{DeliveryId, WebhookEvent};
use provisioning::{BootstrapOutcome, BootstrapPipeline};

use crate::error::ListenerError;

/// Decodes one delivery into a [`WebhookEvent`].
///
/// Unknown labels and bodies that do not match the labelled shape are
/// rejected here, before any handler runs.
pub fn decode_event(label: &str, body: &[u8]) -> Result<WebhookEvent, ListenerError> {
    match label {
        "push" => serde_json::from_slice(body)
            .map(WebhookEvent::Push)
            .map_err(|err| ListenerError::MalformedPayload(err.to_string())),
        "pull_request" => Ok(WebhookEvent::PullRequest),
        "pull_request_review_comment" => serde_json::from_slice(body)
            .map(WebhookEvent::ReviewComment)
            .map_err(|err| ListenerError::MalformedPayload(err.to_string())),
        "pull_request_review_thread" => Ok(WebhookEvent::ReviewThread),
        other => Err(ListenerError::UnrecognizedEvent(other.to_owned())),
    }
}

/// Routes decoded events to their handlers.
pub struct Dispatcher {
    pipeline: Arc<BootstrapPipeline>,
}

impl Dispatcher {
    pub fn new(pipeline: Arc<BootstrapPipeline>) -> Self {
        Self { pipeline }
    }

    /// Handles one decoded delivery.
    #[instrument(skip(self, event), fields(delivery = %delivery, event = event.label()))]
    pub async fn dispatch(
        &self,
        delivery: DeliveryId,
        event: WebhookEvent,
    ) -> Result<(), ListenerError> {
        match event {
            WebhookEvent::Push(push) => {
                match self.pipeline.handle_push(&push).await? {
                    BootstrapOutcome::Completed => info!("repository bootstrap completed"),
                    BootstrapOutcome::Skipped(reason) => {
                        debug!(?reason, "push acknowledged without provisioning")
                    }
                }
                Ok(())
            }
            WebhookEvent::ReviewComment(comment_event) => {
                if comment_event.comment.author_association.as_deref() == Some("COLLABORATOR") {
                    info!("regrade request comment received");
                }
                Ok(())
            }
            WebhookEvent::PullRequest | WebhookEvent::ReviewThread => {
                debug!("event acknowledged without action");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classroom::ZERO_SHA;

    #[test]
    fn push_bodies_decode_into_push_events() {
        let body = serde_json::json!({
            "repository": {
                "id": 500,
                "name": "hw3",
                "organization": "course-org",
                "master_branch": "main"
            },
            "before": ZERO_SHA,
            "created": true,
            "pusher": { "name": "classhub[bot]" },
            "base_ref": null
        })
        .to_string();

        let event = decode_event("push", body.as_bytes()).unwrap();
        match event {
            WebhookEvent::Push(push) => assert!(push.is_initial_commit()),
            other => panic!("expected push, got {other:?}"),
        }
    }

    #[test]
    fn review_comment_bodies_decode() {
        let body = serde_json::json!({
            "comment": { "author_association": "COLLABORATOR" }
        })
        .to_string();
        let event = decode_event("pull_request_review_comment", body.as_bytes()).unwrap();
        assert!(matches!(event, WebhookEvent::ReviewComment(_)));
    }

    #[test]
    fn unknown_labels_are_rejected() {
        let err = decode_event("deployment_status", b"{}").unwrap_err();
        assert!(matches!(err, ListenerError::UnrecognizedEvent(_)));
    }

    #[test]
    fn mismatched_bodies_are_malformed() {
        let err = decode_event("push", br#"{"created": true}"#).unwrap_err();
        assert!(matches!(err, ListenerError::MalformedPayload(_)));
    }
}
