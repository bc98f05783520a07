//! ClassHub webhook event infrastructure.
//!
//! Receives the hosting platform's webhook deliveries and turns them into
//! handler invocations:
//!
//! 1. [`signature`] — HMAC-SHA256 validation of the raw body against the
//!    shared webhook secret, before anything is parsed.
//! 2. [`dispatch::decode_event`] — (event-type label, body) → the domain's
//!    tagged [`classroom::WebhookEvent`]; unknown labels are rejected with a
//!    client error, never looked up dynamically.
//! 3. [`dispatch::Dispatcher`] — routes each decoded event to exactly one
//!    handler (push events drive the bootstrap pipeline).
//! 4. [`server`] — the axum endpoint returning exactly one status per
//!    delivery; a non-2xx answer makes the platform redeliver.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Transport, authentication, and deserialization live
//! here. The [`classroom`] crate sees only its own event types, and handlers
//! are invoked through their crates' public APIs.

pub mod dispatch;
pub mod error;
pub mod server;
pub mod signature;

pub use dispatch::{decode_event, Dispatcher};
pub use error::ListenerError;
pub use server::{router, serve};
