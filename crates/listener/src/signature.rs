//! Webhook signature validation.
//!
//! Every delivery is authenticated by an HMAC-SHA256 digest of the raw body,
//! keyed with the shared webhook secret and carried in the
//! `X-Hub-Signature-256` header as `sha256=<hex>`. Verification runs before
//! any decoding.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::ListenerError;

/// Header carrying the body digest.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

type HmacSha256 = Hmac<Sha256>;

/// Verifies a delivery's signature against the shared secret.
///
/// The digest comparison is constant-time (provided by the MAC
/// implementation), so a failed verification leaks nothing about the
/// expected value.
pub fn verify(
    secret: &str,
    body: &[u8],
    signature_header: Option<&str>,
) -> Result<(), ListenerError> {
    let header = signature_header.ok_or(ListenerError::MissingSignature)?;
    let hex_digest = header
        .strip_prefix("sha256=")
        .ok_or(ListenerError::InvalidSignatureFormat)?;
    let claimed = hex::decode(hex_digest).map_err(|_| ListenerError::InvalidSignatureFormat)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| ListenerError::InvalidSignature)?;
    mac.update(body);
    mac.verify_slice(&claimed)
        .map_err(|_| ListenerError::InvalidSignature)
}
