//! Webhook authenticity: HMAC-SHA256 over the raw request body, plus the
//! secret-verification handshake Wrike performs when a webhook is registered.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

pub const HOOK_SECRET_HEADER: &str = "x-hook-secret";
const HANDSHAKE_MARKER: &[u8] = b"\"WebHook secret verification\"";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing webhook signature header")]
    Missing,
    #[error("webhook signature mismatch")]
    Mismatch,
    #[error("webhook secret cannot initialize hmac")]
    InvalidSecret,
}

fn hmac_for(secret: &str) -> Result<Hmac<Sha256>, SignatureError> {
    Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidSecret)
}

/// Lowercase hex HMAC-SHA256 of `payload` keyed by `secret`.
pub fn hmac_sha256_hex(secret: &str, payload: &[u8]) -> Result<String, SignatureError> {
    let mut mac = hmac_for(secret)?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

pub fn is_handshake(raw_body: &[u8]) -> bool {
    raw_body
        .windows(HANDSHAKE_MARKER.len())
        .any(|window| window == HANDSHAKE_MARKER)
}

/// Value to echo back in `X-Hook-Secret` for a handshake carrying `challenge`.
pub fn handshake_response(secret: &str, challenge: &str) -> Result<String, SignatureError> {
    hmac_sha256_hex(secret, challenge.as_bytes())
}

/// Checks `signature` against the HMAC of the raw, unparsed body.
///
/// The header must be the exact lowercase hex digest; comparison of the
/// decoded bytes is constant-time.
pub fn verify_signature(
    raw_body: &[u8],
    signature: Option<&str>,
    secret: &str,
) -> Result<(), SignatureError> {
    let signature = signature
        .filter(|value| !value.is_empty())
        .ok_or(SignatureError::Missing)?;
    if signature.bytes().any(|byte| byte.is_ascii_uppercase()) {
        return Err(SignatureError::Mismatch);
    }
    let expected = hex::decode(signature).map_err(|_| SignatureError::Mismatch)?;
    let mut mac = hmac_for(secret)?;
    mac.update(raw_body);
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}
