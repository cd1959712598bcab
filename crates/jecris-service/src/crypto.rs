//! Cryptographic utilities for webhook verification.
//!
//! Stripe signs each delivery with HMAC-SHA256 over `"<timestamp>.<body>"`
//! and sends the result in the `Stripe-Signature` header as
//! `t=<unix seconds>,v1=<hex>[,v1=<hex>...]`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Why a webhook signature was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// The header has no `t=` component.
    #[error("signature header has no timestamp")]
    MissingTimestamp,

    /// The `t=` component is not an integer.
    #[error("signature timestamp is not a number")]
    InvalidTimestamp,

    /// The header has no `v1=` component.
    #[error("signature header has no v1 signature")]
    MissingSignature,

    /// The timestamp is further from now than the tolerance.
    #[error("signature timestamp outside tolerance ({age}s)")]
    Expired {
        /// Absolute distance from now, in seconds.
        age: i64,
    },

    /// No `v1` signature matches the expected value.
    #[error("signature mismatch")]
    Mismatch,

    /// The secret could not be used as an HMAC key.
    #[error("invalid signing key")]
    InvalidKey,
}

/// Compute HMAC-SHA256 and return hex-encoded result.
///
/// # Errors
///
/// Returns `SignatureError::InvalidKey` if the key is rejected by the MAC.
pub fn hmac_sha256_hex(secret: &str, message: &str) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::InvalidKey)?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time string comparison to prevent timing attacks.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Verify a `Stripe-Signature` header against the raw request body.
///
/// `now` is the current unix time in seconds; `tolerance_seconds` bounds how
/// far the signed timestamp may drift from it in either direction.
///
/// # Errors
///
/// Returns a `SignatureError` describing the first check that failed.
pub fn verify_stripe_signature(
    payload: &str,
    header: &str,
    secret: &str,
    tolerance_seconds: i64,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", ts)) => timestamp = Some(ts),
            Some(("v1", sig)) => signatures.push(sig),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
    let signed_at: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::InvalidTimestamp)?;

    if signatures.is_empty() {
        return Err(SignatureError::MissingSignature);
    }

    let age = now.saturating_sub(signed_at).saturating_abs();
    if age > tolerance_seconds {
        return Err(SignatureError::Expired { age });
    }

    let expected = hmac_sha256_hex(secret, &format!("{timestamp}.{payload}"))?;

    if signatures.iter().any(|sig| constant_time_eq(&expected, sig)) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Build a `Stripe-Signature` header value for `payload` signed at `timestamp`.
///
/// # Errors
///
/// Returns `SignatureError::InvalidKey` if the key is rejected by the MAC.
pub fn sign_stripe_payload(
    payload: &str,
    secret: &str,
    timestamp: i64,
) -> Result<String, SignatureError> {
    let signature = hmac_sha256_hex(secret, &format!("{timestamp}.{payload}"))?;
    Ok(format!("t={timestamp},v1={signature}"))
}
