//! Svix webhook signatures as sent by the identity provider.
//!
//! The signed content is `{svix-id}.{svix-timestamp}.{body}`, HMAC-SHA256
//! keyed with the base64 secret following the `whsec_` prefix. The
//! `svix-signature` header holds space-separated `v1,<base64>` entries.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::error;

/// Maximum clock skew accepted, in seconds.
pub const TOLERANCE_SECS: i64 = 300;

fn signing_key(secret: &str) -> Option<Vec<u8>> {
    let encoded = secret.strip_prefix("whsec_").unwrap_or(secret);
    match STANDARD.decode(encoded) {
        Ok(key) => Some(key),
        Err(e) => {
            error!("Signing secret is not valid base64: {}", e);
            None
        }
    }
}

fn mac_for(key: &[u8], id: &str, timestamp: &str, body: &str) -> Option<Hmac<Sha256>> {
    let mut mac = match Hmac::<Sha256>::new_from_slice(key) {
        Ok(mac) => mac,
        Err(e) => {
            error!("Failed to create HMAC: {}", e);
            return None;
        }
    };
    mac.update(format!("{id}.{timestamp}.{body}").as_bytes());
    Some(mac)
}

#[must_use]
pub fn verify_svix_signature(
    secret: &str,
    id: &str,
    timestamp: &str,
    signature_header: &str,
    body: &str,
    now_secs: i64,
) -> bool {
    let Ok(ts) = timestamp.parse::<i64>() else {
        error!("Invalid svix-timestamp header");
        return false;
    };
    let within_tolerance = now_secs
        .checked_sub(ts)
        .is_some_and(|drift| drift.unsigned_abs() <= TOLERANCE_SECS.unsigned_abs());
    if !within_tolerance {
        error!("Timestamp out of range, potential replay attack");
        return false;
    }

    let Some(key) = signing_key(secret) else {
        return false;
    };

    let verified = signature_header
        .split_whitespace()
        .filter_map(|entry| entry.strip_prefix("v1,"))
        .filter_map(|sig| STANDARD.decode(sig).ok())
        .any(|sig| {
            mac_for(&key, id, timestamp, body).is_some_and(|mac| mac.verify_slice(&sig).is_ok())
        });

    if !verified {
        error!("Webhook signature verification failed for {}", id);
    }
    verified
}

/// Produces a `v1,<base64>` signature entry.
#[must_use]
pub fn compute_svix_signature(secret: &str, id: &str, timestamp: &str, body: &str) -> String {
    let Some(mac) = signing_key(secret).and_then(|key| mac_for(&key, id, timestamp, body)) else {
        return String::new();
    };
    format!("v1,{}", STANDARD.encode(mac.finalize().into_bytes()))
}
