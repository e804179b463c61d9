//! HMAC-SHA256 helpers shared by both gateways.

use crate::error::SignatureError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac(secret: &str) -> Result<HmacSha256, SignatureError> {
    HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| SignatureError::InvalidKey(e.to_string()))
}

/// Lowercase hex HMAC-SHA256 of `message`.
pub fn hmac_sha256_hex(secret: &str, message: &str) -> Result<String, SignatureError> {
    let mut mac = mac(secret)?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a hex signature in constant time. Invalid hex never matches.
pub fn verify_hmac_sha256_hex(
    secret: &str,
    message: &str,
    signature_hex: &str,
) -> Result<bool, SignatureError> {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return Ok(false);
    };
    let mut mac = mac(secret)?;
    mac.update(message.as_bytes());
    Ok(mac.verify_slice(&expected).is_ok())
}
