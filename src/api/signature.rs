use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::error;

/// `X-Line-Signature` value for a raw request body: base64 of the
/// HMAC-SHA256 keyed with the channel secret.
pub fn compute_line_signature(request_body: &[u8], channel_secret: &str) -> String {
    let mut mac = match Hmac::<Sha256>::new_from_slice(channel_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(e) => {
            error!("Failed to create HMAC: {}", e);
            return String::new();
        }
    };
    mac.update(request_body);
    STANDARD.encode(mac.finalize().into_bytes())
}

pub fn verify_line_signature(request_body: &[u8], signature: &str, channel_secret: &str) -> bool {
    let Ok(expected) = STANDARD.decode(signature.trim()) else {
        error!("X-Line-Signature is not valid base64");
        return false;
    };

    let mut mac = match Hmac::<Sha256>::new_from_slice(channel_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(e) => {
            error!("Failed to create HMAC: {}", e);
            return false;
        }
    };
    mac.update(request_body);

    if mac.verify_slice(&expected).is_ok() {
        true
    } else {
        error!("LINE signature verification failed");
        false
    }
}
