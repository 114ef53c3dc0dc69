//! # Gateway payment signatures
//!
//! When a customer completes a payment, the gateway hands back three values: its order id, its payment id and a
//! signature. The signature is the hex-encoded HMAC-SHA256 of
//!
//! ```text
//!    {gateway_order_id}|{gateway_payment_id}
//! ```
//!
//! keyed with the merchant's API secret. A valid signature is the only evidence of payment that the server trusts.
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn payment_mac(secret: &str, order_id: &str, payment_id: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Some(mac)
}

/// Produces the signature the gateway would attach to this payment.
pub fn sign_payment(secret: &str, order_id: &str, payment_id: &str) -> String {
    payment_mac(secret, order_id, payment_id).map(|mac| hex::encode(mac.finalize().into_bytes())).unwrap_or_default()
}

/// Checks a gateway signature in constant time.
///
/// Malformed input (empty values, a signature that is not hex, or has the wrong length) simply fails verification.
pub fn verify_payment_signature(secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    if secret.is_empty() || order_id.is_empty() || payment_id.is_empty() || signature.is_empty() {
        return false;
    }
    let Ok(provided) = hex::decode(signature.trim()) else {
        return false;
    };
    match payment_mac(secret, order_id, payment_id) {
        Some(mac) => mac.verify_slice(&provided).is_ok(),
        None => false,
    }
}
