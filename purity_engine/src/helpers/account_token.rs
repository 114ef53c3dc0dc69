use rand::RngCore;

/// 24 random bytes, hex-encoded. Used for email verification and password reset links.
pub fn new_account_token() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
