//! Authentication constants.

/// Cookie carrying the anti-forgery state between login redirect and callback.
pub const STATE_COOKIE_NAME: &str = "oauthstate";

/// Random bytes in an anti-forgery nonce (256 bits).
pub const STATE_NONCE_BYTES: usize = 32;

/// Random bytes in a session token body.
pub const TOKEN_NONCE_BYTES: usize = 32;

/// Minimum length of the session token signing key.
pub const MIN_TOKEN_SECRET_LEN: usize = 32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonces_carry_enough_entropy() {
        assert!(STATE_NONCE_BYTES * 8 >= 128);
        assert!(TOKEN_NONCE_BYTES * 8 >= 128);
    }
}
