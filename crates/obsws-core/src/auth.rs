//! Challenge-response authentication handshake.
//!
//! When the server is protected by a password, its reply to `GetAuthRequired`
//! carries two random strings: a `salt` and a `challenge`.  The client proves
//! it knows the password by sending back a token derived from all three:
//!
//! ```text
//! secret   = base64( sha256( password || salt ) )
//! response = base64( sha256( secret || challenge ) )
//! ```
//!
//! `||` is plain string concatenation and the order is fixed by the protocol.
//! Base64 uses the standard alphabet with padding.
//!
//! The password itself never crosses the network, and because the challenge
//! changes per connection a captured token cannot be replayed later.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};

/// The salt/challenge pair issued by a server that requires authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    /// Per-connection random challenge.
    pub challenge: String,
    /// Per-password salt.
    pub salt: String,
}

impl AuthChallenge {
    /// Computes the token answering this challenge for `password`.
    pub fn respond(&self, password: &str) -> String {
        auth_response(password, &self.salt, &self.challenge)
    }
}

/// Computes the authentication token for `password`, `salt` and `challenge`.
///
/// The function is pure: the same three inputs always produce the same token.
///
/// # Examples
///
/// ```rust
/// use obsws_core::auth_response;
///
/// let token = auth_response("password", "s1", "c1");
/// assert_eq!(token, "j+bYGyORRAABiGZ/wXIZ1EmV/T7pbFTv68zIhww7pMY=");
/// ```
pub fn auth_response(password: &str, salt: &str, challenge: &str) -> String {
    let secret = sha256_base64(password, salt);
    sha256_base64(&secret, challenge)
}

/// `base64(sha256(first || second))`.
fn sha256_base64(first: &str, second: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(first.as_bytes());
    hasher.update(second.as_bytes());
    STANDARD.encode(hasher.finalize())
}
