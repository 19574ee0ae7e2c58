//! Update-secret generation and verification for claimed hosts.
//!
//! Note: unlike login passwords (argon2, see `auth`), host update secrets use
//! a salted HMAC-SHA1. The verification load is high-frequency and the
//! credential is low-value, often sent over plain HTTP by embedded or router
//! clients, so a slow KDF here would only add update latency. Do not swap
//! this for a password hash.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

const SECRET_LEN: usize = 24;
const SALT_LEN: usize = 16;
const SCHEME: &str = "hmac-sha1";

/// Generate a fresh plaintext update secret. The caller hashes it with
/// [`hash_secret`] for storage and returns the plaintext to the user exactly
/// once; it is never recoverable afterwards.
pub fn generate_secret() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(SECRET_LEN)
        .map(char::from)
        .collect()
}

/// Hash a plaintext secret with a fresh random salt.
///
/// Stored form: `hmac-sha1$<base64 salt>$<base64 mac>`.
pub fn hash_secret(plain: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill(&mut salt[..]);

    let mut mac = HmacSha1::new_from_slice(&salt).expect("hmac accepts any key length");
    mac.update(plain.as_bytes());
    let digest = mac.finalize().into_bytes();

    format!(
        "{SCHEME}${}${}",
        BASE64.encode(salt),
        BASE64.encode(digest)
    )
}

/// Verify a presented secret against a stored hash.
///
/// The MAC comparison goes through `Mac::verify_slice`, which compares in
/// constant time, so the result does not leak how many bytes matched. Any
/// malformed stored value verifies as false rather than erroring.
pub fn verify_secret(stored: &str, presented: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(scheme), Some(salt_b64), Some(mac_b64)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if scheme != SCHEME {
        return false;
    }

    let (Ok(salt), Ok(expected)) = (BASE64.decode(salt_b64), BASE64.decode(mac_b64)) else {
        return false;
    };

    let Ok(mut mac) = HmacSha1::new_from_slice(&salt) else {
        return false;
    };
    mac.update(presented.as_bytes());
    mac.verify_slice(&expected).is_ok()
}
