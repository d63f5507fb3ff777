use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha1::Sha1;
use sha2::Sha256;

pub type HmacSha1 = Hmac<Sha1>;
pub type HmacSha256 = Hmac<Sha256>;

/// Base64 HMAC of `data` keyed by `secret`, generic over the MAC algorithm.
/// The service signs with HMAC-SHA1; the SHA-256 variant exists for signature
/// scheme upgrades.
pub fn hmac_base64<M>(secret: &str, data: &str) -> String
where
    M: Mac + KeyInit,
{
    let mut mac = match <M as KeyInit>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(data.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

pub fn hmac_sha1(secret: &str, data: &str) -> String {
    hmac_base64::<HmacSha1>(secret, data)
}

pub fn hmac_sha256(secret: &str, data: &str) -> String {
    hmac_base64::<HmacSha256>(secret, data)
}

/// Base64 MD5 checksum, the `Content-MD5` header value for a request body.
pub fn md5_base64(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    BASE64.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn md5_of_empty_body() {
        assert_eq!(md5_base64(b""), "1B2M2Y8AsgTpgAmY7PhCfg==");
    }

    #[test]
    fn hmac_sha1_known_vector() {
        // RFC 2202 test case 2.
        assert_eq!(
            hmac_sha1("Jefe", "what do ya want for nothing?"),
            "7/zfauXrL6LSdBbV8YTfnCWafHk="
        );
    }
}
