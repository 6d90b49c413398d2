use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify Meta's `X-Hub-Signature-256` header against the raw request body.
/// Header format is `sha256=<hex hmac>`. Fails closed on a missing prefix,
/// non-hex digest or mismatch; `verify_slice` compares in constant time.
pub fn verify_meta_signature(app_secret: &str, body: &[u8], signature_header: &str) -> bool {
    let Some(hex_sig) = signature_header.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(app_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Compute the signature header value for a body, `sha256=<hex>`.
/// Used by tests to produce valid deliveries.
pub fn sign_body(app_secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_app_secret";

    #[test]
    fn accepts_valid_signature() {
        let body = br#"{"object":"whatsapp_business_account","entry":[]}"#;
        let header = sign_body(SECRET, body);
        assert!(verify_meta_signature(SECRET, body, &header));
    }

    #[test]
    fn rejects_mutated_digest() {
        let body = b"payload bytes";
        let header = sign_body(SECRET, body);
        // Flip one nibble of the hex digest.
        let mut chars: Vec<char> = header.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == '0' { '1' } else { '0' };
        let tampered: String = chars.into_iter().collect();
        assert!(!verify_meta_signature(SECRET, body, &tampered));
    }

    #[test]
    fn rejects_mutated_body() {
        let header = sign_body(SECRET, b"original");
        assert!(!verify_meta_signature(SECRET, b"originaX", &header));
    }

    #[test]
    fn rejects_wrong_secret() {
        let body = b"payload";
        let header = sign_body("other_secret", body);
        assert!(!verify_meta_signature(SECRET, body, &header));
    }

    #[test]
    fn rejects_missing_prefix() {
        let body = b"payload";
        let header = sign_body(SECRET, body);
        let bare = header.strip_prefix("sha256=").unwrap();
        assert!(!verify_meta_signature(SECRET, body, bare));
    }

    #[test]
    fn rejects_non_hex_digest() {
        assert!(!verify_meta_signature(SECRET, b"payload", "sha256=zzzz"));
        assert!(!verify_meta_signature(SECRET, b"payload", "sha256="));
    }
}
