//! QR payload codec.
//!
//! Member QR codes carry an AES-128-ECB encrypted, PKCS#7 padded, Base64
//! encoded identity payload. The secret is normalized to exactly 16 bytes the
//! same way the payload producers do it (space padding / truncation), so the
//! same key string decrypts on both sides.

use aes::Aes128;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit, block_padding::Pkcs7};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};

use crate::error::AppError;

const KEY_LEN: usize = 16;

/// Pad with spaces to 16 bytes, or truncate to 16 bytes.
fn normalize_key(secret: &str) -> [u8; KEY_LEN] {
    let mut key = [b' '; KEY_LEN];
    let bytes = secret.as_bytes();
    let len = bytes.len().min(KEY_LEN);
    key[..len].copy_from_slice(&bytes[..len]);
    key
}

/// Decrypt a scanned QR blob into the plaintext identity payload.
///
/// Any failure (bad Base64, bad padding, non-UTF-8 plaintext) means a garbled
/// or foreign scan, not a server fault, and collapses to the same error.
pub fn decrypt(encrypted: &str, secret: &str) -> Result<String, AppError> {
    let key = normalize_key(secret);

    let ciphertext = BASE64.decode(encrypted).map_err(|_| AppError::Decryption)?;

    let plaintext = ecb::Decryptor::<Aes128>::new(&key.into())
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| AppError::Decryption)?;

    String::from_utf8(plaintext).map_err(|_| AppError::Decryption)
}

/// Encrypt an identity payload the way member QR codes are produced.
pub fn encrypt(plaintext: &str, secret: &str) -> String {
    let key = normalize_key(secret);

    let ciphertext =
        ecb::Encryptor::<Aes128>::new(&key.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    BASE64.encode(ciphertext)
}

#[cfg(test)]
mod tests {
    use super::{decrypt, encrypt, normalize_key};

    #[test]
    fn round_trip() {
        let plaintext = "S123|Jane|M|Doe|3|BSCS";
        let encrypted = encrypt(plaintext, "org-shared-secret");

        assert_eq!(decrypt(&encrypted, "org-shared-secret").unwrap(), plaintext);
    }

    #[test]
    fn short_key_padded_with_spaces() {
        assert_eq!(normalize_key("abc"), *b"abc             ");
    }

    #[test]
    fn long_key_truncated() {
        assert_eq!(
            normalize_key("0123456789abcdefEXTRA"),
            *b"0123456789abcdef"
        );
    }

    #[test]
    fn equivalent_keys_decrypt_identically() {
        // "key" and "key" + explicit trailing spaces normalize to the same 16 bytes
        let encrypted = encrypt("payload", "key");

        assert_eq!(decrypt(&encrypted, "key             ").unwrap(), "payload");
    }

    #[test]
    fn bad_base64_rejected() {
        assert!(decrypt("not-base64!!!", "key").is_err());
    }

    #[test]
    fn wrong_key_rejected() {
        let encrypted = encrypt("S123|Jane|M|Doe|3|BSCS", "right-key");

        assert!(decrypt(&encrypted, "wrong-key").is_err());
    }
}
