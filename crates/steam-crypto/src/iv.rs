//! HMAC-derived IVs for transport frames.

use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::{fill_random, CryptoError};

type HmacSha1 = Hmac<Sha1>;

/// Random bytes mixed into each IV.
pub(crate) const IV_RANDOM_LEN: usize = 3;
/// Leading bytes of the HMAC digest kept in the IV.
pub(crate) const IV_DIGEST_LEN: usize = 13;
/// Only the first half of the session key keys the HMAC.
const HMAC_SECRET_LEN: usize = 16;

/// Derive a fresh IV for `plaintext`.
///
/// ```text
/// r  = random(3)
/// iv = HMAC-SHA1(key[0..16], r || plaintext)[0..13] || r
/// ```
pub(crate) fn derive_iv(plaintext: &[u8], key: &[u8; 32]) -> Result<[u8; 16], CryptoError> {
    let mut random = [0u8; IV_RANDOM_LEN];
    fill_random(&mut random)?;
    derive_iv_with(&random, plaintext, key)
}

/// Deterministic half of [`derive_iv`]: the caller supplies the random bytes.
pub(crate) fn derive_iv_with(
    random: &[u8; IV_RANDOM_LEN],
    plaintext: &[u8],
    key: &[u8; 32],
) -> Result<[u8; 16], CryptoError> {
    let digest = hmac_prefix(random, plaintext, key)?;

    let mut iv = [0u8; 16];
    iv[..IV_DIGEST_LEN].copy_from_slice(&digest);
    iv[IV_DIGEST_LEN..].copy_from_slice(random);
    Ok(iv)
}

/// Check whether a recovered IV matches the plaintext it was derived for.
pub(crate) fn iv_matches(
    iv: &[u8; 16],
    plaintext: &[u8],
    key: &[u8; 32],
) -> Result<bool, CryptoError> {
    let mut random = [0u8; IV_RANDOM_LEN];
    random.copy_from_slice(&iv[IV_DIGEST_LEN..]);
    Ok(hmac_prefix(&random, plaintext, key)?[..] == iv[..IV_DIGEST_LEN])
}

fn hmac_prefix(
    random: &[u8; IV_RANDOM_LEN],
    plaintext: &[u8],
    key: &[u8; 32],
) -> Result<[u8; IV_DIGEST_LEN], CryptoError> {
    let mut mac = <HmacSha1 as Mac>::new_from_slice(&key[..HMAC_SECRET_LEN])
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
    mac.update(random);
    mac.update(plaintext);
    let digest = mac.finalize().into_bytes();

    let mut out = [0u8; IV_DIGEST_LEN];
    out.copy_from_slice(&digest[..IV_DIGEST_LEN]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [0x42u8; 32];

    #[test]
    fn random_bytes_trail_the_iv() {
        let random = [0x01, 0x02, 0x03];
        let iv = derive_iv_with(&random, b"payload", &KEY).unwrap();
        assert_eq!(&iv[13..], &random);
    }

    #[test]
    fn prefix_is_truncated_hmac() {
        let random = [0xAA, 0xBB, 0xCC];
        let iv = derive_iv_with(&random, b"payload", &KEY).unwrap();

        let mut mac = <HmacSha1 as Mac>::new_from_slice(&KEY[..16]).unwrap();
        mac.update(&random);
        mac.update(b"payload");
        let digest = mac.finalize().into_bytes();
        assert_eq!(&iv[..13], &digest[..13]);
    }

    #[test]
    fn only_first_half_of_key_is_used() {
        let mut other = KEY;
        other[16..].fill(0x00);
        let random = [7, 7, 7];
        assert_eq!(
            derive_iv_with(&random, b"abc", &KEY).unwrap(),
            derive_iv_with(&random, b"abc", &other).unwrap()
        );

        other[0] ^= 0x01;
        assert_ne!(
            derive_iv_with(&random, b"abc", &KEY).unwrap(),
            derive_iv_with(&random, b"abc", &other).unwrap()
        );
    }

    #[test]
    fn plaintext_changes_digest() {
        let random = [9, 9, 9];
        let a = derive_iv_with(&random, b"hello", &KEY).unwrap();
        let b = derive_iv_with(&random, b"hellp", &KEY).unwrap();
        assert_ne!(a[..13], b[..13]);
        assert_eq!(a[13..], b[13..]);
    }

    #[test]
    fn known_answer_iv() {
        let mut key = [0u8; 32];
        for (i, b) in key.iter_mut().enumerate() {
            *b = i as u8;
        }
        let iv = derive_iv_with(&[1, 2, 3], b"hello", &key).unwrap();
        assert_eq!(hex::encode(iv), "e1cff750d56cd0e3473276095b010203");
    }

    #[test]
    fn derived_iv_verifies() {
        let iv = derive_iv(b"some message", &KEY).unwrap();
        assert!(iv_matches(&iv, b"some message", &KEY).unwrap());
        assert!(!iv_matches(&iv, b"another message", &KEY).unwrap());
    }

    #[test]
    fn fresh_randomness_per_call() {
        let ivs: Vec<[u8; 16]> = (0..8).map(|_| derive_iv(b"same", &KEY).unwrap()).collect();
        assert!(ivs.windows(2).any(|w| w[0] != w[1]));
    }
}
