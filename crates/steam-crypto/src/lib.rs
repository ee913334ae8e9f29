//! Steam channel encryption: RSA-wrapped session keys, AES-256 transport
//! frames with HMAC-derived IVs, SHA-1 and CRC-32 helpers.
//!
//! Every function here is stateless and safe to call from any thread. The
//! crate does no I/O and no logging; callers hand in byte buffers they have
//! already pulled off the wire.

pub mod checksum;
pub mod hash;
mod iv;
pub mod session_key;
pub mod transport;

pub use checksum::{crc32, Crc32};
pub use hash::{sha1_digest, sha1_hex, HashInput};
pub use session_key::{
    generate_session_key, session_key_from_slice, system_public_key, wrap_session_key,
    SessionKey, SESSION_KEY_LEN, SYSTEM_PUBLIC_KEY_PEM,
};
pub use transport::{decrypt, encrypt, inspect_frame, ChannelCipher, FrameInspection, IV_LEN};

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("secure random source unavailable")]
    RandomUnavailable,

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("invalid padding")]
    PaddingInvalid,

    #[error("frame too short: need at least 16 bytes, got {len}")]
    InvalidFrame { len: usize },

    #[error("invalid session key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
}

/// Fill `buf` from the OS CSPRNG.
///
/// There is no fallback: if the OS source fails the caller gets
/// [`CryptoError::RandomUnavailable`].
pub(crate) fn fill_random(buf: &mut [u8]) -> Result<(), CryptoError> {
    use rand::rngs::OsRng;
    use rand::RngCore;

    OsRng
        .try_fill_bytes(buf)
        .map_err(|_| CryptoError::RandomUnavailable)
}

/// A CSPRNG seeded from `source`, for APIs that draw through
/// `fill_bytes` and would otherwise panic when the OS source fails.
pub(crate) fn seeded_rng<R: rand::RngCore>(
    source: R,
) -> Result<rand::rngs::StdRng, CryptoError> {
    use rand::SeedableRng;

    rand::rngs::StdRng::from_rng(source).map_err(|_| CryptoError::RandomUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;
    use rand::RngCore;

    struct OfflineRng;

    impl RngCore for OfflineRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new("entropy source offline"))
        }
    }

    #[test]
    fn seeding_from_failed_source_is_reported() {
        assert!(matches!(
            seeded_rng(OfflineRng),
            Err(CryptoError::RandomUnavailable)
        ));
    }

    #[test]
    fn seeding_from_os_source_succeeds() {
        let mut rng = seeded_rng(OsRng).unwrap();
        let mut buf = [0u8; 32];
        rng.fill_bytes(&mut buf);
        assert_ne!(buf, [0u8; 32]);
    }
}
