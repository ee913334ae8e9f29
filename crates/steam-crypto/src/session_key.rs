//! Session key generation and RSA wrapping with Steam's "System" public key.

use std::fmt;
use std::sync::OnceLock;

use rand::rngs::OsRng;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Oaep, RsaPublicKey};
use sha1::Sha1;

use crate::{fill_random, seeded_rng, CryptoError};

/// Length of the symmetric session key.
pub const SESSION_KEY_LEN: usize = 32;

/// Steam's public "System" key (1024-bit RSA, e = 17).
pub const SYSTEM_PUBLIC_KEY_PEM: &str = "-----BEGIN PUBLIC KEY-----
MIGdMA0GCSqGSIb3DQEBAQUAA4GLADCBhwKBgQDf7BrWLBBmLBc1OhSwfFkRf53T
2Ct64+AVzRkeRuh7h3SiGEYxqQMUeYKO6UWiSRKpI2hzic9pobFhRr3Bvr/WARvY
gdTckPv+T1JzZsuVcNfFjrocejN1oWI0Rrtgt4Bo+hOneoo3S57G9F1fOpn5nsQ6
6WOiu4gZKODnFMBCiQIBEQ==
-----END PUBLIC KEY-----
";

static SYSTEM_KEY: OnceLock<Result<RsaPublicKey, String>> = OnceLock::new();

/// The parsed system public key. Parsed on first use, then shared.
pub fn system_public_key() -> Result<&'static RsaPublicKey, CryptoError> {
    SYSTEM_KEY
        .get_or_init(|| {
            RsaPublicKey::from_public_key_pem(SYSTEM_PUBLIC_KEY_PEM).map_err(|e| e.to_string())
        })
        .as_ref()
        .map_err(|e| CryptoError::InvalidPublicKey(e.clone()))
}

/// A freshly generated session key and its RSA-wrapped form.
///
/// `plain` stays with the caller for the lifetime of the channel;
/// `encrypted` is sent to the server once and can then be dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey {
    pub plain: [u8; SESSION_KEY_LEN],
    pub encrypted: Vec<u8>,
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKey")
            .field("plain", &"<redacted>")
            .field("encrypted_len", &self.encrypted.len())
            .finish()
    }
}

/// Generate a 32-byte session key and wrap it for the server.
///
/// `nonce` is the value the server sent in its channel-encrypt request. The
/// wrapped blob decrypts to `plain || nonce`.
///
/// ```text
/// plain     = random(32)
/// encrypted = RSA-OAEP-SHA1(system_key, plain || nonce)   // 128 bytes
/// ```
pub fn generate_session_key(nonce: &[u8]) -> Result<SessionKey, CryptoError> {
    let mut plain = [0u8; SESSION_KEY_LEN];
    fill_random(&mut plain)?;

    let encrypted = wrap_session_key(system_public_key()?, &plain, nonce)?;
    Ok(SessionKey { plain, encrypted })
}

/// RSA-OAEP (SHA-1) encrypt `plain || nonce` under `public_key`.
///
/// The OAEP seed comes from a CSPRNG seeded from the OS source, so an
/// entropy failure surfaces as [`CryptoError::RandomUnavailable`].
/// The output is always exactly the modulus size. Fails with
/// [`CryptoError::EncryptionFailed`] when the message does not fit,
/// which for the 1024-bit system key means a nonce longer than 54 bytes.
pub fn wrap_session_key(
    public_key: &RsaPublicKey,
    plain: &[u8; SESSION_KEY_LEN],
    nonce: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let mut message = Vec::with_capacity(SESSION_KEY_LEN + nonce.len());
    message.extend_from_slice(plain);
    message.extend_from_slice(nonce);

    let mut rng = seeded_rng(OsRng)?;
    public_key
        .encrypt(&mut rng, Oaep::new::<Sha1>(), &message)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
}

/// Copy a caller-supplied key buffer into a fixed-size session key.
pub fn session_key_from_slice(key: &[u8]) -> Result<[u8; SESSION_KEY_LEN], CryptoError> {
    key.try_into()
        .map_err(|_| CryptoError::InvalidKeyLength(key.len()))
}
