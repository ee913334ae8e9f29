//! AES-256 transport frames for the encrypted channel.
//!
//! A frame is the IV wrapped in a single AES-256-ECB block, followed by the
//! payload under AES-256-CBC with PKCS#7 padding:
//!
//! ```text
//! frame = AES-ECB(key, iv) || AES-CBC(key, iv, plaintext)
//! ```
//!
//! The IV comes from [`crate::iv`]. The receiver only learns it by decrypting
//! the first block; nothing authenticates the body.

use std::fmt;

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{
    BlockDecrypt, BlockDecryptMut, BlockEncrypt, BlockEncryptMut, KeyInit, KeyIvInit,
};
use aes::Aes256;
use bytes::{BufMut, Bytes, BytesMut};

use crate::iv::{derive_iv, iv_matches, IV_DIGEST_LEN, IV_RANDOM_LEN};
use crate::session_key::{SessionKey, SESSION_KEY_LEN};
use crate::CryptoError;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Size of the wrapped IV block at the start of every frame.
pub const IV_LEN: usize = 16;
const BLOCK_LEN: usize = 16;

/// Encrypt a payload for the server.
///
/// Output length is `16 + padded_len(plaintext)`, where padding always adds
/// between 1 and 16 bytes.
pub fn encrypt(plaintext: &[u8], key: &[u8; SESSION_KEY_LEN]) -> Result<Bytes, CryptoError> {
    let iv = derive_iv(plaintext, key)?;
    Ok(seal(plaintext, key, &iv))
}

/// Decrypt a frame received from the server.
pub fn decrypt(frame: &[u8], key: &[u8; SESSION_KEY_LEN]) -> Result<Bytes, CryptoError> {
    let (iv, body) = open_iv(frame, key)?;
    decrypt_body(body, key, &iv)
}

fn seal(plaintext: &[u8], key: &[u8; SESSION_KEY_LEN], iv: &[u8; IV_LEN]) -> Bytes {
    let mut iv_block = GenericArray::clone_from_slice(iv);
    Aes256::new(key.into()).encrypt_block(&mut iv_block);

    let body =
        Aes256CbcEnc::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut frame = BytesMut::with_capacity(IV_LEN + body.len());
    frame.put_slice(&iv_block);
    frame.put_slice(&body);
    frame.freeze()
}

/// Split a frame and unwrap its IV block.
fn open_iv<'a>(
    frame: &'a [u8],
    key: &[u8; SESSION_KEY_LEN],
) -> Result<([u8; IV_LEN], &'a [u8]), CryptoError> {
    if frame.len() < IV_LEN {
        return Err(CryptoError::InvalidFrame { len: frame.len() });
    }
    let (iv_block, body) = frame.split_at(IV_LEN);

    let mut block = GenericArray::clone_from_slice(iv_block);
    Aes256::new(key.into()).decrypt_block(&mut block);

    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&block);
    Ok((iv, body))
}

fn decrypt_body(
    body: &[u8],
    key: &[u8; SESSION_KEY_LEN],
    iv: &[u8; IV_LEN],
) -> Result<Bytes, CryptoError> {
    // PKCS#7 always leaves at least one block behind.
    if body.is_empty() || body.len() % BLOCK_LEN != 0 {
        return Err(CryptoError::DecryptionFailed(format!(
            "ciphertext length {} is not a positive multiple of {BLOCK_LEN}",
            body.len()
        )));
    }

    Aes256CbcDec::new(key.into(), iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(body)
        .map(Bytes::from)
        .map_err(|_| CryptoError::PaddingInvalid)
}

/// A decrypted frame taken apart, for debugging captured traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameInspection {
    /// The IV recovered from the first block.
    pub iv: [u8; IV_LEN],
    /// The random bytes that seeded the HMAC (the IV's last 3 bytes).
    pub random: [u8; IV_RANDOM_LEN],
    /// The decrypted payload.
    pub plaintext: Bytes,
    /// Whether `iv[..13]` equals the HMAC over `random || plaintext`.
    ///
    /// Frames produced by [`encrypt`] always match; a mismatch means the
    /// sender used another key or derived its IV differently.
    pub iv_matches: bool,
}

/// Decrypt `frame` and check its IV against the recovered plaintext.
pub fn inspect_frame(
    frame: &[u8],
    key: &[u8; SESSION_KEY_LEN],
) -> Result<FrameInspection, CryptoError> {
    let (iv, body) = open_iv(frame, key)?;
    let plaintext = decrypt_body(body, key, &iv)?;

    let mut random = [0u8; IV_RANDOM_LEN];
    random.copy_from_slice(&iv[IV_DIGEST_LEN..]);

    let matches = iv_matches(&iv, &plaintext, key)?;

    Ok(FrameInspection {
        iv,
        random,
        plaintext,
        iv_matches: matches,
    })
}

/// Transport cipher bound to one session key.
///
/// Unlike a stream cipher context this carries no per-packet state, so one
/// instance can be shared between the send and receive paths.
#[derive(Clone)]
pub struct ChannelCipher {
    key: [u8; SESSION_KEY_LEN],
}

impl ChannelCipher {
    pub fn new(key: &[u8; SESSION_KEY_LEN]) -> Self {
        Self { key: *key }
    }

    pub fn from_session_key(session_key: &SessionKey) -> Self {
        Self::new(&session_key.plain)
    }

    /// Encrypt an outgoing payload.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Bytes, CryptoError> {
        encrypt(plaintext, &self.key)
    }

    /// Decrypt an incoming frame.
    pub fn decrypt(&self, frame: &[u8]) -> Result<Bytes, CryptoError> {
        decrypt(frame, &self.key)
    }
}

impl fmt::Debug for ChannelCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelCipher").finish_non_exhaustive()
    }
}
