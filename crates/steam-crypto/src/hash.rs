//! SHA-1 hashing helpers.

use sha1::{Digest, Sha1};

/// Input to [`sha1_hex`]: raw bytes, or text hashed as its UTF-8 encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashInput<'a> {
    Bytes(&'a [u8]),
    Text(&'a str),
}

impl<'a> HashInput<'a> {
    pub fn as_bytes(&self) -> &'a [u8] {
        match *self {
            Self::Bytes(b) => b,
            Self::Text(s) => s.as_bytes(),
        }
    }
}

impl<'a> From<&'a [u8]> for HashInput<'a> {
    fn from(b: &'a [u8]) -> Self {
        Self::Bytes(b)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for HashInput<'a> {
    fn from(b: &'a [u8; N]) -> Self {
        Self::Bytes(b)
    }
}

impl<'a> From<&'a Vec<u8>> for HashInput<'a> {
    fn from(b: &'a Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl<'a> From<&'a str> for HashInput<'a> {
    fn from(s: &'a str) -> Self {
        Self::Text(s)
    }
}

impl<'a> From<&'a String> for HashInput<'a> {
    fn from(s: &'a String) -> Self {
        Self::Text(s)
    }
}

/// SHA-1 of `input` as 40 lowercase hex characters.
pub fn sha1_hex<'a>(input: impl Into<HashInput<'a>>) -> String {
    hex::encode(sha1_digest(input.into().as_bytes()))
}

/// Raw 20-byte SHA-1 digest.
pub fn sha1_digest(data: &[u8]) -> [u8; 20] {
    Sha1::digest(data).into()
}
