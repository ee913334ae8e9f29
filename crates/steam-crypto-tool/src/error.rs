use steam_crypto::CryptoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid UTF-8 in input")]
    InvalidUtf8,
}
