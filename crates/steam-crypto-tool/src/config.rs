use serde::Deserialize;
use std::path::Path;

use crate::error::ToolError;

#[derive(Debug, Default, Deserialize)]
pub struct ToolConfig {
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputSection {
    #[serde(default)]
    pub encoding: Encoding,
}

/// Text encoding for binary values read from and written to the terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Hex,
    Base64,
}

impl Encoding {
    pub fn encode(self, data: &[u8]) -> String {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine;

        match self {
            Self::Hex => hex::encode(data),
            Self::Base64 => STANDARD.encode(data),
        }
    }

    pub fn decode(self, text: &str) -> Result<Vec<u8>, ToolError> {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine;

        let text = text.trim();
        match self {
            Self::Hex => hex::decode(text).map_err(ToolError::from),
            Self::Base64 => STANDARD.decode(text).map_err(ToolError::from),
        }
    }
}

impl ToolConfig {
    /// Load from `path`. A missing file means "use the defaults".
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ToolError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ToolError> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = ToolConfig::parse("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.output.encoding, Encoding::Hex);
    }

    #[test]
    fn sections_override_defaults() {
        let config = ToolConfig::parse(
            r#"
            [logging]
            level = "debug"

            [output]
            encoding = "base64"
            "#,
        )
        .unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.output.encoding, Encoding::Base64);
    }

    #[test]
    fn unknown_encoding_rejected() {
        let result = ToolConfig::parse("[output]\nencoding = \"octal\"\n");
        assert!(matches!(result, Err(ToolError::Config(_))));
    }

    #[test]
    fn missing_file_is_default() {
        let config = ToolConfig::load("/nonexistent/steam-crypto.toml").unwrap();
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn encodings_decode_what_they_encode() {
        let data = [0x00u8, 0x7F, 0x80, 0xFF];
        assert_eq!(Encoding::Hex.encode(&data), "007f80ff");
        assert_eq!(Encoding::Base64.encode(&data), "AH+A/w==");
        assert_eq!(Encoding::Hex.decode(" 007f80ff\n").unwrap(), data);
        assert_eq!(Encoding::Base64.decode("AH+A/w==").unwrap(), data);
    }

    #[test]
    fn bad_hex_rejected() {
        assert!(matches!(Encoding::Hex.decode("zz"), Err(ToolError::Hex(_))));
    }
}
