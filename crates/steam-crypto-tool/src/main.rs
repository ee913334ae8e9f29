mod config;
mod error;

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use config::{Encoding, ToolConfig};
use error::ToolError;
use steam_crypto::{
    crc32, decrypt, encrypt, generate_session_key, inspect_frame, session_key_from_slice,
    sha1_hex, FrameInspection, SESSION_KEY_LEN,
};
use tracing::{debug, info, warn};

/// Steam channel-encryption diagnostics.
///
/// Binary values on the command line and on stdout use the configured
/// encoding (hex unless `[output] encoding` or `--encoding` says otherwise).
#[derive(Parser, Debug)]
#[command(name = "steam-crypto-tool")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file; ignored if it does not exist
    #[arg(short, long, default_value = "steam-crypto.toml")]
    config: PathBuf,

    /// Override the configured output encoding
    #[arg(short, long, value_enum)]
    encoding: Option<Encoding>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a session key and wrap it with the system public key
    SessionKey {
        /// Nonce from the server's channel-encrypt request
        #[arg(short, long)]
        nonce: String,
    },

    /// Encrypt raw bytes from a file (or stdin) into a transport frame
    Encrypt {
        #[arg(short, long)]
        key: String,
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Decrypt an encoded transport frame from a file (or stdin)
    Decrypt {
        #[arg(short, long)]
        key: String,
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Decrypt a frame and report its IV layout
    Inspect {
        #[arg(short, long)]
        key: String,
        /// Encoded frame; read from stdin when omitted
        #[arg(short, long)]
        frame: Option<String>,
    },

    /// CRC-32 of a file (or stdin)
    Crc32 {
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// SHA-1 of a string, or of a file's bytes
    Sha1 {
        text: Option<String>,
        #[arg(short, long, conflicts_with = "text")]
        input: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match ToolConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", cli.config.display());
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let encoding = cli.encoding.unwrap_or(config.output.encoding);
    debug!("Using {encoding:?} encoding");

    if let Err(e) = run(cli.command, encoding) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(command: Commands, encoding: Encoding) -> Result<(), ToolError> {
    match command {
        Commands::SessionKey { nonce } => {
            let nonce = encoding.decode(&nonce)?;
            let session = generate_session_key(&nonce)?;
            info!(
                "Generated session key for {}-byte nonce ({} bytes wrapped)",
                nonce.len(),
                session.encrypted.len()
            );
            println!("plain:     {}", encoding.encode(&session.plain));
            println!("encrypted: {}", encoding.encode(&session.encrypted));
        }
        Commands::Encrypt { key, input } => {
            let key = parse_key(&key, encoding)?;
            let plaintext = read_input(input.as_deref())?;
            let frame = encrypt(&plaintext, &key)?;
            info!("Encrypted {} bytes into {}-byte frame", plaintext.len(), frame.len());
            println!("{}", encoding.encode(&frame));
        }
        Commands::Decrypt { key, input } => {
            let key = parse_key(&key, encoding)?;
            let frame = encoding.decode(&read_text(input.as_deref())?)?;
            let plaintext = decrypt(&frame, &key)?;
            info!("Decrypted {}-byte frame into {} bytes", frame.len(), plaintext.len());
            println!("{}", encoding.encode(&plaintext));
        }
        Commands::Inspect { key, frame } => {
            let key = parse_key(&key, encoding)?;
            let text = match frame {
                Some(f) => f,
                None => read_text(None)?,
            };
            let frame = encoding.decode(&text)?;
            let report = inspect_frame(&frame, &key)?;
            if !report.iv_matches {
                warn!("IV prefix does not match HMAC of the decrypted payload");
            }
            for line in inspection_lines(&report, encoding) {
                println!("{line}");
            }
        }
        Commands::Crc32 { input } => {
            let data = read_input(input.as_deref())?;
            let crc = crc32(&data);
            debug!("CRC-32 over {} bytes", data.len());
            println!("0x{crc:08x} ({crc})");
        }
        Commands::Sha1 { text, input } => {
            let digest = match text {
                Some(t) => sha1_hex(&t),
                None => sha1_hex(&read_input(input.as_deref())?),
            };
            println!("{digest}");
        }
    }
    Ok(())
}

fn inspection_lines(report: &FrameInspection, encoding: Encoding) -> [String; 4] {
    [
        format!("iv:         {}", encoding.encode(&report.iv)),
        format!("random:     {}", encoding.encode(&report.random)),
        format!("iv_matches: {}", report.iv_matches),
        format!("plaintext:  {}", encoding.encode(&report.plaintext)),
    ]
}

fn parse_key(text: &str, encoding: Encoding) -> Result<[u8; SESSION_KEY_LEN], ToolError> {
    let bytes = encoding.decode(text)?;
    Ok(session_key_from_slice(&bytes)?)
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>, ToolError> {
    match path {
        Some(p) => {
            debug!("Reading {}", p.display());
            Ok(std::fs::read(p)?)
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

fn read_text(path: Option<&Path>) -> Result<String, ToolError> {
    String::from_utf8(read_input(path)?).map_err(|_| ToolError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "steam-crypto-tool",
            "--encoding",
            "base64",
            "session-key",
            "--nonce",
            "AAAA",
        ])
        .unwrap();
        assert_eq!(cli.encoding, Some(Encoding::Base64));
        assert!(matches!(cli.command, Commands::SessionKey { .. }));
    }

    #[test]
    fn sha1_text_and_input_conflict() {
        let result = Cli::try_parse_from([
            "steam-crypto-tool",
            "sha1",
            "hello",
            "--input",
            "file.bin",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_key_requires_32_bytes() {
        let key = parse_key(&"ab".repeat(32), Encoding::Hex).unwrap();
        assert_eq!(key, [0xABu8; 32]);

        assert!(matches!(
            parse_key(&"ab".repeat(16), Encoding::Hex),
            Err(ToolError::Crypto(steam_crypto::CryptoError::InvalidKeyLength(16)))
        ));
    }

    #[test]
    fn session_key_command_runs() {
        assert!(run(
            Commands::SessionKey {
                nonce: "00112233445566778899aabbccddeeff".into(),
            },
            Encoding::Hex,
        )
        .is_ok());
    }

    #[test]
    fn inspection_follows_selected_encoding() {
        let key = [0x24u8; 32];
        let frame = encrypt(b"inspect", &key).unwrap();
        let report = inspect_frame(&frame, &key).unwrap();

        let lines = inspection_lines(&report, Encoding::Base64);
        assert_eq!(lines[0], format!("iv:         {}", Encoding::Base64.encode(&report.iv)));
        assert_eq!(
            lines[1],
            format!("random:     {}", Encoding::Base64.encode(&report.random))
        );
        assert_eq!(lines[2], "iv_matches: true");
        assert_eq!(lines[3], "plaintext:  aW5zcGVjdA==");

        let lines = inspection_lines(&report, Encoding::Hex);
        assert_eq!(lines[1], format!("random:     {}", hex::encode(report.random)));
        assert_eq!(lines[3], "plaintext:  696e7370656374");
    }

    #[test]
    fn inspect_command_runs_on_fresh_frame() {
        let key = [0x24u8; 32];
        let frame = encrypt(b"inspect", &key).unwrap();
        assert!(run(
            Commands::Inspect {
                key: hex::encode(key),
                frame: Some(hex::encode(&frame)),
            },
            Encoding::Hex,
        )
        .is_ok());
    }
}
