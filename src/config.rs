use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::TimeDelta;
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::cbc::{IV_SIZE, KEY_SIZE};

/// Compiled-in link key. Links are obfuscated, not authenticated, with it.
pub const DEFAULT_TOKEN_KEY: &[u8; KEY_SIZE] = b"classlink-static-obfuscation-key";
/// Compiled-in CBC initialization vector used for fixed-IV links.
pub const DEFAULT_TOKEN_IV: &[u8; IV_SIZE] = b"classlink-iv-v01";

/// The default lifetime of a link, counted from its `madeAt`.
pub const DEFAULT_LINK_TTL_HOURS: i64 = 24;
pub const DEFAULT_PORT: u16 = 3000;

pub const DEFAULT_DOWNLOAD_HANDLER_URL: &str = "https://player.classlink.app/download";
pub const DEFAULT_STREAM_PLAYER_URL: &str = "https://player.classlink.app/stream";
pub const DEFAULT_MARKETING_URL: &str = "https://classlink.app";

/// How the CBC initialization vector is chosen when a link is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IvMode {
    /// Every link uses the configured IV; the token carries ciphertext only.
    #[default]
    Fixed,
    /// Every link gets a fresh nonce and is sealed with AES-GCM.
    Random,
}

impl FromStr for IvMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(IvMode::Fixed),
            "random" => Ok(IvMode::Random),
            other => anyhow::bail!("Unknown TOKEN_IV_MODE '{}' (expected 'fixed' or 'random')", other),
        }
    }
}

/// Key material handed to the token codec.
#[derive(Clone)]
pub struct TokenConfig {
    /// The AES-256 key shared by the CBC and GCM link formats.
    pub key: Zeroizing<[u8; KEY_SIZE]>,
    /// The IV used for fixed-IV CBC links.
    pub iv: [u8; IV_SIZE],
    /// The IV strategy used when encoding.
    pub iv_mode: IvMode,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            key: Zeroizing::new(*DEFAULT_TOKEN_KEY),
            iv: *DEFAULT_TOKEN_IV,
            iv_mode: IvMode::Fixed,
        }
    }
}

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The address the server binds to.
    pub bind_addr: String,
    /// The port the server listens on.
    pub port: u16,
    /// Token codec settings.
    pub token: TokenConfig,
    /// How long a link stays valid after it was made.
    pub link_ttl: TimeDelta,
    /// Handler that downloads and plays offline classes.
    pub download_handler_url: String,
    /// Player used for streamed classes.
    pub stream_player_url: String,
    /// Where the expired page sends visitors.
    pub marketing_url: String,
    /// Base URL used when building shareable demo links.
    pub public_base_url: String,
    /// Whether the `/encrypt` demo route is mounted.
    pub demo_routes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            token: TokenConfig::default(),
            link_ttl: TimeDelta::hours(DEFAULT_LINK_TTL_HOURS),
            download_handler_url: DEFAULT_DOWNLOAD_HANDLER_URL.to_string(),
            stream_player_url: DEFAULT_STREAM_PLAYER_URL.to_string(),
            marketing_url: DEFAULT_MARKETING_URL.to_string(),
            public_base_url: format!("http://localhost:{}", DEFAULT_PORT),
            demo_routes: false,
        }
    }
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// Every variable is optional; unset ones fall back to the compiled-in
    /// defaults.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a `Config` from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port: u16 = match lookup("PORT") {
            Some(raw) => raw.trim().parse().context("PORT must be a valid port number")?,
            None => defaults.port,
        };

        let key = match lookup("TOKEN_KEY") {
            Some(raw) => decode_hex_secret::<KEY_SIZE>("TOKEN_KEY", raw)?,
            None => *DEFAULT_TOKEN_KEY,
        };

        let iv = match lookup("TOKEN_IV") {
            Some(raw) => decode_hex_secret::<IV_SIZE>("TOKEN_IV", raw)?,
            None => *DEFAULT_TOKEN_IV,
        };

        let iv_mode = match lookup("TOKEN_IV_MODE") {
            Some(raw) => raw.parse()?,
            None => IvMode::default(),
        };

        let ttl_hours: i64 = match lookup("LINK_TTL_HOURS") {
            Some(raw) => raw.trim().parse().context("Invalid LINK_TTL_HOURS")?,
            None => DEFAULT_LINK_TTL_HOURS,
        };
        if ttl_hours <= 0 {
            anyhow::bail!("LINK_TTL_HOURS must be positive");
        }

        let demo_routes = match lookup("DEMO_ROUTES") {
            Some(raw) => crate::models::session::parse_flag(&raw)
                .context("DEMO_ROUTES must be true or false")?,
            None => false,
        };

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port,
            token: TokenConfig {
                key: Zeroizing::new(key),
                iv,
                iv_mode,
            },
            link_ttl: TimeDelta::try_hours(ttl_hours).context("LINK_TTL_HOURS is too large")?,
            download_handler_url: lookup("DOWNLOAD_HANDLER_URL")
                .unwrap_or(defaults.download_handler_url),
            stream_player_url: lookup("STREAM_PLAYER_URL").unwrap_or(defaults.stream_player_url),
            marketing_url: lookup("MARKETING_URL").unwrap_or(defaults.marketing_url),
            public_base_url: lookup("PUBLIC_BASE_URL")
                .unwrap_or_else(|| format!("http://localhost:{}", port)),
            demo_routes,
        })
    }
}

/// Decodes a hex-encoded secret of exactly `N` bytes, wiping the hex text.
fn decode_hex_secret<const N: usize>(name: &str, mut raw: String) -> Result<[u8; N]> {
    let decoded = hex::decode(raw.trim());
    raw.zeroize();

    let mut bytes = decoded.with_context(|| format!("{} must be valid hexadecimal", name))?;
    let result: Result<[u8; N]> = bytes.as_slice().try_into().map_err(|_| {
        anyhow::anyhow!("{} must be exactly {} bytes ({} hex characters)", name, N, N * 2)
    });
    bytes.zeroize();
    result
}
