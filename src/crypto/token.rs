use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{
    alphabet,
    engine::{general_purpose::URL_SAFE_NO_PAD, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::config::{IvMode, TokenConfig};
use crate::crypto::cbc::{self, KEY_SIZE};
use crate::error::{AppError, DecodeError, Result};
use crate::models::session::ClassSession;

/// Separates a transmitted nonce from the ciphertext.
pub const DELIMITER: char = ':';
/// Length of the nonce carried by sealed tokens.
pub const NONCE_SIZE: usize = 12;

/// Standard-alphabet engine that tolerates missing `=` padding.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Converts class sessions to and from opaque link tokens.
///
/// Two token shapes exist:
///
/// * `b64(ciphertext)`: AES-256-CBC under the configured fixed IV.
/// * `b64(nonce):b64(ciphertext||tag)`: AES-256-GCM under a per-link nonce.
///
/// The delimited form is authenticated, so any edit to its nonce or body is
/// caught before the plaintext is looked at.
pub struct TokenCodec {
    key: Zeroizing<[u8; KEY_SIZE]>,
    iv: [u8; cbc::IV_SIZE],
    iv_mode: IvMode,
}

impl TokenCodec {
    /// Creates a new `TokenCodec` from the given key material.
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            key: config.key.clone(),
            iv: config.iv,
            iv_mode: config.iv_mode,
        }
    }

    /// Encodes a session into a link token.
    ///
    /// Fixed mode yields the bare CBC form; random mode yields a sealed token.
    ///
    /// # Arguments
    ///
    /// * `session` - The session to encode.
    ///
    /// # Returns
    ///
    /// A URL-safe token string.
    pub fn encode(&self, session: &ClassSession) -> Result<String> {
        match self.iv_mode {
            IvMode::Fixed => {
                let json = to_json(session)?;
                Ok(URL_SAFE_NO_PAD.encode(cbc::encrypt(&self.key, &self.iv, json.as_bytes())))
            }
            IvMode::Random => self.seal(session),
        }
    }

    /// Encodes a session into an authenticated AES-GCM link token.
    pub fn seal(&self, session: &ClassSession) -> Result<String> {
        let json = to_json(session)?;

        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = Aes256Gcm::new((&*self.key).into())
            .encrypt(&Nonce::from(nonce), json.as_bytes())
            .map_err(|e| AppError::Encryption(format!("Sealing failed: {}", e)))?;

        Ok(format!(
            "{}{}{}",
            URL_SAFE_NO_PAD.encode(nonce),
            DELIMITER,
            URL_SAFE_NO_PAD.encode(ciphertext)
        ))
    }

    /// Decodes a link token back into a session.
    ///
    /// Spaces (a `+` mangled by URL decoding), URL-safe alphabet characters and
    /// missing padding are all tolerated.
    ///
    /// # Arguments
    ///
    /// * `token` - The token as received in the query string.
    ///
    /// # Returns
    ///
    /// The decoded session, or the reason the token was rejected.
    pub fn decode(&self, token: &str) -> std::result::Result<ClassSession, DecodeError> {
        let plaintext = match token.split_once(DELIMITER) {
            None => {
                let ciphertext = decode_base64(token)?;
                cbc::decrypt(&self.key, &self.iv, &ciphertext)?
            }
            Some((nonce_part, body)) => self.open(&decode_base64(nonce_part)?, &decode_base64(body)?)?,
        };

        let text = std::str::from_utf8(&plaintext)?;
        sonic_rs::from_str(text).map_err(|e| {
            tracing::warn!("Decrypted link is not a class payload: {}", e);
            DecodeError::Json
        })
    }

    fn open(&self, nonce: &[u8], ciphertext: &[u8]) -> std::result::Result<Vec<u8>, DecodeError> {
        let nonce: [u8; NONCE_SIZE] = nonce
            .try_into()
            .map_err(|_| DecodeError::Iv(nonce.len()))?;

        Aes256Gcm::new((&*self.key).into())
            .decrypt(&Nonce::from(nonce), ciphertext)
            .map_err(|_| DecodeError::Authentication)
    }
}

fn to_json(session: &ClassSession) -> Result<String> {
    sonic_rs::to_string(session)
        .map_err(|e| AppError::Internal(format!("Session serialization failed: {}", e)))
}

/// Undoes common URL-transport damage and decodes base64.
fn decode_base64(part: &str) -> std::result::Result<Vec<u8>, DecodeError> {
    let normalized: String = part
        .trim_matches(|c: char| c.is_whitespace() && c != ' ')
        .chars()
        .filter_map(|c| match c {
            ' ' | '-' => Some('+'),
            '_' => Some('/'),
            '=' | '\r' | '\n' | '\t' => None,
            c => Some(c),
        })
        .collect();

    if normalized.is_empty() {
        return Err(DecodeError::Empty);
    }

    Ok(LENIENT.decode(normalized)?)
}
