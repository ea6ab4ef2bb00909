use aes::Aes256;
use cbc::cipher::{
    block_padding::{NoPadding, Pkcs7},
    BlockDecryptMut, BlockEncryptMut, KeyIvInit,
};

use crate::error::DecodeError;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// The size of the AES-256 key in bytes, shared by both link formats.
pub const KEY_SIZE: usize = 32;
/// The AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;
/// The size of a CBC initialization vector in bytes.
pub const IV_SIZE: usize = BLOCK_SIZE;

/// Encrypts a plaintext using AES-256-CBC with PKCS#7 padding.
///
/// # Arguments
///
/// * `key` - The AES-256 key.
/// * `iv` - The initialization vector.
/// * `plaintext` - The data to encrypt.
///
/// # Returns
///
/// The ciphertext, always a whole number of blocks.
pub fn encrypt(key: &[u8; KEY_SIZE], iv: &[u8; IV_SIZE], plaintext: &[u8]) -> Vec<u8> {
    Aes256CbcEnc::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// Decrypts an AES-256-CBC ciphertext and strips its PKCS#7 padding.
///
/// # Arguments
///
/// * `key` - The AES-256 key.
/// * `iv` - The initialization vector used for encryption.
/// * `ciphertext` - The data to decrypt.
///
/// # Returns
///
/// The plaintext, or a [`DecodeError`] when the ciphertext is not block
/// aligned or its padding is invalid.
pub fn decrypt(
    key: &[u8; KEY_SIZE],
    iv: &[u8; IV_SIZE],
    ciphertext: &[u8],
) -> Result<Vec<u8>, DecodeError> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(DecodeError::BlockLength(ciphertext.len()));
    }

    let mut plaintext = Aes256CbcDec::new(key.into(), iv.into())
        .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
        .map_err(|_| DecodeError::BlockLength(ciphertext.len()))?;

    strip_padding(&mut plaintext)?;
    Ok(plaintext)
}

/// Removes PKCS#7 padding in place.
///
/// The final byte must be in `1..=BLOCK_SIZE` and every padding byte must
/// repeat it.
fn strip_padding(buf: &mut Vec<u8>) -> Result<(), DecodeError> {
    let pad = match buf.last() {
        Some(&last) => last as usize,
        None => return Err(DecodeError::Padding),
    };

    if pad == 0 || pad > BLOCK_SIZE || pad > buf.len() {
        return Err(DecodeError::Padding);
    }

    let start = buf.len() - pad;
    if buf[start..].iter().any(|&b| b as usize != pad) {
        return Err(DecodeError::Padding);
    }

    buf.truncate(start);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; KEY_SIZE] = [3u8; KEY_SIZE];
    const IV: [u8; IV_SIZE] = [9u8; IV_SIZE];

    #[test]
    fn ciphertext_is_block_aligned_and_reversible() {
        for len in [0usize, 1, 15, 16, 17, 100] {
            let plaintext = vec![b'x'; len];
            let ciphertext = encrypt(&KEY, &IV, &plaintext);

            assert_eq!(ciphertext.len() % BLOCK_SIZE, 0);
            assert!(ciphertext.len() > plaintext.len());
            assert_eq!(decrypt(&KEY, &IV, &ciphertext).unwrap(), plaintext);
        }
    }

    #[test]
    fn fixed_iv_is_deterministic() {
        assert_eq!(encrypt(&KEY, &IV, b"same"), encrypt(&KEY, &IV, b"same"));
        assert_ne!(encrypt(&KEY, &IV, b"same"), encrypt(&KEY, &[1u8; IV_SIZE], b"same"));
    }

    #[test]
    fn rejects_unaligned_or_empty_ciphertext() {
        let ciphertext = encrypt(&KEY, &IV, b"hello world");

        assert!(matches!(
            decrypt(&KEY, &IV, &ciphertext[..ciphertext.len() - 1]),
            Err(DecodeError::BlockLength(15))
        ));
        assert!(matches!(
            decrypt(&KEY, &IV, &[]),
            Err(DecodeError::BlockLength(0))
        ));
    }

    #[test]
    fn strip_padding_validates_range_and_consistency() {
        let mut zero = vec![b'a'; 15];
        zero.push(0);
        assert!(matches!(strip_padding(&mut zero), Err(DecodeError::Padding)));

        let mut too_large = vec![b'a'; 15];
        too_large.push(17);
        assert!(matches!(strip_padding(&mut too_large), Err(DecodeError::Padding)));

        let mut inconsistent = vec![b'a'; 13];
        inconsistent.extend_from_slice(&[3, 2, 3]);
        assert!(matches!(strip_padding(&mut inconsistent), Err(DecodeError::Padding)));

        let mut valid = vec![b'a'; 13];
        valid.extend_from_slice(&[3, 3, 3]);
        strip_padding(&mut valid).unwrap();
        assert_eq!(valid, vec![b'a'; 13]);
    }

    #[test]
    fn unpadded_block_is_rejected() {
        // A raw block encrypted without padding decrypts to bytes whose last
        // value is 'a', far outside the padding range.
        let block = [b'a'; BLOCK_SIZE];
        let ciphertext = Aes256CbcEnc::new((&KEY).into(), (&IV).into())
            .encrypt_padded_vec_mut::<NoPadding>(&block);

        assert!(matches!(
            decrypt(&KEY, &IV, &ciphertext),
            Err(DecodeError::Padding)
        ));
    }
}
