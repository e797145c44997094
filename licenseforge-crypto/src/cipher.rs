//! License encryption using AES-256-CBC with PKCS#7 padding.
//!
//! CBC carries no authentication tag. Integrity of a decrypted license comes
//! from the signature inside it; this layer only guarantees that malformed
//! ciphertext or padding surfaces as an error instead of truncated output.

use crate::error::{CryptoError, CryptoResult};
use crate::key::SymmetricKey;
use base64::{Engine, engine::general_purpose::STANDARD};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use rand::RngCore;

/// Size of the initialization vector in bytes.
pub const IV_SIZE: usize = 16;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Encrypted data with the IV needed for decryption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedBlob {
    /// The IV used for encryption (fresh per call).
    pub iv: [u8; IV_SIZE],
    /// The padded, encrypted ciphertext.
    pub ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    /// Returns the total framed size (`iv || ciphertext`).
    pub fn len(&self) -> usize {
        IV_SIZE + self.ciphertext.len()
    }

    /// Returns true if the ciphertext is empty.
    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }

    /// Frames the blob as `iv || ciphertext`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len());
        bytes.extend_from_slice(&self.iv);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Splits framed bytes back into IV and ciphertext.
    ///
    /// Only the IV prefix is checked here; ciphertext length is checked by
    /// [`decrypt`].
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() < IV_SIZE {
            return Err(CryptoError::Encoding(format!(
                "blob of {} bytes is shorter than the IV",
                bytes.len()
            )));
        }

        let mut iv = [0u8; IV_SIZE];
        iv.copy_from_slice(&bytes[..IV_SIZE]);
        Ok(Self {
            iv,
            ciphertext: bytes[IV_SIZE..].to_vec(),
        })
    }

    /// Encodes to base64 for storage/transmission.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// Decodes from base64.
    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::Encoding(format!("invalid base64: {e}")))?;
        Self::from_bytes(&bytes)
    }
}

/// Encrypts plaintext under a freshly generated random IV.
pub fn encrypt(key: &SymmetricKey, plaintext: &[u8]) -> EncryptedBlob {
    let mut iv = [0u8; IV_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut iv);

    let ciphertext = Aes256CbcEnc::new(key.as_bytes().into(), (&iv).into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    EncryptedBlob { iv, ciphertext }
}

/// Decrypts a blob and strips its padding.
///
/// # Errors
/// - [`CryptoError::CiphertextLength`] if the ciphertext is not a whole
///   number of blocks.
/// - [`CryptoError::Padding`] if the ciphertext is empty or the trailing
///   padding is not `n` copies of a byte `n` with `1 <= n <= BLOCK_SIZE`.
pub fn decrypt(key: &SymmetricKey, blob: &EncryptedBlob) -> CryptoResult<Vec<u8>> {
    let len = blob.ciphertext.len();
    if len % BLOCK_SIZE != 0 {
        return Err(CryptoError::CiphertextLength { len });
    }
    if len == 0 {
        return Err(CryptoError::Padding);
    }

    Aes256CbcDec::new(key.as_bytes().into(), (&blob.iv).into())
        .decrypt_padded_vec_mut::<Pkcs7>(&blob.ciphertext)
        .map_err(|_| CryptoError::Padding)
}
