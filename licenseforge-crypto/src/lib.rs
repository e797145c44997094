//! Cryptographic primitives for LicenseForge.
//!
//! - [`signing`]: RSA / P-256 key decoding and SHA-256 digest signatures
//! - [`cipher`]: AES-256-CBC with PKCS#7 padding and a random IV per call
//! - [`key`]: the 32-byte symmetric key type
//!
//! Nothing here knows about licenses. Every function is a pure function of
//! its inputs plus the OS random source, so all of it is safe to call from
//! many threads at once.

pub mod cipher;
mod error;
pub mod key;
pub mod signing;

pub use cipher::{BLOCK_SIZE, EncryptedBlob, IV_SIZE, decrypt, encrypt};
pub use error::{CryptoError, CryptoResult};
pub use key::{KEY_SIZE, SymmetricKey, generate_random_key};
pub use signing::{Algorithm, DIGEST_SIZE, PrivateKey, PublicKey, sha256};
