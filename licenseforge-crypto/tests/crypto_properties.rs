//! Property-based tests for the crypto layer.
//!
//! These tests verify properties that must always hold:
//! - Encryption is reversible with the correct key
//! - Every encryption draws a fresh IV
//! - Signatures verify under the matching key and nothing else

use licenseforge_crypto::{
    Algorithm, BLOCK_SIZE, CryptoError, PrivateKey, decrypt, encrypt, generate_random_key, sha256,
};
use proptest::prelude::*;

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

fn plaintext_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..4096)
}

fn ec_key() -> PrivateKey {
    PrivateKey::from_pem(Algorithm::Ecdsa, include_str!("fixtures/ec.pem")).unwrap()
}

// =============================================================================
// ENCRYPTION PROPERTIES
// =============================================================================

mod encryption_properties {
    use super::*;

    proptest! {
        /// Encryption followed by decryption with the same key returns original plaintext
        #[test]
        fn roundtrip_preserves_data(plaintext in plaintext_strategy()) {
            let key = generate_random_key();

            let encrypted = encrypt(&key, &plaintext);
            let decrypted = decrypt(&key, &encrypted).unwrap();

            prop_assert_eq!(decrypted, plaintext);
        }

        /// Same key encrypting same plaintext draws different IVs
        #[test]
        fn same_key_different_ivs(plaintext in plaintext_strategy()) {
            let key = generate_random_key();

            let encrypted1 = encrypt(&key, &plaintext);
            let encrypted2 = encrypt(&key, &plaintext);

            prop_assert_ne!(encrypted1.iv, encrypted2.iv);
            prop_assert_eq!(decrypt(&key, &encrypted1).unwrap(), plaintext.clone());
            prop_assert_eq!(decrypt(&key, &encrypted2).unwrap(), plaintext);
        }

        /// Ciphertext is the plaintext rounded up to the next whole block
        #[test]
        fn ciphertext_is_padded_to_blocks(plaintext in plaintext_strategy()) {
            let key = generate_random_key();
            let encrypted = encrypt(&key, &plaintext);

            prop_assert_eq!(encrypted.ciphertext.len() % BLOCK_SIZE, 0);
            prop_assert!(encrypted.ciphertext.len() > plaintext.len());
            prop_assert!(encrypted.ciphertext.len() <= plaintext.len() + BLOCK_SIZE);
        }

        /// Wrong key never yields the original plaintext
        #[test]
        fn wrong_key_never_recovers_plaintext(plaintext in plaintext_strategy()) {
            prop_assume!(!plaintext.is_empty());

            let encrypted = encrypt(&generate_random_key(), &plaintext);
            match decrypt(&generate_random_key(), &encrypted) {
                Ok(output) => prop_assert_ne!(output, plaintext),
                Err(e) => prop_assert!(matches!(e, CryptoError::Padding)),
            }
        }

        /// Truncating by less than a block is always a length error
        #[test]
        fn truncation_is_length_error(
            plaintext in plaintext_strategy(),
            cut in 1usize..BLOCK_SIZE,
        ) {
            let key = generate_random_key();
            let mut encrypted = encrypt(&key, &plaintext);
            let new_len = encrypted.ciphertext.len() - cut;
            encrypted.ciphertext.truncate(new_len);

            let is_length_error = matches!(
                decrypt(&key, &encrypted),
                Err(CryptoError::CiphertextLength { .. })
            );
            prop_assert!(is_length_error);
        }

        /// Base64 framing is lossless
        #[test]
        fn base64_framing_roundtrip(plaintext in plaintext_strategy()) {
            let key = generate_random_key();
            let encrypted = encrypt(&key, &plaintext);
            let restored = licenseforge_crypto::EncryptedBlob::from_base64(&encrypted.to_base64()).unwrap();
            prop_assert_eq!(restored, encrypted);
        }
    }
}

// =============================================================================
// SIGNATURE PROPERTIES
// =============================================================================

mod signature_properties {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// A signature verifies under the matching public key
        #[test]
        fn sign_then_verify(message in prop::collection::vec(any::<u8>(), 0..512)) {
            let key = ec_key();
            let digest = sha256(&message);
            let signature = key.sign_digest(&digest).unwrap();
            prop_assert!(key.public_key().verify_digest(&digest, &signature).unwrap());
        }

        /// A signature never verifies against a different message
        #[test]
        fn different_message_fails(
            message in prop::collection::vec(any::<u8>(), 0..512),
            other in prop::collection::vec(any::<u8>(), 0..512),
        ) {
            prop_assume!(message != other);

            let key = ec_key();
            let signature = key.sign_digest(&sha256(&message)).unwrap();
            prop_assert!(!key.public_key().verify_digest(&sha256(&other), &signature).unwrap());
        }

        /// Flipping any single signature bit never yields a valid signature
        #[test]
        fn flipped_signature_bit_fails(bit in 0usize..(64 * 8)) {
            let key = ec_key();
            let digest = sha256(b"fixed message");
            let mut signature = key.sign_digest(&digest).unwrap();
            let bit = bit % (signature.len() * 8);
            signature[bit / 8] ^= 1 << (bit % 8);

            // Either the DER no longer parses, or it parses and fails.
            let accepted = matches!(key.public_key().verify_digest(&digest, &signature), Ok(true));
            prop_assert!(!accepted);
        }
    }
}
