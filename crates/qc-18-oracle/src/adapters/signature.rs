//! secp256k1 verifier for vote-extension signatures

use crate::ports::ExtensionSignatureVerifier;
use k256::ecdsa::{signature::Verifier, Signature, VerifyingKey};

/// Verifies 64-byte `r || s` ECDSA signatures against SEC1 public keys.
///
/// A trailing recovery byte, if present, is ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct K256ExtensionVerifier;

impl ExtensionSignatureVerifier for K256ExtensionVerifier {
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
        let pubkey = match VerifyingKey::from_sec1_bytes(public_key) {
            Ok(pk) => pk,
            Err(_) => return false,
        };
        let Some(sig_bytes) = signature.get(..64) else {
            return false;
        };
        let signature = match Signature::from_slice(sig_bytes) {
            Ok(s) => s,
            Err(_) => return false,
        };
        pubkey.verify(message, &signature).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::{signature::Signer, SigningKey};

    fn keypair() -> (SigningKey, Vec<u8>) {
        let key = SigningKey::from_slice(&[7u8; 32]).unwrap();
        let public = key.verifying_key().to_encoded_point(true).as_bytes().to_vec();
        (key, public)
    }

    #[test]
    fn test_valid_signature() {
        let (key, public) = keypair();
        let sig: Signature = key.sign(b"oracle");
        assert!(K256ExtensionVerifier.verify(&public, b"oracle", &sig.to_bytes()));
    }

    #[test]
    fn test_wrong_message_or_garbage() {
        let (key, public) = keypair();
        let sig: Signature = key.sign(b"oracle");
        assert!(!K256ExtensionVerifier.verify(&public, b"other", &sig.to_bytes()));
        assert!(!K256ExtensionVerifier.verify(&public, b"oracle", &[0u8; 10]));
        assert!(!K256ExtensionVerifier.verify(&[1, 2, 3], b"oracle", &sig.to_bytes()));
    }
}
