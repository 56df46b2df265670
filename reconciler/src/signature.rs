//! Gateway event signature verification
//!
//! The gateway signs the raw webhook payload with Ed25519; the signature
//! travels alongside the body as hex. Verification happens before the
//! payload is even parsed, so an unverifiable event has no side effects.

use crate::error::{Error, Result};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

/// Verifies gateway signatures against the gateway's public key
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    /// Create from raw public key bytes
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let key = VerifyingKey::from_bytes(bytes)
            .map_err(|e| Error::Signature(format!("Invalid public key: {}", e)))?;
        Ok(Self { key })
    }

    /// Create from a hex-encoded public key
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let bytes = hex::decode(hex_key)
            .map_err(|e| Error::Signature(format!("Invalid public key hex: {}", e)))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::Signature("Public key must be 32 bytes".to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Verify a hex signature over the raw payload
    pub fn verify(&self, payload: &[u8], signature_hex: &str) -> Result<()> {
        let bytes = hex::decode(signature_hex)
            .map_err(|e| Error::Signature(format!("Invalid signature hex: {}", e)))?;
        let bytes: [u8; 64] = bytes
            .try_into()
            .map_err(|_| Error::Signature("Signature must be 64 bytes".to_string()))?;

        let signature = Signature::from_bytes(&bytes);
        self.key
            .verify(payload, &signature)
            .map_err(|e| Error::Signature(format!("Verification failed: {}", e)))
    }
}

/// Ed25519 key pair standing in for the gateway's signer
///
/// Used by tests and the in-process gateway; production deployments only
/// hold the public half.
#[derive(Debug)]
pub struct GatewayKeyPair {
    signing_key: SigningKey,
}

impl GatewayKeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&rand::random::<[u8; 32]>()),
        }
    }

    /// Create from seed (32 bytes) - deterministic generation
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Hex-encoded public key
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }

    /// Verifier for this key pair's public half
    pub fn verifier(&self) -> SignatureVerifier {
        SignatureVerifier {
            key: self.signing_key.verifying_key(),
        }
    }

    /// Sign a payload, returning the hex signature
    pub fn sign_hex(&self, payload: &[u8]) -> String {
        hex::encode(self.signing_key.sign(payload).to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let keypair = GatewayKeyPair::generate();
        let verifier = keypair.verifier();
        let payload = b"{\"session_id\":\"cs_1\"}";

        let signature = keypair.sign_hex(payload);
        verifier.verify(payload, &signature).unwrap();

        // Tampered payload fails
        let result = verifier.verify(b"{\"session_id\":\"cs_2\"}", &signature);
        assert!(matches!(result, Err(Error::Signature(_))));
    }

    #[test]
    fn test_wrong_key_fails() {
        let keypair = GatewayKeyPair::generate();
        let other = GatewayKeyPair::generate();
        let payload = b"payload";

        let signature = keypair.sign_hex(payload);
        let result = other.verifier().verify(payload, &signature);
        assert!(matches!(result, Err(Error::Signature(_))));
    }

    #[test]
    fn test_verifier_hex_round_trip() {
        let keypair = GatewayKeyPair::from_seed(&[7u8; 32]);
        let verifier = SignatureVerifier::from_hex(&keypair.public_key_hex()).unwrap();

        let payload = b"deterministic";
        verifier.verify(payload, &keypair.sign_hex(payload)).unwrap();
    }

    #[test]
    fn test_malformed_signature_rejected() {
        let keypair = GatewayKeyPair::generate();
        let verifier = keypair.verifier();

        assert!(matches!(
            verifier.verify(b"x", "zz-not-hex"),
            Err(Error::Signature(_))
        ));
        assert!(matches!(
            verifier.verify(b"x", "abcd"),
            Err(Error::Signature(_))
        ));
    }
}
