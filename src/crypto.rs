//! Cryptographic primitives for ChutCoin

use crate::error::ChainError;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{
    constants::{SECRET_KEY_SIZE, UNCOMPRESSED_PUBLIC_KEY_SIZE},
    ecdsa::Signature,
    All, Message, PublicKey, Secp256k1, SecretKey,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A thread-safe, lazily initialized Secp256k1 context.
static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

pub type Sha256Hash = [u8; 32];

/// Hex-encoded DER ECDSA signature.
pub type SignatureHex = String;

/// Public identifier of a wallet.
///
/// Addresses produced by [`KeyPair::address`] are the hex encoding of the
/// uncompressed public point. Any other string is accepted as a recipient,
/// but only key-derived addresses can ever sign.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(value: impl Into<String>) -> Self {
        Address(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Address::new(value)
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Address(value)
    }
}

pub fn sha256(data: &[u8]) -> Sha256Hash {
    Sha256::digest(data).into()
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generates a new random KeyPair using the OS random number generator.
    pub fn generate() -> Self {
        let secret_key = SecretKey::new(&mut OsRng);
        Self::from_secret_key(secret_key)
    }

    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        KeyPair {
            secret_key,
            public_key,
        }
    }

    /// Creates a KeyPair from a hex-encoded 32-byte secret scalar.
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, ChainError> {
        let bytes = hex::decode(secret_hex.trim())
            .map_err(|e| ChainError::CryptoError(format!("Invalid hex secret key: {}", e)))?;
        if bytes.len() != SECRET_KEY_SIZE {
            return Err(ChainError::CryptoError(format!(
                "Secret key must be {} bytes, got {}",
                SECRET_KEY_SIZE,
                bytes.len()
            )));
        }
        let secret_key = SecretKey::from_slice(&bytes)
            .map_err(|e| ChainError::CryptoError(format!("Invalid secret key bytes: {}", e)))?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// The wallet address: hex of the uncompressed public key.
    pub fn address(&self) -> Address {
        let bytes: [u8; UNCOMPRESSED_PUBLIC_KEY_SIZE] = self.public_key.serialize_uncompressed();
        Address(hex::encode(bytes))
    }

    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Signs a 32-byte digest directly (no re-hashing).
    pub fn sign_digest(&self, digest: &Sha256Hash) -> SignatureHex {
        let message = Message::from_digest(*digest);
        let signature = SECP256K1_CONTEXT.sign_ecdsa(&message, &self.secret_key);
        hex::encode(&*signature.serialize_der())
    }
}

/// Produces a fresh identity as `(secret_hex, address)`.
pub fn generate_identity() -> (String, Address) {
    let keypair = KeyPair::generate();
    (keypair.secret_hex(), keypair.address())
}

/// Signs `digest` on behalf of `claimed`, refusing when the key does not own that identity.
pub fn sign(
    keypair: &KeyPair,
    claimed: &Address,
    digest: &Sha256Hash,
) -> Result<SignatureHex, ChainError> {
    if &keypair.address() != claimed {
        return Err(ChainError::IdentityMismatch);
    }
    Ok(keypair.sign_digest(digest))
}

/// Checks a hex DER signature over `digest` against the key encoded in `address`.
///
/// Any malformed input counts as a failed verification.
pub fn verify(address: &Address, digest: &Sha256Hash, signature_hex: &str) -> bool {
    let public_key = match hex::decode(address.as_str())
        .ok()
        .and_then(|bytes| PublicKey::from_slice(&bytes).ok())
    {
        Some(key) => key,
        None => {
            tracing::debug!(address = %address, "address is not a secp256k1 public key");
            return false;
        }
    };

    let mut signature = match hex::decode(signature_hex)
        .ok()
        .and_then(|bytes| Signature::from_der(&bytes).ok())
    {
        Some(sig) => sig,
        None => {
            tracing::debug!("signature is not valid DER");
            return false;
        }
    };
    signature.normalize_s();

    let message = Message::from_digest(*digest);
    SECP256K1_CONTEXT
        .verify_ecdsa(&message, &signature, &public_key)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generation() {
        let (secret, address) = generate_identity();
        assert_eq!(secret.len(), SECRET_KEY_SIZE * 2);
        assert_eq!(address.as_str().len(), UNCOMPRESSED_PUBLIC_KEY_SIZE * 2);
        assert!(address.as_str().starts_with("04"));
    }

    #[test]
    fn test_secret_hex_round_trip() {
        let keypair = KeyPair::generate();
        let restored = KeyPair::from_secret_hex(&keypair.secret_hex()).unwrap();
        assert_eq!(keypair.address(), restored.address());
    }

    #[test]
    fn test_signing_and_verification() {
        let keypair = KeyPair::generate();
        let digest = sha256(b"Hello, ChutCoin!");

        let signature = sign(&keypair, &keypair.address(), &digest).unwrap();
        assert!(verify(&keypair.address(), &digest, &signature));
    }

    #[test]
    fn test_sign_for_foreign_identity_fails() {
        let keypair = KeyPair::generate();
        let other = KeyPair::generate();
        let digest = sha256(b"payload");

        let result = sign(&keypair, &other.address(), &digest);
        assert_eq!(result, Err(ChainError::IdentityMismatch));
    }

    #[test]
    fn test_wrong_key_does_not_verify() {
        let keypair1 = KeyPair::generate();
        let keypair2 = KeyPair::generate();
        let digest = sha256(b"Test message");

        let signature = keypair1.sign_digest(&digest);
        assert!(!verify(&keypair2.address(), &digest, &signature));
    }

    #[test]
    fn test_tampered_digest_does_not_verify() {
        let keypair = KeyPair::generate();
        let signature = keypair.sign_digest(&sha256(b"Original message"));
        assert!(!verify(
            &keypair.address(),
            &sha256(b"Tampered message"),
            &signature
        ));
    }

    #[test]
    fn test_malformed_inputs_return_false() {
        let keypair = KeyPair::generate();
        let digest = sha256(b"Test");
        let signature = keypair.sign_digest(&digest);

        assert!(!verify(&Address::new("address2"), &digest, &signature));
        assert!(!verify(&keypair.address(), &digest, "not-hex"));
        assert!(!verify(&keypair.address(), &digest, "3006"));
    }

    #[test]
    fn test_from_secret_hex_invalid_length() {
        let result = KeyPair::from_secret_hex("abcd");
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Secret key must be"));
    }

    #[test]
    fn test_known_key_derives_stable_address() {
        let secret = "30b56878271f1dfe313883d27d32942b77d06697af73c1c3d8312e79e896908b";
        let a = KeyPair::from_secret_hex(secret).unwrap();
        let b = KeyPair::from_secret_hex(secret).unwrap();
        assert_eq!(a.address(), b.address());
    }
}
