//! secp256k1 ECDSA primitives for witness signing and verification.
//!
//! Messages are hashed with SHA-256 before signing, so callers pass the raw
//! payload bytes rather than a digest.

use crate::hash::sha256;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{ecdsa, All, Message, Secp256k1, SecretKey};
use std::fmt;
use thiserror::Error;

/// Shared signing/verification context.
static SECP256K1: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// Size of a compressed SEC1 public key.
pub const COMPRESSED_PUBLIC_KEY_SIZE: usize = 33;
/// Size of an uncompressed SEC1 public key.
pub const UNCOMPRESSED_PUBLIC_KEY_SIZE: usize = 65;
/// Size of a compact (r || s) signature.
pub const COMPACT_SIGNATURE_SIZE: usize = 64;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid hex encoding for {0}")]
    InvalidHex(&'static str),
    #[error("invalid public key ({0} bytes)")]
    InvalidPublicKey(usize),
    #[error("invalid signature encoding ({0} bytes)")]
    InvalidSignature(usize),
    #[error("invalid private key")]
    InvalidPrivateKey,
    #[error("signature verification failed")]
    VerificationFailed,
}

/// A secp256k1 public key, decoded from either SEC1 point encoding.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(pub secp256k1::PublicKey);

impl PublicKey {
    /// Decode a compressed (33-byte) or uncompressed (65-byte) point.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        secp256k1::PublicKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| CryptoError::InvalidPublicKey(bytes.len()))
    }

    /// Decode a hex-encoded point.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidHex("public key"))?;
        Self::from_slice(&bytes)
    }

    /// Compressed SEC1 encoding.
    pub fn to_compressed(&self) -> [u8; COMPRESSED_PUBLIC_KEY_SIZE] {
        self.0.serialize()
    }

    /// Uncompressed SEC1 encoding.
    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_PUBLIC_KEY_SIZE] {
        self.0.serialize_uncompressed()
    }

    /// Hex of the compressed encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_compressed())
    }

    /// Verify an ECDSA signature over SHA-256(`message`).
    ///
    /// High-S signatures are normalized first, since libsecp256k1 only
    /// accepts the low-S form.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
        let digest = Message::from_digest(sha256(message).0);
        let mut sig = signature.0;
        sig.normalize_s();
        SECP256K1
            .verify_ecdsa(&digest, &sig, &self.0)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

/// An ECDSA signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub ecdsa::Signature);

impl Signature {
    /// Decode a signature.
    ///
    /// Accepts 64-byte compact form, strict DER, or DER followed by a
    /// trailing one-byte sighash flag as found in witness stacks.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() == COMPACT_SIGNATURE_SIZE {
            return ecdsa::Signature::from_compact(bytes)
                .map(Self)
                .map_err(|_| CryptoError::InvalidSignature(bytes.len()));
        }

        if let Ok(sig) = ecdsa::Signature::from_der(bytes) {
            return Ok(Self(sig));
        }

        match bytes.split_last() {
            Some((_sighash, der)) if !der.is_empty() => ecdsa::Signature::from_der(der)
                .map(Self)
                .map_err(|_| CryptoError::InvalidSignature(bytes.len())),
            _ => Err(CryptoError::InvalidSignature(bytes.len())),
        }
    }

    /// Decode a hex-encoded signature.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidHex("signature"))?;
        Self::from_slice(&bytes)
    }

    /// Compact (r || s) encoding.
    pub fn to_compact(&self) -> [u8; COMPACT_SIGNATURE_SIZE] {
        self.0.serialize_compact()
    }

    /// DER encoding.
    pub fn to_der(&self) -> Vec<u8> {
        self.0.serialize_der().to_vec()
    }

    /// Hex of the DER encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_der())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", &hex::encode(self.to_compact())[..16])
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A keypair for signing and verification.
pub struct Keypair {
    secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let secret_key = SecretKey::new(&mut OsRng);
        Self::from_secret_key(secret_key)
    }

    /// Create a keypair from a private key (32 bytes).
    pub fn from_private_key(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let secret_key =
            SecretKey::from_slice(bytes).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = PublicKey(secp256k1::PublicKey::from_secret_key(
            &SECP256K1,
            &secret_key,
        ));
        Self {
            secret_key,
            public_key,
        }
    }

    /// Get the private key bytes.
    pub fn private_key(&self) -> [u8; 32] {
        self.secret_key.secret_bytes()
    }

    /// Sign SHA-256(`message`).
    pub fn sign(&self, message: &[u8]) -> Signature {
        let digest = Message::from_digest(sha256(message).0);
        Signature(SECP256K1.sign_ecdsa(&digest, &self.secret_key))
    }

    /// Verify a signature against our public key.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
        self.public_key.verify(message, signature)
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::constants::CURVE_ORDER;

    /// The same signature with `s` replaced by `n - s`.
    fn high_s_twin(sig: &Signature) -> Signature {
        let mut compact = sig.to_compact();
        let mut borrow = 0i16;
        for i in (0..32).rev() {
            let mut diff = CURVE_ORDER[i] as i16 - compact[32 + i] as i16 - borrow;
            borrow = if diff < 0 { 1 } else { 0 };
            if diff < 0 {
                diff += 256;
            }
            compact[32 + i] = diff as u8;
        }
        Signature::from_slice(&compact).unwrap()
    }

    #[test]
    fn test_sign_and_verify() {
        let kp = Keypair::generate();
        let message = b"hello world";
        let sig = kp.sign(message);
        assert!(kp.verify(message, &sig).is_ok());
    }

    #[test]
    fn test_wrong_message_fails() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"hello");
        assert_eq!(
            kp.verify(b"world", &sig),
            Err(CryptoError::VerificationFailed)
        );
    }

    #[test]
    fn test_wrong_key_fails() {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::generate();
        let sig = kp1.sign(b"hello");
        assert!(kp2.verify(b"hello", &sig).is_err());
    }

    #[test]
    fn test_public_key_both_encodings() {
        let kp = Keypair::generate();
        let compressed = PublicKey::from_slice(&kp.public_key.to_compressed()).unwrap();
        let uncompressed = PublicKey::from_slice(&kp.public_key.to_uncompressed()).unwrap();
        assert_eq!(compressed, kp.public_key);
        assert_eq!(uncompressed, kp.public_key);

        let sig = kp.sign(b"payload");
        assert!(uncompressed.verify(b"payload", &sig).is_ok());
    }

    #[test]
    fn test_malformed_public_key() {
        assert_eq!(
            PublicKey::from_slice(&[0x02; 10]),
            Err(CryptoError::InvalidPublicKey(10))
        );
        assert_eq!(
            PublicKey::from_hex("not hex"),
            Err(CryptoError::InvalidHex("public key"))
        );
        // Right length, but x is not on the curve.
        let mut bogus = [0xFFu8; 33];
        bogus[0] = 0x02;
        assert!(PublicKey::from_slice(&bogus).is_err());
    }

    #[test]
    fn test_signature_encodings() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"payload");

        let compact = Signature::from_slice(&sig.to_compact()).unwrap();
        let der = Signature::from_slice(&sig.to_der()).unwrap();
        let mut with_sighash = sig.to_der();
        with_sighash.push(0x01);
        let witness_style = Signature::from_slice(&with_sighash).unwrap();

        assert_eq!(compact, sig);
        assert_eq!(der, sig);
        assert_eq!(witness_style, sig);
        assert_eq!(Signature::from_hex(&sig.to_hex()).unwrap(), sig);
    }

    #[test]
    fn test_malformed_signature() {
        assert_eq!(
            Signature::from_slice(&[]),
            Err(CryptoError::InvalidSignature(0))
        );
        assert_eq!(
            Signature::from_slice(&[0x30, 0x01, 0x02]),
            Err(CryptoError::InvalidSignature(3))
        );
        assert_eq!(
            Signature::from_hex("zz"),
            Err(CryptoError::InvalidHex("signature"))
        );
    }

    #[test]
    fn test_high_s_signature_accepted() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"payload");
        let high = high_s_twin(&sig);

        assert_ne!(high, sig);
        assert!(kp.public_key.verify(b"payload", &high).is_ok());

        let mut normalized = high.0;
        normalized.normalize_s();
        assert_eq!(Signature(normalized), sig);

        let from_der = Signature::from_hex(&high.to_hex()).unwrap();
        assert_eq!(from_der, high);
        assert!(kp.public_key.verify(b"other", &high).is_err());
    }

    #[test]
    fn test_keypair_from_private_key() {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::from_private_key(&kp1.private_key()).unwrap();
        assert_eq!(kp1.public_key, kp2.public_key);
    }

    #[test]
    fn test_zero_private_key_rejected() {
        assert!(matches!(
            Keypair::from_private_key(&[0u8; 32]),
            Err(CryptoError::InvalidPrivateKey)
        ));
    }
}
