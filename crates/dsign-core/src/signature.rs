//! Signature engine: sign a digest with a private key, verify with a public key.
//!
//! The 32 digest bytes are the signed message; both primitives hash them once
//! more with SHA-256 internally.
//!
//! - RSA: PSS padding, MGF1 with SHA-256, maximum salt length. Randomized.
//! - P-256: ECDSA with SHA-256, DER-encoded signatures.
//!
//! Verification distinguishes "the signature is bad" (`Ok(false)`) from "the
//! signature could not even be checked" (`Err(SignatureMalformed)`).

use p256::ecdsa::signature::{Signer, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{Pss, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest as _, Sha256};
use std::fmt;

use crate::digest::{Digest, DIGEST_LEN};
use crate::error::{CoreError, Result};
use crate::keys::{Algorithm, PrivateKey, PublicKey, RSA_BITS};

/// Raw signature bytes as produced by the signing primitive.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(pub Vec<u8>);

impl Signature {
    /// Wrap raw bytes read from a signature artifact.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Number of signature bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the signature is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Sig({}...)", &hex[..hex.len().min(8)])
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Sign a digest.
pub fn sign(digest: &Digest, key: &PrivateKey) -> Result<Signature> {
    sign_with(digest, key, None)
}

/// Sign a digest, optionally pinning the algorithm the key must use.
///
/// Fails with [`CoreError::KeyUnusable`] when an RSA key is weaker than
/// [`RSA_BITS`], and with [`CoreError::AlgorithmMismatch`] when the key does not
/// match the pinned algorithm.
pub fn sign_with(digest: &Digest, key: &PrivateKey, expected: Option<Algorithm>) -> Result<Signature> {
    if let Some(expected) = expected {
        if key.algorithm() != expected {
            return Err(CoreError::AlgorithmMismatch {
                expected,
                found: key.algorithm(),
            });
        }
    }

    match key {
        PrivateKey::Rsa(key) => sign_rsa_pss(digest, key),
        PrivateKey::EcP256(key) => {
            let sig: p256::ecdsa::Signature = key
                .try_sign(digest.as_bytes())
                .map_err(|e| CoreError::SigningFailed(e.to_string()))?;
            Ok(Signature(sig.to_der().as_bytes().to_vec()))
        }
    }
}

/// Verify a signature over a digest.
///
/// Returns `Ok(false)` when the signature parses but does not verify under
/// `key`. Returns [`CoreError::SignatureMalformed`] when the bytes cannot be a
/// signature for this kind of key at all.
pub fn verify(digest: &Digest, signature: &Signature, key: &PublicKey) -> Result<bool> {
    match key {
        PublicKey::Rsa(key) => verify_rsa_pss(digest, signature, key),
        PublicKey::EcP256(key) => {
            let sig = p256::ecdsa::Signature::from_der(signature.as_bytes()).map_err(|e| {
                CoreError::SignatureMalformed(format!("invalid DER ECDSA signature: {e}"))
            })?;
            Ok(key.verify(digest.as_bytes(), &sig).is_ok())
        }
    }
}

/// Verify a signature over a digest given as raw bytes.
///
/// Wrong-length input is reported as [`CoreError::DigestMalformed`] rather
/// than as a failed verification.
pub fn verify_bytes(digest: &[u8], signature: &Signature, key: &PublicKey) -> Result<bool> {
    if digest.len() != DIGEST_LEN {
        return Err(CoreError::DigestMalformed(format!(
            "expected {DIGEST_LEN} bytes, got {}",
            digest.len()
        )));
    }
    verify(&Digest::try_from(digest)?, signature, key)
}

/// Maximum PSS salt length for a modulus of `modulus_bits` bits:
/// `emLen - hLen - 2`.
fn pss_max_salt_len(modulus_bits: usize) -> usize {
    let em_len = (modulus_bits - 1).div_ceil(8);
    em_len.saturating_sub(DIGEST_LEN + 2)
}

fn sign_rsa_pss(digest: &Digest, key: &RsaPrivateKey) -> Result<Signature> {
    let bits = key.n().bits();
    if bits < RSA_BITS {
        return Err(CoreError::KeyUnusable(format!(
            "RSA key has {bits} bits, at least {RSA_BITS} required"
        )));
    }

    let hashed = Sha256::digest(digest.as_bytes());
    let padding = Pss::new_with_salt::<Sha256>(pss_max_salt_len(bits));
    key.sign_with_rng(&mut rand::thread_rng(), padding, &hashed)
        .map(Signature)
        .map_err(|e| CoreError::SigningFailed(e.to_string()))
}

fn verify_rsa_pss(digest: &Digest, signature: &Signature, key: &RsaPublicKey) -> Result<bool> {
    if signature.len() != key.size() {
        return Err(CoreError::SignatureMalformed(format!(
            "RSA signature must be {} bytes, got {}",
            key.size(),
            signature.len()
        )));
    }

    let hashed = Sha256::digest(digest.as_bytes());
    let padding = Pss::new_with_salt::<Sha256>(pss_max_salt_len(key.n().bits()));
    Ok(key.verify(padding, &hashed, signature.as_bytes()).is_ok())
}
