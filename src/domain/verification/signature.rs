//! HMAC request signing and signature verification.
//!
//! Outbound provider requests are signed over
//! `timestamp || METHOD || path || body`. Provider callbacks carry a digest of
//! the raw body only, with the algorithm announced in a separate header.
//!
//! # Security
//!
//! - Comparison is constant-time over decoded bytes
//! - Every verification path fails closed (empty secret, empty body,
//!   malformed or missing signature, unsupported algorithm)
//! - Neither the secret nor the expected signature is ever logged

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Sha256, Sha512};
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// Header carrying the callback digest.
pub const PAYLOAD_DIGEST_HEADER: &str = "X-Payload-Digest";

/// Header naming the callback digest algorithm.
pub const PAYLOAD_DIGEST_ALG_HEADER: &str = "X-Payload-Digest-Alg";

/// Signature failures. All of them map to an authentication error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("Signing secret is not configured")]
    MissingSecret,

    #[error("Signing key rejected")]
    InvalidKey,

    #[error("Payload is empty")]
    EmptyPayload,

    #[error("Signature is missing")]
    MissingSignature,

    #[error("Signature is not valid hex")]
    MalformedSignature,

    #[error("Unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Signature mismatch")]
    Mismatch,
}

/// Digest algorithms accepted on callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    #[default]
    HmacSha256Hex,
    HmacSha512Hex,
}

impl DigestAlgorithm {
    /// Resolves the algorithm header. Absent or blank means SHA-256.
    pub fn from_header(value: Option<&str>) -> Result<Self, SignatureError> {
        let value = match value.map(str::trim) {
            None | Some("") => return Ok(DigestAlgorithm::HmacSha256Hex),
            Some(v) => v,
        };

        match value.to_uppercase().as_str() {
            "HMAC_SHA256_HEX" => Ok(DigestAlgorithm::HmacSha256Hex),
            "HMAC_SHA512_HEX" => Ok(DigestAlgorithm::HmacSha512Hex),
            _ => Err(SignatureError::UnsupportedAlgorithm(value.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::HmacSha256Hex => "HMAC_SHA256_HEX",
            DigestAlgorithm::HmacSha512Hex => "HMAC_SHA512_HEX",
        }
    }
}

fn compute_mac<M: Mac + KeyInit>(key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>, SignatureError> {
    let mut mac = <M as KeyInit>::new_from_slice(key).map_err(|_| SignatureError::InvalidKey)?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac.finalize().into_bytes().to_vec())
}

fn secret_bytes(secret: &SecretString) -> Result<&[u8], SignatureError> {
    let exposed = secret.expose_secret();
    if exposed.trim().is_empty() {
        return Err(SignatureError::MissingSecret);
    }
    Ok(exposed.as_bytes())
}

fn request_mac(
    secret: &SecretString,
    method: &str,
    path: &str,
    timestamp: i64,
    body: &[u8],
) -> Result<Vec<u8>, SignatureError> {
    let key = secret_bytes(secret)?;
    let timestamp = timestamp.to_string();
    let method = method.to_uppercase();
    compute_mac::<HmacSha256>(
        key,
        &[timestamp.as_bytes(), method.as_bytes(), path.as_bytes(), body],
    )
}

fn compare(expected: &[u8], received: &str) -> Result<(), SignatureError> {
    let received = received.trim();
    if received.is_empty() {
        return Err(SignatureError::MissingSignature);
    }
    let received = hex::decode(received).map_err(|_| SignatureError::MalformedSignature)?;

    if expected.ct_eq(received.as_slice()).unwrap_u8() != 1 {
        return Err(SignatureError::Mismatch);
    }
    Ok(())
}

/// Signs outbound provider requests.
#[derive(Clone)]
pub struct RequestSigner {
    secret: SecretString,
}

impl RequestSigner {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Hex-encoded HMAC-SHA256 of `timestamp || METHOD || path || body`.
    pub fn sign(
        &self,
        method: &str,
        path: &str,
        timestamp: i64,
        body: &[u8],
    ) -> Result<String, SignatureError> {
        request_mac(&self.secret, method, path, timestamp, body).map(hex::encode)
    }
}

/// Verifies signatures produced with a shared secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: SecretString,
}

impl SignatureVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Verifies a request-form signature as produced by [`RequestSigner::sign`].
    pub fn verify_request(
        &self,
        method: &str,
        path: &str,
        timestamp: i64,
        body: &[u8],
        received: &str,
    ) -> Result<(), SignatureError> {
        if body.is_empty() {
            return Err(SignatureError::EmptyPayload);
        }
        let expected = request_mac(&self.secret, method, path, timestamp, body)?;
        compare(&expected, received)
    }

    /// Verifies a callback digest computed over the byte-exact raw body.
    pub fn verify_payload_digest(
        &self,
        body: &[u8],
        received: &str,
        algorithm: DigestAlgorithm,
    ) -> Result<(), SignatureError> {
        let key = secret_bytes(&self.secret)?;
        if body.is_empty() {
            return Err(SignatureError::EmptyPayload);
        }

        let expected = match algorithm {
            DigestAlgorithm::HmacSha256Hex => compute_mac::<HmacSha256>(key, &[body])?,
            DigestAlgorithm::HmacSha512Hex => compute_mac::<HmacSha512>(key, &[body])?,
        };
        compare(&expected, received)
    }
}

/// Hex digest of `body`, as the provider would send it. Used by test tooling
/// and local callback simulators.
pub fn payload_digest(
    secret: &SecretString,
    body: &[u8],
    algorithm: DigestAlgorithm,
) -> Result<String, SignatureError> {
    let key = secret_bytes(secret)?;
    let mac = match algorithm {
        DigestAlgorithm::HmacSha256Hex => compute_mac::<HmacSha256>(key, &[body])?,
        DigestAlgorithm::HmacSha512Hex => compute_mac::<HmacSha512>(key, &[body])?,
    };
    Ok(hex::encode(mac))
}
