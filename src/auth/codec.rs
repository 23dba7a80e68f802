//! Base64url codec for token segments.
//!
//! URL-safe alphabet (`+` → `-`, `/` → `_`), padding stripped. Both verifier
//! implementations and the signer go through this module so the encoding can
//! never diverge between them.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use thiserror::Error;

/// Decoding failed: the input is not valid unpadded base64url.
///
/// Callers treat this as "untrusted input, reject" — it is never an internal
/// error worth surfacing past the verifier.
#[derive(Debug, Error)]
#[error("invalid base64url input: {0}")]
pub struct DecodeError(#[from] base64::DecodeError);

/// Encode bytes as unpadded base64url.
pub fn encode(input: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Decode unpadded base64url back into bytes.
pub fn decode(input: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(URL_SAFE_NO_PAD.decode(input)?)
}
