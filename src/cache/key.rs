//! Cache key fingerprints.
//!
//! A request contributes an ordered list of JSON components. Each component
//! is serialized through `serde_json::Value`, which keeps object keys sorted,
//! so logically equal requests always produce the same text. Components are
//! joined with U+001F, which `serde_json` always escapes inside strings and
//! therefore never appears in serialized output, then hashed with SHA-256
//! and hex-encoded.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::KeyError;

/// Separator between serialized components.
const COMPONENT_SEPARATOR: char = '\u{1f}';

/// Something that can be fingerprinted into a cache key.
pub trait CacheKeyParts {
    /// Ordered components that identify the request.
    ///
    /// Every field that changes the upstream answer must be included.
    fn key_parts(&self) -> Result<Vec<Value>, KeyError>;
}

impl CacheKeyParts for Value {
    fn key_parts(&self) -> Result<Vec<Value>, KeyError> {
        Ok(vec![self.clone()])
    }
}

/// Converts any serializable component into a key part.
pub fn key_part<T: Serialize + ?Sized>(component: &T) -> Result<Value, KeyError> {
    Ok(serde_json::to_value(component)?)
}

/// Derives the cache key for `request`.
///
/// Pure and deterministic: the output is 64 lowercase hex characters.
pub fn build_key<R: CacheKeyParts + ?Sized>(request: &R) -> Result<String, KeyError> {
    let parts = request.key_parts()?;

    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            let mut buf = [0u8; 4];
            hasher.update(COMPONENT_SEPARATOR.encode_utf8(&mut buf).as_bytes());
        }
        hasher.update(serde_json::to_string(part)?.as_bytes());
    }

    Ok(hex::encode(hasher.finalize()))
}
