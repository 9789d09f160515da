//! Codec trait and implementations for persisted records.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! Arena records are loaded and saved by an external provider; the provider
//! doesn't care HOW a record is serialized; it just needs something that
//! implements [`Codec`].
//!
//! We ship [`JsonCodec`], which keeps records human-editable on disk.

use serde::{Serialize, de::DeserializeOwned};

use crate::TypesError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because codecs are held by long-lived async
/// tasks (the arena runtime and its store).
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `TypesError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, TypesError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `TypesError::Decode` if the bytes are malformed or don't
    /// match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, TypesError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses pretty-printed JSON (via `serde_json`).
///
/// Arena records are small and edited by server operators, so readability
/// wins over size here.
///
/// ## Example
///
/// ```rust
/// use skyforge_types::{Codec, JsonCodec, Vec3};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&Vec3::new(1.0, 64.0, -3.5)).unwrap();
/// assert_eq!(bytes, br#""1,64,-3.5""#);
///
/// let decoded: Vec3 = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, Vec3::new(1.0, 64.0, -3.5));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, TypesError> {
        serde_json::to_vec_pretty(value).map_err(TypesError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, TypesError> {
        serde_json::from_slice(data).map_err(TypesError::Decode)
    }
}
