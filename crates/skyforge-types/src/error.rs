//! Error types for the shared types layer.
//!
//! Each crate in Skyforge defines its own error enum. When you see a
//! `TypesError`, the problem is in turning records into bytes (or back),
//! or in reading a position string. Arena rules never produce one.

/// Errors that can occur while encoding, decoding, or parsing shared types.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// Serialization failed (turning a record into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a record).
    ///
    /// Common causes: malformed JSON, a missing required field, or a
    /// position string that does not parse.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A position string is not of the form `x,y,z`.
    #[error("invalid position {0:?}: expected \"x,y,z\"")]
    InvalidPosition(String),
}
