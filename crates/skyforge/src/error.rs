//! Unified error type for Skyforge.

use skyforge_arena::ArenaError;
use skyforge_types::TypesError;

/// Top-level error that wraps the crate-specific errors.
///
/// The `#[from]` attributes let `?` convert sub-crate errors, so callers
/// of the runtime and the store deal with this single type.
#[derive(Debug, thiserror::Error)]
pub enum SkyforgeError {
    /// A record or settings file could not be encoded or decoded.
    #[error(transparent)]
    Types(#[from] TypesError),

    /// An arena rejected the request (full, not found, bad setup, ...).
    #[error(transparent)]
    Arena(#[from] ArenaError),

    /// Reading or writing the record directory failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The arena runtime task has stopped.
    #[error("arena runtime is not running")]
    Unavailable,
}
