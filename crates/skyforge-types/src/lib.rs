//! Shared vocabulary for Skyforge.
//!
//! This crate defines the types every other layer speaks in:
//!
//! - **Identity** ([`PlayerName`], [`ArenaId`], [`WorldId`]): who and where.
//! - **Positions** ([`Vec3`], [`Location`]): the textual `x,y,z` form used
//!   by persisted arena records, and a position bound to a world.
//! - **Host vocabulary** ([`MessageKind`], [`GameMode`], [`DamageCause`],
//!   [`NavItem`], [`BlockKind`]): the small enumerations the arena core
//!   uses when it talks to the host environment.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how arena records are
//!   converted to/from bytes.
//! - **Errors** ([`TypesError`]).
//!
//! # Architecture
//!
//! ```text
//! Host events → Arena core (skyforge-arena) → collaborators (host, economy, ...)
//!                     ↑
//!              shared types (this crate)
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod codec;
mod error;
mod position;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::TypesError;
pub use position::{Location, Vec3};
pub use types::{
    ArenaId, BlockKind, DamageCause, Damager, GameMode, MessageKind, NavItem,
    PlayerName, WorldId,
};
