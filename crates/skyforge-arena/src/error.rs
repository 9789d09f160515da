//! Error types for the arena layer.

use skyforge_types::{ArenaId, PlayerName};

use crate::Phase;

/// Errors that can occur during arena operations.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    /// The arena record is missing fields or breaks the enable rules.
    /// The arena stays in `Setup` until an operator fixes it.
    #[error("arena config invalid: {0}")]
    ConfigInvalid(String),

    /// The configured level is missing or failed to load. The arena is
    /// disabled and its `level` cleared.
    #[error("world {0} is unavailable")]
    WorldUnavailable(String),

    /// The arena is still being set up.
    #[error("arena is not enabled")]
    NotEnabled,

    /// The arena is in a phase that doesn't allow this operation, for
    /// example joining while a round is running.
    #[error("arena is locked in phase {0}")]
    PhaseLocked(Phase),

    /// Every slot is taken.
    #[error("arena is full")]
    Full,

    /// The player is already playing (here or in another arena).
    #[error("player {0} is already in the arena")]
    AlreadyInRoster(PlayerName),

    /// The player isn't tracked by the arena.
    #[error("player {0} is not in the arena")]
    NotInRoster(PlayerName),

    /// The lobby countdown is too close to zero to accept new players.
    #[error("arena is starting")]
    CountdownLocked,

    /// A join hook vetoed the join.
    #[error("join refused")]
    JoinRefused,

    /// A setup command was malformed or failed validation.
    #[error("invalid setup: {0}")]
    InvalidSetup(String),

    /// The arena does not exist.
    #[error("arena {0} not found")]
    NotFound(ArenaId),

    /// An arena with this name is already registered.
    #[error("arena {0} already exists")]
    AlreadyExists(ArenaId),

    /// No enabled arena can take another player right now.
    #[error("no arena available")]
    NoArenaAvailable,
}

impl ArenaError {
    /// Duplicate and unknown roster operations are idempotent no-ops.
    /// The runtime logs them at debug instead of warn.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::AlreadyInRoster(_) | Self::NotInRoster(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_roster_bookkeeping_is_benign() {
        let player = PlayerName::from("alex");
        assert!(ArenaError::AlreadyInRoster(player.clone()).is_benign());
        assert!(ArenaError::NotInRoster(player).is_benign());
        assert!(!ArenaError::Full.is_benign());
        assert!(!ArenaError::NoArenaAvailable.is_benign());
    }
}
