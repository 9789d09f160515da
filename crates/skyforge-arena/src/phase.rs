//! The arena phase state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The lifecycle phase of an arena.
///
/// Rounds cycle through the same three phases forever:
///
/// ```text
/// Setup → Lobby → Active → Restarting → Lobby → ...
/// ```
///
/// - **Setup**: the record is incomplete or the world failed to load.
///   Joins are rejected and the scheduler only refreshes the join sign.
/// - **Lobby**: accepting players. The start countdown runs while enough
///   players are present.
/// - **Active**: a round is being played. Damage can eliminate players.
/// - **Restarting**: a winner has been picked; rewards, world reset and
///   re-arming run off the restart countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Setup,
    Lobby,
    Active,
    Restarting,
}

impl Phase {
    /// Returns `true` if the arena is accepting new players.
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// The phase that normally follows this one.
    pub fn next(self) -> Self {
        match self {
            Self::Setup => Self::Lobby,
            Self::Lobby => Self::Active,
            Self::Active => Self::Restarting,
            Self::Restarting => Self::Lobby,
        }
    }

    /// Returns `true` if moving to `target` follows the round order.
    ///
    /// Any phase may fall back to `Setup` (a broken record or a world that
    /// failed to reload).
    pub fn can_transition_to(self, target: Self) -> bool {
        target == Self::Setup || self.next() == target
    }

    /// Label used on join signs.
    pub fn sign_label(self) -> &'static str {
        match self {
            Self::Setup => "Setup",
            Self::Lobby => "Lobby",
            Self::Active => "InGame",
            Self::Restarting => "Restarting...",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup => write!(f, "Setup"),
            Self::Lobby => write!(f, "Lobby"),
            Self::Active => write!(f, "Active"),
            Self::Restarting => write!(f, "Restarting"),
        }
    }
}
