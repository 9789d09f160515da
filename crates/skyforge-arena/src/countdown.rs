//! Countdown state and the checkpoint tables driven by it.
//!
//! Each phase has one countdown, decremented once per clock tick. Actions
//! that happen at fixed points of a countdown are listed in ordered
//! `(trigger, action)` tables instead of being scattered through the
//! scheduler, so the sequence can be tested on its own.

use crate::ArenaConfig;

/// Start countdowns at or below this value refuse new joins.
pub const JOIN_LOCK_AT: i32 = 5;

/// Value the start countdown jumps to on an operator force start.
pub const FORCE_START_AT: i32 = 10;

/// Seconds at the start of a round during which fall damage is ignored
/// (players drop out of their cages).
pub const CAGE_DROP_GRACE: i32 = 3;

// ---------------------------------------------------------------------------
// Countdowns
// ---------------------------------------------------------------------------

/// The three phase countdowns plus the operator override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdowns {
    pub start_time: i32,
    pub game_time: i32,
    pub restart_time: i32,
    /// Runs the lobby countdown even below the player threshold.
    pub force_start: bool,
}

impl Countdowns {
    pub fn from_config(config: &ArenaConfig) -> Self {
        Self {
            start_time: config.start_time,
            game_time: config.game_time,
            restart_time: config.restart_time,
            force_start: false,
        }
    }

    /// Restores every countdown to the configured default and clears the
    /// force-start flag.
    pub fn rearm(&mut self, config: &ArenaConfig) {
        *self = Self::from_config(config);
    }
}

// ---------------------------------------------------------------------------
// Restart checkpoints
// ---------------------------------------------------------------------------

/// Actions of the restart sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartAction {
    /// Show every player their reward review.
    Review,
    /// Send every participant and spectator out of the arena.
    DisconnectAll,
    /// Restore the world from its backup.
    ReloadWorld,
    /// Reset the roster, re-attach the world, re-arm the countdowns and
    /// go back to the lobby.
    ReloadArena,
}

/// The restart sequence for a configured restart time, in the order the
/// checkpoints are reached.
///
/// The countdown keeps running past zero; the negative values are just
/// further checkpoints.
pub fn restart_schedule(configured: i32) -> [(i32, RestartAction); 4] {
    [
        ((configured - 2).max(5), RestartAction::Review),
        (0, RestartAction::DisconnectAll),
        (-1, RestartAction::ReloadWorld),
        (-6, RestartAction::ReloadArena),
    ]
}

/// Actions whose trigger equals `value`, in schedule order.
pub fn due_actions<A: Copy>(schedule: &[(i32, A)], value: i32) -> impl Iterator<Item = A> + '_ {
    schedule
        .iter()
        .filter(move |(at, _)| *at == value)
        .map(|(_, action)| *action)
}

// ---------------------------------------------------------------------------
// Refill notices
// ---------------------------------------------------------------------------

/// Chest refill announcements made during a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefillNotice {
    RefillSoon,
    RefillImminent,
    Refilled,
}

/// `(seconds into the round, notice)`.
pub const REFILL_NOTICES: [(i32, RefillNotice); 3] = [
    (180, RefillNotice::RefillSoon),
    (420, RefillNotice::RefillImminent),
    (480, RefillNotice::Refilled),
];

/// The notice due when the round countdown reads `game_time`.
pub fn refill_notice(configured_game_time: i32, game_time: i32) -> Option<RefillNotice> {
    REFILL_NOTICES
        .iter()
        .find(|(offset, _)| configured_game_time - offset == game_time)
        .map(|(_, notice)| *notice)
}
