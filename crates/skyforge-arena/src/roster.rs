//! The participant roster.
//!
//! One ordered map serves every phase. In the lobby players are keyed by
//! spawn slot (`Slot`) or by join order (`Queued`, when they wait in a
//! holding area); once the round starts they are re-keyed by name. A
//! second map indexes each player's current key so "is this player here?"
//! never depends on how the roster is keyed.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use skyforge_types::PlayerName;

/// Where a player sits in the roster.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RosterKey {
    /// Spawn slot `spawn-N`.
    Slot(u32),
    /// Join order in the holding area.
    Queued(u64),
    /// During and after a round.
    Named(PlayerName),
}

impl fmt::Display for RosterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slot(n) => write!(f, "spawn-{n}"),
            Self::Queued(n) => write!(f, "queue-{n}"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: BTreeMap<RosterKey, PlayerName>,
    index: HashMap<PlayerName, RosterKey>,
    next_seq: u64,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, key: RosterKey, player: PlayerName) -> bool {
        if self.index.contains_key(&player) || self.entries.contains_key(&key) {
            return false;
        }
        self.index.insert(player.clone(), key.clone());
        self.entries.insert(key, player);
        true
    }

    /// Puts `player` on spawn slot `slot`. Returns `false` if the slot is
    /// taken or the player is already present.
    pub fn assign_slot(&mut self, slot: u32, player: PlayerName) -> bool {
        self.insert(RosterKey::Slot(slot), player)
    }

    /// Appends `player` in join order. Returns `false` if already present.
    pub fn enqueue(&mut self, player: PlayerName) -> bool {
        let key = RosterKey::Queued(self.next_seq);
        let added = self.insert(key, player);
        if added {
            self.next_seq += 1;
        }
        added
    }

    /// Lowest slot in `1..=capacity` nobody holds.
    pub fn first_free_slot(&self, capacity: u32) -> Option<u32> {
        (1..=capacity).find(|slot| !self.entries.contains_key(&RosterKey::Slot(*slot)))
    }

    /// Removes `player`, whatever their key. Returns the key they had.
    pub fn remove(&mut self, player: &PlayerName) -> Option<RosterKey> {
        let key = self.index.remove(player)?;
        self.entries.remove(&key);
        Some(key)
    }

    pub fn contains(&self, player: &PlayerName) -> bool {
        self.index.contains_key(player)
    }

    pub fn key_of(&self, player: &PlayerName) -> Option<&RosterKey> {
        self.index.get(player)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Players in key order (slot order, join order, or by name).
    pub fn players(&self) -> impl Iterator<Item = &PlayerName> {
        self.entries.values()
    }

    /// A copy of the players in key order. Iterate this, not the roster,
    /// when the loop body may remove players.
    pub fn snapshot(&self) -> Vec<PlayerName> {
        self.entries.values().cloned().collect()
    }

    /// Re-keys everyone onto `spawn-1..spawn-N` in current key order and
    /// returns the assignments.
    pub fn rekey_into_slots(&mut self) -> Vec<(u32, PlayerName)> {
        let players = self.snapshot();
        self.entries.clear();
        self.index.clear();

        let mut assigned = Vec::with_capacity(players.len());
        for (slot, player) in (1u32..).zip(players) {
            self.insert(RosterKey::Slot(slot), player.clone());
            assigned.push((slot, player));
        }
        assigned
    }

    /// Re-keys everyone by their own name.
    pub fn rekey_by_name(&mut self) {
        for player in self.snapshot() {
            self.remove(&player);
            self.insert(RosterKey::Named(player.clone()), player);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.next_seq = 0;
    }
}
