//! Identity types and the host vocabulary used by the arena core.
//!
//! The arena core never touches host objects directly. It names players,
//! arenas and worlds through the newtypes below and describes what it wants
//! the host to do with the small enums that follow.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's unique name on the host.
///
/// Newtype wrapper so a player name can't be confused with a world or
/// arena name in a function signature. `#[serde(transparent)]` keeps the
/// JSON form a plain string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerName(pub String);

impl PlayerName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PlayerName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The name an arena is registered under (also its record file name).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArenaId(pub String);

impl ArenaId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArenaId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ArenaId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A world (map) on the host, identified by its folder name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldId(pub String);

impl WorldId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorldId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for WorldId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ---------------------------------------------------------------------------
// Host vocabulary
// ---------------------------------------------------------------------------

/// How a message is shown to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MessageKind {
    /// A regular chat line.
    #[default]
    Chat,
    /// The small line above the hotbar. Used for countdowns.
    Tip,
    /// A popup in the middle of the screen.
    Popup,
    /// A full-screen title.
    Title,
}

/// Host game modes the arena switches players between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameMode {
    Survival,
    Creative,
    /// Restricted, non-interactive. Used while waiting in the lobby.
    Adventure,
    Spectator,
}

/// Why a player took damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DamageCause {
    Contact,
    EntityAttack,
    Projectile,
    Suffocation,
    Fall,
    Fire,
    Lava,
    Drowning,
    BlockExplosion,
    EntityExplosion,
    /// Fell out of the world.
    Void,
    Magic,
    Custom,
}

impl DamageCause {
    /// Melee-style causes that can be attributed to a damager.
    pub fn is_attack(self) -> bool {
        matches!(self, Self::Contact | Self::EntityAttack)
    }
}

/// Who dealt a hit, when the host knows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Damager {
    Player(PlayerName),
    /// Mobs, arrows without a shooter, falling blocks, ...
    Entity,
}

impl Damager {
    pub fn player(&self) -> Option<&PlayerName> {
        match self {
            Self::Player(name) => Some(name),
            Self::Entity => None,
        }
    }
}

/// Navigation items handed out by the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavItem {
    /// Opens the list of other joinable arenas.
    ChangeMap,
    /// Opens the kit selector (only when kits are enabled).
    SelectKit,
    /// Leaves the arena.
    Leave,
}

impl NavItem {
    /// Hotbar slot the item is placed in.
    pub fn hotbar_slot(self) -> u8 {
        match self {
            Self::ChangeMap => 6,
            Self::SelectKit => 7,
            Self::Leave => 8,
        }
    }
}

/// The few block kinds the arena core cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Lucky block when lucky mode is on.
    Sponge,
    /// Primed on placement instead of being set down.
    Tnt,
    Chest,
    Sign,
    Glass,
    StainedGlass,
    Other,
}

impl BlockKind {
    pub fn is_glass(self) -> bool {
        matches!(self, Self::Glass | Self::StainedGlass)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_name_serializes_as_plain_string() {
        let json = serde_json::to_string(&PlayerName::from("Steve")).unwrap();
        assert_eq!(json, r#""Steve""#);
    }

    #[test]
    fn test_identity_display() {
        assert_eq!(PlayerName::from("Alex").to_string(), "Alex");
        assert_eq!(ArenaId::from("sw-1").to_string(), "sw-1");
        assert_eq!(WorldId::from("islands").to_string(), "islands");
    }

    #[test]
    fn test_nav_item_slots_are_distinct() {
        let slots = [
            NavItem::ChangeMap.hotbar_slot(),
            NavItem::SelectKit.hotbar_slot(),
            NavItem::Leave.hotbar_slot(),
        ];
        assert_eq!(slots, [6, 7, 8]);
    }

    #[test]
    fn test_attack_causes() {
        assert!(DamageCause::Contact.is_attack());
        assert!(DamageCause::EntityAttack.is_attack());
        assert!(!DamageCause::Void.is_attack());
        assert!(!DamageCause::Fall.is_attack());
    }

    #[test]
    fn test_glass_detection() {
        assert!(BlockKind::Glass.is_glass());
        assert!(BlockKind::StainedGlass.is_glass());
        assert!(!BlockKind::Sponge.is_glass());
    }
}
