//! Collaborator traits the arena consumes.
//!
//! The arena core owns rules and bookkeeping only. Everything that touches
//! the host (players, worlds, blocks) or another subsystem (economy, kits,
//! chest loot, map backups) goes through a trait object in [`Services`],
//! which is injected when an arena is created.
//!
//! Host methods describe what the arena wants done; they don't report
//! success except where the arena must react to failure. Cosmetic
//! operations (scoreboards, sign text) return `Result<(), HostError>` so
//! the scheduler can log and carry on.

use std::sync::Arc;

use skyforge_types::{ArenaId, BlockKind, GameMode, Location, MessageKind, NavItem, PlayerName, WorldId};

use crate::reward::RewardSummary;
use crate::settings::Sound;

/// Failure of a cosmetic host operation.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("player {0} is offline")]
    Offline(PlayerName),

    #[error("world {0} is not loaded")]
    WorldNotLoaded(WorldId),

    #[error("no sign at {0}")]
    NoSign(Location),

    #[error("{0}")]
    Other(String),
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

/// The game server the arenas run on.
pub trait Host: Send + Sync {
    // -- messaging --

    fn send(&self, player: &PlayerName, kind: MessageKind, text: &str);

    /// Sends `text` to every player on the server.
    fn broadcast_server(&self, text: &str);

    // -- player state --

    fn is_online(&self, player: &PlayerName) -> bool;

    fn position(&self, player: &PlayerName) -> Option<Location>;

    fn teleport(&self, player: &PlayerName, to: &Location);

    fn set_game_mode(&self, player: &PlayerName, mode: GameMode);

    /// The mode players get back when they leave an arena.
    fn default_game_mode(&self) -> GameMode;

    fn health(&self, player: &PlayerName) -> f64;

    fn max_health(&self, player: &PlayerName) -> f64;

    fn set_health(&self, player: &PlayerName, health: f64);

    fn set_food(&self, player: &PlayerName, food: f64);

    fn remove_effects(&self, player: &PlayerName);

    fn set_immobile(&self, player: &PlayerName, immobile: bool);

    fn set_flying(&self, player: &PlayerName, flying: bool);

    fn set_allow_flight(&self, player: &PlayerName, allow: bool);

    // -- inventory --

    /// Clears held, worn and cursor inventories.
    fn clear_inventory(&self, player: &PlayerName);

    /// Drops held, worn and cursor contents at the player's position.
    fn drop_inventory(&self, player: &PlayerName);

    fn give_item(&self, player: &PlayerName, item: NavItem);

    /// Removes the item from the inventory and the cursor.
    fn remove_item(&self, player: &PlayerName, item: NavItem);

    /// Kills entities owned by the player that would teleport them
    /// (thrown pearls and the like).
    fn release_owned_projectiles(&self, player: &PlayerName);

    // -- world --

    fn play_sound(&self, player: &PlayerName, sound: Sound);

    fn block_below(&self, player: &PlayerName) -> BlockKind;

    fn clear_block_below(&self, player: &PlayerName);

    /// Primes TNT at `at` and takes one TNT out of `player`'s inventory.
    fn ignite_tnt(&self, player: &PlayerName, at: &Location, fuse_ticks: u32);

    fn is_world_generated(&self, world: &WorldId) -> bool;

    /// Loads the world if needed. Returns `false` if it can't be loaded.
    fn load_world(&self, world: &WorldId) -> bool;

    fn run_command(&self, command: &str);

    // -- cosmetics --

    fn show_scoreboard(&self, player: &PlayerName, text: &str) -> Result<(), HostError>;

    fn remove_scoreboard(&self, player: &PlayerName);

    fn set_sign_text(&self, at: &Location, lines: &[String; 4]) -> Result<(), HostError>;
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// World backups. The map is saved when the arena is enabled and restored
/// after every round.
pub trait MapReset: Send + Sync {
    /// Restores and loads the named world. `None` if it can't be loaded.
    fn load_map(&self, name: &WorldId) -> Option<WorldId>;

    fn save_map(&self, world: &WorldId);
}

/// Fills every container in a world with loot.
pub trait ChestRefill: Send + Sync {
    fn refill(&self, world: &WorldId);
}

/// Shows the end-of-round reward summary ("Game Review").
pub trait RewardReview: Send + Sync {
    fn present(&self, player: &PlayerName, arena: &ArenaId, summary: &RewardSummary);
}

pub trait Economy: Send + Sync {
    /// Returns `false` if the provider rejected the payment.
    fn add_money(&self, player: &PlayerName, amount: u64) -> bool;
}

/// Sends a player to another server on the proxy.
pub trait ServerTransfer: Send + Sync {
    fn transfer(&self, player: &PlayerName, server: &str);
}

/// Extension points for other plugins (statistics, custom join rules).
/// Every method has a no-op default.
pub trait ArenaHooks: Send + Sync {
    /// Returning `false` vetoes the join.
    fn on_join(&self, _player: &PlayerName, _arena: &ArenaId, _force: bool) -> bool {
        true
    }

    fn on_quit(&self, _player: &PlayerName, _arena: &ArenaId) {}

    fn on_kill(&self, _killer: &PlayerName, _arena: &ArenaId) {}

    fn on_death(&self, _victim: &PlayerName, _arena: &ArenaId) {}

    fn on_win(&self, _winner: &PlayerName, _arena: &ArenaId) {}
}

/// Rate limit for repeated tips, keyed by message.
pub trait MessageThrottle: Send + Sync {
    fn can_send(&self, key: &str) -> bool;
}

pub trait KitProvider: Send + Sync {
    /// Name of the kit the player picked, if any.
    fn selected_kit(&self, player: &PlayerName) -> Option<String>;

    fn equip(&self, player: &PlayerName, kit: &str);

    fn open_shop(&self, player: &PlayerName);
}

pub trait LuckyBlocks: Send + Sync {
    /// Gives prize number `roll` (1..=3) for the block at `at`. Returns
    /// `true` when the prize was a good one.
    fn give_prize(&self, player: &PlayerName, at: &Location, roll: u8) -> bool;
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Stand-in for collaborators that aren't installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Noop;

impl MapReset for Noop {
    fn load_map(&self, name: &WorldId) -> Option<WorldId> {
        Some(name.clone())
    }

    fn save_map(&self, _world: &WorldId) {}
}

impl ChestRefill for Noop {
    fn refill(&self, _world: &WorldId) {}
}

impl RewardReview for Noop {
    fn present(&self, _player: &PlayerName, _arena: &ArenaId, _summary: &RewardSummary) {}
}

impl ArenaHooks for Noop {}

impl MessageThrottle for Noop {
    fn can_send(&self, _key: &str) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

/// Everything an arena talks to, passed in at construction.
///
/// Cheap to clone; every arena in a manager shares the same instances.
#[derive(Clone)]
pub struct Services {
    pub host: Arc<dyn Host>,
    pub map_reset: Arc<dyn MapReset>,
    pub chest_refill: Arc<dyn ChestRefill>,
    pub review: Arc<dyn RewardReview>,
    pub hooks: Arc<dyn ArenaHooks>,
    pub throttle: Arc<dyn MessageThrottle>,
    pub economy: Option<Arc<dyn Economy>>,
    pub transfer: Option<Arc<dyn ServerTransfer>>,
    pub kits: Option<Arc<dyn KitProvider>>,
    pub lucky_blocks: Option<Arc<dyn LuckyBlocks>>,
}

impl Services {
    /// Services with only a host; every other collaborator is a no-op or
    /// absent.
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self {
            host,
            map_reset: Arc::new(Noop),
            chest_refill: Arc::new(Noop),
            review: Arc::new(Noop),
            hooks: Arc::new(Noop),
            throttle: Arc::new(Noop),
            economy: None,
            transfer: None,
            kits: None,
            lucky_blocks: None,
        }
    }

    pub fn with_map_reset(mut self, map_reset: Arc<dyn MapReset>) -> Self {
        self.map_reset = map_reset;
        self
    }

    pub fn with_chest_refill(mut self, chest_refill: Arc<dyn ChestRefill>) -> Self {
        self.chest_refill = chest_refill;
        self
    }

    pub fn with_review(mut self, review: Arc<dyn RewardReview>) -> Self {
        self.review = review;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ArenaHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_throttle(mut self, throttle: Arc<dyn MessageThrottle>) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_economy(mut self, economy: Arc<dyn Economy>) -> Self {
        self.economy = Some(economy);
        self
    }

    pub fn with_transfer(mut self, transfer: Arc<dyn ServerTransfer>) -> Self {
        self.transfer = Some(transfer);
        self
    }

    pub fn with_kits(mut self, kits: Arc<dyn KitProvider>) -> Self {
        self.kits = Some(kits);
        self
    }

    pub fn with_lucky_blocks(mut self, lucky_blocks: Arc<dyn LuckyBlocks>) -> Self {
        self.lucky_blocks = Some(lucky_blocks);
        self
    }
}
