//! Recording doubles for the arena collaborators.
//!
//! Every double stores what it was asked to do behind a `Mutex` so tests
//! can drive an arena and then inspect the calls.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use skyforge_arena::services::{
    ArenaHooks, ChestRefill, Economy, Host, HostError, MapReset, RewardReview,
};
use skyforge_arena::settings::{GameSettings, Sound};
use skyforge_arena::{ArenaConfig, RewardSummary, Services};
use skyforge_types::{
    ArenaId, BlockKind, GameMode, Location, MessageKind, NavItem, PlayerName, Vec3, WorldId,
};

pub fn p(name: &str) -> PlayerName {
    PlayerName::from(name)
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct HostLog {
    pub messages: Vec<(PlayerName, MessageKind, String)>,
    pub server_broadcasts: Vec<String>,
    pub teleports: Vec<(PlayerName, Location)>,
    pub modes: HashMap<PlayerName, GameMode>,
    pub health: HashMap<PlayerName, f64>,
    pub items: HashMap<PlayerName, Vec<NavItem>>,
    pub flying: HashSet<PlayerName>,
    pub commands: Vec<String>,
    pub signs: Vec<[String; 4]>,
    pub scoreboards: Vec<(PlayerName, String)>,
    pub sounds: Vec<(PlayerName, Sound)>,
    pub cleared_cages: Vec<PlayerName>,
    pub offline: HashSet<PlayerName>,
    /// Worlds that exist on disk.
    pub generated: HashSet<WorldId>,
    /// Worlds that exist but refuse to load.
    pub broken: HashSet<WorldId>,
    pub fail_cosmetics: bool,
    pub primed_tnt: Vec<(PlayerName, Location, u32)>,
}

/// In-memory host. Players are online unless marked offline; every world
/// in `generated` loads.
pub struct RecordingHost {
    pub log: Mutex<HostLog>,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        let log = HostLog {
            generated: ["islands", "desert", "hub"].into_iter().map(WorldId::from).collect(),
            ..HostLog::default()
        };
        Arc::new(Self {
            log: Mutex::new(log),
        })
    }

    /// Texts sent to `player`, in order.
    pub fn texts(&self, player: &PlayerName) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|(to, _, _)| to == player)
            .map(|(_, _, text)| text.clone())
            .collect()
    }

    pub fn received(&self, player: &PlayerName, text: &str) -> bool {
        self.texts(player).iter().any(|t| t == text)
    }

    pub fn last_teleport(&self, player: &PlayerName) -> Option<Location> {
        self.log
            .lock()
            .unwrap()
            .teleports
            .iter()
            .rev()
            .find(|(who, _)| who == player)
            .map(|(_, to)| to.clone())
    }

    pub fn mode(&self, player: &PlayerName) -> Option<GameMode> {
        self.log.lock().unwrap().modes.get(player).copied()
    }

    pub fn set_health_of(&self, player: &PlayerName, health: f64) {
        self.log.lock().unwrap().health.insert(player.clone(), health);
    }

    pub fn go_offline(&self, player: &PlayerName) {
        self.log.lock().unwrap().offline.insert(player.clone());
    }

    pub fn server_broadcasts(&self) -> Vec<String> {
        self.log.lock().unwrap().server_broadcasts.clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.log.lock().unwrap().commands.clone()
    }

    pub fn fail_cosmetics(&self) {
        self.log.lock().unwrap().fail_cosmetics = true;
    }

    pub fn break_world(&self, world: &str) {
        self.log.lock().unwrap().broken.insert(WorldId::from(world));
    }
}

impl Host for RecordingHost {
    fn send(&self, player: &PlayerName, kind: MessageKind, text: &str) {
        self.log
            .lock()
            .unwrap()
            .messages
            .push((player.clone(), kind, text.to_string()));
    }

    fn broadcast_server(&self, text: &str) {
        self.log.lock().unwrap().server_broadcasts.push(text.to_string());
    }

    fn is_online(&self, player: &PlayerName) -> bool {
        !self.log.lock().unwrap().offline.contains(player)
    }

    fn position(&self, player: &PlayerName) -> Option<Location> {
        self.last_teleport(player)
    }

    fn teleport(&self, player: &PlayerName, to: &Location) {
        self.log
            .lock()
            .unwrap()
            .teleports
            .push((player.clone(), to.clone()));
    }

    fn set_game_mode(&self, player: &PlayerName, mode: GameMode) {
        self.log.lock().unwrap().modes.insert(player.clone(), mode);
    }

    fn default_game_mode(&self) -> GameMode {
        GameMode::Survival
    }

    fn health(&self, player: &PlayerName) -> f64 {
        self.log
            .lock()
            .unwrap()
            .health
            .get(player)
            .copied()
            .unwrap_or(20.0)
    }

    fn max_health(&self, _player: &PlayerName) -> f64 {
        20.0
    }

    fn set_health(&self, player: &PlayerName, health: f64) {
        self.set_health_of(player, health);
    }

    fn set_food(&self, _player: &PlayerName, _food: f64) {}

    fn remove_effects(&self, _player: &PlayerName) {}

    fn set_immobile(&self, _player: &PlayerName, _immobile: bool) {}

    fn set_flying(&self, player: &PlayerName, flying: bool) {
        let mut log = self.log.lock().unwrap();
        if flying {
            log.flying.insert(player.clone());
        } else {
            log.flying.remove(player);
        }
    }

    fn set_allow_flight(&self, _player: &PlayerName, _allow: bool) {}

    fn clear_inventory(&self, player: &PlayerName) {
        self.log.lock().unwrap().items.remove(player);
    }

    fn drop_inventory(&self, _player: &PlayerName) {}

    fn give_item(&self, player: &PlayerName, item: NavItem) {
        self.log
            .lock()
            .unwrap()
            .items
            .entry(player.clone())
            .or_default()
            .push(item);
    }

    fn remove_item(&self, player: &PlayerName, item: NavItem) {
        if let Some(items) = self.log.lock().unwrap().items.get_mut(player) {
            items.retain(|i| *i != item);
        }
    }

    fn release_owned_projectiles(&self, _player: &PlayerName) {}

    fn play_sound(&self, player: &PlayerName, sound: Sound) {
        self.log.lock().unwrap().sounds.push((player.clone(), sound));
    }

    fn block_below(&self, _player: &PlayerName) -> BlockKind {
        BlockKind::Glass
    }

    fn clear_block_below(&self, player: &PlayerName) {
        self.log.lock().unwrap().cleared_cages.push(player.clone());
    }

    fn ignite_tnt(&self, player: &PlayerName, at: &Location, fuse_ticks: u32) {
        let mut log = self.log.lock().unwrap();
        log.primed_tnt.push((player.clone(), at.clone(), fuse_ticks));
    }

    fn is_world_generated(&self, world: &WorldId) -> bool {
        self.log.lock().unwrap().generated.contains(world)
    }

    fn load_world(&self, world: &WorldId) -> bool {
        let log = self.log.lock().unwrap();
        log.generated.contains(world) && !log.broken.contains(world)
    }

    fn run_command(&self, command: &str) {
        self.log.lock().unwrap().commands.push(command.to_string());
    }

    fn show_scoreboard(&self, player: &PlayerName, text: &str) -> Result<(), HostError> {
        let mut log = self.log.lock().unwrap();
        if log.fail_cosmetics {
            return Err(HostError::Offline(player.clone()));
        }
        log.scoreboards.push((player.clone(), text.to_string()));
        Ok(())
    }

    fn remove_scoreboard(&self, _player: &PlayerName) {}

    fn set_sign_text(&self, at: &Location, lines: &[String; 4]) -> Result<(), HostError> {
        let mut log = self.log.lock().unwrap();
        if log.fail_cosmetics {
            return Err(HostError::NoSign(at.clone()));
        }
        log.signs.push(lines.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingEconomy {
    pub credits: Mutex<Vec<(PlayerName, u64)>>,
}

impl RecordingEconomy {
    pub fn total_for(&self, player: &PlayerName) -> u64 {
        self.credits
            .lock()
            .unwrap()
            .iter()
            .filter(|(who, _)| who == player)
            .map(|(_, amount)| amount)
            .sum()
    }

    pub fn count_for(&self, player: &PlayerName) -> usize {
        self.credits
            .lock()
            .unwrap()
            .iter()
            .filter(|(who, _)| who == player)
            .count()
    }
}

impl Economy for RecordingEconomy {
    fn add_money(&self, player: &PlayerName, amount: u64) -> bool {
        self.credits.lock().unwrap().push((player.clone(), amount));
        true
    }
}

#[derive(Default)]
pub struct RecordingReview {
    pub presented: Mutex<Vec<(PlayerName, RewardSummary)>>,
}

impl RewardReview for RecordingReview {
    fn present(&self, player: &PlayerName, _arena: &ArenaId, summary: &RewardSummary) {
        self.presented
            .lock()
            .unwrap()
            .push((player.clone(), summary.clone()));
    }
}

#[derive(Default)]
pub struct RecordingHooks {
    pub wins: Mutex<Vec<PlayerName>>,
    pub kills: Mutex<Vec<PlayerName>>,
    pub deaths: Mutex<Vec<PlayerName>>,
    pub refuse: Mutex<HashSet<PlayerName>>,
}

impl ArenaHooks for RecordingHooks {
    fn on_join(&self, player: &PlayerName, _arena: &ArenaId, _force: bool) -> bool {
        !self.refuse.lock().unwrap().contains(player)
    }

    fn on_kill(&self, killer: &PlayerName, _arena: &ArenaId) {
        self.kills.lock().unwrap().push(killer.clone());
    }

    fn on_death(&self, victim: &PlayerName, _arena: &ArenaId) {
        self.deaths.lock().unwrap().push(victim.clone());
    }

    fn on_win(&self, winner: &PlayerName, _arena: &ArenaId) {
        self.wins.lock().unwrap().push(winner.clone());
    }
}

#[derive(Default)]
pub struct RecordingMapReset {
    pub loads: Mutex<Vec<WorldId>>,
    pub saves: Mutex<Vec<WorldId>>,
    /// When set, every load fails.
    pub fail: Mutex<bool>,
}

impl MapReset for RecordingMapReset {
    fn load_map(&self, name: &WorldId) -> Option<WorldId> {
        self.loads.lock().unwrap().push(name.clone());
        if *self.fail.lock().unwrap() {
            None
        } else {
            Some(name.clone())
        }
    }

    fn save_map(&self, world: &WorldId) {
        self.saves.lock().unwrap().push(world.clone());
    }
}

#[derive(Default)]
pub struct CountingRefill {
    pub refills: Mutex<usize>,
}

impl ChestRefill for CountingRefill {
    fn refill(&self, _world: &WorldId) {
        *self.refills.lock().unwrap() += 1;
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A host plus every recording collaborator, wired into [`Services`].
pub struct Harness {
    pub host: Arc<RecordingHost>,
    pub economy: Arc<RecordingEconomy>,
    pub review: Arc<RecordingReview>,
    pub hooks: Arc<RecordingHooks>,
    pub map_reset: Arc<RecordingMapReset>,
    pub refill: Arc<CountingRefill>,
    pub settings: Arc<GameSettings>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(GameSettings::default())
    }

    pub fn with_settings(settings: GameSettings) -> Self {
        Self {
            host: RecordingHost::new(),
            economy: Arc::new(RecordingEconomy::default()),
            review: Arc::new(RecordingReview::default()),
            hooks: Arc::new(RecordingHooks::default()),
            map_reset: Arc::new(RecordingMapReset::default()),
            refill: Arc::new(CountingRefill::default()),
            settings: Arc::new(settings),
        }
    }

    pub fn services(&self) -> Services {
        self.services_without_economy()
            .with_economy(self.economy.clone())
    }

    pub fn services_without_economy(&self) -> Services {
        Services::new(self.host.clone())
            .with_review(self.review.clone())
            .with_hooks(self.hooks.clone())
            .with_map_reset(self.map_reset.clone())
            .with_chest_refill(self.refill.clone())
    }
}

pub fn spawn_pos(slot: u32) -> Vec3 {
    Vec3::new(f64::from(slot) * 10.0, 64.0, 0.0)
}

/// A complete four-slot record on `islands` with short timers.
pub fn complete_config() -> ArenaConfig {
    let spawns: BTreeMap<String, Vec3> = (1..=4)
        .map(|slot| (ArenaConfig::spawn_key(slot), spawn_pos(slot)))
        .collect();
    ArenaConfig {
        level: Some(WorldId::from("islands")),
        slots: 4,
        spawns,
        enabled: true,
        join_sign: Some(Location::new(Vec3::new(0.0, 70.0, 5.0), "hub")),
        start_time: 10,
        game_time: 60,
        restart_time: 10,
        spectator_mode: true,
        leave_pos: Some(Location::new(Vec3::new(0.0, 70.0, 0.0), "hub")),
        lucky_blocks: false,
        prize: 100,
        prize_commands: vec!["give {player} diamond 1".into()],
        players_to_start: 2,
        lobby: None,
    }
}
