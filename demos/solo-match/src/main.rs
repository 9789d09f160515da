//! Runs one scripted round against a console host.
//!
//! `RUST_LOG=debug cargo run -p solo-match` shows every arena decision.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use skyforge::prelude::*;
use skyforge::services::{Host, HostError};
use skyforge::settings::Sound;
use skyforge_types::{BlockKind, GameMode, MessageKind, NavItem};
use tracing::info;

// ---------------------------------------------------------------------------
// Console host
// ---------------------------------------------------------------------------

/// Prints what a real server would show and tracks health so hits land.
#[derive(Default)]
struct ConsoleHost {
    health: Mutex<HashMap<PlayerName, f64>>,
}

impl ConsoleHost {
    fn health_of(&self, player: &PlayerName) -> f64 {
        let health = self.health.lock().unwrap_or_else(|e| e.into_inner());
        health.get(player).copied().unwrap_or(20.0)
    }
}

impl Host for ConsoleHost {
    fn send(&self, player: &PlayerName, kind: MessageKind, text: &str) {
        if kind == MessageKind::Chat || kind == MessageKind::Title {
            info!(target: "host", %player, ?kind, "{text}");
        }
    }
    fn broadcast_server(&self, text: &str) {
        info!(target: "host", "[server] {text}");
    }
    fn is_online(&self, _player: &PlayerName) -> bool {
        true
    }
    fn position(&self, _player: &PlayerName) -> Option<Location> {
        None
    }
    fn teleport(&self, player: &PlayerName, to: &Location) {
        info!(target: "host", %player, %to, "teleport");
    }
    fn set_game_mode(&self, _player: &PlayerName, _mode: GameMode) {}
    fn default_game_mode(&self) -> GameMode {
        GameMode::Survival
    }
    fn health(&self, player: &PlayerName) -> f64 {
        self.health_of(player)
    }
    fn max_health(&self, _player: &PlayerName) -> f64 {
        20.0
    }
    fn set_health(&self, player: &PlayerName, health: f64) {
        let mut map = self.health.lock().unwrap_or_else(|e| e.into_inner());
        map.insert(player.clone(), health);
    }
    fn set_food(&self, _player: &PlayerName, _food: f64) {}
    fn remove_effects(&self, _player: &PlayerName) {}
    fn set_immobile(&self, _player: &PlayerName, _immobile: bool) {}
    fn set_flying(&self, _player: &PlayerName, _flying: bool) {}
    fn set_allow_flight(&self, _player: &PlayerName, _allow: bool) {}
    fn clear_inventory(&self, _player: &PlayerName) {}
    fn drop_inventory(&self, _player: &PlayerName) {}
    fn give_item(&self, _player: &PlayerName, _item: NavItem) {}
    fn remove_item(&self, _player: &PlayerName, _item: NavItem) {}
    fn release_owned_projectiles(&self, _player: &PlayerName) {}
    fn play_sound(&self, _player: &PlayerName, _sound: Sound) {}
    fn block_below(&self, _player: &PlayerName) -> BlockKind {
        BlockKind::Glass
    }
    fn clear_block_below(&self, _player: &PlayerName) {}
    fn ignite_tnt(&self, player: &PlayerName, at: &Location, fuse_ticks: u32) {
        info!(target: "host", %player, %at, fuse_ticks, "tnt primed");
    }
    fn is_world_generated(&self, _world: &WorldId) -> bool {
        true
    }
    fn load_world(&self, _world: &WorldId) -> bool {
        true
    }
    fn run_command(&self, command: &str) {
        info!(target: "host", "/{command}");
    }
    fn show_scoreboard(&self, _player: &PlayerName, _text: &str) -> Result<(), HostError> {
        Ok(())
    }
    fn remove_scoreboard(&self, _player: &PlayerName) {}
    fn set_sign_text(&self, _at: &Location, _lines: &[String; 4]) -> Result<(), HostError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

fn arena_record() -> ArenaConfig {
    let mut config = ArenaConfig {
        level: Some(WorldId::from("islands")),
        slots: 4,
        start_time: 8,
        game_time: 60,
        restart_time: 6,
        prize: 50,
        prize_commands: vec!["give {player} diamond 1".into()],
        leave_pos: Some(Location::new(Vec3::new(0.0, 70.0, 0.0), "hub")),
        ..ArenaConfig::default()
    };
    for slot in 1..=4 {
        config.spawns.insert(
            ArenaConfig::spawn_key(slot),
            Vec3::new(f64::from(slot) * 20.0, 64.0, 0.0),
        );
    }
    config
}

async fn wait_for(runtime: &RuntimeHandle, phase: Phase) -> Result<(), SkyforgeError> {
    loop {
        if runtime.list().await?.iter().all(|info| info.phase == phase) {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

async fn hit(runtime: &RuntimeHandle, attacker: &str, victim: &str) -> Result<(), SkyforgeError> {
    let event = DamageEvent::new(victim, DamageCause::EntityAttack, 25.0).by(attacker);
    let outcome = runtime.event(HostEvent::Damage(event)).await?;
    info!(attacker, victim, ?outcome, "hit");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), SkyforgeError> {
    skyforge::init_tracing();

    let manager = ArenaManager::new(
        Arc::new(GameSettings::default()),
        Services::new(Arc::new(ConsoleHost::default())),
    );
    let runtime = skyforge::runtime::spawn(
        manager,
        RuntimeConfig {
            clock: ClockConfig::with_period(Duration::from_millis(200)),
            ..RuntimeConfig::default()
        },
    );

    runtime.create_arena(ArenaId::from("sw1"), arena_record()).await?;
    for name in ["ada", "bo", "cy"] {
        let arena = runtime.join_random(PlayerName::from(name)).await?;
        info!(player = name, %arena, "joined");
    }

    wait_for(&runtime, Phase::Active).await?;

    hit(&runtime, "ada", "bo").await?;
    hit(&runtime, "cy", "ada").await?;

    wait_for(&runtime, Phase::Restarting).await?;
    wait_for(&runtime, Phase::Lobby).await?;

    for info in runtime.shutdown().await? {
        info!(arena = %info.0, "record ready to persist");
    }
    Ok(())
}
