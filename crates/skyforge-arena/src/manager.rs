//! Arena registry: creates arenas, tracks who is where, routes events.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use skyforge_types::{ArenaId, Location, MessageKind, PlayerName};
use tracing::{debug, info};

use crate::events::{EventOutcome, HostEvent};
use crate::settings::GameSettings;
use crate::setup::SetupCommand;
use crate::{Arena, ArenaConfig, ArenaError, DisconnectOptions, Phase, Services};

/// Snapshot of one arena, for listings and map pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaInfo {
    pub id: ArenaId,
    pub phase: Phase,
    pub players: usize,
    pub spectators: usize,
    pub slots: u32,
    pub map: String,
    pub enabled: bool,
}

impl ArenaInfo {
    pub fn of(arena: &Arena) -> Self {
        Self {
            id: arena.id.clone(),
            phase: arena.phase,
            players: arena.roster.len(),
            spectators: arena.spectators.len(),
            slots: arena.config.slots,
            map: arena.map_name().to_string(),
            enabled: arena.config.enabled,
        }
    }
}

/// Every arena on the server.
///
/// A player is tracked by at most one arena at a time; the manager checks
/// this before forwarding joins.
pub struct ArenaManager {
    arenas: BTreeMap<ArenaId, Arena>,
    settings: Arc<GameSettings>,
    services: Services,
}

impl ArenaManager {
    pub fn new(settings: Arc<GameSettings>, services: Services) -> Self {
        Self {
            arenas: BTreeMap::new(),
            settings,
            services,
        }
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Registers an arena from its record. The arena is enabled right away
    /// when the record is complete, otherwise it waits in `Setup`.
    pub fn create_arena(&mut self, id: ArenaId, config: ArenaConfig) -> Result<&Arena, ArenaError> {
        if self.arenas.contains_key(&id) {
            return Err(ArenaError::AlreadyExists(id));
        }
        let arena = Arena::new(
            id.clone(),
            config,
            Arc::clone(&self.settings),
            self.services.clone(),
        );
        info!(arena = %id, phase = %arena.phase, "arena created");
        Ok(self.arenas.entry(id).or_insert(arena))
    }

    /// Removes an arena, sending everyone in it out first. Returns its
    /// final record.
    pub fn remove_arena(&mut self, id: &ArenaId) -> Result<ArenaConfig, ArenaError> {
        let mut arena = self
            .arenas
            .remove(id)
            .ok_or_else(|| ArenaError::NotFound(id.clone()))?;

        let everyone: Vec<PlayerName> = arena
            .roster
            .snapshot()
            .into_iter()
            .chain(arena.spectators.iter().cloned())
            .collect();
        for player in everyone {
            let spectator = arena.spectators.contains(&player);
            arena.disconnect(
                &player,
                "",
                DisconnectOptions {
                    spectator,
                    transfer: true,
                    ..DisconnectOptions::default()
                },
            );
        }

        info!(arena = %id, "arena removed");
        Ok(arena.config)
    }

    pub fn arena(&self, id: &ArenaId) -> Option<&Arena> {
        self.arenas.get(id)
    }

    pub fn arena_mut(&mut self, id: &ArenaId) -> Option<&mut Arena> {
        self.arenas.get_mut(id)
    }

    fn arena_or_not_found(&mut self, id: &ArenaId) -> Result<&mut Arena, ArenaError> {
        self.arenas
            .get_mut(id)
            .ok_or_else(|| ArenaError::NotFound(id.clone()))
    }

    /// The arena tracking `player`, as participant or spectator.
    pub fn arena_of(&self, player: &PlayerName) -> Option<&ArenaId> {
        self.arenas
            .values()
            .find(|arena| arena.in_game(player, true))
            .map(Arena::id)
    }

    pub fn len(&self) -> usize {
        self.arenas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arenas.is_empty()
    }

    // -----------------------------------------------------------------------
    // Joining and leaving
    // -----------------------------------------------------------------------

    /// Joins `player` to arena `id`.
    ///
    /// # Errors
    /// `NotFound`, `AlreadyInRoster` if the player is already in an arena,
    /// or any rejection from [`Arena::join`].
    pub fn join(&mut self, player: &PlayerName, id: &ArenaId, force: bool) -> Result<(), ArenaError> {
        if !self.arenas.contains_key(id) {
            return Err(ArenaError::NotFound(id.clone()));
        }
        if let Some(current) = self.arena_of(player) {
            let text = if current == id {
                &self.settings.messages.already_here
            } else {
                &self.settings.messages.join_already
            };
            self.services.host.send(player, MessageKind::Chat, text);
            return Err(ArenaError::AlreadyInRoster(player.clone()));
        }
        self.arena_or_not_found(id)?.join(player, force)
    }

    /// Takes `player` out of whatever arena holds them and sends them to
    /// the leave position.
    pub fn leave(&mut self, player: &PlayerName) -> Result<ArenaId, ArenaError> {
        let id = self
            .arena_of(player)
            .cloned()
            .ok_or_else(|| ArenaError::NotInRoster(player.clone()))?;
        let message = self.settings.messages.quit.clone();
        let arena = self.arena_or_not_found(&id)?;
        let spectator = arena.is_spectating(player);
        arena.disconnect(
            player,
            &message,
            DisconnectOptions {
                spectator,
                transfer: true,
                ..DisconnectOptions::default()
            },
        );
        Ok(id)
    }

    /// Picks an arena for a quick join: the fullest arena that still
    /// accepts joins, chosen at random among equally full ones.
    pub fn random_empty_arena(&self) -> Option<ArenaId> {
        let open: Vec<&Arena> = self
            .arenas
            .values()
            .filter(|arena| arena.accepts_joins())
            .collect();
        let fullest = open.iter().map(|arena| arena.roster.len()).max()?;
        let ties: Vec<&ArenaId> = open
            .iter()
            .filter(|arena| arena.roster.len() == fullest)
            .map(|arena| &arena.id)
            .collect();

        let pick = rand::rng().random_range(0..ties.len());
        Some(ties[pick].clone())
    }

    /// Joins `player` to [`random_empty_arena`](Self::random_empty_arena).
    pub fn join_random(&mut self, player: &PlayerName) -> Result<ArenaId, ArenaError> {
        let Some(id) = self.random_empty_arena() else {
            self.services
                .host
                .send(player, MessageKind::Chat, &self.settings.messages.all_full);
            return Err(ArenaError::NoArenaAvailable);
        };
        self.join(player, &id, false)?;
        Ok(id)
    }

    /// Arenas `player` could switch to.
    pub fn available_maps(&self, player: &PlayerName) -> Vec<ArenaInfo> {
        let current = self.arena_of(player);
        self.arenas
            .values()
            .filter(|arena| Some(&arena.id) != current && arena.accepts_joins())
            .map(ArenaInfo::of)
            .collect()
    }

    /// Moves `player` from their arena to `target`. The player stays where
    /// they are if `target` would reject them.
    pub fn change_map(&mut self, player: &PlayerName, target: &ArenaId) -> Result<(), ArenaError> {
        let current = self
            .arena_of(player)
            .cloned()
            .ok_or_else(|| ArenaError::NotInRoster(player.clone()))?;
        if &current == target {
            self.services
                .host
                .send(player, MessageKind::Chat, &self.settings.messages.already_here);
            return Err(ArenaError::AlreadyInRoster(player.clone()));
        }

        let destination = self.arena_or_not_found(target)?;
        if let Err(e) = destination.check_join(player, false) {
            destination.reject_join(player, &e);
            return Err(e);
        }

        let from = self.arena_or_not_found(&current)?;
        let spectator = from.is_spectating(player);
        from.disconnect(
            player,
            "",
            DisconnectOptions {
                spectator,
                ..DisconnectOptions::default()
            },
        );
        debug!(%player, from = %current, to = %target, "changing map");
        self.arena_or_not_found(target)?.join(player, false)
    }

    /// "Play again" from the reward review: moves the player to a fresh
    /// arena, or sends them out when every arena is full.
    pub fn confirm_review(&mut self, player: &PlayerName) -> Result<ArenaId, ArenaError> {
        let current = self
            .arena_of(player)
            .cloned()
            .ok_or_else(|| ArenaError::NotInRoster(player.clone()))?;
        let next = self.random_empty_arena();
        let all_full = self.settings.messages.all_full.clone();

        let from = self.arena_or_not_found(&current)?;
        let spectator = from.is_spectating(player);
        let Some(next) = next else {
            from.disconnect(
                player,
                &all_full,
                DisconnectOptions {
                    spectator,
                    transfer: true,
                    ..DisconnectOptions::default()
                },
            );
            return Err(ArenaError::NoArenaAvailable);
        };

        from.disconnect(
            player,
            "",
            DisconnectOptions {
                spectator,
                ..DisconnectOptions::default()
            },
        );
        self.arena_or_not_found(&next)?.join(player, false)?;
        Ok(next)
    }

    // -----------------------------------------------------------------------
    // Operators
    // -----------------------------------------------------------------------

    pub fn force_start(&mut self, id: &ArenaId) -> Result<(), ArenaError> {
        let arena = self.arena_or_not_found(id)?;
        if arena.phase != Phase::Lobby {
            return Err(ArenaError::PhaseLocked(arena.phase));
        }
        arena.force_start();
        Ok(())
    }

    pub fn apply_setup(
        &mut self,
        id: &ArenaId,
        cmd: SetupCommand,
        at: &Location,
    ) -> Result<String, ArenaError> {
        self.arena_or_not_found(id)?.apply_setup(cmd, at)
    }

    // -----------------------------------------------------------------------
    // Events and ticks
    // -----------------------------------------------------------------------

    /// Routes a host event to the arena tracking its player. Sign taps from
    /// players outside every arena are offered to each arena in turn.
    pub fn dispatch(&mut self, event: &HostEvent) -> EventOutcome {
        let player = event.player().clone();

        let Some(id) = self.arena_of(&player).cloned() else {
            if let HostEvent::Tap { at, .. } = event {
                for arena in self.arenas.values_mut() {
                    if arena.on_sign_tap(&player, at) {
                        return EventOutcome::Handled;
                    }
                }
            }
            return EventOutcome::Ignored;
        };

        let outcome = match self.arenas.get_mut(&id) {
            Some(arena) => arena.handle(event),
            None => return EventOutcome::Ignored,
        };

        if let EventOutcome::ShowMaps(_) = outcome {
            let maps = self.available_maps(&player);
            if maps.is_empty() {
                self.services.host.send(
                    &player,
                    MessageKind::Chat,
                    &self.settings.messages.other_arenas_full,
                );
            }
            return EventOutcome::ShowMaps(maps);
        }
        outcome
    }

    /// Runs one scheduler step on every arena.
    pub fn tick_all(&mut self) {
        for arena in self.arenas.values_mut() {
            arena.tick();
        }
    }

    pub fn list(&self) -> Vec<ArenaInfo> {
        self.arenas.values().map(ArenaInfo::of).collect()
    }

    /// Current records, for saving.
    pub fn records(&self) -> impl Iterator<Item = (&ArenaId, &ArenaConfig)> {
        self.arenas.iter().map(|(id, arena)| (id, &arena.config))
    }
}
