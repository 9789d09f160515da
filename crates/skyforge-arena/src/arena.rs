//! The arena: one match venue with its roster, phase and countdowns.
//!
//! An `Arena` is plain state plus rules. It never spawns tasks or sleeps;
//! the runtime calls [`Arena::tick`](crate::Arena::tick) once per clock
//! period and forwards host events to the handlers in this crate. All
//! calls for one arena come from the same task, so nothing here locks.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use skyforge_types::{ArenaId, GameMode, Location, MessageKind, NavItem, PlayerName, Vec3, WorldId};
use tracing::{debug, error, info, warn};

use crate::countdown::{Countdowns, JOIN_LOCK_AT};
use crate::elimination::DamageRecord;
use crate::settings::{GameSettings, render};
use crate::{ArenaConfig, ArenaError, Phase, Roster, Services};

/// Full health and food on the host's scale.
pub(crate) const FULL_VITALS: f64 = 20.0;

/// How a player leaves the arena. See [`Arena::disconnect`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisconnectOptions {
    /// The player was eliminated; with spectator mode on they keep
    /// watching.
    pub death: bool,
    /// The player was spectating.
    pub spectator: bool,
    /// Send the player out: cross-server transfer (if configured) and the
    /// leave position.
    pub transfer: bool,
}

impl DisconnectOptions {
    pub fn transfer() -> Self {
        Self {
            transfer: true,
            ..Self::default()
        }
    }
}

pub struct Arena {
    pub(crate) id: ArenaId,
    pub(crate) config: ArenaConfig,
    pub(crate) settings: Arc<GameSettings>,
    pub(crate) services: Services,
    pub(crate) phase: Phase,
    /// The loaded copy of `config.level`, when there is one.
    pub(crate) world: Option<WorldId>,
    pub(crate) roster: Roster,
    pub(crate) spectators: BTreeSet<PlayerName>,
    /// Kill counters for this round.
    pub(crate) kills: HashMap<PlayerName, u32>,
    /// Prizes already credited this round.
    pub(crate) rewards: HashMap<PlayerName, u64>,
    pub(crate) last_damage: HashMap<PlayerName, DamageRecord>,
    /// Spectators who pressed the leave item once and must confirm.
    pub(crate) leave_requests: HashSet<PlayerName>,
    pub(crate) countdowns: Countdowns,
}

impl Arena {
    /// Creates an arena from its record and tries to enable it.
    ///
    /// A record that can't be enabled leaves the arena in `Setup`; the
    /// reason is logged and operators finish it with setup commands.
    pub fn new(
        id: ArenaId,
        config: ArenaConfig,
        settings: Arc<GameSettings>,
        services: Services,
    ) -> Self {
        let countdowns = Countdowns::from_config(&config);
        let mut arena = Self {
            id,
            config,
            settings,
            services,
            phase: Phase::Setup,
            world: None,
            roster: Roster::new(),
            spectators: BTreeSet::new(),
            kills: HashMap::new(),
            rewards: HashMap::new(),
            last_damage: HashMap::new(),
            leave_requests: HashSet::new(),
            countdowns,
        };

        if let Err(e) = arena.enable() {
            error!(arena = %arena.id, error = %e, "could not load arena, complete setup");
        }
        arena
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn id(&self) -> &ArenaId {
        &self.id
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn world(&self) -> Option<&WorldId> {
        self.world.as_ref()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn spectators(&self) -> impl Iterator<Item = &PlayerName> {
        self.spectators.iter()
    }

    pub fn is_spectating(&self, player: &PlayerName) -> bool {
        self.spectators.contains(player)
    }

    pub fn kills(&self, player: &PlayerName) -> u32 {
        self.kills.get(player).copied().unwrap_or(0)
    }

    /// Prize credited to `player` this round, if any.
    pub fn reward(&self, player: &PlayerName) -> Option<u64> {
        self.rewards.get(player).copied()
    }

    pub fn countdowns(&self) -> &Countdowns {
        &self.countdowns
    }

    /// Deferred-teleport mode: players wait at the lobby location and only
    /// get a spawn slot right before the round starts.
    pub fn holds_in_lobby(&self) -> bool {
        self.config.lobby.is_some()
    }

    /// Name shown on signs and scoreboards.
    pub(crate) fn map_name(&self) -> &str {
        self.world.as_ref().map_or("---", WorldId::as_str)
    }

    /// `true` if `player` is a participant (or a spectator, when
    /// `include_spectators`).
    pub fn in_game(&self, player: &PlayerName, include_spectators: bool) -> bool {
        self.roster.contains(player) || (include_spectators && self.spectators.contains(player))
    }

    /// The centre of spawn `slot` in the arena world.
    pub(crate) fn spawn_location(&self, slot: u32) -> Option<Location> {
        let world = self.world.clone()?;
        let pos = self.config.spawn(slot)?;
        Some(Location::new(pos.block_centre(), world))
    }

    pub(crate) fn msg(&self) -> &crate::settings::Messages {
        &self.settings.messages
    }

    // -----------------------------------------------------------------------
    // Enable / load
    // -----------------------------------------------------------------------

    /// Validates the record and, if it passes, enables the arena and loads
    /// its world.
    ///
    /// # Errors
    /// `ConfigInvalid` if the record breaks an enable rule (the arena is
    /// left in `Setup`), `WorldUnavailable` if the world can't be loaded.
    pub fn enable(&mut self) -> Result<(), ArenaError> {
        if let Err(e) = self.check_enable() {
            self.set_phase(Phase::Setup);
            return Err(e);
        }
        self.config.enabled = true;
        self.load_arena(false)
    }

    fn check_enable(&self) -> Result<(), ArenaError> {
        self.config.validate()?;
        match &self.config.level {
            Some(level) if self.services.host.is_world_generated(level) => Ok(()),
            Some(level) => Err(ArenaError::ConfigInvalid(format!(
                "level {level} is not generated"
            ))),
            None => Err(ArenaError::ConfigInvalid("level is not set".into())),
        }
    }

    /// Attaches the world and resets the arena to an empty lobby.
    ///
    /// With `restart` the world loaded for the previous round is reused
    /// (it was restored by the map reset) and the per-round ledgers are
    /// cleared.
    ///
    /// # Errors
    /// `NotEnabled` for an arena still in setup; `WorldUnavailable` when
    /// the world is gone, which also disables the arena.
    pub fn load_arena(&mut self, restart: bool) -> Result<(), ArenaError> {
        if !self.config.enabled {
            error!(arena = %self.id, "can not load arena: arena is not enabled");
            return Err(ArenaError::NotEnabled);
        }
        let Some(level) = self.config.level.clone() else {
            return Err(self.disable_world("<unset>"));
        };

        if restart {
            if self.world.is_none() {
                return Err(self.disable_world(level.as_str()));
            }
            self.kills.clear();
            self.rewards.clear();
        } else if self.services.host.load_world(&level) {
            self.world = Some(level.clone());
        }

        if self.world.is_none() {
            self.world = self.services.map_reset.load_map(&level);
        }
        if self.world.is_none() {
            return Err(self.disable_world(level.as_str()));
        }

        self.set_phase(Phase::Lobby);
        self.roster.clear();
        self.spectators.clear();
        self.leave_requests.clear();
        self.last_damage.clear();

        info!(arena = %self.id, world = %level, restart, "arena loaded");
        Ok(())
    }

    /// Moves to `next`. Reloading into the current phase is allowed; any
    /// other move must follow the round order.
    fn set_phase(&mut self, next: Phase) {
        if self.phase == next {
            return;
        }
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal phase change {} -> {next}",
            self.phase
        );
        debug!(arena = %self.id, from = %self.phase, to = %next, "phase change");
        self.phase = next;
    }

    fn disable_world(&mut self, level: &str) -> ArenaError {
        error!(arena = %self.id, level, "disabling arena: level not found");
        self.config.level = None;
        self.config.enabled = false;
        self.world = None;
        self.set_phase(Phase::Setup);
        ArenaError::WorldUnavailable(level.to_string())
    }

    // -----------------------------------------------------------------------
    // Join
    // -----------------------------------------------------------------------

    /// Adds `player` to the lobby.
    ///
    /// Rejections send the player the matching message and leave the arena
    /// untouched. `force` is passed to the join hook (operator joins).
    pub fn join(&mut self, player: &PlayerName, force: bool) -> Result<(), ArenaError> {
        if let Err(e) = self.check_join(player, force) {
            self.reject_join(player, &e);
            return Err(e);
        }

        let host = Arc::clone(&self.services.host);

        if let Some(lobby) = self.config.lobby.clone() {
            host.load_world(&lobby.world);
            self.roster.enqueue(player.clone());
            host.teleport(player, &lobby);
        } else {
            let Some(slot) = self.roster.first_free_slot(self.config.slots) else {
                self.reject_join(player, &ArenaError::Full);
                return Err(ArenaError::Full);
            };
            if let Some(spawn) = self.spawn_location(slot) {
                host.teleport(player, &spawn);
            }
            self.roster.assign_slot(slot, player.clone());
        }

        host.clear_inventory(player);
        host.set_game_mode(player, GameMode::Adventure);
        host.set_health(player, FULL_VITALS);
        host.set_food(player, FULL_VITALS);
        host.remove_effects(player);
        host.remove_scoreboard(player);

        self.kills.insert(player.clone(), 0);

        host.give_item(player, NavItem::ChangeMap);
        if self.services.kits.is_some() {
            host.give_item(player, NavItem::SelectKit);
        }
        host.give_item(player, NavItem::Leave);

        let text = render(
            &self.msg().join,
            &[player, &self.roster.len(), &self.config.slots],
        );
        self.broadcast(MessageKind::Chat, &text);

        info!(
            arena = %self.id,
            %player,
            players = self.roster.len(),
            "player joined"
        );
        Ok(())
    }

    /// Tells `player` why they can't join.
    pub(crate) fn reject_join(&self, player: &PlayerName, reason: &ArenaError) {
        let text = match reason {
            ArenaError::NotEnabled => Some(&self.msg().join_setup),
            ArenaError::PhaseLocked(_) => Some(&self.msg().join_in_game),
            ArenaError::Full => Some(&self.msg().join_full),
            ArenaError::AlreadyInRoster(_) => Some(&self.msg().join_already),
            ArenaError::CountdownLocked => Some(&self.msg().join_starting),
            _ => None,
        };
        if let Some(text) = text {
            self.services.host.send(player, MessageKind::Chat, text);
        }
        debug!(arena = %self.id, %player, %reason, "join rejected");
    }

    /// Lobby open, below capacity and not yet locked by the countdown.
    pub fn accepts_joins(&self) -> bool {
        self.config.enabled
            && self.phase == Phase::Lobby
            && self.roster.len() < self.config.slots as usize
            && self.countdowns.start_time > JOIN_LOCK_AT
    }

    pub(crate) fn check_join(&self, player: &PlayerName, force: bool) -> Result<(), ArenaError> {
        if !self.config.enabled || self.phase == Phase::Setup {
            return Err(ArenaError::NotEnabled);
        }
        if !self.phase.is_joinable() {
            return Err(ArenaError::PhaseLocked(self.phase));
        }
        if self.roster.len() >= self.config.slots as usize {
            return Err(ArenaError::Full);
        }
        if self.in_game(player, false) {
            return Err(ArenaError::AlreadyInRoster(player.clone()));
        }
        if self.countdowns.start_time <= JOIN_LOCK_AT {
            return Err(ArenaError::CountdownLocked);
        }
        if !self.services.hooks.on_join(player, &self.id, force) {
            return Err(ArenaError::JoinRefused);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Disconnect
    // -----------------------------------------------------------------------

    /// Takes `player` out of the arena. Returns `false` (and does nothing)
    /// if the player isn't a participant or spectator.
    ///
    /// `message` is sent to the player afterwards unless empty.
    pub fn disconnect(
        &mut self,
        player: &PlayerName,
        message: &str,
        options: DisconnectOptions,
    ) -> bool {
        if !self.in_game(player, true) {
            return false;
        }

        self.spectators.remove(player);
        self.roster.remove(player);
        self.leave_requests.remove(player);

        let host = Arc::clone(&self.services.host);
        if host.is_online(player) {
            host.remove_effects(player);
            host.set_game_mode(player, host.default_game_mode());
            host.set_health(player, FULL_VITALS);
            host.set_food(player, FULL_VITALS);
            host.clear_inventory(player);
            host.set_immobile(player, false);
            host.remove_scoreboard(player);
        }

        self.services.hooks.on_quit(player, &self.id);

        if options.death && self.config.spectator_mode {
            self.spectators.insert(player.clone());
        }

        if !self.config.spectator_mode || options.transfer {
            if self.settings.transfer.enabled {
                match &self.services.transfer {
                    Some(transfer) => transfer.transfer(player, &self.settings.transfer.lobby_server),
                    None => warn!(arena = %self.id, %player, "transfer enabled but no provider installed"),
                }
            }
            if let Some(leave) = &self.config.leave_pos {
                host.teleport(player, leave);
            }
        }

        if !message.is_empty() {
            host.send(player, MessageKind::Chat, message);
        }

        debug!(
            arena = %self.id,
            %player,
            death = options.death,
            transfer = options.transfer,
            players = self.roster.len(),
            "player disconnected"
        );
        true
    }

    // -----------------------------------------------------------------------
    // Round lifecycle
    // -----------------------------------------------------------------------

    /// Opens the round: cages, game modes, kits, chest loot.
    pub fn start_round(&mut self) {
        let host = Arc::clone(&self.services.host);
        let sounds = &self.settings.sounds;

        for player in self.roster.snapshot() {
            if sounds.enabled {
                host.play_sound(&player, sounds.start);
            }
            match self.settings.cage {
                crate::settings::CagePolicy::Enable => host.clear_block_below(&player),
                crate::settings::CagePolicy::Detect if host.block_below(&player).is_glass() => {
                    host.clear_block_below(&player)
                }
                _ => {}
            }
            host.set_game_mode(&player, GameMode::Survival);
            host.clear_inventory(&player);
            host.set_immobile(&player, false);
            host.remove_effects(&player);
        }

        self.roster.rekey_by_name();
        self.set_phase(Phase::Active);

        if let Some(kits) = &self.services.kits {
            for player in self.roster.players() {
                if let Some(kit) = kits.selected_kit(player) {
                    kits.equip(player, &kit);
                }
            }
        }

        if let Some(world) = &self.world {
            self.services.chest_refill.refill(world);
        }

        let title = self.msg().start_title.clone();
        self.broadcast(MessageKind::Title, &title);

        info!(arena = %self.id, players = self.roster.len(), "round started");
    }

    /// Ends the round: picks the winner and switches to `Restarting`.
    pub fn start_restart(&mut self) {
        let winner = self.roster.players().last().cloned();
        self.set_phase(Phase::Restarting);

        let host = Arc::clone(&self.services.host);
        let Some(winner) = winner.filter(|w| host.is_online(w)) else {
            info!(arena = %self.id, "round ended without a winner");
            return;
        };

        host.send(&winner, MessageKind::Title, &self.msg().win_title);
        host.set_allow_flight(&winner, true);
        host.broadcast_server(&render(
            &self.msg().win_broadcast,
            &[&winner, &self.map_name()],
        ));
        self.services.hooks.on_win(&winner, &self.id);
        self.pay_winner(&winner);

        info!(arena = %self.id, %winner, "round won");
    }

    fn pay_winner(&self, winner: &PlayerName) {
        if self.config.prize > 0 {
            match &self.services.economy {
                Some(economy) => {
                    if !economy.add_money(winner, self.config.prize) {
                        warn!(arena = %self.id, %winner, prize = self.config.prize, "economy rejected win prize");
                    }
                }
                None => warn!(
                    arena = %self.id,
                    %winner,
                    prize = self.config.prize,
                    "no economy provider installed, win prize not credited"
                ),
            }
        }
        for command in &self.config.prize_commands {
            self.services
                .host
                .run_command(&command.replace("{player}", winner.as_str()));
        }
    }

    /// `true` once at most one participant is left or time has run out.
    pub fn check_end(&self) -> bool {
        self.roster.len() <= 1 || self.countdowns.game_time <= 0
    }

    /// Operator override: run the lobby countdown from ten seconds
    /// whatever the player count.
    pub fn force_start(&mut self) {
        self.countdowns.force_start = true;
        self.countdowns.start_time = crate::countdown::FORCE_START_AT;
        info!(arena = %self.id, "force start");
    }

    // -----------------------------------------------------------------------
    // Messaging
    // -----------------------------------------------------------------------

    /// Sends `text` to every participant and spectator.
    pub fn broadcast(&self, kind: MessageKind, text: &str) {
        for player in self.roster.players().chain(self.spectators.iter()) {
            self.services.host.send(player, kind, text);
        }
    }

    /// Teleports every participant back to the lobby location.
    pub(crate) fn recentre_on_lobby(&self) {
        if let Some(lobby) = &self.config.lobby {
            for player in self.roster.players() {
                self.services.host.teleport(player, lobby);
            }
        }
    }

    /// A location at `pos` in the arena world.
    pub(crate) fn in_world(&self, pos: Vec3) -> Option<Location> {
        self.world.clone().map(|world| Location::new(pos, world))
    }
}
