//! The phase scheduler: what one clock tick does to an arena.
//!
//! Called once per clock period (one second with the default clock). The
//! order inside each phase matters: countdown, cosmetics, then the
//! transition check, so a failing scoreboard or sign can never stop a
//! phase change from happening in the same tick.

use std::sync::Arc;

use skyforge_types::{MessageKind, NavItem, PlayerName};
use tracing::{debug, error, info, trace, warn};

use crate::countdown::{RefillNotice, RestartAction, due_actions, refill_notice, restart_schedule};
use crate::settings::{BoardVars, ScoreboardSettings, format_clock, render};
use crate::{Arena, DisconnectOptions, Phase};

impl Arena {
    /// Runs one scheduler step.
    pub fn tick(&mut self) {
        self.refresh_sign();

        match self.phase {
            Phase::Setup => {}
            Phase::Lobby => self.tick_lobby(),
            Phase::Active => self.tick_active(),
            Phase::Restarting => self.tick_restarting(),
        }
    }

    fn threshold_met(&self) -> bool {
        self.roster.len() >= self.config.players_to_start as usize || self.countdowns.force_start
    }

    // -----------------------------------------------------------------------
    // Lobby
    // -----------------------------------------------------------------------

    fn tick_lobby(&mut self) {
        if self.threshold_met() {
            self.countdowns.start_time -= 1;
            let start_time = self.countdowns.start_time;

            if self.services.throttle.can_send("arena.starting") {
                let tip = self.lobby_tip(&self.msg().starting);
                self.broadcast(MessageKind::Tip, &tip);
            }
            self.send_scoreboards(false);

            if start_time == 5 && self.holds_in_lobby() {
                self.assign_spawns();
            }

            if start_time == 0 {
                self.start_round();
            } else if self.settings.sounds.enabled {
                for player in self.roster.players() {
                    self.services
                        .host
                        .play_sound(player, self.settings.sounds.start_tick);
                }
            }
            trace!(arena = %self.id, start_time, "lobby countdown");
        } else {
            self.send_scoreboards(false);

            if self.services.throttle.can_send("arena.waiting") {
                let tip = self.lobby_tip(&self.msg().waiting);
                self.broadcast(MessageKind::Tip, &tip);
            }

            if self.holds_in_lobby() && self.countdowns.start_time < self.config.start_time {
                self.recentre_on_lobby();
            }

            self.countdowns.start_time = self.config.start_time;
        }
    }

    fn lobby_tip(&self, template: &str) -> String {
        render(
            template,
            &[
                &self.roster.len(),
                &self.config.slots,
                &format_clock(self.countdowns.start_time),
                &self.config.players_to_start,
            ],
        )
    }

    /// Moves everyone from the holding area onto `spawn-1..N`, in join
    /// order.
    fn assign_spawns(&mut self) {
        let host = Arc::clone(&self.services.host);
        for (slot, player) in self.roster.rekey_into_slots() {
            match self.spawn_location(slot) {
                Some(spawn) => host.teleport(&player, &spawn),
                None => warn!(arena = %self.id, %player, slot, "no spawn for slot"),
            }
            host.remove_item(&player, NavItem::ChangeMap);
        }
        debug!(arena = %self.id, players = self.roster.len(), "spawns assigned");
    }

    // -----------------------------------------------------------------------
    // Active
    // -----------------------------------------------------------------------

    fn tick_active(&mut self) {
        self.countdowns.game_time -= 1;
        let game_time = self.countdowns.game_time;

        self.send_scoreboards(false);

        if self.services.throttle.can_send("arena.game") {
            let tip = render(
                &self.msg().in_game,
                &[&self.roster.len(), &format_clock(game_time)],
            );
            self.broadcast(MessageKind::Tip, &tip);
        }

        if let Some(notice) = refill_notice(self.config.game_time, game_time) {
            let text = match notice {
                RefillNotice::RefillSoon => &self.msg().refill_soon,
                RefillNotice::RefillImminent => &self.msg().refill_imminent,
                RefillNotice::Refilled => &self.msg().refilled,
            };
            self.broadcast(MessageKind::Chat, text);
        }

        if self.check_end() {
            self.start_restart();
        }
    }

    // -----------------------------------------------------------------------
    // Restarting
    // -----------------------------------------------------------------------

    fn tick_restarting(&mut self) {
        self.send_scoreboards(true);

        let current = self.countdowns.restart_time;
        if current >= 0 {
            let tip = render(&self.msg().restart_tip, &[&current]);
            self.broadcast(MessageKind::Tip, &tip);
        }

        self.countdowns.restart_time -= 1;

        let schedule = restart_schedule(self.config.restart_time);
        for action in due_actions(&schedule, current) {
            self.run_restart_action(action);
        }
    }

    fn run_restart_action(&mut self, action: RestartAction) {
        debug!(arena = %self.id, ?action, "restart checkpoint");
        match action {
            RestartAction::Review => self.review_rewards(None),
            RestartAction::DisconnectAll => {
                let mut everyone = self.roster.snapshot();
                everyone.extend(self.spectators.iter().cloned());
                for player in everyone {
                    self.services.host.remove_effects(&player);
                    self.disconnect(&player, "", DisconnectOptions::transfer());
                }
            }
            RestartAction::ReloadWorld => {
                if let Some(world) = self.world.take() {
                    self.world = self.services.map_reset.load_map(&world);
                    if self.world.is_none() {
                        error!(arena = %self.id, %world, "map reset could not reload the world");
                    }
                }
            }
            RestartAction::ReloadArena => {
                if let Err(e) = self.load_arena(true) {
                    error!(arena = %self.id, error = %e, "arena reload failed");
                }
                self.countdowns.rearm(&self.config);
                info!(arena = %self.id, phase = %self.phase, "arena restarted");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Cosmetics
    // -----------------------------------------------------------------------

    /// Countdown that belongs to the current phase.
    fn phase_time(&self) -> i32 {
        match self.phase {
            Phase::Setup | Phase::Lobby => self.countdowns.start_time,
            Phase::Active => self.countdowns.game_time,
            Phase::Restarting => self.countdowns.restart_time,
        }
    }

    fn send_scoreboards(&self, include_spectators: bool) {
        let board = &self.settings.scoreboard;
        if !board.enabled {
            return;
        }

        let template = board.template(self.phase, self.threshold_met());
        let time = format_clock(self.phase_time());
        let host = &self.services.host;

        let spectators = self.spectators.iter().filter(|_| include_spectators);
        for player in self.roster.players().chain(spectators) {
            let text = ScoreboardSettings::render(template, &self.board_vars(player, &time));
            host.remove_scoreboard(player);
            if let Err(e) = host.show_scoreboard(player, &text) {
                debug!(arena = %self.id, %player, error = %e, "scoreboard not shown");
            }
        }
    }

    fn board_vars<'a>(&'a self, player: &PlayerName, time: &str) -> BoardVars<'a> {
        let kit = self
            .services
            .kits
            .as_ref()
            .and_then(|kits| kits.selected_kit(player));
        BoardVars {
            players: self.roster.len(),
            max_players: self.config.slots,
            kit: kit.unwrap_or_else(|| "---".into()),
            needed_players: self.config.players_to_start,
            time: time.to_string(),
            map: self.map_name(),
            kills: self.kills(player),
        }
    }

    /// The four lines of the join sign for the current state.
    pub fn sign_text(&self) -> [String; 4] {
        let signs = &self.settings.join_sign;
        if signs.custom {
            return signs.lines.clone().map(|line| {
                line.replace("%phase", self.phase.sign_label())
                    .replace("%ingame", &self.roster.len().to_string())
                    .replace("%max", &self.config.slots.to_string())
                    .replace("%map", self.map_name())
            });
        }

        if self.phase == Phase::Setup {
            return [
                "SkyWars".into(),
                "[ ? / ? ]".into(),
                "Setup".into(),
                "Wait few sec...".into(),
            ];
        }

        let state = match self.phase {
            Phase::Lobby if self.roster.len() >= self.config.slots as usize => "Full",
            Phase::Lobby => "Join",
            _ => self.phase.sign_label(),
        };
        [
            "SkyWars".into(),
            format!("[ {} / {} ]", self.roster.len(), self.config.slots),
            state.into(),
            format!("Map: {}", self.map_name()),
        ]
    }

    fn refresh_sign(&self) {
        let Some(sign) = &self.config.join_sign else {
            return;
        };
        if let Err(e) = self.services.host.set_sign_text(sign, &self.sign_text()) {
            debug!(arena = %self.id, error = %e, "join sign not updated");
        }
    }
}
