//! Host events other than damage.
//!
//! Every handler is a no-op for players the arena doesn't track. Handlers
//! that can veto the host's default behaviour return `true` when the
//! event should be cancelled.

use rand::Rng;
use skyforge_types::{BlockKind, Location, MessageKind, NavItem, PlayerName, Vec3, WorldId};
use tracing::debug;

use crate::elimination::{DamageEvent, DamageVerdict};
use crate::roster::RosterKey;
use crate::{Arena, ArenaInfo, DisconnectOptions, Phase};

/// Fuse of TNT primed by placing it, in host ticks.
const TNT_FUSE_TICKS: u32 = 50;

/// An event reported by the host for one player.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Damage(DamageEvent),
    Chat { player: PlayerName, message: String },
    Quit { player: PlayerName },
    WorldChange { player: PlayerName, to: WorldId },
    /// Right-click with an arena navigation item.
    UseItem { player: PlayerName, item: NavItem },
    /// Hotbar selection changed.
    HeldItem { player: PlayerName, item: Option<NavItem> },
    /// Tapped a block (possibly a join sign).
    Tap { player: PlayerName, at: Location },
    Move { player: PlayerName, to: Vec3 },
    DropItem { player: PlayerName },
    Exhaust { player: PlayerName },
    ChestOpen { player: PlayerName },
    BlockBreak { player: PlayerName, block: BlockKind, at: Location },
    BlockPlace { player: PlayerName, block: BlockKind, at: Location },
}

impl HostEvent {
    pub fn player(&self) -> &PlayerName {
        match self {
            Self::Damage(event) => &event.victim,
            Self::Chat { player, .. }
            | Self::Quit { player }
            | Self::WorldChange { player, .. }
            | Self::UseItem { player, .. }
            | Self::HeldItem { player, .. }
            | Self::Tap { player, .. }
            | Self::Move { player, .. }
            | Self::DropItem { player }
            | Self::Exhaust { player }
            | Self::ChestOpen { player }
            | Self::BlockBreak { player, .. }
            | Self::BlockPlace { player, .. } => player,
        }
    }
}

/// What the host should do after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// No arena cared about the event.
    Ignored,
    /// Handled; let the host continue as usual.
    Handled,
    /// Handled; cancel the host's default behaviour.
    Cancelled,
    Damage(DamageVerdict),
    /// The player asked to change maps; show them these arenas.
    ShowMaps(Vec<ArenaInfo>),
}

/// Result of using a navigation item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemUse {
    Ignored,
    Left,
    KitShop,
    /// The caller shows the map picker.
    ChangeMap,
}

impl Arena {
    /// Arena chat. Returns `true` if the host chat line was replaced.
    pub fn on_chat(&self, player: &PlayerName, message: &str) -> bool {
        let chat = &self.settings.chat;
        if !chat.custom || !self.in_game(player, true) {
            return false;
        }
        let line = chat
            .format
            .replace("%player", player.as_str())
            .replace("%message", message);
        self.broadcast(MessageKind::Chat, &line);
        true
    }

    /// The player left the server.
    pub fn on_quit(&mut self, player: &PlayerName) -> bool {
        let spectator = self.spectators.contains(player);
        self.disconnect(
            player,
            "",
            DisconnectOptions {
                spectator,
                ..DisconnectOptions::default()
            },
        )
    }

    /// The player moved to another world. Anything other than the arena
    /// world or the lobby world counts as leaving.
    pub fn on_world_change(&mut self, player: &PlayerName, to: &WorldId) -> bool {
        if !self.in_game(player, true) {
            return false;
        }
        let arena_world = self.world.as_ref() == Some(to);
        let lobby_world = self.config.lobby.as_ref().is_some_and(|l| &l.world == to);
        if arena_world || lobby_world {
            return false;
        }

        let spectator = self.spectators.contains(player);
        let message = self.msg().left_arena.clone();
        self.disconnect(
            player,
            &message,
            DisconnectOptions {
                spectator,
                ..DisconnectOptions::default()
            },
        )
    }

    pub fn on_use_item(&mut self, player: &PlayerName, item: NavItem) -> ItemUse {
        if !self.in_game(player, true) {
            return ItemUse::Ignored;
        }
        match item {
            NavItem::Leave => {
                let message = self.msg().quit.clone();
                self.disconnect(player, &message, DisconnectOptions::transfer());
                ItemUse::Left
            }
            NavItem::SelectKit => match &self.services.kits {
                Some(kits) => {
                    kits.open_shop(player);
                    ItemUse::KitShop
                }
                None => ItemUse::Ignored,
            },
            NavItem::ChangeMap => ItemUse::ChangeMap,
        }
    }

    /// Spectators selecting the leave item must select it twice.
    /// Returns `true` if the selection should be cancelled.
    pub fn on_held_item(&mut self, player: &PlayerName, item: Option<NavItem>) -> bool {
        if !self.spectators.contains(player) || item != Some(NavItem::Leave) {
            return false;
        }
        if self.leave_requests.remove(player) {
            let message = self.msg().left_game.clone();
            self.disconnect(
                player,
                &message,
                DisconnectOptions {
                    spectator: true,
                    transfer: true,
                    ..DisconnectOptions::default()
                },
            );
            false
        } else {
            self.services
                .host
                .send(player, MessageKind::Chat, &self.msg().leave_confirm);
            self.leave_requests.insert(player.clone());
            true
        }
    }

    /// A tap on `at`. Returns `true` if it was this arena's join sign.
    pub fn on_sign_tap(&mut self, player: &PlayerName, at: &Location) -> bool {
        let is_sign = self
            .config
            .join_sign
            .as_ref()
            .is_some_and(|sign| sign.same_block(at));
        if !is_sign {
            return false;
        }

        match self.phase {
            Phase::Active => {
                self.services
                    .host
                    .send(player, MessageKind::Chat, &self.msg().sign_in_game)
            }
            Phase::Restarting => {
                self.services
                    .host
                    .send(player, MessageKind::Chat, &self.msg().sign_restarting)
            }
            Phase::Setup => {}
            Phase::Lobby => {
                // Rejections are already reported to the player.
                if let Err(e) = self.join(player, false) {
                    debug!(arena = %self.id, %player, error = %e, "sign join rejected");
                }
            }
        }
        true
    }

    /// Keeps lobby participants on their spawn point. Returns `true` if
    /// the player was pulled back.
    pub fn on_move(&self, player: &PlayerName, to: Vec3) -> bool {
        if self.phase != Phase::Lobby {
            return false;
        }
        if self.holds_in_lobby() && self.countdowns.start_time > crate::countdown::JOIN_LOCK_AT {
            return false;
        }
        let Some(RosterKey::Slot(slot)) = self.roster.key_of(player) else {
            return false;
        };
        let Some(spawn) = self.spawn_location(*slot) else {
            return false;
        };
        if to.distance(spawn.pos) <= 1.0 {
            return false;
        }
        self.services.host.teleport(player, &spawn);
        true
    }

    fn lobby_participant(&self, player: &PlayerName) -> bool {
        self.phase == Phase::Lobby && self.in_game(player, false)
    }

    /// Returns `true` if the drop should be cancelled.
    pub fn on_drop_item(&self, player: &PlayerName) -> bool {
        self.lobby_participant(player)
    }

    /// Returns `true` if hunger should be cancelled.
    pub fn on_exhaust(&self, player: &PlayerName) -> bool {
        if !self.lobby_participant(player) {
            return false;
        }
        self.services.host.set_food(player, crate::arena::FULL_VITALS);
        true
    }

    /// Returns `true` if opening the chest should be cancelled.
    pub fn on_chest_open(&self, player: &PlayerName) -> bool {
        self.lobby_participant(player)
    }

    /// Lucky blocks. Returns `true` if the block's drops should be cleared.
    pub fn on_block_break(&self, player: &PlayerName, block: BlockKind, at: &Location) -> bool {
        if !self.in_game(player, false) || !self.config.lucky_blocks || block != BlockKind::Sponge {
            return false;
        }
        let Some(lucky_blocks) = &self.services.lucky_blocks else {
            return false;
        };

        let roll = rand::rng().random_range(1..=3u8);
        let lucky = lucky_blocks.give_prize(player, at, roll);
        let title = if lucky {
            &self.msg().lucky
        } else {
            &self.msg().unlucky
        };
        self.services.host.send(player, MessageKind::Title, title);
        debug!(arena = %self.id, %player, roll, lucky, "lucky block");
        true
    }

    /// Placed TNT is primed instead of being set down. Returns `true` if
    /// the placement should be cancelled.
    pub fn on_block_place(&self, player: &PlayerName, block: BlockKind, at: &Location) -> bool {
        if !self.in_game(player, false) || block != BlockKind::Tnt {
            return false;
        }
        self.services.host.ignite_tnt(player, at, TNT_FUSE_TICKS);
        debug!(arena = %self.id, %player, %at, "tnt primed");
        true
    }

    /// Routes one host event to the matching handler.
    ///
    /// `ChangeMap` requests come back as [`EventOutcome::ShowMaps`] with an
    /// empty list; the manager fills in the arenas.
    pub fn handle(&mut self, event: &HostEvent) -> EventOutcome {
        let cancelled = |cancel: bool| {
            if cancel {
                EventOutcome::Cancelled
            } else {
                EventOutcome::Handled
            }
        };
        match event {
            HostEvent::Damage(damage) => EventOutcome::Damage(self.on_damage(damage)),
            HostEvent::Chat { player, message } => cancelled(self.on_chat(player, message)),
            HostEvent::Quit { player } => {
                self.on_quit(player);
                EventOutcome::Handled
            }
            HostEvent::WorldChange { player, to } => {
                self.on_world_change(player, to);
                EventOutcome::Handled
            }
            HostEvent::UseItem { player, item } => match self.on_use_item(player, *item) {
                ItemUse::ChangeMap => EventOutcome::ShowMaps(Vec::new()),
                ItemUse::Ignored => EventOutcome::Ignored,
                ItemUse::Left | ItemUse::KitShop => EventOutcome::Handled,
            },
            HostEvent::HeldItem { player, item } => cancelled(self.on_held_item(player, *item)),
            HostEvent::Tap { player, at } => {
                if self.on_sign_tap(player, at) {
                    EventOutcome::Handled
                } else {
                    EventOutcome::Ignored
                }
            }
            HostEvent::Move { player, to } => cancelled(self.on_move(player, *to)),
            HostEvent::DropItem { player } => cancelled(self.on_drop_item(player)),
            HostEvent::Exhaust { player } => cancelled(self.on_exhaust(player)),
            HostEvent::ChestOpen { player } => cancelled(self.on_chest_open(player)),
            HostEvent::BlockBreak { player, block, at } => {
                cancelled(self.on_block_break(player, *block, at))
            }
            HostEvent::BlockPlace { player, block, at } => {
                cancelled(self.on_block_place(player, *block, at))
            }
        }
    }
}
