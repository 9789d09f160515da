//! Damage resolution and elimination.
//!
//! Players never die on the host. When a hit would bring a participant to
//! zero health the damage is cancelled and the arena performs the death
//! itself: it attributes the kill, announces it, drops the victim's items
//! and turns them into a spectator.

use std::sync::Arc;

use skyforge_types::{DamageCause, Damager, GameMode, MessageKind, NavItem, PlayerName, Vec3};
use tracing::info;

use crate::countdown::CAGE_DROP_GRACE;
use crate::settings::{Messages, render};
use crate::{Arena, Phase};

/// A hit delivered by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct DamageEvent {
    pub victim: PlayerName,
    pub cause: DamageCause,
    /// Final damage after armour, as computed by the host.
    pub damage: f64,
    pub damager: Option<Damager>,
}

impl DamageEvent {
    pub fn new(victim: impl Into<PlayerName>, cause: DamageCause, damage: f64) -> Self {
        Self {
            victim: victim.into(),
            cause,
            damage,
            damager: None,
        }
    }

    pub fn by(mut self, damager: impl Into<PlayerName>) -> Self {
        self.damager = Some(Damager::Player(damager.into()));
        self
    }
}

/// The last hit a participant survived. Used to credit void pushes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DamageRecord {
    pub cause: DamageCause,
    pub damager: Option<PlayerName>,
}

/// How a participant was eliminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeathNotice {
    KilledBy { victim: PlayerName, killer: PlayerName },
    /// Attack with no player behind it.
    Killed { victim: PlayerName },
    Exploded { victim: PlayerName },
    Fell { victim: PlayerName },
    PushedIntoVoid { victim: PlayerName, attacker: PlayerName },
    Void { victim: PlayerName },
    Died { victim: PlayerName },
}

impl DeathNotice {
    pub fn victim(&self) -> &PlayerName {
        match self {
            Self::KilledBy { victim, .. }
            | Self::Killed { victim }
            | Self::Exploded { victim }
            | Self::Fell { victim }
            | Self::PushedIntoVoid { victim, .. }
            | Self::Void { victim }
            | Self::Died { victim } => victim,
        }
    }

    /// The player credited with the kill, if any.
    pub fn killer(&self) -> Option<&PlayerName> {
        match self {
            Self::KilledBy { killer, .. } => Some(killer),
            Self::PushedIntoVoid { attacker, .. } => Some(attacker),
            _ => None,
        }
    }

    /// The broadcast line. `left` is the number of players still alive,
    /// `slots` the arena capacity.
    pub fn render(&self, messages: &Messages, left: usize, slots: u32) -> String {
        match self {
            Self::KilledBy { victim, killer } => {
                render(&messages.death_killed, &[victim, killer, &left, &slots])
            }
            Self::Killed { victim } => {
                render(&messages.death_killed, &[victim, &"Player", &left, &slots])
            }
            Self::Exploded { victim } => render(&messages.death_exploded, &[victim, &left, &slots]),
            Self::Fell { victim } => render(&messages.death_fell, &[victim, &left, &slots]),
            Self::PushedIntoVoid { victim, attacker } => {
                render(&messages.death_void_player, &[victim, attacker, &left, &slots])
            }
            Self::Void { victim } => render(&messages.death_void, &[victim, &left, &slots]),
            Self::Died { victim } => render(&messages.death, &[victim, &left, &slots]),
        }
    }
}

/// What the host should do with a damage event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DamageVerdict {
    /// Not an arena participant; leave the event alone.
    Ignored,
    /// Let the damage through.
    Allowed,
    /// Cancel the damage.
    Cancelled,
    /// Cancel the damage; the participant was eliminated instead.
    Eliminated(DeathNotice),
}

impl DamageVerdict {
    /// Whether the host must cancel the event.
    pub fn cancels(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Eliminated(_))
    }
}

impl Arena {
    /// Resolves one damage event against a participant.
    pub fn on_damage(&mut self, event: &DamageEvent) -> DamageVerdict {
        let victim = &event.victim;
        if !self.in_game(victim, false) {
            return DamageVerdict::Ignored;
        }

        match self.phase {
            Phase::Setup => return DamageVerdict::Ignored,
            Phase::Lobby => {
                if event.cause == DamageCause::Void {
                    if let Some(lobby) = &self.config.lobby {
                        self.services.host.teleport(victim, lobby);
                    }
                }
                return DamageVerdict::Cancelled;
            }
            Phase::Restarting => return DamageVerdict::Cancelled,
            Phase::Active => {}
        }

        if event.cause == DamageCause::Fall
            && self.countdowns.game_time > self.config.game_time - CAGE_DROP_GRACE
        {
            return DamageVerdict::Cancelled;
        }

        let host = Arc::clone(&self.services.host);
        let damage = if event.cause == DamageCause::Void {
            host.max_health(victim)
        } else {
            event.damage
        };

        if host.health(victim) - damage > 0.0 {
            self.last_damage.insert(
                victim.clone(),
                DamageRecord {
                    cause: event.cause,
                    damager: event.damager.as_ref().and_then(Damager::player).cloned(),
                },
            );
            return DamageVerdict::Allowed;
        }

        DamageVerdict::Eliminated(self.eliminate(event))
    }

    fn eliminate(&mut self, event: &DamageEvent) -> DeathNotice {
        let victim = event.victim.clone();
        let left = self.roster.len().saturating_sub(1);
        self.services.hooks.on_death(&victim, &self.id);

        let notice = self.classify(event);
        if let Some(killer) = notice.killer().cloned() {
            self.credit_kill(&killer);
        }
        let line = notice.render(self.msg(), left, self.config.slots);
        self.broadcast(MessageKind::Chat, &line);

        let host = Arc::clone(&self.services.host);
        host.release_owned_projectiles(&victim);
        host.drop_inventory(&victim);

        self.roster.remove(&victim);
        self.last_damage.remove(&victim);
        self.spectators.insert(victim.clone());
        host.remove_scoreboard(&victim);

        host.remove_effects(&victim);
        host.clear_inventory(&victim);
        host.set_game_mode(&victim, GameMode::Spectator);
        host.set_flying(&victim, true);

        if let Some(vantage) = self.vantage_point(&victim) {
            host.teleport(&victim, &vantage);
        }
        host.give_item(&victim, NavItem::Leave);

        self.review_rewards(Some(&victim));

        info!(
            arena = %self.id,
            %victim,
            killer = ?notice.killer().map(PlayerName::as_str),
            left,
            "player eliminated"
        );
        notice
    }

    fn classify(&self, event: &DamageEvent) -> DeathNotice {
        let victim = event.victim.clone();
        match event.cause {
            DamageCause::Contact | DamageCause::EntityAttack => {
                match event.damager.as_ref().and_then(Damager::player) {
                    Some(killer) => DeathNotice::KilledBy {
                        victim,
                        killer: killer.clone(),
                    },
                    None => DeathNotice::Killed { victim },
                }
            }
            DamageCause::BlockExplosion => DeathNotice::Exploded { victim },
            DamageCause::Fall => DeathNotice::Fell { victim },
            DamageCause::Void => {
                let attacker = self
                    .last_damage
                    .get(&victim)
                    .and_then(|record| record.damager.as_ref())
                    .filter(|attacker| **attacker != victim && self.in_game(attacker, false))
                    .cloned();
                match attacker {
                    Some(attacker) => DeathNotice::PushedIntoVoid { victim, attacker },
                    None => DeathNotice::Void { victim },
                }
            }
            _ => DeathNotice::Died { victim },
        }
    }

    fn credit_kill(&mut self, killer: &PlayerName) {
        *self.kills.entry(killer.clone()).or_insert(0) += 1;
        self.services.hooks.on_kill(killer, &self.id);
    }

    /// Above the victim, at the height of the first spawn.
    fn vantage_point(&self, victim: &PlayerName) -> Option<skyforge_types::Location> {
        let at = self.services.host.position(victim)?;
        let height = self.config.spawn(1)?.y;
        self.in_world(Vec3::new(at.pos.x, height, at.pos.z))
    }
}
