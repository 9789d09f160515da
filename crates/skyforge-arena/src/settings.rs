//! Plugin-wide game settings shared by every arena.
//!
//! Loaded once (see `skyforge::store::load_settings`) and handed to every
//! arena behind an `Arc`. Every section is optional in the file; missing
//! sections fall back to their defaults.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Phase;

// ---------------------------------------------------------------------------
// GameSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GameSettings {
    pub sounds: SoundSettings,
    pub cage: CagePolicy,
    pub review_form: ReviewFormSettings,
    pub prize: PrizeSettings,
    pub scoreboard: ScoreboardSettings,
    pub transfer: TransferSettings,
    pub join_sign: JoinSignSettings,
    pub chat: ChatSettings,
    pub messages: Messages,
}

// ---------------------------------------------------------------------------
// Sounds
// ---------------------------------------------------------------------------

/// The sounds an arena can play. Names are resolved when the settings are
/// parsed, so a typo fails loading instead of failing every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sound {
    Click,
    Pop,
    Orb,
    Anvil,
    Launch,
    BlazeShoot,
    Door,
    Ghast,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SoundSettings {
    pub enabled: bool,
    /// Played to every participant when the round starts.
    pub start: Sound,
    /// Played every second of the lobby countdown.
    pub start_tick: Sound,
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            start: Sound::Anvil,
            start_tick: Sound::Click,
        }
    }
}

// ---------------------------------------------------------------------------
// Cages
// ---------------------------------------------------------------------------

/// What happens to the block under each player when the round starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CagePolicy {
    /// Leave the map alone.
    Disabled,
    /// Always remove the block below.
    Enable,
    /// Remove the block below only if it is glass.
    #[default]
    Detect,
}

// ---------------------------------------------------------------------------
// Rewards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewFormSettings {
    pub enabled: bool,
}

impl Default for ReviewFormSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Coins granted by the end-of-round review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PrizeSettings {
    pub participation: u64,
    pub per_kill: u64,
    pub win: u64,
}

impl Default for PrizeSettings {
    fn default() -> Self {
        Self {
            participation: 10,
            per_kill: 5,
            win: 50,
        }
    }
}

// ---------------------------------------------------------------------------
// Scoreboard
// ---------------------------------------------------------------------------

/// Scoreboard templates, one per phase.
///
/// Placeholders: `{%line}` (line break), `{%players}`, `{%maxPlayers}`,
/// `{%kit}`, `{%neededPlayers}`, `{%time}`, `{%map}`, `{%kills}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreboardSettings {
    pub enabled: bool,
    #[serde(rename = "format.waiting")]
    pub waiting: String,
    #[serde(rename = "format.starting")]
    pub starting: String,
    #[serde(rename = "format.ingame")]
    pub ingame: String,
    #[serde(rename = "format.restart")]
    pub restart: String,
}

impl Default for ScoreboardSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            waiting: "Map: {%map}{%line}Players: {%players}/{%maxPlayers}{%line}\
                      Needed: {%neededPlayers}{%line}Kit: {%kit}"
                .into(),
            starting: "Map: {%map}{%line}Players: {%players}/{%maxPlayers}{%line}\
                       Starting in {%time}{%line}Kit: {%kit}"
                .into(),
            ingame: "Map: {%map}{%line}Alive: {%players}/{%maxPlayers}{%line}\
                     Time: {%time}{%line}Kills: {%kills}"
                .into(),
            restart: "Map: {%map}{%line}Restarting in {%time}{%line}Kills: {%kills}".into(),
        }
    }
}

/// Values substituted into a scoreboard template.
#[derive(Debug, Clone)]
pub struct BoardVars<'a> {
    pub players: usize,
    pub max_players: u32,
    pub kit: String,
    pub needed_players: u32,
    pub time: String,
    pub map: &'a str,
    pub kills: u32,
}

impl ScoreboardSettings {
    /// The template for a phase. In the lobby the `starting` board is used
    /// once enough players are present.
    pub fn template(&self, phase: Phase, threshold_met: bool) -> &str {
        match phase {
            Phase::Setup | Phase::Lobby if threshold_met => &self.starting,
            Phase::Setup | Phase::Lobby => &self.waiting,
            Phase::Active => &self.ingame,
            Phase::Restarting => &self.restart,
        }
    }

    pub fn render(template: &str, vars: &BoardVars<'_>) -> String {
        substitute(template, |key| {
            let value = match key {
                "%line" => "\n".to_string(),
                "%players" => vars.players.to_string(),
                "%maxPlayers" => vars.max_players.to_string(),
                "%kit" => vars.kit.clone(),
                "%neededPlayers" => vars.needed_players.to_string(),
                "%time" => vars.time.clone(),
                "%map" => vars.map.to_string(),
                "%kills" => vars.kills.to_string(),
                _ => return None,
            };
            Some(value)
        })
    }
}

// ---------------------------------------------------------------------------
// Transfer, join sign, chat
// ---------------------------------------------------------------------------

/// Cross-server transfer on leave (proxy networks).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TransferSettings {
    pub enabled: bool,
    pub lobby_server: String,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            lobby_server: "lobby".into(),
        }
    }
}

/// Join sign text. With `custom` off the built-in layout is used; with it
/// on, `lines` are rendered with `%phase`, `%ingame`, `%max`, `%map`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinSignSettings {
    pub custom: bool,
    pub lines: [String; 4],
}

impl Default for JoinSignSettings {
    fn default() -> Self {
        Self {
            custom: false,
            lines: [
                "SkyWars".into(),
                "[ %ingame / %max ]".into(),
                "%phase".into(),
                "Map: %map".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Replace host chat with the arena-local format.
    pub custom: bool,
    /// `%player` and `%message` are substituted.
    pub format: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            custom: false,
            format: "[%player] %message".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// The message catalogue. `{0}`, `{1}`, ... are positional placeholders
/// filled by [`render`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Messages {
    /// `{0}` player, `{1}` players, `{2}` slots.
    pub join: String,
    pub join_setup: String,
    pub join_in_game: String,
    pub join_full: String,
    pub join_already: String,
    pub join_starting: String,
    pub sign_in_game: String,
    pub sign_restarting: String,
    /// `{0}` players, `{1}` slots, `{2}` time left, `{3}` players needed.
    pub starting: String,
    /// Same placeholders as `starting`.
    pub waiting: String,
    /// `{0}` players alive, `{1}` time left.
    pub in_game: String,
    pub start_title: String,
    pub win_title: String,
    /// `{0}` winner, `{1}` map.
    pub win_broadcast: String,
    /// `{0}` victim, `{1}` killer, `{2}` players left, `{3}` slots.
    pub death_killed: String,
    /// `{0}` victim, `{1}` players left, `{2}` slots.
    pub death_exploded: String,
    pub death_fell: String,
    /// `{0}` victim, `{1}` attacker, `{2}` players left, `{3}` slots.
    pub death_void_player: String,
    pub death_void: String,
    pub death: String,
    pub quit: String,
    pub refill_soon: String,
    pub refill_imminent: String,
    pub refilled: String,
    /// `{0}` seconds.
    pub restart_tip: String,
    pub all_full: String,
    pub other_arenas_full: String,
    pub already_here: String,
    pub leave_confirm: String,
    pub left_game: String,
    pub left_arena: String,
    pub lucky: String,
    pub unlucky: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            join: "{0} joined the game. [{1}/{2}]".into(),
            join_setup: "Arena is under setup!".into(),
            join_in_game: "Arena is already in game!".into(),
            join_full: "Arena is full!".into(),
            join_already: "You are already in game!".into(),
            join_starting: "Arena is starting...".into(),
            sign_in_game: "Arena is in game, try another one.".into(),
            sign_restarting: "Arena is restarting, wait a few seconds.".into(),
            starting: "Starting in {2} [{0}/{1}]".into(),
            waiting: "Waiting for players [{0}/{1}], {3} needed".into(),
            in_game: "Alive: {0} | Time left: {1}".into(),
            start_title: "Game started!".into(),
            win_title: "You won!".into(),
            win_broadcast: "{0} won the game on {1}!".into(),
            death_killed: "{0} was killed by {1}. [{2}/{3}]".into(),
            death_exploded: "{0} exploded. [{1}/{2}]".into(),
            death_fell: "{0} fell from a high place. [{1}/{2}]".into(),
            death_void_player: "{0} was pushed into the void by {1}. [{2}/{3}]".into(),
            death_void: "{0} fell into the void. [{1}/{2}]".into(),
            death: "{0} died. [{1}/{2}]".into(),
            quit: "You have successfully left the arena.".into(),
            refill_soon: "All chests will be refilled in 5 min.".into(),
            refill_imminent: "All chests will be refilled in 1 min.".into(),
            refilled: "All chests have been refilled.".into(),
            restart_tip: "Restarting in {0} sec.".into(),
            all_full: "All the arenas are already full.".into(),
            other_arenas_full: "All the other arenas are full.".into(),
            already_here: "You are already in this arena!".into(),
            leave_confirm: "Do you really want to leave the game? Select the bed again.".into(),
            left_game: "You have successfully left the game.".into(),
            left_arena: "You have successfully left the arena!".into(),
            lucky: "Lucky!".into(),
            unlucky: "Unlucky!".into(),
        }
    }
}

/// Fills `{0}`, `{1}`, ... in `template` with `args`.
///
/// ```
/// use skyforge_arena::settings::render;
///
/// assert_eq!(render("{0} won on {1}", &[&"Alex", &"islands"]), "Alex won on islands");
/// ```
pub fn render(template: &str, args: &[&dyn fmt::Display]) -> String {
    substitute(template, |key| {
        if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        key.parse::<usize>()
            .ok()
            .and_then(|i| args.get(i))
            .map(|arg| arg.to_string())
    })
}

/// Replaces every `{key}` that `lookup` knows in one pass over
/// `template`. Substituted text is never scanned again.
fn substitute(template: &str, mut lookup: impl FnMut(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let found = after
            .find('}')
            .and_then(|close| lookup(&after[..close]).map(|value| (close, value)));
        match found {
            Some((close, value)) => {
                out.push_str(&value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Formats a countdown as `MM:SS`. Negative values show as `00:00`.
pub fn format_clock(seconds: i32) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
