//! Operator setup commands.
//!
//! Setup lines are parsed into [`SetupCommand`] and applied to one arena
//! with [`Arena::apply_setup`]. Positions come from where the operator is
//! standing (or the block they tapped for `joinsign`).

use std::fmt;
use std::str::FromStr;

use skyforge_types::{Location, Vec3, WorldId};
use tracing::info;

use crate::countdown::JOIN_LOCK_AT;
use crate::{Arena, ArenaConfig, ArenaError, Phase};

const USAGE: &str = "setup commands: slots <n>, level <name>, spawn <n>, joinsign, leavepos, \
starttime <s>, gametime <s>, restarttime <s>, lucky <bool>, spectator <bool>, prize <n>, \
addcmdprize <cmd>, rmcmdprize <cmd>, startplayers <n>, lobby, enable, savelevel";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupCommand {
    Slots(u32),
    Level(WorldId),
    Spawn(u32),
    JoinSign,
    LeavePos,
    StartTime(i32),
    GameTime(i32),
    RestartTime(i32),
    Lucky(bool),
    Spectator(bool),
    Prize(u64),
    /// The rest of the line, spaces included.
    AddPrizeCommand(String),
    RemovePrizeCommand(String),
    StartPlayers(u32),
    Lobby,
    Enable,
    SaveLevel,
}

impl SetupCommand {
    /// Parses one setup line, e.g. `spawn 3` or `addcmdprize give {player} diamond 1`.
    ///
    /// # Errors
    /// `InvalidSetup` with a usage hint for unknown commands or bad
    /// arguments.
    pub fn parse(line: &str) -> Result<Self, ArenaError> {
        let line = line.trim();
        let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let cmd = match name.to_ascii_lowercase().as_str() {
            "slots" => Self::Slots(number(name, rest)?),
            "level" => Self::Level(WorldId::from(word(name, rest)?)),
            "spawn" => Self::Spawn(number(name, rest)?),
            "joinsign" => Self::JoinSign,
            "leavepos" => Self::LeavePos,
            "starttime" => Self::StartTime(number(name, rest)?),
            "gametime" => Self::GameTime(number(name, rest)?),
            "restarttime" => Self::RestartTime(number(name, rest)?),
            "lucky" => Self::Lucky(number(name, rest)?),
            "spectator" => Self::Spectator(number(name, rest)?),
            "prize" => Self::Prize(number(name, rest)?),
            "addcmdprize" => Self::AddPrizeCommand(word(name, rest)?.to_string()),
            "rmcmdprize" => Self::RemovePrizeCommand(word(name, rest)?.to_string()),
            "startplayers" => Self::StartPlayers(number(name, rest)?),
            "lobby" => Self::Lobby,
            "enable" => Self::Enable,
            "savelevel" => Self::SaveLevel,
            _ => return Err(ArenaError::InvalidSetup(USAGE.to_string())),
        };
        Ok(cmd)
    }
}

fn word<'a>(name: &str, rest: &'a str) -> Result<&'a str, ArenaError> {
    if rest.is_empty() {
        Err(ArenaError::InvalidSetup(format!("usage: {name} <value>")))
    } else {
        Ok(rest)
    }
}

fn number<T: FromStr>(name: &str, rest: &str) -> Result<T, ArenaError> {
    word(name, rest)?
        .parse()
        .map_err(|_| ArenaError::InvalidSetup(format!("{name}: invalid value {rest:?}")))
}

impl FromStr for SetupCommand {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SetupCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slots(n) => write!(f, "slots {n}"),
            Self::Level(world) => write!(f, "level {world}"),
            Self::Spawn(n) => write!(f, "spawn {n}"),
            Self::JoinSign => f.write_str("joinsign"),
            Self::LeavePos => f.write_str("leavepos"),
            Self::StartTime(s) => write!(f, "starttime {s}"),
            Self::GameTime(s) => write!(f, "gametime {s}"),
            Self::RestartTime(s) => write!(f, "restarttime {s}"),
            Self::Lucky(on) => write!(f, "lucky {on}"),
            Self::Spectator(on) => write!(f, "spectator {on}"),
            Self::Prize(n) => write!(f, "prize {n}"),
            Self::AddPrizeCommand(cmd) => write!(f, "addcmdprize {cmd}"),
            Self::RemovePrizeCommand(cmd) => write!(f, "rmcmdprize {cmd}"),
            Self::StartPlayers(n) => write!(f, "startplayers {n}"),
            Self::Lobby => f.write_str("lobby"),
            Self::Enable => f.write_str("enable"),
            Self::SaveLevel => f.write_str("savelevel"),
        }
    }
}

/// Block corner of `pos`.
fn floored(pos: Vec3) -> Vec3 {
    Vec3::new(pos.x.floor(), pos.y.floor(), pos.z.floor())
}

impl Arena {
    /// Applies one setup command. `at` is the operator's position.
    ///
    /// Returns the confirmation line for the operator.
    ///
    /// # Errors
    /// `InvalidSetup` for out-of-range values, `ConfigInvalid` when
    /// `enable` finds an incomplete record.
    pub fn apply_setup(&mut self, cmd: SetupCommand, at: &Location) -> Result<String, ArenaError> {
        let reply = match &cmd {
            SetupCommand::Slots(n) => {
                if *n == 0 {
                    return Err(ArenaError::InvalidSetup("slots must be at least 1".into()));
                }
                self.config.slots = *n;
                format!("slots updated to {n}")
            }
            SetupCommand::Level(world) => {
                if !self.services.host.is_world_generated(world) {
                    return Err(ArenaError::InvalidSetup(format!("level {world} does not exist")));
                }
                self.config.level = Some(world.clone());
                format!("arena level updated to {world}")
            }
            SetupCommand::Spawn(n) => {
                if *n == 0 || *n > self.config.slots {
                    return Err(ArenaError::InvalidSetup(format!(
                        "spawn must be between 1 and {}",
                        self.config.slots
                    )));
                }
                self.config
                    .spawns
                    .insert(ArenaConfig::spawn_key(*n), floored(at.pos));
                format!("spawn {n} set to {}", floored(at.pos))
            }
            SetupCommand::JoinSign => {
                self.config.join_sign = Some(Location::new(floored(at.pos), at.world.clone()));
                "join sign updated".to_string()
            }
            SetupCommand::LeavePos => {
                self.config.leave_pos = Some(at.clone());
                "leave position updated".to_string()
            }
            SetupCommand::StartTime(s) => {
                if *s <= JOIN_LOCK_AT {
                    return Err(ArenaError::InvalidSetup(format!(
                        "start time must be above {JOIN_LOCK_AT} seconds"
                    )));
                }
                self.config.start_time = *s;
                if self.phase == Phase::Setup {
                    self.countdowns.start_time = *s;
                }
                format!("start time updated to {s}")
            }
            SetupCommand::GameTime(s) => {
                self.config.game_time = *s;
                if self.phase == Phase::Setup {
                    self.countdowns.game_time = *s;
                }
                format!("game time updated to {s}")
            }
            SetupCommand::RestartTime(s) => {
                self.config.restart_time = *s;
                if self.phase == Phase::Setup {
                    self.countdowns.restart_time = *s;
                }
                format!("restart time updated to {s}")
            }
            SetupCommand::Lucky(on) => {
                self.config.lucky_blocks = *on;
                format!("lucky blocks {}", if *on { "enabled" } else { "disabled" })
            }
            SetupCommand::Spectator(on) => {
                self.config.spectator_mode = *on;
                format!("spectator mode {}", if *on { "enabled" } else { "disabled" })
            }
            SetupCommand::Prize(n) => {
                self.config.prize = *n;
                format!("win prize updated to {n}")
            }
            SetupCommand::AddPrizeCommand(command) => {
                self.config.prize_commands.push(command.clone());
                format!("prize command added: {command}")
            }
            SetupCommand::RemovePrizeCommand(command) => {
                let before = self.config.prize_commands.len();
                self.config.prize_commands.retain(|c| c != command);
                if self.config.prize_commands.len() == before {
                    return Err(ArenaError::InvalidSetup(format!(
                        "prize command not found: {command}"
                    )));
                }
                format!("prize command removed: {command}")
            }
            SetupCommand::StartPlayers(n) => {
                if *n == 0 {
                    return Err(ArenaError::InvalidSetup(
                        "startplayers must be at least 1".into(),
                    ));
                }
                self.config.players_to_start = *n;
                format!("players to start updated to {n}")
            }
            SetupCommand::Lobby => {
                self.config.lobby = Some(at.clone());
                "waiting lobby updated".to_string()
            }
            SetupCommand::Enable => {
                if self.phase != Phase::Setup {
                    return Ok("arena is already enabled".to_string());
                }
                self.enable()?;
                if let Some(world) = &self.world {
                    self.services.map_reset.save_map(world);
                }
                "arena enabled".to_string()
            }
            SetupCommand::SaveLevel => {
                let (Some(_), Some(world)) = (&self.config.level, &self.world) else {
                    return Err(ArenaError::InvalidSetup(
                        "level must be set and loaded before saving".into(),
                    ));
                };
                self.services.map_reset.save_map(world);
                "level saved".to_string()
            }
        };

        info!(arena = %self.id, command = %cmd, "setup applied");
        Ok(reply)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_commands() {
        assert_eq!(SetupCommand::parse("slots 8").unwrap(), SetupCommand::Slots(8));
        assert_eq!(SetupCommand::parse("  SPAWN 3 ").unwrap(), SetupCommand::Spawn(3));
        assert_eq!(
            SetupCommand::parse("gametime 600").unwrap(),
            SetupCommand::GameTime(600)
        );
        assert_eq!(SetupCommand::parse("prize 250").unwrap(), SetupCommand::Prize(250));
    }

    #[test]
    fn test_parse_flags() {
        assert_eq!(SetupCommand::parse("lucky true").unwrap(), SetupCommand::Lucky(true));
        assert_eq!(
            SetupCommand::parse("spectator false").unwrap(),
            SetupCommand::Spectator(false)
        );
        assert!(SetupCommand::parse("lucky maybe").is_err());
    }

    #[test]
    fn test_parse_prize_command_keeps_rest_of_line() {
        let cmd: SetupCommand = "addcmdprize give {player} diamond 3".parse().unwrap();
        assert_eq!(
            cmd,
            SetupCommand::AddPrizeCommand("give {player} diamond 3".into())
        );
    }

    #[test]
    fn test_parse_bare_commands() {
        for (line, cmd) in [
            ("joinsign", SetupCommand::JoinSign),
            ("leavepos", SetupCommand::LeavePos),
            ("lobby", SetupCommand::Lobby),
            ("enable", SetupCommand::Enable),
            ("savelevel", SetupCommand::SaveLevel),
        ] {
            assert_eq!(SetupCommand::parse(line).unwrap(), cmd);
        }
    }

    #[test]
    fn test_parse_rejects_unknown_and_missing_args() {
        assert!(matches!(
            SetupCommand::parse("fly"),
            Err(ArenaError::InvalidSetup(msg)) if msg.starts_with("setup commands")
        ));
        assert!(SetupCommand::parse("slots").is_err());
        assert!(SetupCommand::parse("slots -1").is_err());
        assert!(SetupCommand::parse("level").is_err());
    }

    #[test]
    fn test_display_matches_parse() {
        for line in ["spawn 2", "level islands", "addcmdprize say hi", "enable"] {
            assert_eq!(SetupCommand::parse(line).unwrap().to_string(), line);
        }
    }

    #[test]
    fn test_floored_positions() {
        assert_eq!(floored(Vec3::new(3.7, 64.2, -1.5)), Vec3::new(3.0, 64.0, -2.0));
    }
}
