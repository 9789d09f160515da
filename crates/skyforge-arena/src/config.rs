//! The persisted arena record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use skyforge_types::{Location, Vec3, WorldId};

use crate::ArenaError;
use crate::countdown::JOIN_LOCK_AT;

// ---------------------------------------------------------------------------
// ArenaConfig
// ---------------------------------------------------------------------------

/// One arena's record, as stored by the arena store.
///
/// Field names on the wire follow the record format operators already
/// edit by hand (`startTime`, `leavePos`, `pts`, ...). Every field has a
/// default, so an empty object `{}` is a valid (incomplete) record that
/// leaves the arena in `Setup`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArenaConfig {
    /// Name of the world the round is played in.
    pub level: Option<WorldId>,

    /// Player capacity. Also the number of spawn points required.
    pub slots: u32,

    /// Spawn points keyed `spawn-1` .. `spawn-N`.
    pub spawns: BTreeMap<String, Vec3>,

    /// Set once the record has passed [`validate`](Self::validate).
    pub enabled: bool,

    /// Sign that joins players when tapped. Stored as `[]` when unset.
    #[serde(rename = "joinsign", with = "join_sign_format")]
    pub join_sign: Option<Location>,

    /// Lobby countdown, in seconds.
    pub start_time: i32,

    /// Round length, in seconds.
    pub game_time: i32,

    /// Restart countdown, in seconds.
    pub restart_time: i32,

    /// Eliminated players stay as spectators instead of leaving.
    pub spectator_mode: bool,

    /// Where players are sent when they leave.
    pub leave_pos: Option<Location>,

    /// Sponge blocks roll lucky-block prizes when broken.
    pub lucky_blocks: bool,

    /// Coins paid to the winner.
    pub prize: u64,

    /// Console commands run for the winner; `{player}` is substituted.
    #[serde(rename = "prizecmds")]
    pub prize_commands: Vec<String>,

    /// Players needed before the lobby countdown runs.
    #[serde(rename = "pts")]
    pub players_to_start: u32,

    /// Holding position. When set, players wait here and only get a
    /// spawn slot five seconds before the round starts.
    pub lobby: Option<Location>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            level: None,
            slots: 12,
            spawns: BTreeMap::new(),
            enabled: false,
            join_sign: None,
            start_time: 30,
            game_time: 1200,
            restart_time: 10,
            spectator_mode: true,
            leave_pos: None,
            lucky_blocks: false,
            prize: 0,
            prize_commands: Vec::new(),
            players_to_start: 2,
            lobby: None,
        }
    }
}

impl ArenaConfig {
    /// Key of the given spawn slot (`spawn-3`).
    pub fn spawn_key(slot: u32) -> String {
        format!("spawn-{slot}")
    }

    /// Position of the given spawn slot, if configured.
    pub fn spawn(&self, slot: u32) -> Option<Vec3> {
        self.spawns.get(&Self::spawn_key(slot)).copied()
    }

    /// Checks every rule an arena must satisfy before it can be enabled.
    ///
    /// Does not check that the level exists on the host; the arena does
    /// that when it enables.
    ///
    /// # Errors
    /// Returns `ArenaError::ConfigInvalid` naming the first broken rule.
    pub fn validate(&self) -> Result<(), ArenaError> {
        let invalid = |reason: String| Err(ArenaError::ConfigInvalid(reason));

        if self.level.is_none() {
            return invalid("level is not set".into());
        }
        if self.slots == 0 {
            return invalid("slots must be positive".into());
        }
        if self.spawns.len() != self.slots as usize {
            return invalid(format!(
                "expected {} spawns, found {}",
                self.slots,
                self.spawns.len()
            ));
        }
        if let Some(missing) = (1..=self.slots).find(|slot| self.spawn(*slot).is_none()) {
            return invalid(format!("{} is missing", Self::spawn_key(missing)));
        }
        if self.players_to_start == 0 {
            return invalid("players needed to start must be positive".into());
        }
        if self.start_time <= JOIN_LOCK_AT {
            // joins close at this mark, so the lobby would never open
            return invalid(format!(
                "start time must be above {JOIN_LOCK_AT} seconds, got {}",
                self.start_time
            ));
        }
        if self.leave_pos.is_none() {
            return invalid("leave position is not set".into());
        }
        Ok(())
    }
}

/// `joinsign` is written as `[]` when unset. `null` is accepted too.
mod join_sign_format {
    use serde::de::{Error, IgnoredAny};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use skyforge_types::Location;

    pub fn serialize<S: Serializer>(value: &Option<Location>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(location) => location.serialize(s),
            None => s.collect_seq(std::iter::empty::<()>()),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Location>, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Set(Location),
            Other(Vec<IgnoredAny>),
        }

        match Option::<Wire>::deserialize(d)? {
            None => Ok(None),
            Some(Wire::Set(location)) => Ok(Some(location)),
            Some(Wire::Other(items)) if items.is_empty() => Ok(None),
            Some(Wire::Other(_)) => Err(D::Error::custom(
                "joinsign must be [\"x,y,z\", \"world\"] or []",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> ArenaConfig {
        let mut config = ArenaConfig {
            level: Some("islands".into()),
            slots: 2,
            leave_pos: Some(Location::new(Vec3::new(0.0, 70.0, 0.0), "hub")),
            ..ArenaConfig::default()
        };
        config.spawns.insert("spawn-1".into(), Vec3::new(10.0, 64.0, 10.0));
        config.spawns.insert("spawn-2".into(), Vec3::new(-10.0, 64.0, -10.0));
        config
    }

    #[test]
    fn test_defaults_match_basic_record() {
        let config = ArenaConfig::default();
        assert_eq!(config.slots, 12);
        assert_eq!(config.start_time, 30);
        assert_eq!(config.game_time, 1200);
        assert_eq!(config.restart_time, 10);
        assert_eq!(config.players_to_start, 2);
        assert!(config.spectator_mode);
        assert!(!config.enabled);
    }

    #[test]
    fn test_empty_object_is_default_record() {
        let config: ArenaConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ArenaConfig::default());
    }

    #[test]
    fn test_complete_record_validates() {
        assert!(complete().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_each_missing_piece() {
        let mut c = complete();
        c.level = None;
        assert!(matches!(c.validate(), Err(ArenaError::ConfigInvalid(_))));

        let mut c = complete();
        c.slots = 3;
        assert!(c.validate().is_err());

        let mut c = complete();
        c.spawns.remove("spawn-2");
        c.spawns.insert("spawn-7".into(), Vec3::new(0.0, 0.0, 0.0));
        let err = c.validate().unwrap_err().to_string();
        assert!(err.contains("spawn-2"), "{err}");

        let mut c = complete();
        c.players_to_start = 0;
        assert!(c.validate().is_err());

        let mut c = complete();
        c.leave_pos = None;
        assert!(c.validate().is_err());

        let mut c = complete();
        c.start_time = JOIN_LOCK_AT;
        let err = c.validate().unwrap_err().to_string();
        assert!(err.contains("start time"), "{err}");
        c.start_time = JOIN_LOCK_AT + 1;
        assert!(c.validate().is_ok());

        let mut c = complete();
        c.slots = 0;
        c.spawns.clear();
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_value(complete()).unwrap();
        for key in [
            "level", "slots", "spawns", "enabled", "joinsign", "startTime", "gameTime",
            "restartTime", "spectatorMode", "leavePos", "luckyBlocks", "prize", "prizecmds",
            "pts", "lobby",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["joinsign"], serde_json::json!([]));
        assert_eq!(json["leavePos"], serde_json::json!(["0,70,0", "hub"]));
        assert_eq!(json["spawns"]["spawn-1"], serde_json::json!("10,64,10"));
    }

    #[test]
    fn test_record_round_trips() {
        let mut config = complete();
        config.join_sign = Some(Location::new(Vec3::new(3.0, 71.0, -2.0), "hub"));
        config.lobby = Some(Location::new(Vec3::new(0.25, 80.0, 0.75), "waiting"));
        config.prize_commands = vec!["give {player} diamond 1".into(), "say gg".into()];
        config.prize = 250;

        let first = serde_json::to_string(&config).unwrap();
        let reloaded: ArenaConfig = serde_json::from_str(&first).unwrap();
        let second = serde_json::to_string(&reloaded).unwrap();

        assert_eq!(reloaded, config);
        assert_eq!(first, second);
    }

    #[test]
    fn test_spawn_order_in_source_is_irrelevant() {
        let a: ArenaConfig = serde_json::from_str(
            r#"{"spawns": {"spawn-2": "1,2,3", "spawn-1": "4,5,6"}}"#,
        )
        .unwrap();
        let b: ArenaConfig = serde_json::from_str(
            r#"{"spawns": {"spawn-1": "4,5,6", "spawn-2": "1,2,3"}}"#,
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_join_sign_accepts_null_and_rejects_junk() {
        let c: ArenaConfig = serde_json::from_str(r#"{"joinsign": null}"#).unwrap();
        assert_eq!(c.join_sign, None);

        assert!(serde_json::from_str::<ArenaConfig>(r#"{"joinsign": ["1,2,3"]}"#).is_err());
    }

    #[test]
    fn test_spawn_lookup() {
        let c = complete();
        assert_eq!(c.spawn(1), Some(Vec3::new(10.0, 64.0, 10.0)));
        assert_eq!(c.spawn(3), None);
        assert_eq!(ArenaConfig::spawn_key(12), "spawn-12");
    }
}
