//! Arena rules for Skyforge.
//!
//! An arena runs timed elimination rounds on one map: players gather in a
//! lobby, a countdown starts once enough of them are present, the round
//! runs until one participant is left or time is up, and a restart phase
//! pays out rewards and restores the map.
//!
//! # Key types
//!
//! - [`Arena`]: one venue. Driven by [`Arena::tick`] and the host event
//!   handlers.
//! - [`ArenaManager`]: every arena on the server, plus quick-join selection.
//! - [`Phase`]: `Setup → Lobby → Active → Restarting → Lobby`.
//! - [`Roster`]: the ordered participant list.
//! - [`ArenaConfig`]: the persisted arena record.
//! - [`Services`]: the host and other collaborators an arena talks to.
//!
//! Nothing in this crate is async. The runtime in the `skyforge` crate
//! owns the manager inside a single task and calls into it.

mod arena;
mod config;
pub mod countdown;
mod elimination;
mod error;
mod events;
mod manager;
mod phase;
mod reward;
mod roster;
mod scheduler;
pub mod services;
pub mod settings;
mod setup;

pub use arena::{Arena, DisconnectOptions};
pub use config::ArenaConfig;
pub use elimination::{DamageEvent, DamageRecord, DamageVerdict, DeathNotice};
pub use error::ArenaError;
pub use events::{EventOutcome, HostEvent, ItemUse};
pub use manager::{ArenaInfo, ArenaManager};
pub use phase::Phase;
pub use reward::RewardSummary;
pub use roster::{Roster, RosterKey};
pub use services::{HostError, Services};
pub use settings::GameSettings;
pub use setup::SetupCommand;
