//! # Skyforge
//!
//! Timed elimination arenas for shared game hosts.
//!
//! Players join an arena's lobby, a countdown starts once enough of them
//! are waiting, and the round runs until one participant is left or time
//! runs out. The restart phase pays out rewards, sends everyone out and
//! restores the map for the next round.
//!
//! This crate ties the layers together:
//!
//! - [`skyforge_arena`]: the arena rules, driven by ticks and host events.
//! - [`skyforge_clock`]: the tick source.
//! - [`runtime`]: the task that owns the arenas and serialises events and
//!   ticks.
//! - [`store`]: arena records and settings on disk.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use skyforge::prelude::*;
//!
//! # async fn run(host: Arc<dyn skyforge::services::Host>) -> Result<(), SkyforgeError> {
//! skyforge::init_tracing();
//!
//! let settings = skyforge::store::load_settings("skyforge.json").await?;
//! let manager = ArenaManager::new(Arc::new(settings), Services::new(host));
//! let store = ArenaStore::new("arenas");
//! let runtime = skyforge::runtime::boot(manager, &store, RuntimeConfig::default()).await?;
//!
//! runtime.join_random(PlayerName::from("Alex")).await?;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod runtime;
pub mod store;

pub use error::SkyforgeError;
pub use skyforge_arena::{services, settings};

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` fmt subscriber filtered by `RUST_LOG`, defaulting
/// to `info`. Does nothing if a subscriber is already installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub mod prelude {
    pub use crate::SkyforgeError;
    pub use crate::runtime::{RuntimeConfig, RuntimeHandle};
    pub use crate::store::ArenaStore;
    pub use skyforge_arena::{
        Arena, ArenaConfig, ArenaError, ArenaInfo, ArenaManager, DamageEvent, DamageVerdict,
        EventOutcome, GameSettings, HostEvent, Phase, Services, SetupCommand,
    };
    pub use skyforge_clock::ClockConfig;
    pub use skyforge_types::{ArenaId, DamageCause, Location, PlayerName, Vec3, WorldId};
}
