//! The arena runtime: one Tokio task that owns every arena.
//!
//! Host events and operator commands arrive through an mpsc channel and
//! are answered over oneshot reply channels. Clock ticks come from a
//! [`RoundClock`] polled in the same `select!` loop, so an event and a
//! tick never touch the arenas at the same time.

use skyforge_arena::{
    ArenaConfig, ArenaError, ArenaInfo, ArenaManager, EventOutcome, HostEvent, SetupCommand,
};
use skyforge_clock::{ClockConfig, RoundClock};
use skyforge_types::{ArenaId, Location, PlayerName};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use crate::store::ArenaStore;
use crate::SkyforgeError;

/// Default command channel size.
const DEFAULT_CHANNEL_SIZE: usize = 256;

/// Settings for [`spawn`].
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub clock: ClockConfig,
    /// Bound of the command channel. Senders wait when it is full.
    pub channel_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            clock: ClockConfig::every_second(),
            channel_size: DEFAULT_CHANNEL_SIZE,
        }
    }
}

type Reply<T> = oneshot::Sender<T>;

/// Arena records as `(name, record)` pairs, sorted by name.
pub type Records = Vec<(ArenaId, ArenaConfig)>;

/// Commands accepted by the runtime.
enum ArenaCommand {
    Create {
        id: ArenaId,
        config: ArenaConfig,
        reply: Reply<Result<ArenaInfo, ArenaError>>,
    },
    Remove {
        id: ArenaId,
        reply: Reply<Result<ArenaConfig, ArenaError>>,
    },
    Join {
        player: PlayerName,
        arena: ArenaId,
        reply: Reply<Result<(), ArenaError>>,
    },
    JoinRandom {
        player: PlayerName,
        reply: Reply<Result<ArenaId, ArenaError>>,
    },
    Leave {
        player: PlayerName,
        reply: Reply<Result<ArenaId, ArenaError>>,
    },
    ChangeMap {
        player: PlayerName,
        arena: ArenaId,
        reply: Reply<Result<(), ArenaError>>,
    },
    ConfirmReview {
        player: PlayerName,
        reply: Reply<Result<ArenaId, ArenaError>>,
    },
    ForceStart {
        arena: ArenaId,
        reply: Reply<Result<(), ArenaError>>,
    },
    Setup {
        arena: ArenaId,
        command: SetupCommand,
        at: Location,
        reply: Reply<Result<String, ArenaError>>,
    },
    Event {
        event: HostEvent,
        reply: Reply<EventOutcome>,
    },
    List {
        reply: Reply<Vec<ArenaInfo>>,
    },
    Records {
        reply: Reply<Records>,
    },
    /// Stops the runtime and hands back the final records.
    Shutdown {
        reply: Reply<Records>,
    },
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Handle to the running arena runtime.
///
/// Cheap to clone; every clone talks to the same task. All methods fail
/// with [`SkyforgeError::Unavailable`] once the runtime has stopped.
#[derive(Clone)]
pub struct RuntimeHandle {
    sender: mpsc::Sender<ArenaCommand>,
}

impl RuntimeHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> ArenaCommand,
    ) -> Result<T, SkyforgeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .await
            .map_err(|_| SkyforgeError::Unavailable)?;
        reply_rx.await.map_err(|_| SkyforgeError::Unavailable)
    }

    pub async fn create_arena(
        &self,
        id: ArenaId,
        config: ArenaConfig,
    ) -> Result<ArenaInfo, SkyforgeError> {
        Ok(self
            .request(|reply| ArenaCommand::Create { id, config, reply })
            .await??)
    }

    pub async fn remove_arena(&self, id: ArenaId) -> Result<ArenaConfig, SkyforgeError> {
        Ok(self
            .request(|reply| ArenaCommand::Remove { id, reply })
            .await??)
    }

    pub async fn join(&self, player: PlayerName, arena: ArenaId) -> Result<(), SkyforgeError> {
        Ok(self
            .request(|reply| ArenaCommand::Join {
                player,
                arena,
                reply,
            })
            .await??)
    }

    pub async fn join_random(&self, player: PlayerName) -> Result<ArenaId, SkyforgeError> {
        Ok(self
            .request(|reply| ArenaCommand::JoinRandom { player, reply })
            .await??)
    }

    pub async fn leave(&self, player: PlayerName) -> Result<ArenaId, SkyforgeError> {
        Ok(self
            .request(|reply| ArenaCommand::Leave { player, reply })
            .await??)
    }

    pub async fn change_map(&self, player: PlayerName, arena: ArenaId) -> Result<(), SkyforgeError> {
        Ok(self
            .request(|reply| ArenaCommand::ChangeMap {
                player,
                arena,
                reply,
            })
            .await??)
    }

    pub async fn confirm_review(&self, player: PlayerName) -> Result<ArenaId, SkyforgeError> {
        Ok(self
            .request(|reply| ArenaCommand::ConfirmReview { player, reply })
            .await??)
    }

    pub async fn force_start(&self, arena: ArenaId) -> Result<(), SkyforgeError> {
        Ok(self
            .request(|reply| ArenaCommand::ForceStart { arena, reply })
            .await??)
    }

    /// Parses and applies one setup line for `arena`.
    pub async fn setup(
        &self,
        arena: ArenaId,
        line: &str,
        at: Location,
    ) -> Result<String, SkyforgeError> {
        let command = SetupCommand::parse(line)?;
        Ok(self
            .request(|reply| ArenaCommand::Setup {
                arena,
                command,
                at,
                reply,
            })
            .await??)
    }

    /// Forwards a host event and returns what the host should do with it.
    pub async fn event(&self, event: HostEvent) -> Result<EventOutcome, SkyforgeError> {
        self.request(|reply| ArenaCommand::Event { event, reply })
            .await
    }

    pub async fn list(&self) -> Result<Vec<ArenaInfo>, SkyforgeError> {
        self.request(|reply| ArenaCommand::List { reply }).await
    }

    pub async fn records(&self) -> Result<Records, SkyforgeError> {
        self.request(|reply| ArenaCommand::Records { reply }).await
    }

    /// Stops the runtime. Returns the records as they were at shutdown.
    pub async fn shutdown(&self) -> Result<Records, SkyforgeError> {
        self.request(|reply| ArenaCommand::Shutdown { reply }).await
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

struct RuntimeActor {
    manager: ArenaManager,
    clock: RoundClock,
    receiver: mpsc::Receiver<ArenaCommand>,
}

impl RuntimeActor {
    async fn run(mut self) {
        info!(arenas = self.manager.len(), "arena runtime started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else {
                        debug!("all runtime handles dropped");
                        break;
                    };
                    if !self.handle(cmd) {
                        break;
                    }
                }
                tick = self.clock.next_tick() => {
                    trace!(tick = tick.seq, late = tick.late, "arena tick");
                    self.manager.tick_all();
                    self.clock.record_tick_end();
                }
            }
        }

        info!(ticks = self.clock.ticks(), "arena runtime stopped");
    }

    /// Handles one command. Returns `false` on shutdown.
    fn handle(&mut self, cmd: ArenaCommand) -> bool {
        let manager = &mut self.manager;
        match cmd {
            ArenaCommand::Create { id, config, reply } => {
                let _ = reply.send(manager.create_arena(id, config).map(ArenaInfo::of));
            }
            ArenaCommand::Remove { id, reply } => {
                let _ = reply.send(manager.remove_arena(&id));
            }
            ArenaCommand::Join {
                player,
                arena,
                reply,
            } => {
                let result = manager.join(&player, &arena, false);
                let _ = reply.send(logged("join", &player, result));
            }
            ArenaCommand::JoinRandom { player, reply } => {
                let result = manager.join_random(&player);
                let _ = reply.send(logged("join_random", &player, result));
            }
            ArenaCommand::Leave { player, reply } => {
                let result = manager.leave(&player);
                let _ = reply.send(logged("leave", &player, result));
            }
            ArenaCommand::ChangeMap {
                player,
                arena,
                reply,
            } => {
                let result = manager.change_map(&player, &arena);
                let _ = reply.send(logged("change_map", &player, result));
            }
            ArenaCommand::ConfirmReview { player, reply } => {
                let result = manager.confirm_review(&player);
                let _ = reply.send(logged("confirm_review", &player, result));
            }
            ArenaCommand::ForceStart { arena, reply } => {
                let _ = reply.send(manager.force_start(&arena));
            }
            ArenaCommand::Setup {
                arena,
                command,
                at,
                reply,
            } => {
                let _ = reply.send(manager.apply_setup(&arena, command, &at));
            }
            ArenaCommand::Event { event, reply } => {
                let _ = reply.send(manager.dispatch(&event));
            }
            ArenaCommand::List { reply } => {
                let _ = reply.send(manager.list());
            }
            ArenaCommand::Records { reply } => {
                let _ = reply.send(records_of(manager));
            }
            ArenaCommand::Shutdown { reply } => {
                info!("arena runtime shutting down");
                let _ = reply.send(records_of(manager));
                return false;
            }
        }
        true
    }
}

/// Logs a failed player request. Duplicate and unknown roster operations
/// are routine, so they stay at debug.
fn logged<T>(
    op: &'static str,
    player: &PlayerName,
    result: Result<T, ArenaError>,
) -> Result<T, ArenaError> {
    if let Err(e) = &result {
        if e.is_benign() {
            debug!(op, %player, error = %e, "player request ignored");
        } else {
            warn!(op, %player, error = %e, "player request rejected");
        }
    }
    result
}

fn records_of(manager: &ArenaManager) -> Records {
    manager
        .records()
        .map(|(id, config)| (id.clone(), config.clone()))
        .collect()
}

/// Spawns the runtime task around `manager` and returns its handle.
pub fn spawn(manager: ArenaManager, config: RuntimeConfig) -> RuntimeHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));
    let actor = RuntimeActor {
        manager,
        clock: RoundClock::new(config.clock),
        receiver: rx,
    };
    tokio::spawn(actor.run());
    RuntimeHandle { sender: tx }
}

/// Creates an arena for every record in `store` and spawns the runtime.
///
/// Records that fail to register (duplicate names) are logged and
/// skipped; incomplete records still register and wait in setup.
pub async fn boot(
    mut manager: ArenaManager,
    store: &ArenaStore,
    config: RuntimeConfig,
) -> Result<RuntimeHandle, SkyforgeError> {
    for (id, record) in store.load_all().await? {
        if let Err(e) = manager.create_arena(id.clone(), record) {
            warn!(arena = %id, error = %e, "arena record not registered");
        }
    }
    Ok(spawn(manager, config))
}
