//! On-disk arena records and settings.
//!
//! Records live in one directory, one `<arena>.json` file each, so
//! operators can copy or edit a single arena by hand. Settings are a single
//! JSON file; a missing file means "use the defaults".

use std::path::{Path, PathBuf};

use skyforge_arena::{ArenaConfig, GameSettings};
use skyforge_types::{ArenaId, Codec, JsonCodec};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::SkyforgeError;

const RECORD_EXTENSION: &str = "json";

/// A directory of arena records.
#[derive(Debug, Clone)]
pub struct ArenaStore {
    dir: PathBuf,
    codec: JsonCodec,
}

impl ArenaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            codec: JsonCodec,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, id: &ArenaId) -> PathBuf {
        self.dir.join(format!("{}.{RECORD_EXTENSION}", id.as_str()))
    }

    /// Loads every record in the directory, sorted by arena name.
    ///
    /// A missing directory yields no records. Files that fail to decode
    /// are logged and skipped so one broken record can't keep the other
    /// arenas down.
    pub async fn load_all(&self) -> Result<Vec<(ArenaId, ArenaConfig)>, SkyforgeError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(dir = %self.dir.display(), "no arena directory, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            let bytes = fs::read(&path).await?;
            match self.codec.decode::<ArenaConfig>(&bytes) {
                Ok(config) => records.push((ArenaId::from(name), config)),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable arena record"),
            }
        }

        records.sort_by(|(a, _), (b, _)| a.cmp(b));
        debug!(dir = %self.dir.display(), count = records.len(), "arena records loaded");
        Ok(records)
    }

    pub async fn save(&self, id: &ArenaId, config: &ArenaConfig) -> Result<(), SkyforgeError> {
        fs::create_dir_all(&self.dir).await?;
        let bytes = self.codec.encode(config)?;
        fs::write(self.path_of(id), bytes).await?;
        debug!(arena = %id, "arena record saved");
        Ok(())
    }

    pub async fn save_all<'a>(
        &self,
        records: impl IntoIterator<Item = (&'a ArenaId, &'a ArenaConfig)>,
    ) -> Result<(), SkyforgeError> {
        for (id, config) in records {
            self.save(id, config).await?;
        }
        Ok(())
    }

    /// Deletes a record. Deleting a missing record is not an error.
    pub async fn remove(&self, id: &ArenaId) -> Result<(), SkyforgeError> {
        match fs::remove_file(self.path_of(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Reads the plugin-wide settings. A missing file gives the defaults.
pub async fn load_settings(path: impl AsRef<Path>) -> Result<GameSettings, SkyforgeError> {
    let path = path.as_ref();
    match fs::read(path).await {
        Ok(bytes) => Ok(JsonCodec.decode(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no settings file, using defaults");
            Ok(GameSettings::default())
        }
        Err(e) => Err(e.into()),
    }
}
