// 🌱 Seed Import - one-time bootstrap of an empty store
//
// Bundled asset is compiled in, so a missing file can only come from an
// explicit override path. Malformed data aborts the run with a log line
// before anything is staged.

use crate::db::{StoreError, TeamStore};
use crate::team::NewTeam;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Seed data shipped with the binary
pub const BUNDLED_SEED: &str = include_str!("../assets/seed.json");

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedEntry {
    pub team_name: String,
    pub qualifying_zone: String,
    pub image_name: String,
    pub wins: i32,
}

impl From<SeedEntry> for NewTeam {
    fn from(entry: SeedEntry) -> Self {
        NewTeam {
            team_name: Some(entry.team_name),
            qualifying_zone: Some(entry.qualifying_zone),
            image_name: Some(entry.image_name),
            wins: entry.wins,
            losses: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSource {
    Bundled,
    File(PathBuf),
}

impl SeedSource {
    pub fn from_override(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => SeedSource::File(path),
            None => SeedSource::Bundled,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("seed file {path} is missing: {source}")]
    Missing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Store already held this many teams
    Skipped(i64),
    Imported(usize),
    /// Seed data could not be parsed; nothing was written
    Aborted(String),
}

pub fn load_seed(path: &Path) -> Result<String, SeedError> {
    std::fs::read_to_string(path).map_err(|source| SeedError::Missing {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_seed(json: &str) -> Result<Vec<SeedEntry>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Import the seed only when the store has no teams at all
pub fn import_if_empty(store: &mut TeamStore, source: &SeedSource) -> Result<ImportOutcome, SeedError> {
    let existing = store.count()?;
    if existing != 0 {
        info!(existing, "store already populated, skipping seed import");
        return Ok(ImportOutcome::Skipped(existing));
    }

    match source {
        SeedSource::Bundled => import_json(store, BUNDLED_SEED),
        SeedSource::File(path) => {
            let json = load_seed(path)?;
            import_json(store, &json)
        }
    }
}

/// Stage one team per entry and commit them as a single batch
pub fn import_json(store: &mut TeamStore, json: &str) -> Result<ImportOutcome, SeedError> {
    let entries = match parse_seed(json) {
        Ok(entries) => entries,
        Err(err) => {
            error!(error = %err, "Error importing teams");
            return Ok(ImportOutcome::Aborted(err.to_string()));
        }
    };

    let count = entries.len();
    for entry in entries {
        store.insert(entry.into());
    }
    store.commit()?;

    info!("Imported {} teams", count);
    Ok(ImportOutcome::Imported(count))
}
