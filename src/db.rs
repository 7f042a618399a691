// 🗄️ Team Store - SQLite persistence + live grouped view + change brackets
//
// Mutations are staged in memory and written by `commit()` inside one
// SQLite transaction. Only after the transaction succeeds is the grouped
// view re-derived and the diff delivered to subscribers.

use crate::diff::{diff, ChangeBatch, ChangeSubscriber};
use crate::team::{NewTeam, Team, TeamId};
use crate::view::GroupedView;
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to open team store: {0}")]
    Open(#[source] rusqlite::Error),

    #[error("failed to read teams: {0}")]
    Query(#[source] rusqlite::Error),

    #[error("failed to commit changes: {0}")]
    Commit(#[source] rusqlite::Error),

    #[error("team {0} not found")]
    NotFound(TeamId),
}

/// A change staged for the next commit
#[derive(Debug, Clone, PartialEq, Eq)]
enum Mutation {
    Insert(NewTeam),
    IncrementWins(TeamId),
}

pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    // WAL for crash recovery; in-memory databases report "memory" and ignore it
    let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS teams (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            team_name TEXT,
            qualifying_zone TEXT,
            image_name TEXT,
            wins INTEGER NOT NULL DEFAULT 0,
            losses INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_teams_zone ON teams(qualifying_zone)",
        [],
    )?;

    Ok(())
}

/// Read every team in display order
pub fn get_all_teams(conn: &Connection) -> rusqlite::Result<Vec<Team>> {
    let mut stmt = conn.prepare(
        "SELECT id, team_name, qualifying_zone, image_name, wins, losses
         FROM teams
         ORDER BY qualifying_zone ASC, wins DESC, team_name ASC, id ASC",
    )?;

    let teams = stmt
        .query_map([], |row| {
            Ok(Team {
                id: row.get(0)?,
                team_name: row.get(1)?,
                qualifying_zone: row.get(2)?,
                image_name: row.get(3)?,
                wins: row.get(4)?,
                losses: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(teams)
}

pub fn count_teams(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM teams", [], |row| row.get(0))
}

pub struct TeamStore {
    conn: Connection,
    pending: Vec<Mutation>,
    snapshot: GroupedView,
    subscribers: Vec<Box<dyn ChangeSubscriber>>,
}

impl TeamStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(StoreError::Open)?;
        info!(path = %path.display(), "opened team store");
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::Open)?;
        Self::from_connection(conn)
    }

    /// Prepare the schema and run the initial query. Failure here is fatal for callers.
    pub fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        setup_database(&conn).map_err(StoreError::Open)?;
        let teams = get_all_teams(&conn).map_err(StoreError::Query)?;
        debug!(count = teams.len(), "initial fetch");

        Ok(TeamStore {
            conn,
            pending: Vec::new(),
            snapshot: GroupedView::build(teams),
            subscribers: Vec::new(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn count(&self) -> Result<i64, StoreError> {
        count_teams(&self.conn).map_err(StoreError::Query)
    }

    /// Current grouped view (as of the last successful commit)
    pub fn grouped_view(&self) -> &GroupedView {
        &self.snapshot
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn ChangeSubscriber>) {
        self.subscribers.push(subscriber);
    }

    // ========================================================================
    // STAGING
    // ========================================================================

    pub fn insert(&mut self, team: NewTeam) {
        self.pending.push(Mutation::Insert(team));
    }

    pub fn increment_wins(&mut self, id: TeamId) {
        self.pending.push(Mutation::IncrementWins(id));
    }

    pub fn has_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drop everything staged since the last commit
    pub fn rollback(&mut self) {
        if !self.pending.is_empty() {
            debug!(discarded = self.pending.len(), "rolled back staged changes");
        }
        self.pending.clear();
    }

    // ========================================================================
    // COMMIT
    // ========================================================================

    /// Write all staged mutations atomically, then notify subscribers.
    ///
    /// On failure nothing is written, the staged mutations are discarded and
    /// no subscriber hears about it.
    pub fn commit(&mut self) -> Result<ChangeBatch, StoreError> {
        if self.pending.is_empty() {
            return Ok(ChangeBatch::default());
        }

        let pending = std::mem::take(&mut self.pending);
        if let Err(err) = write_all(&mut self.conn, &pending) {
            warn!(error = %err, staged = pending.len(), "commit failed, nothing written");
            return Err(err);
        }

        let teams = get_all_teams(&self.conn).map_err(StoreError::Query)?;
        let next = GroupedView::build(teams);
        let batch = diff(&self.snapshot, &next);
        self.snapshot = next;

        info!(
            mutations = pending.len(),
            events = batch.len(),
            "committed team changes"
        );
        for event in batch.iter() {
            debug!(%event, "change");
        }

        for subscriber in self.subscribers.iter_mut() {
            batch.deliver(subscriber.as_mut());
        }

        Ok(batch)
    }
}

fn write_all(conn: &mut Connection, pending: &[Mutation]) -> Result<(), StoreError> {
    // dropping the transaction without commit rolls it back
    let tx = conn.transaction().map_err(StoreError::Commit)?;

    for mutation in pending {
        match mutation {
            Mutation::Insert(team) => {
                tx.execute(
                    "INSERT INTO teams (team_name, qualifying_zone, image_name, wins, losses)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        team.team_name,
                        team.qualifying_zone,
                        team.image_name,
                        team.wins,
                        team.losses,
                    ],
                )
                .map_err(StoreError::Commit)?;
            }
            Mutation::IncrementWins(id) => {
                let changed = tx
                    .execute(
                        "UPDATE teams SET wins = MIN(wins + 1, 2147483647) WHERE id = ?1",
                        params![id],
                    )
                    .map_err(StoreError::Commit)?;
                if changed == 0 {
                    return Err(StoreError::NotFound(*id));
                }
            }
        }
    }

    tx.commit().map_err(StoreError::Commit)
}
