use std::path::{Path, PathBuf};

use chrono::Utc;
use log::info;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::{LeagueError, Result};
use crate::model::{Match, MatchOutcome, NewMatch, Team, WeekResult};

const APP_DIR: &str = "league_sim";
const DB_FILE: &str = "league.sqlite";

pub const DEFAULT_TEAMS: [&str; 4] = ["Manchester City", "Liverpool", "Arsenal", "Chelsea"];
pub const SEED_WEEK: u32 = 4;

/// Persistence boundary for teams and match results.
///
/// `replace_week` is the only way a whole week is rewritten and must be
/// atomic: readers never see a half-replaced week.
pub trait ResultStore {
    fn list_teams(&self) -> Result<Vec<Team>>;
    fn add_team(&mut self, name: &str) -> Result<Team>;
    fn list_matches(&self, week: Option<u32>) -> Result<Vec<Match>>;
    fn find_match(&self, id: u32) -> Result<Option<Match>>;
    fn max_played_week(&self) -> Result<Option<u32>>;
    fn replace_week(&mut self, week: u32, matches: &[NewMatch]) -> Result<Vec<Match>>;
    fn clear_week(&mut self, week: u32) -> Result<usize>;
    fn delete_after_week(&mut self, week: u32) -> Result<usize>;
    fn insert_match(&mut self, m: &NewMatch) -> Result<Match>;
    fn update_score(&mut self, id: u32, home_score: u32, away_score: u32) -> Result<Match>;
    fn find_last_meeting(&self, team_a: u32, team_b: u32) -> Result<Option<Match>>;
    fn week_results(&self, week: u32) -> Result<Vec<WeekResult>>;
}

pub struct SqliteStore {
    conn: Connection,
}

pub fn default_db_path() -> PathBuf {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return PathBuf::from(base).join(APP_DIR).join(DB_FILE);
        }
    }
    match std::env::var("HOME") {
        Ok(home) if !home.trim().is_empty() => PathBuf::from(home)
            .join(".cache")
            .join(APP_DIR)
            .join(DB_FILE),
        _ => PathBuf::from(DB_FILE),
    }
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path).map_err(|err| {
            LeagueError::store(format!("open sqlite db {}: {err}", path.display()))
        })?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Inserts the four default clubs when the team table is empty and the
    /// opening week-4 results when that week has no matches.
    pub fn seed_defaults(&mut self) -> Result<()> {
        if self.list_teams()?.is_empty() {
            for name in DEFAULT_TEAMS {
                self.add_team(name)?;
            }
            info!("seeded {} default teams", DEFAULT_TEAMS.len());
        }

        if !self.list_matches(Some(SEED_WEEK))?.is_empty() {
            return Ok(());
        }
        let teams = self.list_teams()?;
        let id_of = |name: &str| teams.iter().find(|t| t.name == name).map(|t| t.id);
        let (Some(city), Some(liverpool), Some(arsenal), Some(chelsea)) = (
            id_of("Manchester City"),
            id_of("Liverpool"),
            id_of("Arsenal"),
            id_of("Chelsea"),
        ) else {
            return Ok(());
        };
        self.replace_week(
            SEED_WEEK,
            &[
                NewMatch {
                    week: SEED_WEEK,
                    home_team_id: city,
                    away_team_id: liverpool,
                    home_score: 0,
                    away_score: 0,
                },
                NewMatch {
                    week: SEED_WEEK,
                    home_team_id: arsenal,
                    away_team_id: chelsea,
                    home_score: 1,
                    away_score: 2,
                },
            ],
        )?;
        info!("seeded week {SEED_WEEK} results");
        Ok(())
    }
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS teams (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );
        CREATE TABLE IF NOT EXISTS matches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            week INTEGER NOT NULL,
            home_team_id INTEGER NOT NULL,
            away_team_id INTEGER NOT NULL,
            home_score INTEGER NOT NULL,
            away_score INTEGER NOT NULL,
            result TEXT NOT NULL,
            recorded_at TEXT NOT NULL,
            FOREIGN KEY (home_team_id) REFERENCES teams(id),
            FOREIGN KEY (away_team_id) REFERENCES teams(id)
        );
        CREATE INDEX IF NOT EXISTS idx_matches_week ON matches(week);
        "#,
    )
    .map_err(|err| LeagueError::store(format!("create sqlite schema: {err}")))?;
    Ok(())
}

const MATCH_COLUMNS: &str = "id, week, home_team_id, away_team_id, home_score, away_score";

// The stored `result` column is informational; the outcome is always
// re-derived from the scores.
fn match_from_row(row: &Row<'_>) -> rusqlite::Result<Match> {
    let home_score = row.get::<_, u32>(4)?;
    let away_score = row.get::<_, u32>(5)?;
    Ok(Match {
        id: row.get::<_, u32>(0)?,
        week: row.get::<_, u32>(1)?,
        home_team_id: row.get::<_, u32>(2)?,
        away_team_id: row.get::<_, u32>(3)?,
        home_score,
        away_score,
        result: MatchOutcome::from_scores(home_score, away_score),
    })
}

fn insert_row(conn: &Connection, m: &NewMatch) -> Result<u32> {
    conn.execute(
        "INSERT INTO matches (week, home_team_id, away_team_id, home_score, away_score, result, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            m.week,
            m.home_team_id,
            m.away_team_id,
            m.home_score,
            m.away_score,
            m.outcome().as_str(),
            Utc::now().to_rfc3339(),
        ],
    )
    .map_err(|err| LeagueError::store(format!("insert match: {err}")))?;
    u32::try_from(conn.last_insert_rowid())
        .map_err(|_| LeagueError::store("match id out of range"))
}

impl ResultStore for SqliteStore {
    fn list_teams(&self) -> Result<Vec<Team>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM teams ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(Team {
                id: row.get::<_, u32>(0)?,
                name: row.get(1)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn add_team(&mut self, name: &str) -> Result<Team> {
        self.conn
            .execute("INSERT INTO teams (name) VALUES (?1)", params![name])
            .map_err(|err| LeagueError::store(format!("insert team {name}: {err}")))?;
        let id = u32::try_from(self.conn.last_insert_rowid())
            .map_err(|_| LeagueError::store("team id out of range"))?;
        Ok(Team::new(id, name))
    }

    fn list_matches(&self, week: Option<u32>) -> Result<Vec<Match>> {
        let mut out = Vec::new();
        match week {
            Some(week) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {MATCH_COLUMNS} FROM matches WHERE week = ?1 ORDER BY id ASC"
                ))?;
                for row in stmt.query_map(params![week], match_from_row)? {
                    out.push(row?);
                }
            }
            None => {
                let mut stmt = self
                    .conn
                    .prepare(&format!("SELECT {MATCH_COLUMNS} FROM matches ORDER BY id ASC"))?;
                for row in stmt.query_map([], match_from_row)? {
                    out.push(row?);
                }
            }
        }
        Ok(out)
    }

    fn find_match(&self, id: u32) -> Result<Option<Match>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = ?1"),
                params![id],
                match_from_row,
            )
            .optional()?)
    }

    fn max_played_week(&self) -> Result<Option<u32>> {
        Ok(self
            .conn
            .query_row("SELECT MAX(week) FROM matches", [], |row| {
                row.get::<_, Option<u32>>(0)
            })?)
    }

    fn replace_week(&mut self, week: u32, matches: &[NewMatch]) -> Result<Vec<Match>> {
        let tx = self
            .conn
            .transaction()
            .map_err(|err| LeagueError::store(format!("begin week {week} transaction: {err}")))?;
        tx.execute("DELETE FROM matches WHERE week = ?1", params![week])
            .map_err(|err| LeagueError::store(format!("clear week {week}: {err}")))?;

        let mut ids = Vec::with_capacity(matches.len());
        for m in matches {
            let row = NewMatch { week, ..m.clone() };
            ids.push(insert_row(&tx, &row)?);
        }
        tx.commit()
            .map_err(|err| LeagueError::store(format!("commit week {week}: {err}")))?;
        info!("replaced week {week} with {} matches", ids.len());

        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(m) = self.find_match(id)? {
                out.push(m);
            }
        }
        Ok(out)
    }

    fn clear_week(&mut self, week: u32) -> Result<usize> {
        let n = self
            .conn
            .execute("DELETE FROM matches WHERE week = ?1", params![week])
            .map_err(|err| LeagueError::store(format!("clear week {week}: {err}")))?;
        info!("cleared {n} matches from week {week}");
        Ok(n)
    }

    fn delete_after_week(&mut self, week: u32) -> Result<usize> {
        let n = self
            .conn
            .execute("DELETE FROM matches WHERE week > ?1", params![week])
            .map_err(|err| LeagueError::store(format!("reset after week {week}: {err}")))?;
        info!("deleted {n} matches after week {week}");
        Ok(n)
    }

    fn insert_match(&mut self, m: &NewMatch) -> Result<Match> {
        let id = insert_row(&self.conn, m)?;
        self.find_match(id)?
            .ok_or_else(|| LeagueError::store(format!("match {id} vanished after insert")))
    }

    fn update_score(&mut self, id: u32, home_score: u32, away_score: u32) -> Result<Match> {
        let outcome = MatchOutcome::from_scores(home_score, away_score);
        let changed = self
            .conn
            .execute(
                "UPDATE matches SET home_score = ?1, away_score = ?2, result = ?3, recorded_at = ?4
                 WHERE id = ?5",
                params![
                    home_score,
                    away_score,
                    outcome.as_str(),
                    Utc::now().to_rfc3339(),
                    id
                ],
            )
            .map_err(|err| LeagueError::store(format!("update match {id}: {err}")))?;
        if changed == 0 {
            return Err(LeagueError::NotFound(format!("match {id}")));
        }
        self.find_match(id)?
            .ok_or_else(|| LeagueError::NotFound(format!("match {id}")))
    }

    fn find_last_meeting(&self, team_a: u32, team_b: u32) -> Result<Option<Match>> {
        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT {MATCH_COLUMNS} FROM matches
                     WHERE (home_team_id = ?1 AND away_team_id = ?2)
                        OR (home_team_id = ?2 AND away_team_id = ?1)
                     ORDER BY id DESC LIMIT 1"
                ),
                params![team_a, team_b],
                match_from_row,
            )
            .optional()?)
    }

    fn week_results(&self, week: u32) -> Result<Vec<WeekResult>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.id, m.week, h.name, a.name, m.home_score, m.away_score
             FROM matches m
             JOIN teams h ON m.home_team_id = h.id
             JOIN teams a ON m.away_team_id = a.id
             WHERE m.week = ?1
             ORDER BY m.id ASC",
        )?;
        let rows = stmt.query_map(params![week], |row| {
            let home_score = row.get::<_, u32>(4)?;
            let away_score = row.get::<_, u32>(5)?;
            Ok(WeekResult {
                id: row.get::<_, u32>(0)?,
                week: row.get::<_, u32>(1)?,
                home_team: row.get(2)?,
                away_team: row.get(3)?,
                home_score,
                away_score,
                result: MatchOutcome::from_scores(home_score, away_score),
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> SqliteStore {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.seed_defaults().unwrap();
        store
    }

    fn new_match(week: u32, home: u32, away: u32, hs: u32, as_: u32) -> NewMatch {
        NewMatch {
            week,
            home_team_id: home,
            away_team_id: away,
            home_score: hs,
            away_score: as_,
        }
    }

    #[test]
    fn seeding_is_idempotent() {
        let mut store = seeded();
        store.seed_defaults().unwrap();
        assert_eq!(store.list_teams().unwrap().len(), 4);
        let week4 = store.list_matches(Some(4)).unwrap();
        assert_eq!(week4.len(), 2);
        assert_eq!(week4[0].result, MatchOutcome::Draw);
        assert_eq!(week4[1].result, MatchOutcome::Loss);
        assert_eq!(store.max_played_week().unwrap(), Some(4));
    }

    #[test]
    fn empty_store_has_no_played_week() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.max_played_week().unwrap(), None);
    }

    #[test]
    fn duplicate_team_names_are_a_store_error() {
        let mut store = seeded();
        let err = store.add_team("Arsenal").unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn replace_week_swaps_the_whole_week() {
        let mut store = seeded();
        store
            .replace_week(5, &[new_match(5, 1, 3, 2, 0), new_match(5, 2, 4, 1, 1)])
            .unwrap();
        let replaced = store.replace_week(5, &[new_match(5, 1, 3, 0, 1)]).unwrap();
        assert_eq!(replaced.len(), 1);
        assert_eq!(store.list_matches(Some(5)).unwrap(), replaced);
        assert_eq!(store.list_matches(Some(4)).unwrap().len(), 2);
    }

    #[test]
    fn replace_week_rolls_back_on_bad_rows() {
        let mut store = seeded();
        let err = store
            .replace_week(4, &[new_match(4, 1, 2, 1, 0), new_match(4, 1, 99, 1, 0)])
            .unwrap_err();
        assert!(err.is_retryable());
        // The seeded week survives the failed replace.
        assert_eq!(store.list_matches(Some(4)).unwrap().len(), 2);
    }

    #[test]
    fn update_score_rederives_result() {
        let mut store = seeded();
        let first = store.list_matches(Some(4)).unwrap()[0].clone();
        let updated = store.update_score(first.id, 3, 1).unwrap();
        assert_eq!(updated.result, MatchOutcome::Win);
        assert!(matches!(
            store.update_score(999, 1, 1),
            Err(LeagueError::NotFound(_))
        ));
    }

    #[test]
    fn last_meeting_is_latest_insert_either_way_round() {
        let mut store = seeded();
        store.insert_match(&new_match(5, 2, 1, 0, 2)).unwrap();
        let last = store.find_last_meeting(1, 2).unwrap().unwrap();
        assert_eq!(last.week, 5);
        assert_eq!(last.winner_id(), Some(1));
        assert!(store.find_last_meeting(1, 3).unwrap().is_none());
    }

    #[test]
    fn reset_keeps_weeks_up_to_the_cutoff() {
        let mut store = seeded();
        store.insert_match(&new_match(5, 1, 3, 1, 0)).unwrap();
        store.insert_match(&new_match(6, 1, 4, 1, 0)).unwrap();
        assert_eq!(store.delete_after_week(4).unwrap(), 2);
        assert_eq!(store.max_played_week().unwrap(), Some(4));
    }

    #[test]
    fn week_results_join_team_names() {
        let store = seeded();
        let rows = store.week_results(4).unwrap();
        assert_eq!(rows[0].home_team, "Manchester City");
        assert_eq!(rows[1].away_team, "Chelsea");
        assert_eq!(rows[1].result, MatchOutcome::Loss);
        assert!(store.week_results(9).unwrap().is_empty());
    }
}
