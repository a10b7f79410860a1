use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

use crate::outcome::Outcome;
use crate::result_codes::{self, RawResult, ResultScheme};

/// One historical fixture as loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub home_team: String,
    pub away_team: String,
    pub date: Option<NaiveDate>,
    pub result_code: RawResult,
    pub home_goals: Option<i32>,
    pub away_goals: Option<i32>,
}

impl MatchRecord {
    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }
}

/// Immutable, ordered set of fixtures for one league group.
///
/// Cloning is cheap and clones share rows, so concurrent predictions can read
/// the same snapshot. The result encoding is detected once at construction.
#[derive(Debug, Clone)]
pub struct MatchTable {
    rows: Arc<Vec<MatchRecord>>,
    end: usize,
    scheme: ResultScheme,
}

impl MatchTable {
    pub fn new(rows: Vec<MatchRecord>) -> Self {
        let scheme = result_codes::detect_or_default(rows.iter().map(|r| &r.result_code));
        Self::with_scheme(rows, scheme)
    }

    pub fn with_scheme(rows: Vec<MatchRecord>, scheme: ResultScheme) -> Self {
        let end = rows.len();
        Self {
            rows: Arc::new(rows),
            end,
            scheme,
        }
    }

    pub fn empty() -> Self {
        Self::with_scheme(Vec::new(), ResultScheme::Integer)
    }

    pub fn rows(&self) -> &[MatchRecord] {
        &self.rows[..self.end]
    }

    pub fn len(&self) -> usize {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end == 0
    }

    pub fn scheme(&self) -> ResultScheme {
        self.scheme
    }

    /// Canonical outcome of a row under this table's scheme. A row stored
    /// without a code falls back to its score.
    pub fn outcome(&self, row: &MatchRecord) -> Option<Outcome> {
        if row.result_code.is_missing() {
            return match (row.home_goals, row.away_goals) {
                (Some(hg), Some(ag)) => Some(Outcome::from_goals(hg, ag)),
                _ => None,
            };
        }
        result_codes::classify(&row.result_code, self.scheme)
    }

    /// The first `n` rows, sharing storage and scheme with `self`.
    pub fn prefix(&self, n: usize) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
            end: n.min(self.end),
            scheme: self.scheme,
        }
    }

    /// Copy with rows ordered by date, undated rows last. Rows sharing a
    /// date keep their relative order.
    pub fn chronological(&self) -> Self {
        let mut rows = self.rows().to_vec();
        rows.sort_by_key(|r| (r.date.is_none(), r.date));
        Self::with_scheme(rows, self.scheme)
    }

    pub fn teams(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        for row in self.rows() {
            out.insert(row.home_team.as_str());
            out.insert(row.away_team.as_str());
        }
        out
    }
}

/// Supplies tables of past matches per league group.
pub trait MatchSource {
    fn load_matches(&self, group_id: &str) -> Result<MatchTable>;
}

/// Matches persisted in a local SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteSource {
    path: PathBuf,
}

impl SqliteSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MatchSource for SqliteSource {
    fn load_matches(&self, group_id: &str) -> Result<MatchTable> {
        let conn = open_db(&self.path)?;
        load_matches(&conn, group_id)
    }
}

pub fn default_db_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("PREDICTOR_DB_PATH")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".cache")
            .join("football_predictor")
            .join("historical_matches.sqlite"),
    )
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS matches (
            row_id INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id TEXT NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            match_date TEXT NOT NULL DEFAULT '',
            fixture_seq INTEGER NOT NULL DEFAULT 0,
            result_text TEXT NULL,
            result_code INTEGER NULL,
            home_goals INTEGER NULL,
            away_goals INTEGER NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(group_id, home_team, away_team, match_date, fixture_seq)
        );
        CREATE INDEX IF NOT EXISTS idx_matches_group ON matches(group_id);
        CREATE INDEX IF NOT EXISTS idx_matches_date ON matches(match_date);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Inserts or refreshes rows for a group. Returns the number of rows written.
///
/// A row is keyed by its fixture and date plus its position among rows of
/// the batch sharing both, so repeated undated meetings stay distinct while
/// re-ingesting the same batch updates in place.
pub fn upsert_matches(conn: &mut Connection, group_id: &str, rows: &[MatchRecord]) -> Result<usize> {
    if group_id.trim().is_empty() {
        return Err(anyhow!("empty group id passed to upsert"));
    }
    let tx = conn.transaction().context("begin upsert transaction")?;
    let mut seen: HashMap<(&str, &str, Option<NaiveDate>), i64> = HashMap::new();
    let mut written = 0usize;
    for row in rows {
        let seq = seen
            .entry((row.home_team.as_str(), row.away_team.as_str(), row.date))
            .or_insert(0);
        upsert_match(&tx, group_id, row, *seq)?;
        *seq += 1;
        written += 1;
    }
    tx.commit().context("commit upsert transaction")?;
    Ok(written)
}

fn upsert_match(
    tx: &rusqlite::Transaction<'_>,
    group_id: &str,
    m: &MatchRecord,
    seq: i64,
) -> Result<()> {
    let (result_text, result_code) = match &m.result_code {
        RawResult::Text(s) => (Some(s.clone()), None),
        RawResult::Code(n) => (None, Some(*n)),
        RawResult::Missing => (None, None),
    };
    tx.execute(
        r#"
        INSERT INTO matches (
            group_id, home_team, away_team, match_date, fixture_seq,
            result_text, result_code, home_goals, away_goals, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(group_id, home_team, away_team, match_date, fixture_seq) DO UPDATE SET
            result_text = excluded.result_text,
            result_code = excluded.result_code,
            home_goals = excluded.home_goals,
            away_goals = excluded.away_goals,
            updated_at = excluded.updated_at
        "#,
        params![
            group_id,
            m.home_team,
            m.away_team,
            m.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
            seq,
            result_text,
            result_code,
            m.home_goals,
            m.away_goals,
            Utc::now().to_rfc3339(),
        ],
    )
    .context("upsert match")?;
    Ok(())
}

pub fn load_matches(conn: &Connection, group_id: &str) -> Result<MatchTable> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT home_team, away_team, match_date, result_text, result_code,
                   home_goals, away_goals
            FROM matches
            WHERE group_id = ?1
            ORDER BY row_id ASC
            "#,
        )
        .context("prepare load matches query")?;

    let rows = stmt
        .query_map(params![group_id], |row| {
            let date: String = row.get(2)?;
            let result_text: Option<String> = row.get(3)?;
            let result_code: Option<i64> = row.get(4)?;
            let result_code = match (result_text, result_code) {
                (Some(s), _) => RawResult::Text(s),
                (None, Some(n)) => RawResult::Code(n),
                (None, None) => RawResult::Missing,
            };
            Ok(MatchRecord {
                home_team: row.get(0)?,
                away_team: row.get(1)?,
                date: NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok(),
                result_code,
                home_goals: row.get(5)?,
                away_goals: row.get(6)?,
            })
        })
        .context("query load matches")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode match row")?);
    }
    Ok(MatchTable::new(out))
}

pub fn list_groups(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT DISTINCT group_id FROM matches ORDER BY group_id")
        .context("prepare list groups query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query list groups")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode group row")?);
    }
    Ok(out)
}
