use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use csv::StringRecord;
use tracing::debug;

use crate::historical_dataset::{MatchRecord, MatchSource, MatchTable};
use crate::outcome::Outcome;
use crate::result_codes::{self, RawResult, ResultScheme};

/// Column names for one of the football-data export layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvLayout {
    pub home: &'static str,
    pub away: &'static str,
    pub result: &'static str,
    pub home_goals: &'static str,
    pub away_goals: &'static str,
}

/// Season files: `HomeTeam,AwayTeam,FTR,FTHG,FTAG`.
pub const LAYOUT_V1: CsvLayout = CsvLayout {
    home: "HomeTeam",
    away: "AwayTeam",
    result: "FTR",
    home_goals: "FTHG",
    away_goals: "FTAG",
};

/// Multi-season "new league" files: `Home,Away,Res,HG,AG`.
pub const LAYOUT_V2: CsvLayout = CsvLayout {
    home: "Home",
    away: "Away",
    result: "Res",
    home_goals: "HG",
    away_goals: "AG",
};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d/%m/%y"];

struct Columns {
    home: usize,
    away: usize,
    result: Option<usize>,
    date: Option<usize>,
    home_goals: Option<usize>,
    away_goals: Option<usize>,
}

/// Picks the layout whose team columns are present in the header.
pub fn detect_layout(headers: &StringRecord) -> Option<CsvLayout> {
    [LAYOUT_V1, LAYOUT_V2]
        .into_iter()
        .find(|layout| position(headers, layout.home).is_some() && position(headers, layout.away).is_some())
}

pub fn read_matches_from_path(path: &Path) -> Result<Vec<MatchRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("open match csv {}", path.display()))?;
    read_records(&mut reader).with_context(|| format!("read match csv {}", path.display()))
}

pub fn read_matches<R: Read>(input: R) -> Result<Vec<MatchRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);
    read_records(&mut reader)
}

pub fn load_table(path: &Path) -> Result<MatchTable> {
    Ok(MatchTable::new(read_matches_from_path(path)?))
}

fn read_records<R: Read>(reader: &mut csv::Reader<R>) -> Result<Vec<MatchRecord>> {
    let headers = reader.headers().context("read csv header")?.clone();
    let layout = detect_layout(&headers).ok_or_else(|| {
        anyhow!("unrecognised csv header: expected HomeTeam/AwayTeam or Home/Away columns")
    })?;
    let cols = Columns {
        home: position(&headers, layout.home).unwrap_or(0),
        away: position(&headers, layout.away).unwrap_or(1),
        result: position(&headers, layout.result),
        date: position(&headers, "Date"),
        home_goals: position(&headers, layout.home_goals),
        away_goals: position(&headers, layout.away_goals),
    };

    let mut out = Vec::new();
    let mut skipped = 0usize;
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("csv row {}", idx + 2))?;
        match parse_row(&record, &cols) {
            Some(row) => out.push(row),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!(skipped, kept = out.len(), "dropped csv rows without team names");
    }
    fill_codes_from_goals(&mut out);
    Ok(out)
}

/// Rows with a blank result but a full score get a code in the encoding the
/// rest of the file uses. Files without any codes get text codes.
fn fill_codes_from_goals(rows: &mut [MatchRecord]) {
    let scheme = result_codes::detect_scheme(rows.iter().map(|r| &r.result_code))
        .unwrap_or(ResultScheme::Text);
    let mut filled = 0usize;
    for row in rows.iter_mut() {
        if row.result_code.is_missing()
            && let (Some(hg), Some(ag)) = (row.home_goals, row.away_goals)
        {
            row.result_code = RawResult::encode(Outcome::from_goals(hg, ag), scheme);
            filled += 1;
        }
    }
    if filled > 0 {
        debug!(filled, ?scheme, "derived missing result codes from goals");
    }
}

fn parse_row(record: &StringRecord, cols: &Columns) -> Option<MatchRecord> {
    let home_team = record.get(cols.home)?.trim();
    let away_team = record.get(cols.away)?.trim();
    if home_team.is_empty() || away_team.is_empty() {
        return None;
    }

    let home_goals = cols.home_goals.and_then(|i| parse_goals(record.get(i)?));
    let away_goals = cols.away_goals.and_then(|i| parse_goals(record.get(i)?));
    let result_code = cols
        .result
        .and_then(|i| record.get(i))
        .map(RawResult::parse)
        .unwrap_or(RawResult::Missing);

    Some(MatchRecord {
        home_team: home_team.to_string(),
        away_team: away_team.to_string(),
        date: cols.date.and_then(|i| record.get(i)).and_then(parse_date),
        result_code,
        home_goals,
        away_goals,
    })
}

fn position(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    // `%Y` also accepts two digits, so short years are routed explicitly.
    let short_year = s.rsplit('/').next().is_some_and(|y| y.len() == 2) && s.contains('/');
    let formats: &[&str] = if short_year {
        &DATE_FORMATS[2..]
    } else {
        &DATE_FORMATS[..2]
    };
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn parse_goals(raw: &str) -> Option<i32> {
    let s = raw.trim();
    if let Ok(n) = s.parse::<i32>() {
        return (n >= 0).then_some(n);
    }
    let f = s.parse::<f64>().ok()?;
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0).then_some(f as i32)
}

/// Reads `<dir>/<group_id>.csv`.
#[derive(Debug, Clone)]
pub struct CsvSource {
    dir: PathBuf,
}

impl CsvSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, group_id: &str) -> PathBuf {
        self.dir.join(format!("{group_id}.csv"))
    }
}

impl MatchSource for CsvSource {
    fn load_matches(&self, group_id: &str) -> Result<MatchTable> {
        if group_id.trim().is_empty() || group_id.contains(['/', '\\']) {
            return Err(anyhow!("invalid group id {group_id:?}"));
        }
        load_table(&self.path_for(group_id))
    }
}
