use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::error::HistoryError;
use crate::shot::{DistanceLabel, SessionId, Shot, Timestamp};

/// One persisted row. Headers keep the Italian column names of existing
/// history files; English names are accepted on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ShotRow {
    datetime: Timestamp,
    session_id: SessionId,
    #[serde(rename = "volee", alias = "volley")]
    volley: u32,
    #[serde(rename = "freccia", alias = "arrow")]
    arrow: u32,
    x: f64,
    y: f64,
    #[serde(rename = "punteggio", alias = "score")]
    score: u8,
    #[serde(rename = "distanza", alias = "distance")]
    distance: DistanceLabel,
}

impl From<&Shot> for ShotRow {
    fn from(shot: &Shot) -> Self {
        Self {
            datetime: shot.timestamp,
            session_id: shot.session_id.clone(),
            volley: shot.volley_index,
            arrow: shot.arrow_index,
            x: shot.x(),
            y: shot.y(),
            score: shot.score(),
            distance: shot.distance.clone(),
        }
    }
}

impl ShotRow {
    fn into_shot(self, row: usize) -> Result<Shot, HistoryError> {
        if self.volley == 0 || self.arrow == 0 {
            return Err(HistoryError::InvalidRow {
                row,
                reason: "volley and arrow numbers start at 1".into(),
            });
        }
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(HistoryError::InvalidRow {
                row,
                reason: "coordinates must be finite".into(),
            });
        }

        let shot = Shot::new(
            self.x,
            self.y,
            self.volley,
            self.arrow,
            self.session_id,
            self.datetime,
            self.distance,
        );
        if shot.score() != self.score {
            warn!(
                row,
                stored = self.score,
                computed = shot.score(),
                "stored score disagrees with coordinates, using computed score"
            );
        }
        Ok(shot)
    }
}

/// Where the shot log lives on disk
pub trait HistoryBackend {
    /// Read every stored shot in append order. A missing store is empty.
    fn load(&self) -> Result<Vec<Shot>, HistoryError>;

    /// Append one session all-or-nothing and return every stored shot
    /// afterwards, including sessions other processes saved since `load`.
    /// A session id already on record is refused.
    fn append(&self, new_shots: &[Shot]) -> Result<Vec<Shot>, HistoryError>;

    fn location(&self) -> &Path;
}

const CSV_HEADER: [&str; 8] = [
    "datetime",
    "session_id",
    "volee",
    "freccia",
    "x",
    "y",
    "punteggio",
    "distanza",
];

fn reject_known_session(existing: &[Shot], new_shots: &[Shot]) -> Result<(), HistoryError> {
    match new_shots
        .iter()
        .find(|new| existing.iter().any(|old| old.session_id == new.session_id))
    {
        Some(clash) => Err(HistoryError::DuplicateSession(clash.session_id.clone())),
        None => Ok(()),
    }
}

/// Comma separated log, rewritten in full through a temp file and rename
#[derive(Debug, Clone)]
pub struct CsvHistory {
    path: PathBuf,
}

impl CsvHistory {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    fn io_error(&self, source: std::io::Error) -> HistoryError {
        HistoryError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn write_error<E: Into<std::io::Error>>(&self, source: E) -> HistoryError {
        HistoryError::Write {
            path: self.path.clone(),
            source: source.into(),
        }
    }

    fn write_rows<W: Write>(&self, out: W, shots: &[Shot]) -> Result<(), HistoryError> {
        let mut writer = csv::Writer::from_writer(out);
        for shot in shots {
            writer
                .serialize(ShotRow::from(shot))
                .map_err(|e| self.write_error(e))?;
        }
        if shots.is_empty() {
            writer
                .write_record(CSV_HEADER)
                .map_err(|e| self.write_error(e))?;
        }
        writer.flush().map_err(|e| self.write_error(e))
    }

    /// Replace the file through a temp file and rename, keeping its permissions
    fn replace_all(&self, shots: &[Shot]) -> Result<(), HistoryError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| self.write_error(e))?;

        let tmp = NamedTempFile::new_in(&dir).map_err(|e| self.write_error(e))?;
        self.write_rows(tmp.as_file(), shots)?;
        tmp.as_file().sync_all().map_err(|e| self.write_error(e))?;
        if let Ok(meta) = fs::metadata(&self.path) {
            fs::set_permissions(tmp.path(), meta.permissions())
                .map_err(|e| self.write_error(e))?;
        }
        tmp.persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;
        Ok(())
    }
}

impl HistoryBackend for CsvHistory {
    fn load(&self) -> Result<Vec<Shot>, HistoryError> {
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("no history at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
        let mut shots = Vec::new();
        for (idx, row) in reader.deserialize::<ShotRow>().enumerate() {
            // header is line 1
            shots.push(row?.into_shot(idx + 2)?);
        }
        Ok(shots)
    }

    fn append(&self, new_shots: &[Shot]) -> Result<Vec<Shot>, HistoryError> {
        // re-read so sessions saved elsewhere since startup survive the rewrite
        let mut merged = self.load()?;
        reject_known_session(&merged, new_shots)?;
        merged.extend_from_slice(new_shots);
        self.replace_all(&merged)?;
        Ok(merged)
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

const CREATE_SHOTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS shots (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        datetime TEXT NOT NULL,
        session_id TEXT NOT NULL,
        volley INTEGER NOT NULL,
        arrow INTEGER NOT NULL,
        x REAL NOT NULL,
        y REAL NOT NULL,
        score INTEGER NOT NULL,
        distance TEXT NOT NULL
    )
"#;

/// SQLite log; each session append is one transaction
#[derive(Debug, Clone)]
pub struct SqliteHistory {
    path: PathBuf,
}

impl SqliteHistory {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    fn open(&self) -> Result<Connection, HistoryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| HistoryError::Io {
                path: self.path.clone(),
                source,
            })?;
        }
        let conn = Connection::open(&self.path)?;
        conn.execute(CREATE_SHOTS_TABLE, [])?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_shots_distance ON shots(distance)",
            [],
        )?;
        Ok(conn)
    }
}

impl HistoryBackend for SqliteHistory {
    fn load(&self) -> Result<Vec<Shot>, HistoryError> {
        if !self.path.exists() {
            info!("no history at {}, starting empty", self.path.display());
            return Ok(Vec::new());
        }
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT datetime, session_id, volley, arrow, x, y, score, distance FROM shots ORDER BY id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, u8>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?;

        let mut shots = Vec::new();
        for (idx, row) in rows.enumerate() {
            let (datetime, session_id, volley, arrow, x, y, score, distance) = row?;
            let invalid = |reason: String| HistoryError::InvalidRow {
                row: idx + 1,
                reason,
            };
            let parsed = ShotRow {
                datetime: datetime.parse().map_err(|e| invalid(format!("{e}")))?,
                session_id: SessionId::from(session_id.as_str()),
                volley,
                arrow,
                x,
                y,
                score,
                distance: distance.parse().map_err(|e| invalid(format!("{e}")))?,
            };
            shots.push(parsed.into_shot(idx + 1)?);
        }
        Ok(shots)
    }

    fn append(&self, new_shots: &[Shot]) -> Result<Vec<Shot>, HistoryError> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;

        let mut ids: Vec<&SessionId> = new_shots.iter().map(|s| &s.session_id).collect();
        ids.dedup();
        for id in ids {
            let taken: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM shots WHERE session_id = ?1)",
                [id.as_str()],
                |row| row.get(0),
            )?;
            if taken {
                return Err(HistoryError::DuplicateSession(id.clone()));
            }
        }

        for shot in new_shots {
            tx.execute(
                r#"
                INSERT INTO shots (datetime, session_id, volley, arrow, x, y, score, distance)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    shot.timestamp.to_string(),
                    shot.session_id.as_str(),
                    shot.volley_index,
                    shot.arrow_index,
                    shot.x(),
                    shot.y(),
                    shot.score(),
                    shot.distance.as_str(),
                ],
            )?;
        }
        tx.commit()?;
        self.load()
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

/// In-memory snapshot of every recorded shot plus where it is persisted
pub struct HistoryStore {
    shots: Vec<Shot>,
    backend: Box<dyn HistoryBackend>,
}

impl HistoryStore {
    /// Load the snapshot once at startup
    pub fn load(backend: Box<dyn HistoryBackend>) -> Result<Self, HistoryError> {
        let shots = backend.load()?;
        info!(
            shots = shots.len(),
            "loaded history from {}",
            backend.location().display()
        );
        Ok(Self { shots, backend })
    }

    pub fn shots(&self) -> &[Shot] {
        &self.shots
    }

    pub fn is_empty(&self) -> bool {
        self.shots.is_empty()
    }

    pub fn location(&self) -> &Path {
        self.backend.location()
    }

    /// Append a whole session after the prior shots and persist the result.
    /// The snapshot is refreshed from the store, so sessions saved by another
    /// process meanwhile show up too. On failure nothing is written and the
    /// snapshot is unchanged.
    pub fn append_session(&mut self, session: &[Shot]) -> Result<(), HistoryError> {
        let merged = self.backend.append(session)?;
        info!(
            added = session.len(),
            total = merged.len(),
            "saved history to {}",
            self.backend.location().display()
        );
        self.shots = merged;
        Ok(())
    }

    /// `start`, or the first later minute whose session id is not on record
    pub fn free_session_start(&self, start: Timestamp) -> Timestamp {
        let mut candidate = start;
        while self
            .shots
            .iter()
            .any(|s| s.session_id == candidate.session_id())
        {
            candidate = candidate.minutes_after(1);
        }
        candidate
    }
}
