//! Append-only log of quiz submissions (JSON Lines).
//!
//! Each checkout that carries quiz answers appends one line:
//!
//! ```text
//! {"ts":"2026-03-02T18:00:00.000Z","vehicle_brand":"Fiat","pref_reduce_lag":"true"}
//! ```
//!
//! The log is analytics only. Writes are best-effort from the checkout path
//! and never block a purchase; the CLI reads it back for summaries.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use powerchip_core::{QuizMetadata, metadata_keys};

/// Errors reading or writing the quiz log.
#[derive(Debug, Error)]
pub enum QuizLogError {
    /// Filesystem operation failed.
    #[error("quiz log I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Entry could not be encoded.
    #[error("quiz log encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One line of the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizLogEntry {
    #[serde(serialize_with = "serialize_millis")]
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: QuizMetadata,
}

fn serialize_millis<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Parsed log contents.
#[derive(Debug, Clone, Default)]
pub struct QuizLogContents {
    pub entries: Vec<QuizLogEntry>,
    /// Lines that were not valid entries.
    pub skipped: usize,
}

/// Aggregate view over the log.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuizSummary {
    pub total: usize,
    pub skipped: usize,
    /// Submission count per vehicle brand.
    pub brands: BTreeMap<String, usize>,
    pub more_torque: usize,
    pub throttle_response: usize,
    pub reduce_lag: usize,
    pub average_power_hp: Option<f64>,
    pub first: Option<DateTime<Utc>>,
    pub last: Option<DateTime<Utc>>,
}

/// Handle to the JSONL quiz log file.
#[derive(Debug, Clone)]
pub struct QuizLog {
    path: PathBuf,
}

impl QuizLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a submission stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`QuizLogError`] if the directory or file cannot be written.
    pub async fn append(&self, metadata: &QuizMetadata) -> Result<(), QuizLogError> {
        self.append_at(metadata, Utc::now()).await
    }

    /// Append a submission with an explicit timestamp.
    ///
    /// The line is written with a single `write_all` on a file opened in
    /// append mode, so concurrent appends never interleave within a line.
    ///
    /// # Errors
    ///
    /// Returns [`QuizLogError`] if the directory or file cannot be written.
    #[instrument(skip(self, metadata), fields(path = %self.path.display()))]
    pub async fn append_at(
        &self,
        metadata: &QuizMetadata,
        ts: DateTime<Utc>,
    ) -> Result<(), QuizLogError> {
        let entry = QuizLogEntry {
            ts,
            fields: metadata.clone(),
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| self.io_error(source))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| self.io_error(source))?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|source| self.io_error(source))?;
        file.flush().await.map_err(|source| self.io_error(source))?;

        debug!("Quiz submission logged");

        Ok(())
    }

    /// Read every entry. A missing file reads as empty.
    ///
    /// # Errors
    ///
    /// Returns [`QuizLogError`] if the file exists but cannot be read.
    pub async fn read_all(&self) -> Result<QuizLogContents, QuizLogError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(QuizLogContents::default());
            }
            Err(source) => return Err(self.io_error(source)),
        };

        Ok(parse_lines(&text))
    }

    fn io_error(&self, source: std::io::Error) -> QuizLogError {
        QuizLogError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Parse JSONL text, skipping blank lines and counting malformed ones.
#[must_use]
pub fn parse_lines(text: &str) -> QuizLogContents {
    let mut contents = QuizLogContents::default();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match serde_json::from_str::<QuizLogEntry>(line) {
            Ok(entry) => contents.entries.push(entry),
            Err(_) => contents.skipped += 1,
        }
    }

    contents
}

/// Aggregate log contents.
#[must_use]
pub fn summarize(contents: &QuizLogContents) -> QuizSummary {
    let mut summary = QuizSummary {
        total: contents.entries.len(),
        skipped: contents.skipped,
        ..QuizSummary::default()
    };

    let mut power_sum = 0.0;
    let mut power_count: u32 = 0;

    for entry in &contents.entries {
        let is_set = |key: &str| entry.fields.get(key).is_some_and(|v| v == "true");

        if let Some(brand) = entry.fields.get(metadata_keys::VEHICLE_BRAND) {
            *summary.brands.entry(brand.clone()).or_default() += 1;
        }
        if is_set(metadata_keys::PREF_MORE_TORQUE) {
            summary.more_torque += 1;
        }
        if is_set(metadata_keys::PREF_THROTTLE_RESPONSE) {
            summary.throttle_response += 1;
        }
        if is_set(metadata_keys::PREF_REDUCE_LAG) {
            summary.reduce_lag += 1;
        }
        if let Some(hp) = entry
            .fields
            .get(metadata_keys::ENGINE_POWER_HP)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|hp| hp.is_finite())
        {
            power_sum += hp;
            power_count += 1;
        }

        summary.first = Some(summary.first.map_or(entry.ts, |t| t.min(entry.ts)));
        summary.last = Some(summary.last.map_or(entry.ts, |t| t.max(entry.ts)));
    }

    if power_count > 0 {
        summary.average_power_hp = Some(power_sum / f64::from(power_count));
    }

    summary
}
