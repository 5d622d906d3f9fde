//! Post generation job kinds and results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of marketing post the external generator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    /// A single static image.
    Static,
    /// A multi-image carousel (takes an image count).
    Carousel,
    /// A short video (takes a duration in seconds).
    Reels,
}

impl GenerationKind {
    /// All kinds, in schedule order.
    pub const ALL: [Self; 3] = [Self::Static, Self::Carousel, Self::Reels];

    /// Value passed to the generator's `--type` argument.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Carousel => "carousel",
            Self::Reels => "reels",
        }
    }
}

impl std::fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known [`GenerationKind`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid generation type: {0}")]
pub struct UnknownGenerationKind(pub String);

impl std::str::FromStr for GenerationKind {
    type Err = UnknownGenerationKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static" => Ok(Self::Static),
            "carousel" => Ok(Self::Carousel),
            "reels" => Ok(Self::Reels),
            _ => Err(UnknownGenerationKind(s.to_string())),
        }
    }
}

/// Result reported by a successful generator run.
///
/// Whatever JSON the generator prints is passed through untouched. Output
/// that is not JSON still counts as success and is wrapped as
/// `{"status": "ok", "detail": <trimmed output>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobResult(Value);

impl JobResult {
    /// Interpret the standard output of a successful run.
    #[must_use]
    pub fn from_stdout(stdout: &str) -> Self {
        let trimmed = stdout.trim();
        serde_json::from_str(trimmed).map_or_else(|_| Self::fallback(trimmed), Self)
    }

    /// Wrap non-JSON output.
    #[must_use]
    pub fn fallback(detail: &str) -> Self {
        Self(serde_json::json!({ "status": "ok", "detail": detail }))
    }

    /// Borrow the JSON value.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Unwrap into the JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}
