//! Generated post endpoints.
//!
//! `POST /posts/generate` runs the generator on demand and answers with its
//! result; `GET /posts/list` lists finished artifacts, which are served as
//! static files under `/posts`.

use std::path::Path;

use axum::{Json, body::Bytes, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use powerchip_core::{GenerationKind, JobResult};

use crate::error::{AppError, Result};
use crate::jobs::GenerationJob;
use crate::state::AppState;

/// File extensions listed as finished posts.
const POST_EXTENSIONS: &[&str] = &["png", "mp4"];

/// `POST /posts/generate` body.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Carousel slide count (number or numeric string).
    #[serde(default)]
    pub count: Option<Value>,
    /// Reel duration in seconds (number or numeric string).
    #[serde(default)]
    pub duration: Option<Value>,
}

impl GenerateRequest {
    /// Validate into a job.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidJobKind`] when `type` is missing or not one
    /// of `static`, `carousel`, `reels`.
    pub fn into_job(self) -> Result<GenerationJob> {
        let raw = self.kind.unwrap_or_default();
        let kind = raw
            .parse::<GenerationKind>()
            .map_err(|_| AppError::InvalidJobKind(raw))?;

        Ok(GenerationJob {
            kind,
            count: self.count.as_ref().and_then(as_u32),
            duration: self.duration.as_ref().and_then(as_u32),
        })
    }
}

/// One listed artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostFile {
    pub file: String,
    pub url: String,
}

/// `GET /posts/list` response.
#[derive(Debug, Serialize)]
pub struct PostList {
    pub status: &'static str,
    pub files: Vec<PostFile>,
}

/// Run the generator for one job and return its result.
#[instrument(skip_all)]
pub async fn generate(State(state): State<AppState>, body: Bytes) -> Result<Json<JobResult>> {
    let request: GenerateRequest = if body.iter().all(u8::is_ascii_whitespace) {
        GenerateRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|_| AppError::InvalidJobKind(String::new()))?
    };
    let job = request.into_job()?;

    let result = state.generator().run(&job).await?;

    Ok(Json(result))
}

/// List generated images and videos, sorted by file name.
#[instrument(skip_all)]
pub async fn list(State(state): State<AppState>) -> Result<Json<PostList>> {
    let files = list_posts(&state.config().posts_dir)
        .await
        .map_err(AppError::PostsUnavailable)?;

    Ok(Json(PostList {
        status: "ok",
        files,
    }))
}

/// Read the posts directory.
///
/// # Errors
///
/// Returns the I/O error if the directory cannot be read.
pub async fn list_posts(dir: &Path) -> std::io::Result<Vec<PostFile>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut names = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let is_post = Path::new(&name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| POST_EXTENSIONS.contains(&ext));
        if is_post {
            names.push(name);
        }
    }

    names.sort();

    Ok(names
        .into_iter()
        .map(|file| PostFile {
            url: format!("/posts/{file}"),
            file,
        })
        .collect())
}

fn as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
