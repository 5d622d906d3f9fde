//! Summarize quiz submissions.

use std::path::PathBuf;

use tracing::{info, warn};

use powerchip_storefront::config::QUIZ_LOG_FILE;
use powerchip_storefront::services::QuizLog;
use powerchip_storefront::services::quiz_log::summarize;

/// Read the quiz log and print a JSON summary.
///
/// # Errors
///
/// Returns an error if the log exists but cannot be read.
pub async fn print(path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let path = path.unwrap_or_else(default_path);
    info!(path = %path.display(), "Reading quiz log");

    let contents = QuizLog::new(path).read_all().await?;
    if contents.skipped > 0 {
        warn!(skipped = contents.skipped, "Skipped malformed quiz log lines");
    }

    let summary = summarize(&contents);

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

fn default_path() -> PathBuf {
    dotenvy::dotenv().ok();
    let data_dir = std::env::var("DATA_DIR")
        .ok()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| "data".to_string());
    PathBuf::from(data_dir).join(QUIZ_LOG_FILE)
}
