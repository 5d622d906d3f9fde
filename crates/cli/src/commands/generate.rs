//! Run the post generator once from the command line.

use tracing::info;

use powerchip_core::GenerationKind;
use powerchip_storefront::config::GeneratorConfig;
use powerchip_storefront::jobs::{GenerationJob, GeneratorInvoker};

/// Run one generation job and print the result as JSON.
///
/// Uses the same `GENERATOR_*` and `POSTS_DIR` settings as the server.
///
/// # Errors
///
/// Returns an error if the generator cannot be started or exits non-zero.
pub async fn run(
    kind: GenerationKind,
    count: Option<u32>,
    duration: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = GeneratorConfig::from_env_standalone();
    tokio::fs::create_dir_all(&config.output_dir).await?;

    let job = GenerationJob {
        kind,
        count,
        duration,
    };
    info!(job = %job, output_dir = %config.output_dir.display(), "Running generator");

    let result = GeneratorInvoker::new(config).run(&job).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(result.as_value())?);
    }

    Ok(())
}
