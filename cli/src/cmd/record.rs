use std::path::Path;

use rebench_core::{action, dataset::Dataset, Config};
use tokio_util::sync::CancellationToken;

use super::SubcmdResult;

pub async fn exec(
    path: &Path,
    version: u32,
    cfg: &Config,
    interrupt: CancellationToken,
) -> SubcmdResult {
    let key = format!("{}{}", cfg.output.label_prefix, version);
    let mut dataset = Dataset::load(path)?;
    // Reject the whole file before anything runs.
    let _ = dataset.testcases()?;

    if cfg.bench.measure_memory {
        log::warn!("Memory is not measured when recording");
    }
    let pipeline = action::build_pipeline(&cfg.bench, interrupt);
    let _ = action::run_and_record(
        &pipeline,
        &mut dataset,
        cfg.bench.timeout(),
        &key,
        cfg.output.pretty,
    )
    .await?;
    log::info!("Saved '{}' into {}", key, path.to_string_lossy());
    Ok(())
}
