use std::path::Path;

use rebench_core::{action, dataset::Dataset, testing::TestCase, Config};
use tokio_util::sync::CancellationToken;

use super::SubcmdResult;

pub async fn exec_batch(
    path: &Path,
    cfg: &Config,
    opts: action::PrintOptions,
    interrupt: CancellationToken,
) -> SubcmdResult {
    let cases = Dataset::load(path)?.testcases()?;
    run(&cases, cfg, opts, interrupt).await
}

pub async fn exec_single(
    regex: &str,
    input: &str,
    cfg: &Config,
    opts: action::PrintOptions,
    interrupt: CancellationToken,
) -> SubcmdResult {
    let cases = [TestCase::new(regex, input)];
    run(&cases, cfg, opts, interrupt).await
}

async fn run(
    cases: &[TestCase],
    cfg: &Config,
    opts: action::PrintOptions,
    interrupt: CancellationToken,
) -> SubcmdResult {
    let pipeline = action::build_pipeline(&cfg.bench, interrupt);
    let _ = action::run_and_print(
        &pipeline,
        cases,
        cfg.bench.timeout(),
        cfg.bench.measure_memory,
        opts,
    )
    .await?;
    Ok(())
}
