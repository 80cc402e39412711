use crate::comparison::{ComparisonLoop, RunSummary};
use crate::config::{ComparisonConfig, Scenario};
use crate::logging::setup_logging;
use crate::sink::open_sink;
use crate::source::open_source;
use anyhow::Context;
use detector::Detector;

/// Entry point shared by the per-scenario binaries.
///
/// Loads configuration and both models, runs the comparison to completion and
/// prints the summary block to stdout. Any load or inference failure is
/// returned so the process exits non-zero.
pub fn run<D: Detector>(scenario: Scenario) -> anyhow::Result<RunSummary> {
    let config = ComparisonConfig::from_env(scenario)?;
    setup_logging(&config);

    tracing::info!(
        scenario = %scenario,
        environment = config.environment.as_str(),
        video = %config.video_path,
        "Starting model comparison"
    );

    let fast = D::load(&config.fast, &config.inference)
        .with_context(|| format!("Failed to load {} model", config.fast.label))?;
    let reference = D::load(&config.reference, &config.inference)
        .with_context(|| format!("Failed to load {} model", config.reference.label))?;

    let mut source = open_source(&config.video_path)
        .with_context(|| format!("Failed to open input {}", config.video_path))?;
    let mut sink = open_sink(&config)?;

    let mut comparison = ComparisonLoop::new(fast, reference, config.loop_options());
    let summary = comparison.run(&mut source, &mut sink)?;

    // Close the window before printing
    drop(sink);

    println!("\n{summary}");
    Ok(summary)
}
