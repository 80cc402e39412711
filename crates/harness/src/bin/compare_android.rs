use detector::backend::ort::OrtDetector;
use harness::config::Scenario;

fn main() -> anyhow::Result<()> {
    harness::scenario::run::<OrtDetector>(Scenario::Android)?;
    Ok(())
}
