use crate::config::ComparisonConfig;

pub fn setup_logging(config: &ComparisonConfig) {
    common::setup_logging(config.environment);
}
