pub mod config;
pub mod logging;
mod span;

pub use config::Environment;
pub use logging::setup_logging;
