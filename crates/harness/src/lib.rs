pub mod comparison;
pub mod compositor;
pub mod config;
pub mod logging;
pub mod report;
pub mod scenario;
pub mod sink;
pub mod source;
pub mod stats;
pub mod timer;

pub use comparison::{ComparisonLoop, LoopOptions, RunSummary, StopReason};
pub use config::{ComparisonConfig, Scenario};
pub use sink::WindowSink;
pub use source::FrameSource;
pub use timer::{Timer, WallClock};
