//! Terminal summary printed once a run ends.

use crate::comparison::RunSummary;
use crate::stats::{Backend, LatencyStats, StatsError, Summary};
use std::fmt;

const WIDTH: usize = 60;

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heavy = "=".repeat(WIDTH);
        let light = "-".repeat(WIDTH);

        writeln!(f, "{heavy}")?;
        writeln!(f, "Comparison results")?;
        writeln!(f, "{heavy}")?;
        writeln!(f, "{:<22}{}", "Total frames:", self.frames)?;
        writeln!(f, "{:<22}{}", "Recorded samples:", self.fast_samples.len())?;
        writeln!(f, "{:<22}{}", "Stopped by:", self.stop_reason)?;
        writeln!(f, "{light}")?;

        match &self.statistics {
            Ok(Summary::Measured(stats)) => {
                write_backend(f, &self.fast_label, &stats.fast)?;
                write_backend(f, &self.reference_label, &stats.reference)?;
                writeln!(f, "{light}")?;
                writeln!(f, "{:<22}{:.2}x", "Speedup:", stats.speedup_ratio)?;
            }
            Ok(Summary::Skipped) => {
                writeln!(f, "No timing samples recorded, statistics skipped")?;
            }
            Err(StatsError::InsufficientTimingData { backend, mean_ms }) => {
                let label = match backend {
                    Backend::Fast => &self.fast_label,
                    Backend::Reference => &self.reference_label,
                };
                writeln!(f, "Statistics unavailable: insufficient timing data")?;
                writeln!(f, "  {label} mean latency is {mean_ms} ms")?;
            }
        }

        write!(f, "{heavy}")
    }
}

fn write_backend(f: &mut fmt::Formatter<'_>, label: &str, stats: &LatencyStats) -> fmt::Result {
    writeln!(
        f,
        "{label}: {:.2}ms ({:.1} fps)",
        stats.mean_ms, stats.fps
    )?;
    writeln!(
        f,
        "  min {:.2} / p50 {:.2} / p95 {:.2} / max {:.2} ms",
        stats.min_ms, stats.p50_ms, stats.p95_ms, stats.max_ms
    )
}
