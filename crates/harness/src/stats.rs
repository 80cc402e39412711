use std::fmt;

/// Which side of the comparison a sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Fast,
    Reference,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Fast => f.write_str("fast"),
            Backend::Reference => f.write_str("reference"),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum StatsError {
    #[error("insufficient timing data for {backend} backend: mean latency is {mean_ms} ms")]
    InsufficientTimingData { backend: Backend, mean_ms: f64 },
}

/// Append-only per-backend latency record, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatencySamples {
    samples: Vec<f64>,
}

impl LatencySamples {
    pub fn push(&mut self, latency_ms: f64) {
        self.samples.push(latency_ms);
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Aggregate latency figures for one backend.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyStats {
    pub samples: usize,
    pub mean_ms: f64,
    pub fps: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
}

impl LatencyStats {
    /// `samples` must be non-empty.
    fn from_samples(backend: Backend, samples: &[f64]) -> Result<Self, StatsError> {
        let n = samples.len();
        let mean_ms = samples.iter().sum::<f64>() / n as f64;

        if !mean_ms.is_finite() || mean_ms <= 0.0 {
            return Err(StatsError::InsufficientTimingData { backend, mean_ms });
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        Ok(Self {
            samples: n,
            mean_ms,
            fps: 1000.0 / mean_ms,
            min_ms: sorted[0],
            max_ms: sorted[n - 1],
            p50_ms: percentile(&sorted, 50.0),
            p95_ms: percentile(&sorted, 95.0),
        })
    }
}

/// Nearest-rank percentile of already sorted data: the smallest sample with
/// at least `p` percent of the data at or below it.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = (p / 100.0 * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonStats {
    pub fast: LatencyStats,
    pub reference: LatencyStats,
    /// Reference mean over fast mean; above 1 means the fast backend is faster.
    pub speedup_ratio: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    /// At least one backend recorded no samples.
    Skipped,
    Measured(ComparisonStats),
}

pub fn summarize(fast: &[f64], reference: &[f64]) -> Result<Summary, StatsError> {
    if fast.is_empty() || reference.is_empty() {
        return Ok(Summary::Skipped);
    }

    let fast = LatencyStats::from_samples(Backend::Fast, fast)?;
    let reference = LatencyStats::from_samples(Backend::Reference, reference)?;
    let speedup_ratio = reference.mean_ms / fast.mean_ms;

    Ok(Summary::Measured(ComparisonStats {
        fast,
        reference,
        speedup_ratio,
    }))
}
