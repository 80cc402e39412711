use crate::compositor::{self, ComposeError, DEFAULT_DISPLAY_SCALE, Panel};
use crate::sink::WindowSink;
use crate::source::FrameSource;
use crate::stats::{self, LatencySamples, StatsError, Summary};
use crate::timer::{Timer, WallClock};
use anyhow::Context;
use common::{span, span_debug};
use detector::Detector;
use std::fmt;

const PROGRESS_INTERVAL: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopOptions {
    pub display_scale: f64,
    /// Ticks at the start of the run that are displayed but not recorded.
    pub warmup_frames: u64,
    pub max_frames: Option<u64>,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            display_scale: DEFAULT_DISPLAY_SCALE,
            warmup_frames: 0,
            max_frames: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    SourceExhausted,
    UserStop,
    FrameLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::SourceExhausted => f.write_str("end of input"),
            StopReason::UserStop => f.write_str("user stop"),
            StopReason::FrameLimit => f.write_str("frame limit"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Ticks completed, warm-up included.
    pub frames: u64,
    pub stop_reason: StopReason,
    pub fast_label: String,
    pub reference_label: String,
    pub fast_samples: LatencySamples,
    pub reference_samples: LatencySamples,
    pub statistics: Result<Summary, StatsError>,
}

/// Runs two detectors over the same frames, one tick per frame.
///
/// Each tick the frame is cloned once: the fast backend gets the copy and the
/// reference backend the original, so neither can observe the other's
/// drawing. Both calls are timed individually and run strictly in order.
pub struct ComparisonLoop<A, B, T = WallClock> {
    fast: A,
    reference: B,
    timer: T,
    options: LoopOptions,
}

impl<A: Detector, B: Detector> ComparisonLoop<A, B, WallClock> {
    pub fn new(fast: A, reference: B, options: LoopOptions) -> Self {
        Self::with_timer(fast, reference, WallClock, options)
    }
}

impl<A: Detector, B: Detector, T: Timer> ComparisonLoop<A, B, T> {
    pub fn with_timer(fast: A, reference: B, timer: T, options: LoopOptions) -> Self {
        Self {
            fast,
            reference,
            timer,
            options,
        }
    }

    /// Consume `source` until it is exhausted, the sink asks to stop, or the
    /// frame limit is hit. Detector and display failures abort the run.
    pub fn run<S, W>(&mut self, source: &mut S, sink: &mut W) -> anyhow::Result<RunSummary>
    where
        S: FrameSource + ?Sized,
        W: WindowSink + ?Sized,
    {
        let scale = self.options.display_scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ComposeError::InvalidScale(scale).into());
        }

        let _run = span!(
            "comparison_run",
            fast = %self.fast.label(),
            reference = %self.reference.label()
        );
        tracing::info!(
            fast = %self.fast.label(),
            reference = %self.reference.label(),
            warmup_frames = self.options.warmup_frames,
            max_frames = ?self.options.max_frames,
            controls = sink.stop_hint(),
            "Comparison started"
        );

        let mut fast_samples = LatencySamples::default();
        let mut reference_samples = LatencySamples::default();
        let mut frames: u64 = 0;

        let stop_reason = loop {
            if self.options.max_frames.is_some_and(|max| frames >= max) {
                break StopReason::FrameLimit;
            }

            let Some(frame) = source
                .next_frame()
                .with_context(|| format!("Failed to read frame {}", frames + 1))?
            else {
                break StopReason::SourceExhausted;
            };
            frames += 1;

            let _tick = span_debug!("tick", frame = frames);

            let fast_input = frame.clone();
            let reference_input = frame;

            let (fast_result, fast_ms) = {
                let _s = span_debug!("detect", backend = "fast");
                self.timer
                    .measure(|| self.fast.detect_and_annotate(fast_input))
            };
            let fast_annotated = fast_result.with_context(|| {
                format!("{} failed on frame {}", self.fast.label(), frames)
            })?;

            let (reference_result, reference_ms) = {
                let _s = span_debug!("detect", backend = "reference");
                self.timer
                    .measure(|| self.reference.detect_and_annotate(reference_input))
            };
            let reference_annotated = reference_result.with_context(|| {
                format!("{} failed on frame {}", self.reference.label(), frames)
            })?;

            if frames > self.options.warmup_frames {
                fast_samples.push(fast_ms);
                reference_samples.push(reference_ms);
            }

            let composite = compositor::compose(
                Panel {
                    frame: fast_annotated.frame,
                    label: self.fast.label(),
                    latency_ms: fast_ms,
                },
                Panel {
                    frame: reference_annotated.frame,
                    label: self.reference.label(),
                    latency_ms: reference_ms,
                },
                scale,
            )?;

            sink.show(&composite).context("Failed to display composite frame")?;

            if frames.is_multiple_of(PROGRESS_INTERVAL) {
                tracing::debug!(
                    frame = frames,
                    fast_ms,
                    reference_ms,
                    fast_detections = fast_annotated.detections.len(),
                    reference_detections = reference_annotated.detections.len(),
                    "Progress"
                );
            }

            if sink.stop_requested()? {
                break StopReason::UserStop;
            }
        };

        let statistics = stats::summarize(fast_samples.as_slice(), reference_samples.as_slice());

        tracing::info!(
            frames,
            stop_reason = %stop_reason,
            recorded = fast_samples.len(),
            "Comparison finished"
        );

        Ok(RunSummary {
            frames,
            stop_reason,
            fast_label: self.fast.label().to_string(),
            reference_label: self.reference.label().to_string(),
            fast_samples,
            reference_samples,
            statistics,
        })
    }
}
