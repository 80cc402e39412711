use detector::{BackendSpec, Detection, Detector, Frame, InferenceOptions};
use harness::source::FrameIter;
use harness::stats::{StatsError, Summary};
use harness::{ComparisonLoop, LoopOptions, StopReason, Timer, WindowSink};
use image::Rgb;
use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

type CallLog = Rc<RefCell<Vec<String>>>;

/// Detector that logs every call, optionally marks its input frame, and
/// records the first pixel of every frame it receives.
struct ScriptedDetector {
    label: String,
    log: CallLog,
    scribble: bool,
    seen: Rc<RefCell<Vec<[u8; 3]>>>,
    fail_on_call: Option<usize>,
    calls: usize,
}

impl ScriptedDetector {
    fn new(label: &str, log: &CallLog) -> Self {
        Self {
            label: label.to_string(),
            log: Rc::clone(log),
            scribble: false,
            seen: Rc::new(RefCell::new(Vec::new())),
            fail_on_call: None,
            calls: 0,
        }
    }
}

impl Detector for ScriptedDetector {
    fn load(_spec: &BackendSpec, _options: &InferenceOptions) -> anyhow::Result<Self> {
        anyhow::bail!("scripted detectors are built directly")
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn infer(&mut self, frame: &Frame) -> anyhow::Result<Vec<Detection>> {
        self.calls += 1;
        self.log.borrow_mut().push(self.label.clone());
        self.seen.borrow_mut().push(frame.get_pixel(0, 0).0);

        if self.fail_on_call == Some(self.calls) {
            anyhow::bail!("inference failed");
        }

        Ok(vec![Detection {
            x1: 1.0,
            y1: 1.0,
            x2: 6.0,
            y2: 6.0,
            confidence: 0.9,
            class_id: 0,
            label: "target".to_string(),
        }])
    }

    fn detect_and_annotate(&mut self, mut frame: Frame) -> anyhow::Result<detector::Annotated> {
        if self.scribble {
            frame.put_pixel(0, 0, Rgb([255, 0, 255]));
        }
        let detections = self.infer(&frame)?;
        let frame = self.render(frame, &detections);
        Ok(detector::Annotated { frame, detections })
    }
}

/// Returns scripted latencies in call order, cycling when exhausted.
struct ScriptedTimer {
    latencies: Vec<f64>,
    next: usize,
}

impl ScriptedTimer {
    fn alternating(fast_ms: f64, reference_ms: f64) -> Self {
        Self {
            latencies: vec![fast_ms, reference_ms],
            next: 0,
        }
    }
}

impl Timer for ScriptedTimer {
    fn measure<T>(&mut self, operation: impl FnOnce() -> T) -> (T, f64) {
        let result = operation();
        let elapsed = self.latencies[self.next % self.latencies.len()];
        self.next += 1;
        (result, elapsed)
    }
}

/// Remembers composite sizes and requests a stop after a scripted poll.
#[derive(Default)]
struct RecordingSink {
    shown: Vec<(u32, u32)>,
    stop_after: Option<usize>,
    polls: usize,
    hint: Option<&'static str>,
}

impl WindowSink for RecordingSink {
    fn show(&mut self, frame: &Frame) -> anyhow::Result<()> {
        self.shown.push(frame.dimensions());
        Ok(())
    }

    fn stop_requested(&mut self) -> anyhow::Result<bool> {
        self.polls += 1;
        Ok(self.stop_after.is_some_and(|n| self.polls >= n))
    }

    fn stop_hint(&self) -> Option<&str> {
        self.hint
    }
}

/// Collects formatted log output for assertions.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn run_logged(sink: &mut RecordingSink) -> String {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let log = CallLog::default();
        comparison(&log, LoopOptions::default())
            .run(&mut frames(1), sink)
            .unwrap();
    });
    buffer.contents()
}

fn frames(count: usize) -> FrameIter<std::vec::IntoIter<Frame>> {
    let frames = (0..count)
        .map(|i| Frame::from_pixel(40, 30, Rgb([i as u8 * 10, 0, 0])))
        .collect::<Vec<_>>();
    FrameIter::new(frames)
}

fn comparison(
    log: &CallLog,
    options: LoopOptions,
) -> ComparisonLoop<ScriptedDetector, ScriptedDetector, ScriptedTimer> {
    ComparisonLoop::with_timer(
        ScriptedDetector::new("fast", log),
        ScriptedDetector::new("reference", log),
        ScriptedTimer::alternating(10.0, 20.0),
        options,
    )
}

#[test]
fn zero_frames_skip_statistics() {
    let log = CallLog::default();
    let mut sink = RecordingSink::default();

    let summary = comparison(&log, LoopOptions::default())
        .run(&mut frames(0), &mut sink)
        .unwrap();

    assert_eq!(summary.frames, 0);
    assert_eq!(summary.stop_reason, StopReason::SourceExhausted);
    assert_eq!(summary.statistics, Ok(Summary::Skipped));
    assert!(log.borrow().is_empty());
    assert!(sink.shown.is_empty());
}

#[test]
fn three_frames_give_exact_statistics() {
    let log = CallLog::default();
    let mut sink = RecordingSink::default();

    let summary = comparison(&log, LoopOptions::default())
        .run(&mut frames(3), &mut sink)
        .unwrap();

    assert_eq!(summary.frames, 3);
    assert_eq!(summary.fast_samples.as_slice(), &[10.0, 10.0, 10.0]);
    assert_eq!(summary.reference_samples.as_slice(), &[20.0, 20.0, 20.0]);

    let Ok(Summary::Measured(stats)) = &summary.statistics else {
        panic!("expected measured statistics, got {:?}", summary.statistics);
    };
    assert_eq!(stats.fast.mean_ms, 10.0);
    assert_eq!(stats.fast.fps, 100.0);
    assert_eq!(stats.reference.mean_ms, 20.0);
    assert_eq!(stats.reference.fps, 50.0);
    assert_eq!(stats.speedup_ratio, 2.0);
}

#[test]
fn backends_run_in_order_once_per_frame() {
    let log = CallLog::default();
    let mut sink = RecordingSink::default();

    comparison(&log, LoopOptions::default())
        .run(&mut frames(3), &mut sink)
        .unwrap();

    assert_eq!(
        *log.borrow(),
        vec!["fast", "reference", "fast", "reference", "fast", "reference"]
    );
    assert_eq!(sink.shown.len(), 3);
    assert_eq!(sink.polls, 3);
}

#[test]
fn fast_backend_mutation_does_not_reach_reference() {
    let log = CallLog::default();
    let mut fast = ScriptedDetector::new("fast", &log);
    fast.scribble = true;
    let reference = ScriptedDetector::new("reference", &log);
    let reference_seen = Rc::clone(&reference.seen);

    let mut comparison = ComparisonLoop::with_timer(
        fast,
        reference,
        ScriptedTimer::alternating(10.0, 20.0),
        LoopOptions::default(),
    );
    comparison
        .run(&mut frames(3), &mut RecordingSink::default())
        .unwrap();

    assert_eq!(
        *reference_seen.borrow(),
        vec![[0, 0, 0], [10, 0, 0], [20, 0, 0]]
    );
}

#[test]
fn stop_after_two_of_five_frames() {
    let log = CallLog::default();
    let mut sink = RecordingSink {
        stop_after: Some(2),
        ..Default::default()
    };
    let mut source = frames(5);

    let summary = comparison(&log, LoopOptions::default())
        .run(&mut source, &mut sink)
        .unwrap();

    assert_eq!(summary.frames, 2);
    assert_eq!(summary.stop_reason, StopReason::UserStop);
    assert_eq!(summary.fast_samples.len(), 2);
    assert_eq!(summary.reference_samples.len(), 2);
    assert_eq!(log.borrow().len(), 4);

    // The remaining frames were never pulled
    let mut remaining = 0;
    while harness::FrameSource::next_frame(&mut source).unwrap().is_some() {
        remaining += 1;
    }
    assert_eq!(remaining, 3);
}

#[test]
fn frame_limit_ends_run() {
    let log = CallLog::default();
    let options = LoopOptions {
        max_frames: Some(4),
        ..Default::default()
    };

    let summary = comparison(&log, options)
        .run(&mut frames(10), &mut RecordingSink::default())
        .unwrap();

    assert_eq!(summary.frames, 4);
    assert_eq!(summary.stop_reason, StopReason::FrameLimit);
    assert_eq!(summary.fast_samples.len(), 4);
}

#[test]
fn warmup_ticks_are_shown_but_not_recorded() {
    let log = CallLog::default();
    let mut sink = RecordingSink::default();
    let options = LoopOptions {
        warmup_frames: 2,
        ..Default::default()
    };

    let summary = comparison(&log, options)
        .run(&mut frames(5), &mut sink)
        .unwrap();

    assert_eq!(summary.frames, 5);
    assert_eq!(sink.shown.len(), 5);
    assert_eq!(summary.fast_samples.len(), 3);
    assert_eq!(summary.reference_samples.len(), 3);
}

#[test]
fn warmup_longer_than_input_skips_statistics() {
    let log = CallLog::default();
    let options = LoopOptions {
        warmup_frames: 10,
        ..Default::default()
    };

    let summary = comparison(&log, options)
        .run(&mut frames(3), &mut RecordingSink::default())
        .unwrap();

    assert_eq!(summary.frames, 3);
    assert_eq!(summary.statistics, Ok(Summary::Skipped));
}

#[test]
fn composite_size_follows_display_scale() {
    let log = CallLog::default();
    let mut sink = RecordingSink::default();

    comparison(&log, LoopOptions::default())
        .run(&mut frames(1), &mut sink)
        .unwrap();

    // Two 40x30 frames side by side, scaled by 0.8
    assert_eq!(sink.shown, vec![(64, 24)]);
}

#[test]
fn zero_latency_is_insufficient_timing_data() {
    let log = CallLog::default();
    let mut comparison = ComparisonLoop::with_timer(
        ScriptedDetector::new("fast", &log),
        ScriptedDetector::new("reference", &log),
        ScriptedTimer::alternating(0.0, 20.0),
        LoopOptions::default(),
    );

    let summary = comparison
        .run(&mut frames(2), &mut RecordingSink::default())
        .unwrap();

    assert!(matches!(
        summary.statistics,
        Err(StatsError::InsufficientTimingData { .. })
    ));
}

#[test]
fn start_log_carries_window_stop_hint() {
    let mut sink = RecordingSink {
        hint: Some("press 'q' in the window to quit"),
        ..Default::default()
    };

    let logs = run_logged(&mut sink);

    let started = logs
        .lines()
        .find(|line| line.contains("Comparison started"))
        .unwrap();
    assert!(started.contains("press 'q' in the window to quit"));
}

#[test]
fn start_log_omits_hint_without_window() {
    let logs = run_logged(&mut RecordingSink::default());

    let started = logs
        .lines()
        .find(|line| line.contains("Comparison started"))
        .unwrap();
    assert!(!started.contains("controls"));
}

#[test]
fn backend_failure_aborts_run() {
    let log = CallLog::default();
    let fast = ScriptedDetector::new("fast", &log);
    let mut reference = ScriptedDetector::new("reference", &log);
    reference.fail_on_call = Some(2);
    let mut sink = RecordingSink::default();

    let mut comparison = ComparisonLoop::with_timer(
        fast,
        reference,
        ScriptedTimer::alternating(10.0, 20.0),
        LoopOptions::default(),
    );
    let err = comparison.run(&mut frames(5), &mut sink).unwrap_err();

    assert!(err.to_string().contains("reference failed on frame 2"));
    assert_eq!(sink.shown.len(), 1);
    assert_eq!(*log.borrow(), vec!["fast", "reference", "fast", "reference"]);
}

#[test]
fn invalid_display_scale_is_rejected_before_reading() {
    let log = CallLog::default();
    let options = LoopOptions {
        display_scale: 0.0,
        ..Default::default()
    };

    let result = comparison(&log, options).run(&mut frames(2), &mut RecordingSink::default());

    assert!(result.is_err());
    assert!(log.borrow().is_empty());
}
