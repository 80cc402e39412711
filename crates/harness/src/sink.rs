use crate::config::ComparisonConfig;
use detector::Frame;
use signal_hook::{
    consts::{SIGINT, SIGTERM},
    flag,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("cannot open window {0:?}: built without the `opencv` feature (set HEADLESS=true to run without one)")]
    WindowUnavailable(String),
}

/// Where composite frames are shown, and where the user asks to stop.
pub trait WindowSink {
    fn show(&mut self, frame: &Frame) -> anyhow::Result<()>;

    /// Non-blocking poll, called once per tick after `show`.
    fn stop_requested(&mut self) -> anyhow::Result<bool>;

    /// How the operator stops the run, if the sink takes input.
    fn stop_hint(&self) -> Option<&str> {
        None
    }
}

impl<W: WindowSink + ?Sized> WindowSink for Box<W> {
    fn show(&mut self, frame: &Frame) -> anyhow::Result<()> {
        (**self).show(frame)
    }

    fn stop_requested(&mut self) -> anyhow::Result<bool> {
        (**self).stop_requested()
    }

    fn stop_hint(&self) -> Option<&str> {
        (**self).stop_hint()
    }
}

/// Displays nothing. SIGINT or SIGTERM count as the stop request.
pub struct HeadlessSink {
    shutdown: Arc<AtomicBool>,
    shown: u64,
}

impl HeadlessSink {
    pub fn new() -> anyhow::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));

        flag::register(SIGTERM, Arc::clone(&shutdown))?;
        flag::register(SIGINT, Arc::clone(&shutdown))?;

        tracing::info!("Running headless, stop with Ctrl-C");

        Ok(Self::with_flag(shutdown))
    }

    /// Use an externally owned stop flag instead of signal handlers.
    pub fn with_flag(shutdown: Arc<AtomicBool>) -> Self {
        Self { shutdown, shown: 0 }
    }

    pub fn frames_shown(&self) -> u64 {
        self.shown
    }
}

impl WindowSink for HeadlessSink {
    fn show(&mut self, _frame: &Frame) -> anyhow::Result<()> {
        self.shown += 1;
        Ok(())
    }

    fn stop_requested(&mut self) -> anyhow::Result<bool> {
        Ok(self.shutdown.load(Ordering::Relaxed))
    }
}

pub fn open_sink(config: &ComparisonConfig) -> anyhow::Result<Box<dyn WindowSink>> {
    if config.headless {
        return Ok(Box::new(HeadlessSink::new()?));
    }
    open_window(&config.window_title)
}

#[cfg(feature = "opencv")]
fn open_window(title: &str) -> anyhow::Result<Box<dyn WindowSink>> {
    Ok(Box::new(window::HighGuiSink::open(title)?))
}

#[cfg(not(feature = "opencv"))]
fn open_window(title: &str) -> anyhow::Result<Box<dyn WindowSink>> {
    Err(SinkError::WindowUnavailable(title.to_string()).into())
}

#[cfg(feature = "opencv")]
pub mod window {
    use super::WindowSink;
    use anyhow::Context;
    use detector::Frame;
    use opencv::{
        core::{AlgorithmHint, Mat},
        highgui, imgproc,
        prelude::*,
    };

    const STOP_KEY: i32 = b'q' as i32;
    const POLL_MS: i32 = 1;
    const STOP_HINT: &str = "press 'q' in the window to quit";

    /// One named HighGUI window, destroyed when dropped.
    pub struct HighGuiSink {
        title: String,
        bgr: Mat,
    }

    impl HighGuiSink {
        pub fn open(title: &str) -> anyhow::Result<Self> {
            highgui::named_window(title, highgui::WINDOW_AUTOSIZE)
                .with_context(|| format!("Failed to create window {title:?}"))?;
            Ok(Self {
                title: title.to_string(),
                bgr: Mat::default(),
            })
        }
    }

    impl WindowSink for HighGuiSink {
        fn show(&mut self, frame: &Frame) -> anyhow::Result<()> {
            let flat = Mat::from_slice(frame.as_raw())?;
            let rgb = flat.reshape(3, frame.height() as i32)?;

            imgproc::cvt_color(
                &*rgb,
                &mut self.bgr,
                imgproc::COLOR_RGB2BGR,
                0,
                AlgorithmHint::ALGO_HINT_DEFAULT,
            )?;

            highgui::imshow(&self.title, &self.bgr)?;
            Ok(())
        }

        fn stop_requested(&mut self) -> anyhow::Result<bool> {
            let key = highgui::wait_key(POLL_MS)?;
            Ok(key >= 0 && (key & 0xFF) == STOP_KEY)
        }

        fn stop_hint(&self) -> Option<&str> {
            Some(STOP_HINT)
        }
    }

    impl Drop for HighGuiSink {
        fn drop(&mut self) {
            if let Err(e) = highgui::destroy_window(&self.title) {
                tracing::warn!(error = %e, "Failed to destroy window");
            }
        }
    }
}
