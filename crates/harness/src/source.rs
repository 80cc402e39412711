//! Finite, non-restartable frame sequences.

use anyhow::Context;
use detector::Frame;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("input {0} does not exist")]
    NotFound(PathBuf),

    #[error("invalid frame pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),

    #[error("cannot decode video {0}: built without the `opencv` feature")]
    UnsupportedInput(PathBuf),
}

/// Produces frames in order until exhausted.
pub trait FrameSource {
    /// `Ok(None)` once the sequence is exhausted; it stays exhausted.
    fn next_frame(&mut self) -> anyhow::Result<Option<Frame>>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> anyhow::Result<Option<Frame>> {
        (**self).next_frame()
    }
}

/// Adapts any iterator of already decoded frames.
pub struct FrameIter<I>(I);

impl<I: Iterator<Item = Frame>> FrameIter<I> {
    pub fn new(frames: impl IntoIterator<IntoIter = I>) -> Self {
        Self(frames.into_iter())
    }
}

impl<I: Iterator<Item = Frame>> FrameSource for FrameIter<I> {
    fn next_frame(&mut self) -> anyhow::Result<Option<Frame>> {
        Ok(self.0.next())
    }
}

/// Still images decoded one by one, in lexicographic path order.
#[derive(Debug)]
pub struct ImageSequenceSource {
    paths: std::vec::IntoIter<PathBuf>,
}

impl ImageSequenceSource {
    /// All jpg/jpeg/png files directly inside `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, SourceError> {
        if !dir.is_dir() {
            return Err(SourceError::NotFound(dir.to_path_buf()));
        }
        let pattern = dir.join("*");
        Self::from_glob(&pattern.to_string_lossy())
    }

    pub fn from_glob(pattern: &str) -> Result<Self, SourceError> {
        let mut paths: Vec<PathBuf> = glob::glob(pattern)?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable path");
                    None
                }
            })
            .filter(|path| path.is_file() && is_image(path))
            .collect();
        paths.sort();

        tracing::debug!(pattern, frames = paths.len(), "Image sequence resolved");

        Ok(Self::from_paths(paths))
    }

    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            paths: paths.into_iter(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.paths.len()
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> anyhow::Result<Option<Frame>> {
        let Some(path) = self.paths.next() else {
            return Ok(None);
        };
        let image = image::open(&path)
            .with_context(|| format!("Failed to decode frame {}", path.display()))?;
        Ok(Some(image.into_rgb8()))
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

fn is_glob(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

/// Pick a source for `input`: a glob pattern, a directory of stills, a single
/// still image, or otherwise a video file.
pub fn open_source(input: &str) -> anyhow::Result<Box<dyn FrameSource>> {
    if is_glob(input) {
        return Ok(Box::new(ImageSequenceSource::from_glob(input)?));
    }

    let path = Path::new(input);
    if path.is_dir() {
        return Ok(Box::new(ImageSequenceSource::from_dir(path)?));
    }
    if !path.exists() {
        return Err(SourceError::NotFound(path.to_path_buf()).into());
    }
    if is_image(path) {
        return Ok(Box::new(ImageSequenceSource::from_paths(vec![
            path.to_path_buf(),
        ])));
    }

    open_video(path)
}

#[cfg(feature = "opencv")]
fn open_video(path: &Path) -> anyhow::Result<Box<dyn FrameSource>> {
    Ok(Box::new(video::VideoFileSource::open(path)?))
}

#[cfg(not(feature = "opencv"))]
fn open_video(path: &Path) -> anyhow::Result<Box<dyn FrameSource>> {
    Err(SourceError::UnsupportedInput(path.to_path_buf()).into())
}

#[cfg(feature = "opencv")]
pub mod video {
    use super::FrameSource;
    use anyhow::Context;
    use detector::Frame;
    use opencv::{
        core::{AlgorithmHint, Mat},
        imgproc,
        prelude::*,
        videoio::{self, VideoCapture},
    };
    use std::path::Path;

    /// Frames decoded from a video file through OpenCV, converted BGR to RGB.
    pub struct VideoFileSource {
        capture: VideoCapture,
        bgr: Mat,
        rgb: Mat,
        exhausted: bool,
    }

    impl VideoFileSource {
        pub fn open(path: &Path) -> anyhow::Result<Self> {
            let path_str = path.to_string_lossy();
            let capture = VideoCapture::from_file(&path_str, videoio::CAP_ANY)
                .with_context(|| format!("Failed to open video {}", path.display()))?;

            if !capture.is_opened()? {
                anyhow::bail!("Could not open video {}", path.display());
            }

            tracing::info!(
                path = %path.display(),
                width = capture.get(videoio::CAP_PROP_FRAME_WIDTH).unwrap_or(0.0),
                height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT).unwrap_or(0.0),
                fps = capture.get(videoio::CAP_PROP_FPS).unwrap_or(0.0),
                "Video opened"
            );

            Ok(Self {
                capture,
                bgr: Mat::default(),
                rgb: Mat::default(),
                exhausted: false,
            })
        }
    }

    impl FrameSource for VideoFileSource {
        fn next_frame(&mut self) -> anyhow::Result<Option<Frame>> {
            if self.exhausted {
                return Ok(None);
            }
            if !self.capture.read(&mut self.bgr)? || self.bgr.empty() {
                self.exhausted = true;
                return Ok(None);
            }

            imgproc::cvt_color(
                &self.bgr,
                &mut self.rgb,
                imgproc::COLOR_BGR2RGB,
                0,
                AlgorithmHint::ALGO_HINT_DEFAULT,
            )
            .context("Failed to convert frame to RGB")?;

            let (width, height) = (self.rgb.cols() as u32, self.rgb.rows() as u32);
            let data = self.rgb.data_bytes()?.to_vec();

            Frame::from_raw(width, height, data)
                .map(Some)
                .context("Decoded frame has an unexpected buffer size")
        }
    }
}
