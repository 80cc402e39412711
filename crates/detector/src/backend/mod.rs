use std::fmt;
use std::str::FromStr;

#[cfg(feature = "ort-backend")]
pub mod ort;

pub const DEFAULT_INPUT_SIZE: (u32, u32) = (640, 640);
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionProvider {
    Cpu,
    Cuda,
    CoreMl,
}

impl ExecutionProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionProvider::Cpu => "cpu",
            ExecutionProvider::Cuda => "cuda",
            ExecutionProvider::CoreMl => "coreml",
        }
    }
}

impl fmt::Display for ExecutionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown execution provider `{0}` (expected cpu, cuda or coreml)")]
pub struct UnknownProvider(pub String);

impl FromStr for ExecutionProvider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cpu" => Ok(ExecutionProvider::Cpu),
            "cuda" | "gpu" => Ok(ExecutionProvider::Cuda),
            "coreml" | "core-ml" => Ok(ExecutionProvider::CoreMl),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// Which model to load and how to present it.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendSpec {
    pub label: String,
    pub model_path: String,
    pub provider: ExecutionProvider,
}

impl BackendSpec {
    pub fn new(
        label: impl Into<String>,
        model_path: impl Into<String>,
        provider: ExecutionProvider,
    ) -> Self {
        Self {
            label: label.into(),
            model_path: model_path.into(),
            provider,
        }
    }
}

/// Pre/post-processing settings shared by both backends of a comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceOptions {
    pub input_size: (u32, u32),
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            input_size: DEFAULT_INPUT_SIZE,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
        }
    }
}
