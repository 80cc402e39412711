use crate::comparison::LoopOptions;
use crate::compositor::DEFAULT_DISPLAY_SCALE;
use detector::backend::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_INPUT_SIZE, DEFAULT_IOU_THRESHOLD};
use detector::{BackendSpec, ExecutionProvider, InferenceOptions};
use std::env;
use std::fmt;
use std::str::FromStr;

pub use common::Environment;

pub const DEFAULT_VIDEO_PATH: &str = "video_test_5.mp4";
pub const DEFAULT_REFERENCE_MODEL_PATH: &str = "best.onnx";
pub const DEFAULT_REFERENCE_MODEL_LABEL: &str = "PyTorch FP32";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {name}")]
    InvalidValue { name: &'static str, value: String },

    #[error("display scale must be a positive finite number, got {0}")]
    InvalidDisplayScale(f64),
}

/// The two deployment targets compared against the reference model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Android,
    Ios,
}

impl Scenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Android => "android",
            Scenario::Ios => "ios",
        }
    }

    pub fn window_title(&self) -> &'static str {
        match self {
            Scenario::Android => "Android Model Comparison (TFLite vs PyTorch)",
            Scenario::Ios => "iOS Model Comparison (CoreML vs PyTorch)",
        }
    }

    fn fast_backend(&self) -> BackendSpec {
        match self {
            Scenario::Android => BackendSpec::new(
                "TFLite INT8",
                "models/android/best_int8.onnx",
                ExecutionProvider::Cpu,
            ),
            Scenario::Ios => BackendSpec::new(
                "CoreML FP16",
                "models/ios/best_fp16.onnx",
                ExecutionProvider::CoreMl,
            ),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonConfig {
    pub environment: Environment,
    pub scenario: Scenario,
    pub window_title: String,
    pub video_path: String,
    pub fast: BackendSpec,
    pub reference: BackendSpec,
    pub inference: InferenceOptions,
    pub display_scale: f64,
    pub headless: bool,
    pub max_frames: Option<u64>,
    pub warmup_frames: u64,
}

impl ComparisonConfig {
    /// Fixed defaults of a scenario, ignoring the environment.
    pub fn for_scenario(scenario: Scenario) -> Self {
        Self {
            environment: Environment::default(),
            scenario,
            window_title: scenario.window_title().to_string(),
            video_path: DEFAULT_VIDEO_PATH.to_string(),
            fast: scenario.fast_backend(),
            reference: BackendSpec::new(
                DEFAULT_REFERENCE_MODEL_LABEL,
                DEFAULT_REFERENCE_MODEL_PATH,
                ExecutionProvider::Cpu,
            ),
            inference: InferenceOptions::default(),
            display_scale: DEFAULT_DISPLAY_SCALE,
            headless: false,
            max_frames: None,
            warmup_frames: 0,
        }
    }

    /// Load configuration from environment variables on top of the scenario defaults
    pub fn from_env(scenario: Scenario) -> Result<Self, ConfigError> {
        let mut config = Self::from_lookup(scenario, |name| env::var(name).ok())?;
        config.environment = Environment::from_env();
        Ok(config)
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable lookup.
    pub fn from_lookup(
        scenario: Scenario,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::for_scenario(scenario);

        let video_path = lookup("VIDEO_PATH").unwrap_or(defaults.video_path);

        let fast = BackendSpec {
            label: lookup("FAST_MODEL_LABEL").unwrap_or(defaults.fast.label),
            model_path: lookup("FAST_MODEL_PATH").unwrap_or(defaults.fast.model_path),
            provider: parse_var(&lookup, "FAST_EXECUTION_PROVIDER")?
                .unwrap_or(defaults.fast.provider),
        };

        let reference = BackendSpec {
            label: lookup("REFERENCE_MODEL_LABEL").unwrap_or(defaults.reference.label),
            model_path: lookup("REFERENCE_MODEL_PATH").unwrap_or(defaults.reference.model_path),
            provider: parse_var(&lookup, "REFERENCE_EXECUTION_PROVIDER")?
                .unwrap_or(defaults.reference.provider),
        };

        let input_width = parse_var(&lookup, "INPUT_WIDTH")?.unwrap_or(DEFAULT_INPUT_SIZE.0);
        let input_height = parse_var(&lookup, "INPUT_HEIGHT")?.unwrap_or(DEFAULT_INPUT_SIZE.1);

        let inference = InferenceOptions {
            input_size: (input_width, input_height),
            confidence_threshold: parse_var(&lookup, "CONFIDENCE_THRESHOLD")?
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            iou_threshold: parse_var(&lookup, "IOU_THRESHOLD")?.unwrap_or(DEFAULT_IOU_THRESHOLD),
        };

        let headless = parse_var::<Flag>(&lookup, "HEADLESS")?
            .map(|flag| flag.0)
            .unwrap_or(defaults.headless);

        let config = Self {
            environment: defaults.environment,
            scenario,
            window_title: defaults.window_title,
            video_path,
            fast,
            reference,
            inference,
            display_scale: parse_var(&lookup, "DISPLAY_SCALE")?.unwrap_or(defaults.display_scale),
            headless,
            max_frames: parse_var(&lookup, "MAX_FRAMES")?,
            warmup_frames: parse_var(&lookup, "WARMUP_FRAMES")?.unwrap_or(defaults.warmup_frames),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.display_scale.is_finite() || self.display_scale <= 0.0 {
            return Err(ConfigError::InvalidDisplayScale(self.display_scale));
        }
        Ok(())
    }

    pub fn loop_options(&self) -> LoopOptions {
        LoopOptions {
            display_scale: self.display_scale,
            warmup_frames: self.warmup_frames,
            max_frames: self.max_frames,
        }
    }
}

/// Unset and blank variables read as `None`; anything else must parse.
fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        _ => Ok(None),
    }
}

/// Boolean accepting the usual shell spellings.
struct Flag(bool);

impl FromStr for Flag {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Flag(true)),
            "0" | "false" | "no" | "off" => Ok(Flag(false)),
            _ => Err(()),
        }
    }
}
