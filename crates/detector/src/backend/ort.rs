use super::{BackendSpec, ExecutionProvider, InferenceOptions};
use crate::classes::ClassNames;
use crate::detection::{Detection, Detector, Frame};
use crate::processing::{PostProcessor, PreProcessor, TransformParams};
use anyhow::Context;
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};

const INPUT_NAME: &str = "images";
const OUTPUT_NAME: &str = "output0";
const NAMES_METADATA_KEY: &str = "names";

/// A YOLO model exported to ONNX, executed by ONNX Runtime.
pub struct OrtDetector {
    label: String,
    session: Session,
    preprocessor: PreProcessor,
    postprocessor: PostProcessor,
    class_names: ClassNames,
}

impl OrtDetector {
    fn build_session(path: &str, provider: ExecutionProvider) -> anyhow::Result<Session> {
        // Initialize ORT environment (idempotent)
        let _ = ort::init().commit();

        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?;

        match provider {
            ExecutionProvider::Cuda => {
                tracing::info!("Initializing ONNX Runtime with CUDA execution provider");
                builder = builder.with_execution_providers([
                    ort::execution_providers::CUDAExecutionProvider::default()
                        .with_device_id(0)
                        .build()
                        .error_on_failure(),
                ])?;
            }
            ExecutionProvider::CoreMl => {
                tracing::info!("Initializing ONNX Runtime with CoreML execution provider");
                builder = builder.with_execution_providers([
                    ort::execution_providers::CoreMLExecutionProvider::default()
                        .build()
                        .error_on_failure(),
                ])?;
            }
            ExecutionProvider::Cpu => {
                tracing::info!("Initializing ONNX Runtime with CPU execution provider");
            }
        }

        Ok(builder.commit_from_file(path)?)
    }

    fn read_class_names(session: &Session) -> ClassNames {
        match session
            .metadata()
            .and_then(|meta| meta.custom(NAMES_METADATA_KEY))
        {
            Ok(Some(raw)) => ClassNames::parse(&raw),
            Ok(None) => ClassNames::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read class names from model metadata");
                ClassNames::default()
            }
        }
    }
}

impl Detector for OrtDetector {
    fn load(spec: &BackendSpec, options: &InferenceOptions) -> anyhow::Result<Self> {
        let session = Self::build_session(&spec.model_path, spec.provider)
            .with_context(|| format!("Failed to load model {}", spec.model_path))?;

        let class_names = Self::read_class_names(&session);

        tracing::info!(
            label = %spec.label,
            model_path = %spec.model_path,
            provider = %spec.provider,
            classes = class_names.len(),
            "Model loaded"
        );

        Ok(Self {
            label: spec.label.clone(),
            session,
            preprocessor: PreProcessor::new(options.input_size),
            postprocessor: PostProcessor::new(
                options.confidence_threshold,
                options.iou_threshold,
            ),
            class_names,
        })
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn infer(&mut self, frame: &Frame) -> anyhow::Result<Vec<Detection>> {
        let (input, letterbox) = self.preprocessor.preprocess(frame)?;

        let output = {
            let _infer_span = tracing::info_span!("model_inference", label = %self.label).entered();
            let outputs = self.session.run(ort::inputs![
                INPUT_NAME => TensorRef::from_array_view(input.view())?
            ])?;
            outputs[OUTPUT_NAME].try_extract_array::<f32>()?.into_owned()
        };

        let transform = TransformParams {
            orig_width: frame.width(),
            orig_height: frame.height(),
            letterbox,
        };

        self.postprocessor
            .parse_detections(&output.view(), &transform, &self.class_names)
    }
}
