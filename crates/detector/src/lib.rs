pub mod backend;
pub mod classes;
pub mod detection;
pub mod font;
pub mod processing;
pub mod render;

// Re-export commonly used types for convenience
pub use backend::{BackendSpec, ExecutionProvider, InferenceOptions};
pub use classes::ClassNames;
pub use detection::{Annotated, Detection, Detector, Frame};
