pub mod post;
pub mod pre;

pub use post::{PostProcessor, TransformParams};
pub use pre::{Letterbox, PreProcessor};
