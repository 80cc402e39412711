use crate::backend::{BackendSpec, InferenceOptions};
use crate::render;

/// One RGB video frame, 8 bits per channel, row-major.
pub type Frame = image::RgbImage;

/// A single detected object in frame pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
    pub class_id: u32,
    pub label: String,
}

impl Detection {
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Intersection over union with another box.
    pub fn iou(&self, other: &Detection) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let intersection = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - intersection;

        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }
}

/// Output of one detect-and-annotate call.
#[derive(Debug, Clone)]
pub struct Annotated {
    pub frame: Frame,
    pub detections: Vec<Detection>,
}

/// A detection model execution path.
///
/// `infer` is the model call proper, `render` draws its output onto a frame.
/// Frames are taken by value where they are modified, so a backend can never
/// touch pixels owned by another caller.
pub trait Detector {
    fn load(spec: &BackendSpec, options: &InferenceOptions) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Name shown in overlays and logs.
    fn label(&self) -> &str;

    fn infer(&mut self, frame: &Frame) -> anyhow::Result<Vec<Detection>>;

    fn render(&self, frame: Frame, detections: &[Detection]) -> Frame {
        render::draw_detections(frame, detections)
    }

    fn detect_and_annotate(&mut self, frame: Frame) -> anyhow::Result<Annotated> {
        let detections = self.infer(&frame)?;
        let frame = self.render(frame, &detections);
        Ok(Annotated { frame, detections })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(x1: f32, y1: f32, x2: f32, y2: f32) -> Detection {
        Detection {
            x1,
            y1,
            x2,
            y2,
            confidence: 0.9,
            class_id: 0,
            label: "person".to_string(),
        }
    }

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let a = boxed(10.0, 10.0, 50.0, 50.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = boxed(0.0, 0.0, 10.0, 10.0);
        let b = boxed(20.0, 20.0, 30.0, 30.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn iou_of_half_overlap() {
        // Overlap 5x10 = 50, union 100 + 100 - 50 = 150
        let a = boxed(0.0, 0.0, 10.0, 10.0);
        let b = boxed(5.0, 0.0, 15.0, 10.0);
        assert!((a.iou(&b) - 50.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_box_has_zero_area() {
        let a = boxed(10.0, 10.0, 5.0, 5.0);
        assert_eq!(a.area(), 0.0);
        assert_eq!(a.iou(&a), 0.0);
    }

    struct Blank;

    impl Detector for Blank {
        fn load(_spec: &BackendSpec, _options: &InferenceOptions) -> anyhow::Result<Self> {
            Ok(Blank)
        }

        fn label(&self) -> &str {
            "blank"
        }

        fn infer(&mut self, _frame: &Frame) -> anyhow::Result<Vec<Detection>> {
            Ok(vec![boxed(2.0, 2.0, 12.0, 12.0)])
        }
    }

    #[test]
    fn detect_and_annotate_draws_on_the_given_frame() {
        let mut detector = Blank;
        let frame = Frame::new(32, 32);

        let annotated = detector.detect_and_annotate(frame).unwrap();

        assert_eq!(annotated.detections.len(), 1);
        assert_eq!(annotated.frame.dimensions(), (32, 32));
        assert_ne!(annotated.frame.get_pixel(2, 6).0, [0, 0, 0]);
    }
}
