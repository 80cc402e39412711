use crate::classes::ClassNames;
use crate::detection::Detection;
use crate::processing::pre::Letterbox;
use std::cmp::Ordering;

/// Upper bound on boxes kept per frame after suppression.
pub const MAX_DETECTIONS: usize = 300;

/// Maps model-input coordinates back onto the original frame.
#[derive(Debug, Clone, Copy)]
pub struct TransformParams {
    pub orig_width: u32,
    pub orig_height: u32,
    pub letterbox: Letterbox,
}

impl TransformParams {
    #[inline]
    fn to_frame_x(&self, x: f32) -> f32 {
        ((x - self.letterbox.offset_x) / self.letterbox.scale).clamp(0.0, self.orig_width as f32)
    }

    #[inline]
    fn to_frame_y(&self, y: f32) -> f32 {
        ((y - self.letterbox.offset_y) / self.letterbox.scale).clamp(0.0, self.orig_height as f32)
    }
}

pub struct PostProcessor {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
}

impl PostProcessor {
    pub fn new(confidence_threshold: f32, iou_threshold: f32) -> Self {
        Self {
            confidence_threshold,
            iou_threshold,
        }
    }

    /// Decode a YOLO head output.
    ///
    /// `output` is `[1, 4 + num_classes, num_anchors]`; rows 0..4 hold
    /// `cx, cy, w, h` in input pixels, the remaining rows per-class scores.
    #[tracing::instrument(skip_all)]
    pub fn parse_detections(
        &self,
        output: &ndarray::ArrayViewD<f32>,
        transform: &TransformParams,
        names: &ClassNames,
    ) -> anyhow::Result<Vec<Detection>> {
        let shape = output.shape();
        if shape.len() != 3 || shape[0] != 1 || shape[1] <= 4 {
            anyhow::bail!(
                "Unexpected detection output shape {:?}, expected [1, 4 + classes, anchors]",
                shape
            );
        }

        let num_rows = shape[1];
        let num_anchors = shape[2];

        let mut candidates = Vec::new();

        for i in 0..num_anchors {
            let (class_idx, confidence) = (4..num_rows)
                .map(|row| (row - 4, output[[0, row, i]]))
                .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
                .unwrap_or((0, f32::NEG_INFINITY));

            if confidence < self.confidence_threshold {
                continue;
            }

            let cx = output[[0, 0, i]];
            let cy = output[[0, 1, i]];
            let w = output[[0, 2, i]];
            let h = output[[0, 3, i]];

            let (x1, y1, x2, y2) = cxcywh_to_xyxy(cx, cy, w, h);
            let class_id = class_idx as u32;

            candidates.push(Detection {
                x1: transform.to_frame_x(x1),
                y1: transform.to_frame_y(y1),
                x2: transform.to_frame_x(x2),
                y2: transform.to_frame_y(y2),
                confidence,
                class_id,
                label: names.label(class_id),
            });
        }

        tracing::trace!(candidates = candidates.len(), "Decoded candidates");

        Ok(non_max_suppression(candidates, self.iou_threshold))
    }
}

/// Greedy per-class suppression, highest confidence first.
pub fn non_max_suppression(mut candidates: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::new();

    for candidate in candidates {
        if kept.len() >= MAX_DETECTIONS {
            break;
        }
        let suppressed = kept
            .iter()
            .any(|k| k.class_id == candidate.class_id && k.iou(&candidate) > iou_threshold);
        if !suppressed {
            kept.push(candidate);
        }
    }

    kept
}

/// Convert bounding box from center-width-height format to corner format
#[inline]
fn cxcywh_to_xyxy(cx: f32, cy: f32, w: f32, h: f32) -> (f32, f32, f32, f32) {
    let x1 = cx - w / 2.0;
    let y1 = cy - h / 2.0;
    let x2 = cx + w / 2.0;
    let y2 = cy + h / 2.0;
    (x1, y1, x2, y2)
}
