use crate::detection::{Detection, Frame};
use crate::font;
use image::Rgb;
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};

const BOX_THICKNESS: i32 = 2;
const TAG_SCALE: u32 = 2;
const TAG_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

const PALETTE: [[u8; 3]; 20] = [
    [0xFF, 0x38, 0x38],
    [0xFF, 0x9D, 0x97],
    [0xFF, 0x70, 0x1F],
    [0xFF, 0xB2, 0x1D],
    [0xCF, 0xD2, 0x31],
    [0x48, 0xF9, 0x0A],
    [0x92, 0xCC, 0x17],
    [0x3D, 0xDB, 0x86],
    [0x1A, 0x93, 0x34],
    [0x00, 0xD4, 0xBB],
    [0x2C, 0x99, 0xA8],
    [0x00, 0xC2, 0xFF],
    [0x34, 0x45, 0x93],
    [0x64, 0x73, 0xFF],
    [0x00, 0x18, 0xEC],
    [0x84, 0x38, 0xFF],
    [0x52, 0x00, 0x85],
    [0xCB, 0x38, 0xFF],
    [0xFF, 0x95, 0xC8],
    [0xFF, 0x37, 0xC7],
];

/// Stable color for a class id.
pub fn class_color(class_id: u32) -> Rgb<u8> {
    Rgb(PALETTE[class_id as usize % PALETTE.len()])
}

/// Draw a hollow box, growing outwards for each extra pixel of thickness.
pub fn draw_box(frame: &mut Frame, detection: &Detection, color: Rgb<u8>, thickness: i32) {
    let x = detection.x1.round() as i32;
    let y = detection.y1.round() as i32;
    let width = detection.width().round() as u32;
    let height = detection.height().round() as u32;

    if width == 0 || height == 0 {
        return;
    }

    for offset in 0..thickness.max(1) {
        let rect = Rect::at(x - offset, y - offset)
            .of_size(width + 2 * offset as u32, height + 2 * offset as u32);
        draw_hollow_rect_mut(frame, rect, color);
    }
}

/// Draw every detection as a box with a "label score" tag above it.
pub fn draw_detections(mut frame: Frame, detections: &[Detection]) -> Frame {
    for detection in detections {
        let color = class_color(detection.class_id);
        draw_box(&mut frame, detection, color, BOX_THICKNESS);

        let text = format!("{} {:.2}", detection.label, detection.confidence);
        let (_, text_height) = font::text_size(&text, TAG_SCALE);
        let tag_height = (text_height + 2 * TAG_SCALE) as i32;

        let x = detection.x1.round() as i32 - BOX_THICKNESS + 1;
        let above = detection.y1.round() as i32 - BOX_THICKNESS + 1 - tag_height;
        let y = if above >= 0 {
            above
        } else {
            detection.y1.round() as i32
        };

        font::draw_tag(&mut frame, &text, x, y, TAG_SCALE, TAG_TEXT_COLOR, color);
    }

    frame
}
