use common::span_debug;
use detector::{Frame, font};
use fast_image_resize::{
    FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer,
    images::{Image, ImageRef},
};
use image::Rgb;

pub const DEFAULT_DISPLAY_SCALE: f64 = 0.8;

/// Overlay color of the left (fast) panel.
pub const FAST_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
/// Overlay color of the right (reference) panel.
pub const REFERENCE_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

const MARGIN: i32 = 10;
const TITLE_SCALE: u32 = 3;
const DETAIL_SCALE: u32 = 2;
const LINE_GAP: i32 = 9;

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("display scale must be a positive finite number, got {0}")]
    InvalidScale(f64),

    #[error("cannot compose an empty {0}x{1} frame")]
    EmptyFrame(u32, u32),

    #[error("resize buffer error: {0}")]
    Buffer(#[from] fast_image_resize::ImageBufferError),

    #[error("resize failed: {0}")]
    Resize(#[from] fast_image_resize::ResizeError),

    #[error("resized buffer does not match {0}x{1}")]
    BufferSize(u32, u32),
}

/// One annotated frame and the text to stamp on it.
#[derive(Debug, Clone)]
pub struct Panel<'a> {
    pub frame: Frame,
    pub label: &'a str,
    pub latency_ms: f64,
}

/// `"12.3ms (81.3fps)"`; the fps part is omitted for a non-positive latency.
pub fn latency_text(latency_ms: f64) -> String {
    if latency_ms.is_finite() && latency_ms > 0.0 {
        format!("{:.1}ms ({:.1}fps)", latency_ms, 1000.0 / latency_ms)
    } else {
        format!("{:.1}ms (-- fps)", latency_ms)
    }
}

/// Stamp the model name and its latency line in the top-left corner.
pub fn draw_overlay(frame: &mut Frame, label: &str, latency_ms: f64, color: Rgb<u8>) {
    let (_, title_height) = font::text_size(label, TITLE_SCALE);
    let title_height = title_height.max(font::GLYPH_HEIGHT * TITLE_SCALE) as i32;

    font::draw_text(frame, label, MARGIN, MARGIN, TITLE_SCALE, color);
    font::draw_text(
        frame,
        &latency_text(latency_ms),
        MARGIN,
        MARGIN + title_height + LINE_GAP,
        DETAIL_SCALE,
        color,
    );
}

/// Label both panels, place them side by side, and scale the result.
///
/// The output is `round(scale * (wA + wB))` by `round(scale * max(hA, hB))`.
/// A shorter panel is padded with black below.
pub fn compose(fast: Panel<'_>, reference: Panel<'_>, scale: f64) -> Result<Frame, ComposeError> {
    let _s = span_debug!("compose");

    if !scale.is_finite() || scale <= 0.0 {
        return Err(ComposeError::InvalidScale(scale));
    }
    for panel in [&fast, &reference] {
        let (w, h) = panel.frame.dimensions();
        if w == 0 || h == 0 {
            return Err(ComposeError::EmptyFrame(w, h));
        }
    }

    let mut left = fast.frame;
    let mut right = reference.frame;
    draw_overlay(&mut left, fast.label, fast.latency_ms, FAST_COLOR);
    draw_overlay(&mut right, reference.label, reference.latency_ms, REFERENCE_COLOR);

    let width = left.width() + right.width();
    let height = left.height().max(right.height());

    let mut combined = Frame::new(width, height);
    image::imageops::replace(&mut combined, &left, 0, 0);
    image::imageops::replace(&mut combined, &right, left.width() as i64, 0);

    let out_width = ((width as f64 * scale).round() as u32).max(1);
    let out_height = ((height as f64 * scale).round() as u32).max(1);

    if (out_width, out_height) == (width, height) {
        return Ok(combined);
    }

    resize(&combined, out_width, out_height)
}

fn resize(frame: &Frame, width: u32, height: u32) -> Result<Frame, ComposeError> {
    let src = ImageRef::new(frame.width(), frame.height(), frame.as_raw(), PixelType::U8x3)?;
    let mut dst = Image::new(width, height, PixelType::U8x3);

    Resizer::new().resize(
        &src,
        &mut dst,
        &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
    )?;

    Frame::from_raw(width, height, dst.into_vec()).ok_or(ComposeError::BufferSize(width, height))
}
