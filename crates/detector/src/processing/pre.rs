use crate::backend::DEFAULT_INPUT_SIZE;
use crate::detection::Frame;
use common::span;
use fast_image_resize::{
    FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer,
    images::{Image, ImageRef},
};
use ndarray::{Array, IxDyn};

const LETTERBOX_COLOR: u8 = 114;

/// Geometry of the letterbox applied to a frame, needed to map boxes back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

/// Resizes frames into the model input with aspect ratio kept, pads with
/// gray, and lays the result out as a `[1, 3, H, W]` tensor in `0..=1`.
pub struct PreProcessor {
    pub input_size: (u32, u32),
    letterboxed_buffer: Vec<u8>,
}

impl PreProcessor {
    pub fn new(input_size: (u32, u32)) -> Self {
        Self {
            input_size,
            letterboxed_buffer: vec![LETTERBOX_COLOR; (input_size.0 * input_size.1 * 3) as usize],
        }
    }

    pub fn preprocess(&mut self, frame: &Frame) -> anyhow::Result<(Array<f32, IxDyn>, Letterbox)> {
        let _s = span!("preprocess_frame");

        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            anyhow::bail!("Cannot preprocess an empty {}x{} frame", width, height);
        }

        let letterbox = self.resize_and_letterbox(frame.as_raw(), width, height)?;
        let input = self.normalize()?;

        Ok((input, letterbox))
    }

    fn resize_and_letterbox(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> anyhow::Result<Letterbox> {
        let (input_w, input_h) = self.input_size;

        let scale = (input_w as f32 / width as f32).min(input_h as f32 / height as f32);
        let new_width = ((width as f32 * scale) as u32).clamp(1, input_w);
        let new_height = ((height as f32 * scale) as u32).clamp(1, input_h);

        let offset_x = (input_w - new_width) / 2;
        let offset_y = (input_h - new_height) / 2;

        let src = ImageRef::new(width, height, pixels, PixelType::U8x3)?;
        let mut resized = Image::new(new_width, new_height, PixelType::U8x3);

        Resizer::new().resize(
            &src,
            &mut resized,
            &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
        )?;

        self.letterboxed_buffer.fill(LETTERBOX_COLOR);

        let resized_data = resized.buffer();
        let row_bytes = (new_width * 3) as usize;
        let stride = (input_w * 3) as usize;

        for (y, src_row) in resized_data.chunks_exact(row_bytes).enumerate() {
            let dst = (y + offset_y as usize) * stride + (offset_x * 3) as usize;
            self.letterboxed_buffer[dst..dst + row_bytes].copy_from_slice(src_row);
        }

        Ok(Letterbox {
            scale,
            offset_x: offset_x as f32,
            offset_y: offset_y as f32,
        })
    }

    fn normalize(&self) -> anyhow::Result<Array<f32, IxDyn>> {
        let _s = span!("normalize");

        let (width, height) = (self.input_size.0 as usize, self.input_size.1 as usize);
        let spatial = width * height;

        let mut output = vec![0.0f32; 3 * spatial];

        for (i, px) in self.letterboxed_buffer.chunks_exact(3).enumerate() {
            output[i] = px[0] as f32 / 255.0;
            output[i + spatial] = px[1] as f32 / 255.0;
            output[i + 2 * spatial] = px[2] as f32 / 255.0;
        }

        Ok(Array::from_shape_vec(IxDyn(&[1, 3, height, width]), output)?)
    }
}

impl Default for PreProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_SIZE)
    }
}
