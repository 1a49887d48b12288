use crate::error::{ClassifierError, Result};
use common::{span, span_debug};
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use ndarray::{Array4, ArrayView4};

/// Model input resolution as `(width, height)`.
pub const DEFAULT_INPUT_SIZE: (u32, u32) = (224, 224);

/// One RGB image laid out as `(1, height, width, 3)` with samples in `[0, 1]`.
///
/// Only [`transform`] builds these, so the shape always matches the size it was asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    data: Array4<f32>,
}

impl ImageTensor {
    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.data.view()
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// `(width, height)` of the image inside the tensor.
    pub fn size(&self) -> (u32, u32) {
        let shape = self.data.shape();
        (shape[2] as u32, shape[1] as u32)
    }
}

/// Decode `bytes`, stretch to `target_width x target_height` and scale to `[0, 1]`.
pub fn transform(bytes: &[u8], target_width: u32, target_height: u32) -> Result<ImageTensor> {
    let _s = span!("transform");

    if target_width == 0 || target_height == 0 {
        return Err(ClassifierError::Preprocess(format!(
            "target size {target_width}x{target_height} is empty"
        )));
    }

    let rgb = decode_rgb(bytes)?;
    let (width, height) = rgb.dimensions();

    tracing::trace!(
        width,
        height,
        target_width,
        target_height,
        encoded_bytes = bytes.len(),
        "Decoded image"
    );

    let resized = resize(rgb.into_raw(), width, height, target_width, target_height)?;
    let data = normalize(&resized, target_width, target_height)?;

    Ok(ImageTensor { data })
}

fn decode_rgb(bytes: &[u8]) -> Result<image::RgbImage> {
    let _s = span_debug!("decode");

    let rgb = image::load_from_memory(bytes)?.to_rgb8();
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(ClassifierError::EmptyImage);
    }
    Ok(rgb)
}

fn resize(
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    target_width: u32,
    target_height: u32,
) -> Result<Vec<u8>> {
    let _s = span_debug!("resize");

    let src = Image::from_vec_u8(width, height, pixels, PixelType::U8x3)
        .map_err(|e| ClassifierError::Preprocess(e.to_string()))?;
    let mut dst = Image::new(target_width, target_height, PixelType::U8x3);

    Resizer::new()
        .resize(
            &src,
            &mut dst,
            &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::CatmullRom)),
        )
        .map_err(|e| ClassifierError::Preprocess(e.to_string()))?;

    Ok(dst.into_vec())
}

fn normalize(pixels: &[u8], width: u32, height: u32) -> Result<Array4<f32>> {
    let _s = span_debug!("normalize");

    let samples: Vec<f32> = pixels.iter().map(|&v| v as f32 / 255.0).collect();

    Array4::from_shape_vec((1, height as usize, width as usize, 3), samples)
        .map_err(|e| ClassifierError::Preprocess(e.to_string()))
}
