use crate::ClassifyError;
use image::{imageops::FilterType, DynamicImage, GenericImageView};
use ndarray::{Array4, ArrayView4};
use std::io::Cursor;

pub const INPUT_SIZE: u32 = 224;

pub const CHANNEL_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const CHANNEL_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Normalized model input of shape `(1, 3, S, S)`, planar by channel.
///
/// Values are `(pixel / 255 - mean) / std` and are not clamped afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    data: Array4<f32>,
}

impl InputTensor {
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.data.view()
    }

    pub fn as_array(&self) -> &Array4<f32> {
        &self.data
    }
}

pub fn decode_image(image_data: &[u8]) -> Result<DynamicImage, ClassifyError> {
    let image_reader = image::ImageReader::new(Cursor::new(image_data))
        .with_guessed_format()
        .map_err(|e| ClassifyError::ImageDecode(e.to_string()))?;

    let image = image_reader
        .decode()
        .map_err(|e| ClassifyError::ImageDecode(e.to_string()))?;

    ensure_not_empty(&image)?;
    Ok(image)
}

pub fn preprocess(image: &DynamicImage) -> Result<InputTensor, ClassifyError> {
    preprocess_with_size(image, INPUT_SIZE)
}

pub fn preprocess_with_size(image: &DynamicImage, size: u32) -> Result<InputTensor, ClassifyError> {
    ensure_not_empty(image)?;

    let rgb = if image.dimensions() == (size, size) {
        image.to_rgb8()
    } else {
        image.resize_exact(size, size, FilterType::Triangle).to_rgb8()
    };

    let side = size as usize;
    let plane = side * side;
    let mut data = vec![0f32; 3 * plane];

    for (i, pixel) in rgb.pixels().enumerate() {
        for (c, value) in pixel.0.iter().enumerate() {
            data[i + c * plane] = ((*value as f32) / 255. - CHANNEL_MEAN[c]) / CHANNEL_STD[c];
        }
    }

    let data = Array4::from_shape_vec((1, 3, side, side), data)
        .map_err(|e| ClassifyError::ImageDecode(format!("invalid tensor shape: {}", e)))?;

    Ok(InputTensor { data })
}

fn ensure_not_empty(image: &DynamicImage) -> Result<(), ClassifyError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ClassifyError::ImageDecode(format!(
            "image has zero dimensions ({}x{})",
            width, height
        )));
    }
    Ok(())
}
