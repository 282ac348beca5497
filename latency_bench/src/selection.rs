use crate::error::BenchError;
use bytes::Bytes;
use classify_core::decode_image;
use image::{DynamicImage, GenericImageView};
use std::path::Path;

/// The image picked by the user: raw bytes for the upload, decoded bitmap for
/// local preprocessing.
#[derive(Debug, Clone)]
pub struct SelectedImage {
    pub name: String,
    pub bytes: Bytes,
    pub image: DynamicImage,
}

impl SelectedImage {
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Bytes>) -> Result<Self, BenchError> {
        let bytes = bytes.into();
        let image = decode_image(&bytes)?;

        Ok(Self {
            name: name.into(),
            bytes,
            image,
        })
    }

    pub async fn open(path: &Path) -> Result<Self, BenchError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| BenchError::ImageDecode(format!("{}: {}", path.display(), e)))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        Self::from_bytes(name, bytes)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}
