use crate::error::ImageDecodeError;
use crate::image_decoder::interface::{DecodedImage, ImageDecoder, ImageSource};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Decodes with the `image` crate on the blocking pool.
#[derive(Debug, Clone, Default)]
pub struct ImageDecoderImage {}

impl ImageDecoderImage {
    pub fn new() -> Self {
        Self {}
    }
}

pub fn data_url_payload(url: &str) -> Result<Vec<u8>, ImageDecodeError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| ImageDecodeError::InvalidDataUrl("missing data: scheme".to_string()))?;

    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImageDecodeError::InvalidDataUrl("missing payload".to_string()))?;

    if !meta.starts_with("image/") {
        return Err(ImageDecodeError::InvalidDataUrl(format!(
            "not an image media type: {}",
            meta
        )));
    }

    if !meta.ends_with(";base64") {
        return Err(ImageDecodeError::InvalidDataUrl(
            "only base64 payloads are supported".to_string(),
        ));
    }

    STANDARD
        .decode(payload.trim())
        .map_err(|e| ImageDecodeError::InvalidDataUrl(e.to_string()))
}

#[async_trait]
impl ImageDecoder for ImageDecoderImage {
    async fn decode(&self, source: &ImageSource) -> Result<DecodedImage, ImageDecodeError> {
        let bytes: Vec<u8> = match source {
            ImageSource::Encoded(bytes) => bytes.to_vec(),
            ImageSource::DataUrl(url) => data_url_payload(url)?,
        };

        let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| ImageDecodeError::Unsupported(e.to_string()))?
            .map_err(|e| ImageDecodeError::Unsupported(e.to_string()))?;

        Ok(DecodedImage::new(decoded))
    }
}
