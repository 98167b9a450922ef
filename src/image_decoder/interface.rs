use crate::error::ImageDecodeError;
use async_trait::async_trait;
use image::DynamicImage;
use std::fmt;
use std::sync::Arc;

/// Encoded image as handed over by a file picker or a camera.
#[derive(Clone, PartialEq)]
pub enum ImageSource {
    Encoded(Arc<[u8]>),
    /// `data:image/<format>;base64,<payload>`
    DataUrl(Arc<str>),
}

impl ImageSource {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::Encoded(bytes.into())
    }

    pub fn from_data_url(url: impl Into<String>) -> Self {
        Self::DataUrl(url.into().into())
    }

    pub fn byte_len(&self) -> usize {
        match self {
            Self::Encoded(bytes) => bytes.len(),
            Self::DataUrl(url) => url.len(),
        }
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encoded(bytes) => write!(f, "Encoded({} bytes)", bytes.len()),
            Self::DataUrl(url) => write!(f, "DataUrl({} chars)", url.len()),
        }
    }
}

/// Decoded pixels, ready to classify. Cheap to clone.
#[derive(Clone)]
pub struct DecodedImage(Arc<DynamicImage>);

impl DecodedImage {
    pub fn new(image: DynamicImage) -> Self {
        Self(Arc::new(image))
    }

    pub fn shared(&self) -> Arc<DynamicImage> {
        self.0.clone()
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DecodedImage({}x{})", self.width(), self.height())
    }
}

#[async_trait]
pub trait ImageDecoder: Send + Sync {
    async fn decode(&self, source: &ImageSource) -> Result<DecodedImage, ImageDecodeError>;
}
