use crate::acquisition::sequence::SequenceToken;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("Failed to load model: {0}")]
    ModelLoad(String),
    #[error("Model is not loaded yet, call load() first")]
    ModelNotLoaded,
    #[error("Failed to classify image: {0}")]
    Inference(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImageDecodeError {
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),
    #[error("Unsupported or corrupt image: {0}")]
    Unsupported(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    #[error("Camera is not available: {0}")]
    Unavailable(String),
    #[error("Failed to capture still: {0}")]
    Capture(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AcquisitionError {
    #[error(transparent)]
    Decode(#[from] ImageDecodeError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error("Acquisition {0} was superseded by a newer one")]
    Superseded(SequenceToken),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid commentary buckets: {0}")]
    Commentary(String),
    #[error("Invalid categories: {0}")]
    Category(String),
    #[error("Invalid UTC offset: {0} hours")]
    UtcOffset(i32),
}
