use crate::error::CameraError;
use crate::image_decoder::interface::ImageSource;
use async_trait::async_trait;

/// A live camera that can hand out encoded stills on demand.
#[async_trait]
pub trait DeviceCamera: Send + Sync {
    async fn start(&self) -> Result<(), CameraError>;
    async fn stop(&self) -> Result<(), CameraError>;
    async fn capture_still(&self) -> Result<ImageSource, CameraError>;
}
