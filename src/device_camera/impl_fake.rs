use crate::device_camera::interface::DeviceCamera;
use crate::error::CameraError;
use crate::image_decoder::interface::ImageSource;
use crate::library::logger::interface::Logger;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Produces a gradient JPEG still as a data URL, like a browser webcam
/// screenshot.
pub struct DeviceCameraFake {
    logger: Arc<dyn Logger + Send + Sync>,
    available: bool,
    warmup: Duration,
    started: AtomicBool,
    pub starts: AtomicUsize,
    pub captures: AtomicUsize,
}

impl DeviceCameraFake {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            logger: logger.with_namespace("camera").with_namespace("fake"),
            available: true,
            warmup: Duration::ZERO,
            started: AtomicBool::new(false),
            starts: AtomicUsize::new(0),
            captures: AtomicUsize::new(0),
        }
    }

    /// Camera access is denied, as when the user refuses the permission.
    #[allow(dead_code)]
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    #[allow(dead_code)]
    pub fn with_warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    fn render_still(&self, frame: usize) -> Result<Vec<u8>, CameraError> {
        let shade = (frame * 40 % 256) as u8;
        let still = RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 4) as u8, (y * 5) as u8, shade]));

        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(still)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
            .map_err(|e| CameraError::Capture(e.to_string()))?;
        Ok(bytes)
    }
}

#[async_trait]
impl DeviceCamera for DeviceCameraFake {
    async fn start(&self) -> Result<(), CameraError> {
        let _ = self.logger.info("Starting camera...");
        if !self.available {
            return Err(CameraError::Unavailable("permission denied".to_string()));
        }
        tokio::time::sleep(self.warmup).await;
        self.started.store(true, Ordering::SeqCst);
        self.starts.fetch_add(1, Ordering::SeqCst);
        let _ = self.logger.info("Camera started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), CameraError> {
        self.started.store(false, Ordering::SeqCst);
        let _ = self.logger.info("Camera stopped");
        Ok(())
    }

    async fn capture_still(&self) -> Result<ImageSource, CameraError> {
        if !self.is_started() {
            return Err(CameraError::Capture("camera is not started".to_string()));
        }
        let frame = self.captures.fetch_add(1, Ordering::SeqCst);
        let bytes = self.render_still(frame)?;
        let _ = self
            .logger
            .info(&format!("Still captured ({} bytes)", bytes.len()));
        Ok(ImageSource::from_data_url(format!(
            "data:image/jpeg;base64,{}",
            STANDARD.encode(bytes)
        )))
    }
}
