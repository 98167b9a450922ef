use std::error::Error;

/// Somewhere to show the current screen, one text line at a time.
pub trait DeviceDisplay: Send + Sync {
    /// Start a new screen.
    fn clear(&mut self) -> Result<(), Box<dyn Error + Send + Sync>>;

    fn write_line(&mut self, text: &str) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Called once all lines of a screen are written.
    fn present(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
