use crate::device_display::interface::DeviceDisplay;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// Keeps the last presented screen for assertions.
#[derive(Clone, Default)]
pub struct DeviceDisplayFake {
    pending: Vec<String>,
    pub screen: Arc<Mutex<Vec<String>>>,
}

impl DeviceDisplayFake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screen(&self) -> Vec<String> {
        self.screen
            .lock()
            .map(|screen| screen.clone())
            .unwrap_or_default()
    }
}

impl DeviceDisplay for DeviceDisplayFake {
    fn clear(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.pending.clear();
        Ok(())
    }

    fn write_line(&mut self, text: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.pending.push(text.to_string());
        Ok(())
    }

    fn present(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut screen = self.screen.lock().map_err(|e| e.to_string())?;
        *screen = self.pending.clone();
        Ok(())
    }
}
