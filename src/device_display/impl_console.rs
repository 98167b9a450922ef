use crate::device_display::interface::DeviceDisplay;
use std::error::Error;

pub struct DeviceDisplayConsole {
    lines: Vec<String>,
}

impl DeviceDisplayConsole {
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }
}

impl DeviceDisplay for DeviceDisplayConsole {
    fn clear(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.lines.clear();
        Ok(())
    }

    fn write_line(&mut self, text: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.lines.push(text.to_string());
        Ok(())
    }

    fn present(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        println!("┌──────────────────────────────────────────");
        for line in &self.lines {
            println!("│ {}", line);
        }
        println!("└──────────────────────────────────────────");
        Ok(())
    }
}
