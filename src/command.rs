use crate::session::core::Event;
use std::path::PathBuf;

/// A line typed on stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Upload(PathBuf),
    Camera,
    Capture,
    Retake,
    Confirm,
    Cancel,
    Retry,
    Reload,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match (word.to_lowercase().as_str(), rest) {
            ("upload", "") => Err("usage: upload <path>".to_string()),
            ("upload", path) => Ok(Command::Upload(PathBuf::from(path))),
            ("camera", "") => Ok(Command::Camera),
            ("capture", "") => Ok(Command::Capture),
            ("retake", "") => Ok(Command::Retake),
            ("confirm", "") => Ok(Command::Confirm),
            ("cancel", "") => Ok(Command::Cancel),
            ("retry", "") => Ok(Command::Retry),
            ("reload", "") => Ok(Command::Reload),
            ("quit" | "exit", "") => Ok(Command::Quit),
            ("", _) => Err("empty command".to_string()),
            _ => Err(format!("unknown command: {}", line)),
        }
    }

    /// The event for every command that needs no IO. `Upload` and `Quit`
    /// are handled by the caller.
    pub fn to_event(&self) -> Option<Event> {
        match self {
            Command::Upload(_) | Command::Quit => None,
            Command::Camera => Some(Event::CameraRequested),
            Command::Capture => Some(Event::CaptureRequested),
            Command::Retake => Some(Event::CaptureRetakeRequested),
            Command::Confirm => Some(Event::CaptureConfirmed),
            Command::Cancel => Some(Event::CameraCancelled),
            Command::Retry => Some(Event::RetryRequested),
            Command::Reload => Some(Event::ModelLoadRetryRequested),
        }
    }
}

pub const HELP: &str =
    "commands: upload <path> | camera | capture | retake | confirm | cancel | retry | reload | quit";
