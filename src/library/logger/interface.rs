use std::sync::Arc;

/// Injected into every component. Errors from logging are ignored by callers.
pub trait Logger: Send + Sync {
    fn info(&self, message: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn warn(&self, message: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn error(&self, message: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Child logger whose lines are prefixed `parent:namespace`.
    fn with_namespace(&self, namespace: &str) -> Arc<dyn Logger + Send + Sync>;
}
