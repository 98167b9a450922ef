use crate::analysis::category::CategoryConfig;
use crate::commentary::messages::{default_buckets, DEFAULT_FALLBACK};
use crate::commentary::table::{CommentaryBucket, CommentaryTable};
use crate::error::ConfigError;
use crate::image_classifier::models::model_config::ModelConfig;
use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Config {
    pub logger_timezone: FixedOffset,
    pub model: ModelConfig,
    pub categories: CategoryConfig,
    pub commentary: Vec<CommentaryBucket>,
    pub fallback_message: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logger_timezone: korea_standard_time(),
            model: ModelConfig::default(),
            categories: CategoryConfig::default(),
            commentary: default_buckets(),
            fallback_message: DEFAULT_FALLBACK.to_string(),
        }
    }
}

fn korea_standard_time() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).unwrap_or_else(|| Utc.fix())
}

/// On-disk shape. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    utc_offset_hours: Option<i32>,
    model: Option<ModelConfig>,
    categories: Option<CategoryConfig>,
    commentary: Option<CommentaryFile>,
}

/// Score bands are fixed; each entry replaces the messages of the band with
/// the same `low` and `high`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CommentaryFile {
    fallback: Option<String>,
    buckets: Vec<CommentaryBucket>,
}

fn override_messages(
    mut buckets: Vec<CommentaryBucket>,
    overrides: Vec<CommentaryBucket>,
) -> Result<Vec<CommentaryBucket>, ConfigError> {
    for entry in overrides {
        let bucket = buckets
            .iter_mut()
            .find(|b| (b.low, b.high) == (entry.low, entry.high))
            .ok_or_else(|| {
                ConfigError::Commentary(format!(
                    "no score band [{}, {})",
                    entry.low, entry.high
                ))
            })?;
        bucket.messages = entry.messages;
    }
    Ok(buckets)
}

impl Config {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text)?;
        let defaults = Config::default();

        let logger_timezone = match file.utc_offset_hours {
            Some(hours) => FixedOffset::east_opt(hours.saturating_mul(3600))
                .ok_or(ConfigError::UtcOffset(hours))?,
            None => defaults.logger_timezone,
        };

        let (commentary, fallback_message) = match file.commentary {
            Some(c) => (
                override_messages(defaults.commentary, c.buckets)?,
                c.fallback.unwrap_or(defaults.fallback_message),
            ),
            None => (defaults.commentary, defaults.fallback_message),
        };

        let config = Self {
            logger_timezone,
            model: file.model.unwrap_or(defaults.model),
            categories: file.categories.unwrap_or(defaults.categories),
            commentary,
            fallback_message,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.categories.validate()?;
        self.commentary_table()?;
        Ok(())
    }

    pub fn commentary_table(&self) -> Result<CommentaryTable, ConfigError> {
        CommentaryTable::new(self.commentary.clone(), self.fallback_message.clone())
    }
}
