use config::{Config, ConfigError, Environment, File as ConfigFile, FileFormat, FileSourceFile};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::field_copy::{parse_rules, FieldCopyRule};

pub const DEFAULT_BASE_URL: &str = "https://site-api.datocms.com";
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_SETTLE_DELAY_SECS: u64 = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Content API access token. Usually supplied through `LOCALE_DUPER_API_TOKEN`.
    pub api_token: Option<String>,
    /// Sandbox environment name; the primary environment is used when unset.
    pub environment: Option<String>,
    pub base_url: String,
    pub page_size: u32,
    pub settle_delay_secs: u64,
    #[serde(default)]
    pub field_copy: Vec<FieldCopyRule>,
    /// Field-copy rules in the host's stored form, a JSON array of
    /// `{ "modelId", "fieldId" }`. Appended to `field_copy` on load.
    #[serde(default)]
    pub field_copy_json: Option<String>,
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    build(ConfigFile::with_name("Config").required(false))
}

/// Load from an explicit file, still layering environment overrides on top.
pub fn load_configuration_from(path: &Path) -> Result<AppConfig, ConfigError> {
    build(ConfigFile::from(path).required(true))
}

fn build(file: ConfigFile<FileSourceFile, FileFormat>) -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .set_default("base_url", DEFAULT_BASE_URL)?
        .set_default("page_size", DEFAULT_PAGE_SIZE)?
        .set_default("settle_delay_secs", DEFAULT_SETTLE_DELAY_SECS)?
        .add_source(file)
        .add_source(Environment::with_prefix("LOCALE_DUPER").try_parsing(true))
        .build()?;
    let mut config = builder.try_deserialize::<AppConfig>()?;

    if let Some(raw) = config.field_copy_json.as_deref() {
        let stored = parse_rules(&serde_json::Value::String(raw.to_string()))
            .map_err(|e| ConfigError::Message(format!("invalid field_copy_json: {e}")))?;
        for rule in stored {
            if !config.field_copy.contains(&rule) {
                config.field_copy.push(rule);
            }
        }
    }
    Ok(config)
}

impl AppConfig {
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        match self.api_token.as_deref() {
            Some(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(ConfigError::NotFound("api_token".to_string())),
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }
}
