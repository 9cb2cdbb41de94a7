//! Configuration loading and validation for the publisher service.
//!
//! All values are read from environment variables once at startup. The process
//! exits with a clear error message if a value is present but unusable.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;

use crate::publisher::PublisherConfig;

/// Validated service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Kinesis stream receiving encrypted events. Unset or empty disables
    /// publishing.
    #[serde(default)]
    pub event_stream_name: Option<String>,

    /// KMS key id used to wrap each payload. **Required** when publishing is enabled.
    #[serde(default)]
    pub kms_key_id: String,

    /// Base64 KMS ciphertext of the 32-byte stream key. **Required** when
    /// publishing is enabled.
    #[serde(default)]
    pub wrapped_stream_key: String,

    /// Port the HTTP ingest server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// OTLP collector endpoint. Unset means JSON logs only.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// The publisher's slice of the configuration.
    pub fn publisher_config(&self) -> PublisherConfig {
        PublisherConfig {
            destination: self.event_stream_name.clone(),
            wrapping_key_id: self.kms_key_id.clone(),
            wrapped_key_ciphertext: self.wrapped_stream_key.trim().to_owned(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.listen_port == 0 {
            anyhow::bail!("LISTEN_PORT must be > 0");
        }

        // Key settings only matter once there is somewhere to publish.
        if !self.publisher_config().is_enabled() {
            return Ok(());
        }
        ensure_non_empty(&self.kms_key_id, "KMS_KEY_ID")?;
        ensure_non_empty(&self.wrapped_stream_key, "WRAPPED_STREAM_KEY")?;
        STANDARD
            .decode(self.wrapped_stream_key.trim())
            .context("WRAPPED_STREAM_KEY must be base64")?;
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required when EVENT_STREAM_NAME is set");
    }
    Ok(())
}
