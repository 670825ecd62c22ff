//! Configuration manager for guardian.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::FromRef;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::AppState;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const VERSION: &str = env!("CARGO_PKG_VERSION");
const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Instance name.
    pub name: String,
    /// Public URL of current instance.
    pub url: String,
    /// Listening address.
    #[serde(skip_serializing)]
    pub address: String,
    /// Listening port.
    #[serde(skip_serializing)]
    pub port: u16,
    /// Seconds before a request is cancelled.
    #[serde(skip_serializing)]
    pub request_timeout: u64,
    #[serde(skip_deserializing)]
    version: String,
    #[serde(skip)]
    path: PathBuf,
    /// Seed data loaded on start.
    #[serde(skip_serializing)]
    pub fixtures: Option<Fixtures>,
    /// Related to the image analysis service.
    #[serde(skip_serializing)]
    pub analysis: Analysis,
    /// Related to PDF export.
    #[serde(skip_serializing)]
    pub export: Export,
    /// Related to OpenTelemetry export.
    #[serde(skip_serializing)]
    pub telemetry: Option<Telemetry>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: "Guardián IA".into(),
            url: "http://localhost:8080/".into(),
            address: "0.0.0.0".into(),
            port: 8080,
            request_timeout: 60,
            version: VERSION.to_owned(),
            path: PathBuf::default(),
            fixtures: None,
            analysis: Analysis::default(),
            export: Export::default(),
            telemetry: None,
        }
    }
}

/// Seed files.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixtures {
    /// YAML list of users.
    pub users: Option<PathBuf>,
    /// YAML list of reports referencing users by id.
    pub reports: Option<PathBuf>,
}

/// Gemini configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Analysis {
    /// Base URL of the generative language API.
    pub endpoint: String,
    /// Model name.
    pub model: String,
    /// Overridden by `GEMINI_API_KEY`.
    pub api_key: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Reject risk levels outside of the closed set instead of coercing
    /// them to Amarillo.
    pub strict_risk_level: bool,
}

impl Default for Analysis {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".into(),
            model: "gemini-2.5-flash".into(),
            api_key: None,
            temperature: 0.2,
            strict_risk_level: false,
        }
    }
}

/// PDF export configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Export {
    /// Text repeated diagonally on every page.
    pub watermark: String,
    /// Product name printed in page footers. File names are fixed.
    pub product: String,
}

impl Default for Export {
    fn default() -> Self {
        Self {
            watermark: "Guardián IA".into(),
            product: "Guardián IA".into(),
        }
    }
}

/// OpenTelemetry configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// OTLP gRPC endpoint for logs.
    pub endpoint: String,
    /// Also export traces.
    #[serde(default)]
    pub traces: bool,
}

impl FromRef<AppState> for Arc<Configuration> {
    fn from_ref(state: &AppState) -> Arc<Configuration> {
        Arc::clone(&state.config)
    }
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Normalizes a URL string by ensuring it starts with a valid scheme
    /// (`http` or `https`).
    fn normalize_url(&self, url: &str) -> Result<String, url::ParseError> {
        let url_with_scheme =
            if url.starts_with("http://") || url.starts_with("https://") {
                url.to_string()
            } else {
                format!("https://{url}")
            };

        let parsed_url = Url::parse(&url_with_scheme)?;
        Ok(parsed_url.to_string())
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    pub fn read(self) -> Result<Arc<Self>, url::ParseError> {
        let file_path = if self.path.is_file() {
            &self.path
        } else {
            &Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        };

        let mut config = match File::open(file_path) {
            Ok(file) => match serde_yaml::from_reader::<_, Configuration>(file)
            {
                Ok(config) => config,
                Err(err) => self.error(err),
            },
            Err(err) => self.error(err),
        };

        // set app version.
        config.version = VERSION.to_owned();

        // normalize URLs.
        config.url = self.normalize_url(&config.url)?;
        config.analysis.endpoint = self
            .normalize_url(&config.analysis.endpoint)?
            .trim_end_matches('/')
            .to_owned();

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            config.analysis.api_key = Some(key);
        }

        Ok(Arc::new(config))
    }

    /// Return a default configuration as fallback.
    fn error(&self, err: impl std::error::Error) -> Self {
        tracing::error!(error = %err, "`config.yaml` file not found");
        Self::default()
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}
