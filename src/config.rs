use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_SUMMARIZATION_MODEL: &str = "facebook/bart-large-cnn";
const DEFAULT_CHUNK_SIZE: usize = 1024;
const DEFAULT_MIN_LENGTH: usize = 30;
const DEFAULT_MAX_LENGTH: usize = 150;
const DEFAULT_OCR_LANGUAGE: &str = "eng";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
    /// Values were individually valid but contradict each other.
    #[error("Inconsistent configuration: {0}")]
    Inconsistent(String),
    /// Configuration was installed twice in the same process.
    #[error("Configuration already initialized")]
    AlreadyInitialized,
}

/// Runtime configuration for the PDF summarizer.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Backend used to run the summarization model.
    pub summarization_provider: SummarizationProvider,
    /// Optional base URL of the summarization endpoint; providers fall back to their default.
    pub summarization_url: Option<String>,
    /// Model identifier passed to the provider.
    pub summarization_model: String,
    /// Optional bearer token for hosted inference endpoints.
    pub summarization_api_token: Option<String>,
    /// Number of characters sent to the model per request.
    pub summary_chunk_size: usize,
    /// Minimum summary length per chunk, in model units.
    pub summary_min_length: usize,
    /// Maximum summary length per chunk, in model units.
    pub summary_max_length: usize,
    /// Tesseract language pack used for OCR.
    pub ocr_language: String,
    /// Optional rasterization resolution; `None` keeps the pdftoppm default.
    pub ocr_dpi: Option<u32>,
    /// Path or name of the `pdftoppm` executable.
    pub pdftoppm_bin: String,
    /// Path or name of the `tesseract` executable.
    pub tesseract_bin: String,
}

/// Supported summarization backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarizationProvider {
    /// Hugging Face style inference endpoint serving a seq2seq summarization model.
    HuggingFace,
    /// Local Ollama runtime.
    Ollama,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let summarization_provider = match load_env_optional("SUMMARIZATION_PROVIDER") {
            Some(value) => value.parse().map_err(|()| {
                ConfigError::InvalidValue(format!("SUMMARIZATION_PROVIDER={value}"))
            })?,
            None => SummarizationProvider::HuggingFace,
        };

        let config = Self {
            server_port: parse_optional("SERVER_PORT")?,
            summarization_provider,
            summarization_url: load_env_optional("SUMMARIZATION_URL"),
            summarization_model: load_env_optional("SUMMARIZATION_MODEL")
                .unwrap_or_else(|| DEFAULT_SUMMARIZATION_MODEL.to_string()),
            summarization_api_token: load_env_optional("SUMMARIZATION_API_TOKEN"),
            summary_chunk_size: parse_optional("SUMMARY_CHUNK_SIZE")?
                .unwrap_or(DEFAULT_CHUNK_SIZE),
            summary_min_length: parse_optional("SUMMARY_MIN_LENGTH")?
                .unwrap_or(DEFAULT_MIN_LENGTH),
            summary_max_length: parse_optional("SUMMARY_MAX_LENGTH")?
                .unwrap_or(DEFAULT_MAX_LENGTH),
            ocr_language: load_env_optional("OCR_LANGUAGE")
                .unwrap_or_else(|| DEFAULT_OCR_LANGUAGE.to_string()),
            ocr_dpi: parse_optional("OCR_DPI")?,
            pdftoppm_bin: load_env_optional("PDFTOPPM_BIN").unwrap_or_else(|| "pdftoppm".into()),
            tesseract_bin: load_env_optional("TESSERACT_BIN")
                .unwrap_or_else(|| "tesseract".into()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that individual parsers cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.summary_chunk_size == 0 {
            return Err(ConfigError::InvalidValue(
                "SUMMARY_CHUNK_SIZE must be greater than zero".into(),
            ));
        }
        if self.summary_min_length > self.summary_max_length {
            return Err(ConfigError::Inconsistent(format!(
                "SUMMARY_MIN_LENGTH ({}) exceeds SUMMARY_MAX_LENGTH ({})",
                self.summary_min_length, self.summary_max_length
            )));
        }
        if self.ocr_dpi == Some(0) {
            return Err(ConfigError::InvalidValue(
                "OCR_DPI must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: None,
            summarization_provider: SummarizationProvider::HuggingFace,
            summarization_url: None,
            summarization_model: DEFAULT_SUMMARIZATION_MODEL.to_string(),
            summarization_api_token: None,
            summary_chunk_size: DEFAULT_CHUNK_SIZE,
            summary_min_length: DEFAULT_MIN_LENGTH,
            summary_max_length: DEFAULT_MAX_LENGTH,
            ocr_language: DEFAULT_OCR_LANGUAGE.to_string(),
            ocr_dpi: None,
            pdftoppm_bin: "pdftoppm".into(),
            tesseract_bin: "tesseract".into(),
        }
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

impl FromStr for SummarizationProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "huggingface" | "hf" => Ok(Self::HuggingFace),
            "ollama" => Ok(Self::Ollama),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        server_port = ?config.server_port,
        provider = ?config.summarization_provider,
        model = %config.summarization_model,
        chunk_size = config.summary_chunk_size,
        min_length = config.summary_min_length,
        max_length = config.summary_max_length,
        "Loaded configuration"
    );
    CONFIG
        .set(config)
        .map_err(|_| ConfigError::AlreadyInitialized)?;
    Ok(get_config())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parses_case_insensitively() {
        assert_eq!(
            "HuggingFace".parse::<SummarizationProvider>(),
            Ok(SummarizationProvider::HuggingFace)
        );
        assert_eq!(
            " ollama ".parse::<SummarizationProvider>(),
            Ok(SummarizationProvider::Ollama)
        );
        assert!("openai".parse::<SummarizationProvider>().is_err());
    }

    #[test]
    fn defaults_match_bart_settings() {
        let config = Config::default();
        assert_eq!(config.summarization_model, "facebook/bart-large-cnn");
        assert_eq!(config.summary_chunk_size, 1024);
        assert_eq!(config.summary_min_length, 30);
        assert_eq!(config.summary_max_length, 150);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_chunk_size() {
        let config = Config {
            summary_chunk_size: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn validate_rejects_inverted_length_bounds() {
        let config = Config {
            summary_min_length: 200,
            summary_max_length: 100,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Inconsistent(message)) if message.contains("SUMMARY_MIN_LENGTH")
        ));
    }
}
