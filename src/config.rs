//! Pipeline configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! command-line flags (which clap also fills from the environment).

use crate::error::ConfigError;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT_PATH: &str = "SDW2023.csv";
pub const DEFAULT_ID_COLUMN: &str = "UserID";
pub const DEFAULT_USERS_API_URL: &str = "https://jsonplaceholder.typicode.com/users";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 80;
pub const DEFAULT_TEMPERATURE: f32 = 0.8;
pub const DEFAULT_OUTPUT_DIR: &str = "user_updates";
pub const DEFAULT_REPORT_PATH: &str = "etl_report.json";

/// Key values that people leave in place of a real key.
const PLACEHOLDER_KEYS: &[&str] = &[
    "sua_chave_openai_aqui",
    "your_openai_api_key",
    "your-api-key-here",
    "changeme",
];

/// Settings for the text-generation backend.
#[derive(Debug)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub api_key: Option<SecretString>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            api_key: None,
        }
    }
}

impl LlmConfig {
    /// Resolve the API key, rejecting empty and placeholder values.
    pub fn resolve_api_key(&self) -> Result<&SecretString, ConfigError> {
        let key = self.api_key.as_ref().ok_or(ConfigError::MissingApiKey)?;
        let raw = key.expose_secret().trim();
        if raw.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if is_placeholder_key(raw) {
            return Err(ConfigError::PlaceholderApiKey);
        }
        Ok(key)
    }
}

pub fn is_placeholder_key(key: &str) -> bool {
    let key = key.trim();
    PLACEHOLDER_KEYS
        .iter()
        .any(|placeholder| key.eq_ignore_ascii_case(placeholder))
        || (key.starts_with('<') && key.ends_with('>'))
}

#[derive(Debug)]
pub struct EtlConfig {
    pub input_path: PathBuf,
    pub id_column: String,
    pub users_api_url: String,
    pub output_dir: PathBuf,
    pub report_path: PathBuf,
    pub seed: Option<u64>,
    pub llm: LlmConfig,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            id_column: DEFAULT_ID_COLUMN.to_string(),
            users_api_url: DEFAULT_USERS_API_URL.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
            seed: None,
            llm: LlmConfig::default(),
        }
    }
}

/// On-disk form; every field is optional and falls back to the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    input_path: Option<PathBuf>,
    id_column: Option<String>,
    users_api_url: Option<String>,
    output_dir: Option<PathBuf>,
    report_path: Option<PathBuf>,
    seed: Option<u64>,
    #[serde(default)]
    llm: FileLlmConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileLlmConfig {
    base_url: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    api_key: Option<String>,
}

/// Values supplied on the command line; `None` keeps the lower layer.
#[derive(Debug, Default)]
pub struct Overrides {
    pub input_path: Option<PathBuf>,
    pub users_api_url: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
    pub seed: Option<u64>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

impl EtlConfig {
    /// Load a TOML file on top of the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let file: FileConfig = toml::from_str(text)?;
        let mut cfg = Self::default();
        if let Some(v) = file.input_path {
            cfg.input_path = v;
        }
        if let Some(v) = file.id_column {
            cfg.id_column = v;
        }
        if let Some(v) = file.users_api_url {
            cfg.users_api_url = v;
        }
        if let Some(v) = file.output_dir {
            cfg.output_dir = v;
        }
        if let Some(v) = file.report_path {
            cfg.report_path = v;
        }
        cfg.seed = file.seed;
        if let Some(v) = file.llm.base_url {
            cfg.llm.base_url = v;
        }
        if let Some(v) = file.llm.model {
            cfg.llm.model = v;
        }
        if let Some(v) = file.llm.max_tokens {
            cfg.llm.max_tokens = v;
        }
        if let Some(v) = file.llm.temperature {
            cfg.llm.temperature = v;
        }
        cfg.llm.api_key = file.llm.api_key.map(SecretString::from);
        Ok(cfg)
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(v) = overrides.input_path {
            self.input_path = v;
        }
        if let Some(v) = overrides.users_api_url {
            self.users_api_url = v;
        }
        if let Some(v) = overrides.output_dir {
            self.output_dir = v;
        }
        if let Some(v) = overrides.report_path {
            self.report_path = v;
        }
        if overrides.seed.is_some() {
            self.seed = overrides.seed;
        }
        if let Some(v) = overrides.base_url {
            self.llm.base_url = v;
        }
        if let Some(v) = overrides.model {
            self.llm.model = v;
        }
        if let Some(v) = overrides.api_key {
            self.llm.api_key = Some(SecretString::from(v));
        }
        self
    }

    /// Check everything needed before any network call is made.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.llm.resolve_api_key()?;

        if self.id_column.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "id_column",
                reason: "must not be empty".to_string(),
            });
        }
        for (field, url) in [
            ("users_api_url", &self.users_api_url),
            ("llm.base_url", &self.llm.base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("'{}' is not an http(s) URL", url),
                });
            }
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "llm.model",
                reason: "must not be empty".to_string(),
            });
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::Invalid {
                field: "llm.max_tokens",
                reason: "must be positive".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid {
                field: "llm.temperature",
                reason: "must be between 0 and 2".to_string(),
            });
        }
        Ok(())
    }

    /// Human-readable dump with the API key redacted.
    pub fn describe(&self) -> String {
        let key = match &self.llm.api_key {
            Some(k) if !k.expose_secret().is_empty() => "<set>",
            _ => "<none>",
        };
        format!(
            "input_path: {}\nid_column: {}\nusers_api_url: {}\noutput_dir: {}\nreport_path: {}\nseed: {}\nllm.base_url: {}\nllm.model: {}\nllm.max_tokens: {}\nllm.temperature: {}\nllm.api_key: {}",
            self.input_path.display(),
            self.id_column,
            self.users_api_url,
            self.output_dir.display(),
            self.report_path.display(),
            self.seed
                .map(|s| s.to_string())
                .unwrap_or_else(|| "<random>".to_string()),
            self.llm.base_url,
            self.llm.model,
            self.llm.max_tokens,
            self.llm.temperature,
            key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn with_key(key: &str) -> EtlConfig {
        EtlConfig::default().apply(Overrides {
            api_key: Some(key.to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_defaults() {
        let cfg = EtlConfig::default();
        assert_eq!(cfg.input_path, PathBuf::from("SDW2023.csv"));
        assert_eq!(cfg.id_column, "UserID");
        assert_eq!(cfg.llm.model, "gpt-3.5-turbo");
        assert_eq!(cfg.llm.max_tokens, 80);
        assert_eq!(cfg.output_dir, PathBuf::from("user_updates"));
        assert_eq!(cfg.report_path, PathBuf::from("etl_report.json"));
    }

    #[test]
    fn test_missing_key_rejected() {
        let cfg = EtlConfig::default();
        assert!(matches!(cfg.validate(), Err(ConfigError::MissingApiKey)));
        assert!(matches!(
            with_key("   ").validate(),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn test_placeholder_key_rejected() {
        assert!(matches!(
            with_key("sua_chave_openai_aqui").validate(),
            Err(ConfigError::PlaceholderApiKey)
        ));
        assert!(matches!(
            with_key("<OPENAI_KEY>").validate(),
            Err(ConfigError::PlaceholderApiKey)
        ));
    }

    #[test]
    fn test_real_key_accepted() {
        assert!(with_key("sk-live-abc123").validate().is_ok());
    }

    #[test]
    fn test_temperature_range() {
        let mut cfg = with_key("sk-abc");
        cfg.llm.temperature = 3.5;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid {
                field: "llm.temperature",
                ..
            })
        ));
    }

    #[test]
    fn test_bad_url_rejected() {
        let cfg = with_key("sk-abc").apply(Overrides {
            users_api_url: Some("ftp://example.com".to_string()),
            ..Default::default()
        });
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid {
                field: "users_api_url",
                ..
            })
        ));
    }

    #[test]
    fn test_toml_layer_and_overrides() {
        let cfg = EtlConfig::from_toml_str(
            r#"
            id_column = "Id"
            output_dir = "out"
            seed = 42

            [llm]
            model = "gpt-4o-mini"
            temperature = 0.2
            api_key = "sk-from-file"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.id_column, "Id");
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
        assert_eq!(cfg.llm.max_tokens, 80);

        let cfg = cfg.apply(Overrides {
            model: Some("gpt-4".to_string()),
            api_key: Some("sk-from-cli".to_string()),
            ..Default::default()
        });
        assert_eq!(cfg.llm.model, "gpt-4");
        assert_eq!(cfg.output_dir, PathBuf::from("out"));
        assert_eq!(
            cfg.llm.api_key.as_ref().unwrap().expose_secret(),
            "sk-from-cli"
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(EtlConfig::from_toml_str("colour = \"blue\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("etl.toml");
        std::fs::write(&path, "report_path = \"r.json\"\n").unwrap();
        let cfg = EtlConfig::load_from(&path).unwrap();
        assert_eq!(cfg.report_path, PathBuf::from("r.json"));

        let missing = EtlConfig::load_from(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_describe_redacts_key() {
        let text = with_key("sk-secret-value").describe();
        assert!(text.contains("llm.api_key: <set>"));
        assert!(!text.contains("sk-secret-value"));
    }
}
