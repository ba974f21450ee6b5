pub mod cli;
pub mod toml_config;

use crate::utils::error::{PredictionError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use clap::Parser;

pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_MATERIALS_PROJECT_ENDPOINT: &str = "https://api.materialsproject.org";
pub const DEFAULT_TOP_N: usize = 3;
pub const DEFAULT_SUPERCELL: [usize; 3] = [2, 2, 2];

pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";
pub const GEMINI_KEY_VAR: &str = "GOOGLE_API_KEY";
pub const MATERIALS_PROJECT_KEY_VAR: &str = "MATERIALS_PROJECT_API_KEY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmSettings {
    pub endpoint: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSettings {
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub retry_delay_seconds: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
            retry_attempts: 1,
            retry_delay_seconds: 2,
        }
    }
}

/// Where and how the three external services are reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSettings {
    pub openai: LlmSettings,
    pub gemini: LlmSettings,
    pub materials_project_endpoint: String,
    pub http: HttpSettings,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            openai: LlmSettings {
                endpoint: DEFAULT_OPENAI_ENDPOINT.to_string(),
                model: DEFAULT_OPENAI_MODEL.to_string(),
            },
            gemini: LlmSettings {
                endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
                model: DEFAULT_GEMINI_MODEL.to_string(),
            },
            materials_project_endpoint: DEFAULT_MATERIALS_PROJECT_ENDPOINT.to_string(),
            http: HttpSettings::default(),
        }
    }
}

impl Validate for ServiceSettings {
    fn validate(&self) -> Result<()> {
        validation::validate_url("openai.endpoint", &self.openai.endpoint)?;
        validation::validate_non_empty_string("openai.model", &self.openai.model)?;
        validation::validate_url("gemini.endpoint", &self.gemini.endpoint)?;
        validation::validate_non_empty_string("gemini.model", &self.gemini.model)?;
        validation::validate_url(
            "materials_project.endpoint",
            &self.materials_project_endpoint,
        )?;
        validation::validate_positive_number(
            "http.timeout_seconds",
            self.http.timeout_seconds as usize,
            1,
        )?;
        validation::validate_range("http.retry_attempts", self.http.retry_attempts, 1, 10)?;
        Ok(())
    }
}

/// API keys for the three services, loaded once at start-up.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    pub openai: String,
    pub gemini: String,
    pub materials_project: String,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("openai", &"***")
            .field("gemini", &"***")
            .field("materials_project", &"***")
            .finish()
    }
}

impl ApiCredentials {
    pub fn from_env() -> Result<Self> {
        Self::with_overrides(None, None, None)
    }

    /// Keys from a dotenv file; exported variables fill whatever the file lacks.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let invalid = |e: dotenvy::Error| PredictionError::ConfigValidationError {
            field: path.display().to_string(),
            message: e.to_string(),
        };

        let mut values = HashMap::new();
        for item in dotenvy::from_path_iter(path).map_err(invalid)? {
            let (key, value) = item.map_err(invalid)?;
            values.insert(key, value);
        }

        Self::with_overrides(
            values.get(OPENAI_KEY_VAR).map(String::as_str),
            values.get(GEMINI_KEY_VAR).map(String::as_str),
            values.get(MATERIALS_PROJECT_KEY_VAR).map(String::as_str),
        )
    }

    /// Explicit values win over the environment. Empty values and
    /// unresolved `${VAR}` placeholders count as missing.
    pub fn with_overrides(
        openai: Option<&str>,
        gemini: Option<&str>,
        materials_project: Option<&str>,
    ) -> Result<Self> {
        let mut missing = Vec::new();
        let mut resolve = |explicit: Option<&str>, var: &str| -> String {
            let value = explicit
                .filter(|v| is_usable_key(v))
                .map(str::to_string)
                .or_else(|| std::env::var(var).ok().filter(|v| is_usable_key(v)));
            match value {
                Some(v) => v,
                None => {
                    missing.push(var.to_string());
                    String::new()
                }
            }
        };

        let openai = resolve(openai, OPENAI_KEY_VAR);
        let gemini = resolve(gemini, GEMINI_KEY_VAR);
        let materials_project = resolve(materials_project, MATERIALS_PROJECT_KEY_VAR);

        if !missing.is_empty() {
            return Err(PredictionError::MissingConfigError {
                field: missing.join(", "),
            });
        }

        Ok(Self {
            openai,
            gemini,
            materials_project,
        })
    }
}

fn is_usable_key(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && !(trimmed.starts_with("${") && trimmed.ends_with('}'))
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "materials-predictor")]
#[command(about = "Suggest candidate materials with two LLMs and check them against the Materials Project")]
pub struct CliConfig {
    /// Materials design goal, e.g. "transparent conductor"
    #[arg(long, short)]
    pub goal: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    pub top_n: usize,

    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_SUPERCELL)]
    pub supercell: Vec<usize>,

    #[arg(long, default_value = DEFAULT_OPENAI_MODEL)]
    pub openai_model: String,

    #[arg(long, default_value = DEFAULT_GEMINI_MODEL)]
    pub gemini_model: String,

    #[arg(long, default_value = DEFAULT_OPENAI_ENDPOINT)]
    pub openai_endpoint: String,

    #[arg(long, default_value = DEFAULT_GEMINI_ENDPOINT)]
    pub gemini_endpoint: String,

    #[arg(long, default_value = DEFAULT_MATERIALS_PROJECT_ENDPOINT)]
    pub mp_endpoint: String,

    #[arg(long, default_value = "60")]
    pub timeout_seconds: u64,

    #[arg(long, default_value = "1")]
    pub retry_attempts: u32,

    /// Read API keys from this dotenv file instead of ./.env
    #[arg(long)]
    pub env_file: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Log CPU, memory and duration of each phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn design_goal(&self) -> &str {
        self.goal.trim()
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn top_n(&self) -> usize {
        self.top_n
    }

    fn supercell(&self) -> [usize; 3] {
        match self.supercell.as_slice() {
            [a, b, c] => [*a, *b, *c],
            _ => DEFAULT_SUPERCELL,
        }
    }

    fn services(&self) -> ServiceSettings {
        ServiceSettings {
            openai: LlmSettings {
                endpoint: self.openai_endpoint.clone(),
                model: self.openai_model.clone(),
            },
            gemini: LlmSettings {
                endpoint: self.gemini_endpoint.clone(),
                model: self.gemini_model.clone(),
            },
            materials_project_endpoint: self.mp_endpoint.clone(),
            http: HttpSettings {
                timeout_seconds: self.timeout_seconds,
                retry_attempts: self.retry_attempts,
                ..HttpSettings::default()
            },
        }
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_design_goal(&self.goal)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_range("top_n", self.top_n, 1, 20)?;
        validation::validate_supercell("supercell", &self.supercell)?;
        self.services().validate()
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliConfig {
        let mut argv = vec!["materials-predictor"];
        argv.extend_from_slice(args);
        CliConfig::parse_from(argv)
    }

    #[test]
    fn test_cli_defaults() {
        let config = parse(&["--goal", "battery cathode"]);
        assert_eq!(config.design_goal(), "battery cathode");
        assert_eq!(config.top_n(), 3);
        assert_eq!(config.supercell(), [2, 2, 2]);

        let services = config.services();
        assert_eq!(services.openai.model, "gpt-4o");
        assert_eq!(services.gemini.model, "gemini-1.5-flash-latest");
        assert_eq!(services.http.retry_attempts, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_supercell_override() {
        let config = parse(&["--goal", "x", "--supercell", "3,1,2"]);
        assert_eq!(config.supercell(), [3, 1, 2]);
    }

    #[test]
    fn test_cli_rejects_blank_goal_and_bad_endpoint() {
        let blank = parse(&["--goal", "  "]);
        assert!(matches!(
            blank.validate(),
            Err(PredictionError::ValidationError { .. })
        ));

        let bad = parse(&["--goal", "x", "--mp-endpoint", "not a url"]);
        assert!(matches!(
            bad.validate(),
            Err(PredictionError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_credentials_prefer_explicit_values() {
        let creds = ApiCredentials::with_overrides(Some("a"), Some("b"), Some("c")).unwrap();
        assert_eq!(creds.openai, "a");
        assert_eq!(creds.gemini, "b");
        assert_eq!(creds.materials_project, "c");
        assert!(format!("{:?}", creds).contains("***"));
    }

    #[test]
    fn test_credentials_from_env_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "# service keys\nOPENAI_API_KEY=sk-from-file\nGOOGLE_API_KEY=\"gemini from file\"\nMATERIALS_PROJECT_API_KEY='mp-file'\n",
        )
        .unwrap();

        let creds = ApiCredentials::from_env_file(&path).unwrap();
        assert_eq!(creds.openai, "sk-from-file");
        assert_eq!(creds.gemini, "gemini from file");
        assert_eq!(creds.materials_project, "mp-file");
    }

    #[test]
    fn test_missing_env_file_is_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = ApiCredentials::from_env_file(dir.path().join("absent.env")).unwrap_err();
        assert!(matches!(err, PredictionError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_cli_env_file_flag() {
        let config = parse(&["--goal", "x", "--env-file", "secrets.env"]);
        assert_eq!(config.env_file.as_deref(), Some("secrets.env"));
        assert!(parse(&["--goal", "x"]).env_file.is_none());
    }

    #[test]
    fn test_unresolved_placeholder_counts_as_missing() {
        assert!(!is_usable_key("${OPENAI_API_KEY}"));
        assert!(!is_usable_key("   "));
        assert!(is_usable_key("sk-123"));
    }
}
