use crate::config::{
    ApiCredentials, HttpSettings, LlmSettings, ServiceSettings, DEFAULT_GEMINI_ENDPOINT,
    DEFAULT_GEMINI_MODEL, DEFAULT_MATERIALS_PROJECT_ENDPOINT, DEFAULT_OPENAI_ENDPOINT,
    DEFAULT_OPENAI_MODEL, DEFAULT_SUPERCELL, DEFAULT_TOP_N,
};
use crate::core::ConfigProvider;
use crate::utils::error::{PredictionError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub run: RunConfig,
    pub openai: Option<ProviderConfig>,
    pub gemini: Option<ProviderConfig>,
    pub materials_project: Option<DatabaseConfig>,
    pub http: Option<HttpConfig>,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub goal: String,
    pub top_n: Option<usize>,
    pub supercell: Option<Vec<usize>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_seconds: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub json_logs: Option<bool>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PredictionError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left in place.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| {
            PredictionError::ConfigValidationError {
                field: "environment".to_string(),
                message: e.to_string(),
            }
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    /// Keys written in the file take precedence over the environment.
    pub fn credentials(&self) -> Result<ApiCredentials> {
        ApiCredentials::with_overrides(
            self.openai.as_ref().and_then(|p| p.api_key.as_deref()),
            self.gemini.as_ref().and_then(|p| p.api_key.as_deref()),
            self.materials_project
                .as_ref()
                .and_then(|d| d.api_key.as_deref()),
        )
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }

    fn llm_settings(provider: Option<&ProviderConfig>, endpoint: &str, model: &str) -> LlmSettings {
        LlmSettings {
            endpoint: provider
                .and_then(|p| p.endpoint.clone())
                .unwrap_or_else(|| endpoint.to_string()),
            model: provider
                .and_then(|p| p.model.clone())
                .unwrap_or_else(|| model.to_string()),
        }
    }
}

impl ConfigProvider for TomlConfig {
    fn design_goal(&self) -> &str {
        self.run.goal.trim()
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn top_n(&self) -> usize {
        self.run.top_n.unwrap_or(DEFAULT_TOP_N)
    }

    fn supercell(&self) -> [usize; 3] {
        match self.run.supercell.as_deref() {
            Some([a, b, c]) => [*a, *b, *c],
            _ => DEFAULT_SUPERCELL,
        }
    }

    fn services(&self) -> ServiceSettings {
        let defaults = HttpSettings::default();
        let http = self.http.clone().unwrap_or_default();

        ServiceSettings {
            openai: Self::llm_settings(
                self.openai.as_ref(),
                DEFAULT_OPENAI_ENDPOINT,
                DEFAULT_OPENAI_MODEL,
            ),
            gemini: Self::llm_settings(
                self.gemini.as_ref(),
                DEFAULT_GEMINI_ENDPOINT,
                DEFAULT_GEMINI_MODEL,
            ),
            materials_project_endpoint: self
                .materials_project
                .as_ref()
                .and_then(|d| d.endpoint.clone())
                .unwrap_or_else(|| DEFAULT_MATERIALS_PROJECT_ENDPOINT.to_string()),
            http: HttpSettings {
                timeout_seconds: http.timeout_seconds.unwrap_or(defaults.timeout_seconds),
                retry_attempts: http.retry_attempts.unwrap_or(defaults.retry_attempts),
                retry_delay_seconds: http
                    .retry_delay_seconds
                    .unwrap_or(defaults.retry_delay_seconds),
            },
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_design_goal(&self.run.goal)?;
        validation::validate_path("load.output_path", &self.load.output_path)?;
        validation::validate_range("run.top_n", self.top_n(), 1, 20)?;
        if let Some(factors) = &self.run.supercell {
            validation::validate_supercell("run.supercell", factors)?;
        }
        self.services().validate()
    }
}
