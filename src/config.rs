//! Configuration management
//!
//! Configuration is read from environment variables (a `.env` file in the
//! working directory is loaded first, if present):
//! - `OPENAI_API_KEY` - Required. Key for the chat model.
//! - `OPENAI_BASE_URL` - Optional. API root for an OpenAI-compatible gateway.
//! - `RX_MODEL` - Optional. Model id. Defaults to `gpt-4.1`.
//! - `RX_TEMPERATURE` - Optional. Sampling temperature. Defaults to `0.7`.
//! - `RX_MAX_TOKENS` - Optional. Completion token cap per step.
//! - `SERPER_API_KEY` - Required. Serper.dev search.
//! - `GOOGLE_API_KEY` / `GOOGLE_CSE_ID` - Required. Google Custom Search.
//! - `TAVILY_API_KEY` - Required. Tavily search.
//! - `RX_MAX_MESSAGES` - Optional. Transcript length that forces termination. Defaults to `16`.
//! - `RX_LLM_TIMEOUT_SECS` - Optional. Per model call. Defaults to `120`.
//! - `RX_TOOL_TIMEOUT_SECS` - Optional. Per tool call. Defaults to `30`.
//! - `RX_PORT` - Optional. HTTP port. Defaults to `8000`.
//!
//! Values are parsed into plain structs handed to constructors; nothing
//! below `main` reads the environment.

use crate::llm::DEFAULT_MODEL;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),
}

/// Chat model settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

/// Credentials for the search providers
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub serper_api_key: String,
    pub google_api_key: String,
    pub google_cse_id: String,
    pub tavily_api_key: String,
}

/// Bounds on a single agent session
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Transcript length at which the loop is force-terminated
    pub max_messages: usize,
    pub llm_timeout: Duration,
    pub tool_timeout: Duration,
}

pub const DEFAULT_MAX_MESSAGES: usize = 16;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_MESSAGES,
            llm_timeout: Duration::from_secs(120),
            tool_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub agent: AgentConfig,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };

        let llm = LlmConfig {
            api_key: vars.required("OPENAI_API_KEY")?,
            base_url: vars.optional("OPENAI_BASE_URL"),
            model: vars
                .optional("RX_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: vars.parsed("RX_TEMPERATURE")?.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: vars.parsed("RX_MAX_TOKENS")?,
        };
        if !(0.0..=2.0).contains(&llm.temperature) {
            return Err(ConfigError::InvalidValue(
                "RX_TEMPERATURE".to_string(),
                format!("{} is outside 0.0..=2.0", llm.temperature),
            ));
        }

        let search = SearchConfig {
            serper_api_key: vars.required("SERPER_API_KEY")?,
            google_api_key: vars.required("GOOGLE_API_KEY")?,
            google_cse_id: vars.required("GOOGLE_CSE_ID")?,
            tavily_api_key: vars.required("TAVILY_API_KEY")?,
        };

        let defaults = AgentConfig::default();
        let agent = AgentConfig {
            max_messages: vars
                .parsed("RX_MAX_MESSAGES")?
                .unwrap_or(defaults.max_messages),
            llm_timeout: vars
                .parsed("RX_LLM_TIMEOUT_SECS")?
                .map_or(defaults.llm_timeout, Duration::from_secs),
            tool_timeout: vars
                .parsed("RX_TOOL_TIMEOUT_SECS")?
                .map_or(defaults.tool_timeout, Duration::from_secs),
        };
        // The first model step already brings the transcript to two messages
        if agent.max_messages < 2 {
            return Err(ConfigError::InvalidValue(
                "RX_MAX_MESSAGES".to_string(),
                format!("{} must be at least 2", agent.max_messages),
            ));
        }

        let port = vars.parsed("RX_PORT")?.unwrap_or(8000);

        Ok(Self {
            llm,
            search,
            agent,
            port,
        })
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Present and non-blank
    fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, name: &str) -> Result<String, ConfigError> {
        self.optional(name)
            .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
    }

    fn parsed<T>(&self, name: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(name)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{raw}: {e}")))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("OPENAI_API_KEY", "sk-test"),
            ("SERPER_API_KEY", "serper"),
            ("GOOGLE_API_KEY", "google"),
            ("GOOGLE_CSE_ID", "cse"),
            ("TAVILY_API_KEY", "tvly"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|name| vars.get(name).map(ToString::to_string))
    }

    #[test]
    fn test_defaults() {
        let config = load(&base_vars()).unwrap();
        assert_eq!(config.llm.model, "gpt-4.1");
        assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.agent.max_messages, 16);
        assert_eq!(config.agent.tool_timeout, Duration::from_secs(30));
        assert_eq!(config.port, 8000);
        assert!(config.llm.base_url.is_none());
    }

    #[test]
    fn test_missing_credential() {
        let mut vars = base_vars();
        vars.remove("TAVILY_API_KEY");
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "TAVILY_API_KEY"));
    }

    #[test]
    fn test_blank_credential_counts_as_missing() {
        let mut vars = base_vars();
        vars.insert("GOOGLE_CSE_ID", "   ");
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::MissingEnvVar(ref v) if v == "GOOGLE_CSE_ID"
        ));
    }

    #[test]
    fn test_overrides() {
        let mut vars = base_vars();
        vars.insert("RX_MODEL", "gpt-4o-mini");
        vars.insert("RX_MAX_MESSAGES", "8");
        vars.insert("RX_LLM_TIMEOUT_SECS", "5");
        vars.insert("RX_PORT", "9100");
        let config = load(&vars).unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.agent.max_messages, 8);
        assert_eq!(config.agent.llm_timeout, Duration::from_secs(5));
        assert_eq!(config.port, 9100);
    }

    #[test]
    fn test_invalid_numbers() {
        let mut vars = base_vars();
        vars.insert("RX_MAX_MESSAGES", "lots");
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::InvalidValue(ref v, _) if v == "RX_MAX_MESSAGES"
        ));

        let mut vars = base_vars();
        vars.insert("RX_MAX_MESSAGES", "1");
        assert!(load(&vars).is_err());

        let mut vars = base_vars();
        vars.insert("RX_TEMPERATURE", "3.5");
        assert!(load(&vars).is_err());
    }
}
