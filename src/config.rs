use anyhow::{bail, Context, Result};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }
}

/// Log output format; JSON lines by default in prod.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn resolve(value: Option<&str>, env: &Environment) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("json") => Self::Json,
            Some("pretty") => Self::Pretty,
            _ if matches!(env, Environment::Prod) => Self::Json,
            _ => Self::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,
    pub log_format: LogFormat,

    // CORS
    pub cors_allow_origins: Vec<String>,
    pub max_body_bytes: usize,

    // Completion service
    pub llm_base_url: String,
    pub llm_api_key: String,
    pub llm_model: Option<String>,
    pub llm_timeout_seconds: u64,
    pub llm_decode_retries: u32,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Environment::from_str(&lookup("ENV").unwrap_or_else(|| "dev".to_string()));
        let server_addr = lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8000".to_string());
        let log_format = LogFormat::resolve(lookup("LOG_FORMAT").as_deref(), &env);

        // CORS
        let cors_allow_origins = lookup("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|| "http://localhost:8501".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let max_body_bytes = lookup("MAX_BODY_BYTES")
            .and_then(|s| s.parse().ok())
            .unwrap_or(64 * 1024);

        // Completion service
        let llm_api_key = lookup("API_KEY")
            .filter(|s| !s.trim().is_empty())
            .context("API key not found: API_KEY must be set")?;
        let llm_base_url =
            lookup("LLM_BASE_URL").unwrap_or_else(|| "https://api.aimlapi.com/v1".to_string());
        let parsed = url::Url::parse(&llm_base_url)
            .with_context(|| format!("LLM_BASE_URL is not a valid URL: {}", llm_base_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("LLM_BASE_URL must use http or https, got {}", parsed.scheme());
        }
        let llm_model = lookup("LLM_MODEL").filter(|s| !s.trim().is_empty());
        let llm_timeout_seconds = lookup("LLM_TIMEOUT_SECONDS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(120); // 2 minutes default for LLM calls
        let llm_decode_retries = lookup("LLM_DECODE_RETRIES")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        Ok(Settings {
            env,
            server_addr,
            log_format,
            cors_allow_origins,
            max_body_bytes,
            llm_base_url,
            llm_api_key,
            llm_model,
            llm_timeout_seconds,
            llm_decode_retries,
        })
    }
}
