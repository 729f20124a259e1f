use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::shared::constants::{DEFAULT_KNOWLEDGE_SOURCES, DEFAULT_MODEL};

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub rate_limit: RateLimitConfig,
    pub agent: AgentConfig,
    pub knowledge: KnowledgeConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
    /// Take the client identity from `X-Forwarded-For` / `X-Real-IP`
    pub trust_forwarded_for: bool,
}

/// Sliding-window admission settings, fixed for the lifetime of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window: Duration,
    /// Interval of the stale-identity sweep; `None` disables it
    pub sweep_interval: Option<Duration>,
}

/// Model provider settings for the legal agent
#[derive(Clone)]
pub struct AgentConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
    /// Report agent failures with 200 instead of 502
    pub errors_in_band: bool,
}

#[derive(Debug, Clone)]
pub struct KnowledgeConfig {
    pub base_url: Option<String>,
    pub collection: String,
    pub dir: PathBuf,
    pub sources: Vec<String>,
    pub search_limit: usize,
    pub ingest_on_startup: bool,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            rate_limit: RateLimitConfig::from_env()?,
            agent: AgentConfig::from_env()?,
            knowledge: KnowledgeConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

/// Read a boolean flag, accepting `true/false`, `1/0`, `yes/no`
fn env_flag(name: &str, default: bool) -> Result<bool, String> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "" => Ok(default),
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(format!("{} must be true or false", name)),
        },
    }
}

fn env_number<T: std::str::FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| format!("{} must be a valid number", name)),
        _ => Ok(default),
    }
}

fn comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 64 * 1024;

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let cors_allowed_origins =
            comma_list(&env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        let max_request_body_size =
            env_number("MAX_REQUEST_BODY_SIZE", Self::DEFAULT_MAX_REQUEST_BODY_SIZE)?;

        let trust_forwarded_for = env_flag("TRUST_FORWARDED_FOR", false)?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
            trust_forwarded_for,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl RateLimitConfig {
    const DEFAULT_MAX_REQUESTS: usize = 5;
    const DEFAULT_WINDOW_SECS: u64 = 60;
    const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

    pub fn new(max_requests: usize, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
            sweep_interval: None,
        }
    }

    pub fn from_env() -> Result<Self, String> {
        let max_requests = env_number("RATE_LIMIT_MAX_REQUESTS", Self::DEFAULT_MAX_REQUESTS)?;
        if max_requests == 0 {
            return Err("RATE_LIMIT_MAX_REQUESTS must be at least 1".to_string());
        }

        let window_secs = env_number("RATE_LIMIT_WINDOW_SECS", Self::DEFAULT_WINDOW_SECS)?;
        if window_secs == 0 {
            return Err("RATE_LIMIT_WINDOW_SECS must be at least 1".to_string());
        }

        let sweep_secs = env_number(
            "RATE_LIMIT_SWEEP_INTERVAL_SECS",
            Self::DEFAULT_SWEEP_INTERVAL_SECS,
        )?;

        Ok(Self {
            max_requests,
            window: Duration::from_secs(window_secs),
            sweep_interval: (sweep_secs > 0).then(|| Duration::from_secs(sweep_secs)),
        })
    }

    pub fn window_seconds(&self) -> u64 {
        self.window.as_secs()
    }
}

impl AgentConfig {
    const DEFAULT_API_BASE: &'static str = "https://generativelanguage.googleapis.com/v1beta";
    const DEFAULT_TIMEOUT_SECS: u64 = 120;

    pub fn from_env() -> Result<Self, String> {
        let api_key = env::var("GOOGLE_API_KEY").ok().filter(|s| !s.is_empty());
        let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let api_base = env::var("GEMINI_API_BASE")
            .unwrap_or_else(|_| Self::DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        let timeout_secs = env_number("AGENT_TIMEOUT_SECS", Self::DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err("AGENT_TIMEOUT_SECS must be at least 1".to_string());
        }
        let errors_in_band = env_flag("AGENT_ERRORS_IN_BAND", false)?;

        Ok(Self {
            api_key,
            model,
            api_base,
            timeout: Duration::from_secs(timeout_secs),
            errors_in_band,
        })
    }

    /// The API key, required by every mode that talks to the model
    pub fn require_api_key(&self) -> Result<&str, String> {
        self.api_key
            .as_deref()
            .ok_or_else(|| "GOOGLE_API_KEY environment variable is required".to_string())
    }
}

// Keeps the API key out of logs
impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .field("errors_in_band", &self.errors_in_band)
            .finish()
    }
}

impl KnowledgeConfig {
    const DEFAULT_SEARCH_LIMIT: usize = 5;

    pub fn from_env() -> Result<Self, String> {
        let base_url = env::var("KNOWLEDGE_BASE_URL")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());

        let collection =
            env::var("KNOWLEDGE_COLLECTION").unwrap_or_else(|_| "indian_laws".to_string());

        let dir = PathBuf::from(
            env::var("KNOWLEDGE_DIR").unwrap_or_else(|_| "./legal_chromadb".to_string()),
        );

        let sources = match env::var("KNOWLEDGE_SOURCES") {
            Ok(raw) if !raw.trim().is_empty() => comma_list(&raw),
            _ => DEFAULT_KNOWLEDGE_SOURCES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };

        let search_limit = env_number("KNOWLEDGE_SEARCH_LIMIT", Self::DEFAULT_SEARCH_LIMIT)?;
        let ingest_on_startup = env_flag("INGEST_ON_STARTUP", false)?;

        Ok(Self {
            base_url,
            collection,
            dir,
            sources,
            search_limit,
            ingest_on_startup,
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title =
            env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Indian Legal Advisor API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION").unwrap_or_else(|_| {
            "Rate-limited question answering over Indian law (IPC, IT Act 2000)".to_string()
        });

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_list_trims_and_drops_empty() {
        assert_eq!(
            comma_list(" a , b,, c "),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(comma_list("").is_empty());
    }

    #[test]
    fn test_rate_limit_config_new() {
        let config = RateLimitConfig::new(5, 60);
        assert_eq!(config.max_requests, 5);
        assert_eq!(config.window_seconds(), 60);
        assert!(config.sweep_interval.is_none());
    }

    #[test]
    fn test_swagger_credentials_need_both_parts() {
        let mut swagger = SwaggerConfig {
            username: Some("admin".to_string()),
            password: None,
            title: String::new(),
            version: String::new(),
            description: String::new(),
        };
        assert!(swagger.credentials().is_none());

        swagger.password = Some("secret".to_string());
        assert_eq!(swagger.credentials().as_deref(), Some("admin:secret"));
    }

    #[test]
    fn test_zero_agent_timeout_is_rejected() {
        env::set_var("AGENT_TIMEOUT_SECS", "0");
        let result = AgentConfig::from_env();
        env::remove_var("AGENT_TIMEOUT_SECS");

        assert_eq!(
            result.err().as_deref(),
            Some("AGENT_TIMEOUT_SECS must be at least 1")
        );
    }

    #[test]
    fn test_agent_config_debug_hides_key() {
        let config = AgentConfig {
            api_key: Some("very-secret".to_string()),
            model: DEFAULT_MODEL.to_string(),
            api_base: "http://localhost".to_string(),
            timeout: Duration::from_secs(1),
            errors_in_band: false,
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("***"));
    }
}
