use std::time::Duration;

/// Connection settings for an LLM-backed suggester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            api_key: String::new(),
            model: "gemini-2.5-flash-lite".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
        }
    }
}

/// Server configuration parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server listen port.
    pub port: u16,
    /// Server bind host.
    pub host: String,
    /// Difficulty passed to the suggester when a session does not set one.
    pub default_elo: u32,
    /// Attempts the external opponent gets per turn.
    pub max_attempts: u32,
    /// Pause between attempts in milliseconds.
    pub backoff_ms: u64,
    /// Per-request timeout for suggester calls in milliseconds.
    pub ai_timeout_ms: u64,
    /// `gemini`, `http` or `random`.
    pub suggester: String,
    pub gemini: ProviderConfig,
    /// Endpoint for the `http` suggester.
    pub suggest_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        let defaults = AppConfig::default();
        let gemini = ProviderConfig {
            api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            model: std::env::var("GEMINI_MODEL").unwrap_or(defaults.gemini.model),
            endpoint: std::env::var("GEMINI_ENDPOINT").unwrap_or(defaults.gemini.endpoint),
        };
        let suggester = std::env::var("CHESS_SUGGESTER").unwrap_or_else(|_| {
            if gemini.api_key.is_empty() {
                "random".to_string()
            } else {
                "gemini".to_string()
            }
        });

        AppConfig {
            port: env_parse("PORT").unwrap_or(defaults.port),
            host: std::env::var("HOST").unwrap_or(defaults.host),
            default_elo: env_parse("CHESS_AI_ELO").unwrap_or(defaults.default_elo),
            max_attempts: env_parse("CHESS_AI_MAX_ATTEMPTS").unwrap_or(defaults.max_attempts),
            backoff_ms: env_parse("CHESS_AI_BACKOFF_MS").unwrap_or(defaults.backoff_ms),
            ai_timeout_ms: env_parse("CHESS_AI_TIMEOUT").unwrap_or(defaults.ai_timeout_ms),
            suggester,
            gemini,
            suggest_url: std::env::var("CHESS_SUGGEST_URL")
                .ok()
                .filter(|s| !s.is_empty()),
        }
    }

    /// Socket address string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_millis(self.ai_timeout_ms)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            port: 8082,
            host: "0.0.0.0".to_string(),
            default_elo: 1800,
            max_attempts: 10,
            backoff_ms: 0,
            ai_timeout_ms: 10_000,
            suggester: "random".to_string(),
            gemini: ProviderConfig::default(),
            suggest_url: None,
        }
    }
}
