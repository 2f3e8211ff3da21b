use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub llm: LlmConfig,
    pub conversation: ConversationConfig,
    pub compiler: CompilerConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Request header carrying the JSON or base64 JSON credential.
    pub token_header: String,
    pub no_token_message: String,
    pub whitelist_message: String,
    pub missing_role_message: String,
    /// Inline seed, `user:ROLE,user:ROLE`.
    pub whitelist: Option<String>,
    /// YAML seed file with a `users` list.
    pub whitelist_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    pub max_entries: usize,
    pub ttl_secs: u64,
    pub max_messages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    pub max_limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("CHATBI_HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("CHATBI_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Auth overrides
        if let Ok(v) = env::var("AUTH_TOKEN_HEADER") {
            if !v.trim().is_empty() {
                self.auth.token_header = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("AUTH_NO_TOKEN_MESSAGE") {
            self.auth.no_token_message = v;
        }
        if let Ok(v) = env::var("AUTH_WHITELIST_MESSAGE") {
            self.auth.whitelist_message = v;
        }
        if let Ok(v) = env::var("AUTH_MISSING_ROLE_MESSAGE") {
            self.auth.missing_role_message = v;
        }
        if let Ok(v) = env::var("AUTH_WHITELIST") {
            self.auth.whitelist = Some(v);
        }
        if let Ok(v) = env::var("AUTH_WHITELIST_FILE") {
            self.auth.whitelist_file = Some(v);
        }

        // LLM overrides
        if let Ok(v) = env::var("LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = env::var("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = env::var("LLM_TIMEOUT") {
            self.llm.timeout_secs = parse_timeout(&v).unwrap_or_else(|| {
                tracing::warn!("Invalid timeout format: {}, using default {}s", v, DEFAULT_LLM_TIMEOUT_SECS);
                DEFAULT_LLM_TIMEOUT_SECS
            });
        }
        if let Ok(v) = env::var("LLM_TEMPERATURE") {
            self.llm.temperature = v.parse().unwrap_or(self.llm.temperature);
        }

        // Conversation overrides
        if let Ok(v) = env::var("CONVERSATION_MAX_ENTRIES") {
            self.conversation.max_entries = v.parse().unwrap_or(self.conversation.max_entries);
        }
        if let Ok(v) = env::var("CONVERSATION_TTL_SECS") {
            self.conversation.ttl_secs = v.parse().unwrap_or(self.conversation.ttl_secs);
        }
        if let Ok(v) = env::var("CONVERSATION_MAX_MESSAGES") {
            self.conversation.max_messages = v.parse().unwrap_or(self.conversation.max_messages);
        }

        // Compiler overrides
        if let Ok(v) = env::var("COMPILER_MAX_LIMIT") {
            self.compiler.max_limit = v.parse().ok();
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    fn auth_defaults() -> AuthConfig {
        AuthConfig {
            token_header: "Login-Token".to_string(),
            no_token_message: "Authentication token not provided".to_string(),
            whitelist_message: "User is not whitelisted (userId required)".to_string(),
            missing_role_message: "Missing role required for access".to_string(),
            whitelist: None,
            whitelist_file: None,
        }
    }

    fn llm_defaults() -> LlmConfig {
        LlmConfig {
            base_url: "http://localhost:11434".to_string(),
            model: "qwen2.5:7b".to_string(),
            timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            temperature: 0.1,
        }
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            auth: Self::auth_defaults(),
            llm: Self::llm_defaults(),
            conversation: ConversationConfig {
                max_entries: 1000,
                ttl_secs: 24 * 60 * 60,
                max_messages: 200,
            },
            compiler: CompilerConfig {
                max_limit: Some(1000),
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            auth: Self::auth_defaults(),
            llm: Self::llm_defaults(),
            conversation: ConversationConfig {
                max_entries: 5000,
                ttl_secs: 4 * 60 * 60,
                max_messages: 100,
            },
            compiler: CompilerConfig {
                max_limit: Some(500),
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            auth: Self::auth_defaults(),
            llm: Self::llm_defaults(),
            conversation: ConversationConfig {
                max_entries: 10000,
                ttl_secs: 60 * 60,
                max_messages: 50,
            },
            compiler: CompilerConfig {
                max_limit: Some(100),
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

/// Parse a timeout such as `"120s"` or `"120"` into seconds.
pub fn parse_timeout(value: &str) -> Option<u64> {
    let value = value.trim();
    value.strip_suffix('s').unwrap_or(value).trim().parse().ok()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.auth.token_header, "Login-Token");
        assert_eq!(config.compiler.max_limit, Some(1000));
        assert_eq!(config.llm.timeout_secs, 120);
        assert!(config.auth.whitelist.is_none());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.compiler.max_limit, Some(100));
        assert!(config.conversation.ttl_secs < AppConfig::development().conversation.ttl_secs);
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("120s"), Some(120));
        assert_eq!(parse_timeout(" 30 "), Some(30));
        assert_eq!(parse_timeout("2m"), None);
        assert_eq!(parse_timeout("s"), None);
    }
}
