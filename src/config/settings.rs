//! Process settings from environment variables (optionally seeded from a `.env` file by the binary).

use crate::error::ConfigError;
use sqlx::mysql::MySqlSslMode;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct DatabaseSettings {
    pub chatbot_url: String,
    pub scribe_url: String,
    pub evaa_config_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub ssl_mode: MySqlSslMode,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database: DatabaseSettings,
    /// Intersect table allow-lists with the live column set on every write.
    pub column_introspection: bool,
    /// Organization assigned to providers created without one.
    pub default_organization_id: i64,
    pub body_limit_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            host: "0.0.0.0".into(),
            port: 3001,
            database: DatabaseSettings {
                chatbot_url: "mysql://localhost:3306/ai_chatbot_config".into(),
                scribe_url: "mysql://localhost:3306/scribe_test_eu".into(),
                evaa_config_url: "mysql://localhost:3306/evaa_config".into(),
                max_connections: 10,
                acquire_timeout: Duration::from_secs(30),
                ssl_mode: MySqlSslMode::Preferred,
            },
            column_introspection: true,
            default_organization_id: 1,
            body_limit_bytes: 1024 * 1024,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup; unset or empty keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut s = Settings::default();

        if let Some(v) = get("HOST") {
            s.host = v;
        }
        if let Some(v) = get("PORT") {
            s.port = parse("PORT", &v)?;
        }
        if let Some(v) = get("CHATBOT_DATABASE_URL") {
            s.database.chatbot_url = v;
        }
        if let Some(v) = get("SCRIBE_DATABASE_URL") {
            s.database.scribe_url = v;
        }
        if let Some(v) = get("EVAA_CONFIG_DATABASE_URL") {
            s.database.evaa_config_url = v;
        }
        if let Some(v) = get("DB_MAX_CONNECTIONS") {
            let n: u32 = parse("DB_MAX_CONNECTIONS", &v)?;
            if n == 0 {
                return Err(ConfigError::InvalidSetting {
                    name: "DB_MAX_CONNECTIONS",
                    message: "must be at least 1".into(),
                });
            }
            s.database.max_connections = n;
        }
        if let Some(v) = get("DB_ACQUIRE_TIMEOUT_SECS") {
            s.database.acquire_timeout = Duration::from_secs(parse("DB_ACQUIRE_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = get("DB_SSL_MODE") {
            s.database.ssl_mode = MySqlSslMode::from_str(&v).map_err(|e| ConfigError::InvalidSetting {
                name: "DB_SSL_MODE",
                message: e.to_string(),
            })?;
        }
        if let Some(v) = get("COLUMN_INTROSPECTION") {
            s.column_introspection = parse_bool("COLUMN_INTROSPECTION", &v)?;
        }
        if let Some(v) = get("DEFAULT_ORGANIZATION_ID") {
            s.default_organization_id = parse("DEFAULT_ORGANIZATION_ID", &v)?;
        }
        if let Some(v) = get("BODY_LIMIT_BYTES") {
            s.body_limit_bytes = parse("BODY_LIMIT_BYTES", &v)?;
        }
        Ok(s)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T: FromStr>(name: &'static str, v: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    v.parse().map_err(|e: T::Err| ConfigError::InvalidSetting {
        name,
        message: format!("{:?}: {}", v, e),
    })
}

fn parse_bool(name: &'static str, v: &str) -> Result<bool, ConfigError> {
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidSetting {
            name,
            message: format!("{:?} is not a boolean", v),
        }),
    }
}
