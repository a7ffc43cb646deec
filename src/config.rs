use std::{fmt, str::FromStr};

use anyhow::{bail, Context};

/// Ten years.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 525_600 * 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    Postgres,
    MySql,
}

impl FromStr for DbKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgres" => Ok(DbKind::Postgres),
            "mysql" => Ok(DbKind::MySql),
            other => bail!("invalid DB_TYPE: {other} (must be 'mysql' or 'postgres')"),
        }
    }
}

impl fmt::Display for DbKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DbKind::Postgres => "postgres",
            DbKind::MySql => "mysql",
        })
    }
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub kind: DbKind,
    pub user: String,
    pub password: String,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub ssl_mode: String,
}

// password stays out of Debug output
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("kind", &self.kind)
            .field("user", &self.user)
            .field("has_password", &!self.password.is_empty())
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub token_ttl_minutes: i64,
    pub store_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Values are trimmed and an empty
    /// value counts as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let kind: DbKind = get("DB_TYPE", "mysql").parse()?;
        let password = get("DB_PASSWORD", "");
        if password.is_empty() {
            bail!("DB_PASSWORD environment variable not set - this is required");
        }

        let database = DatabaseConfig {
            kind,
            user: get("DB_USER", "root"),
            password,
            name: get("DB_NAME", "ecomgo"),
            host: get("DB_HOST", "localhost"),
            port: get("DB_PORT", "3306")
                .parse()
                .context("DB_PORT must be a port number")?,
            ssl_mode: get("DB_SSLMODE", "disable"),
        };

        let server = ServerConfig {
            host: get("APP_HOST", "0.0.0.0"),
            port: get("SERVER_PORT", "8085")
                .parse()
                .context("SERVER_PORT must be a port number")?,
        };

        let auth = AuthConfig {
            token_ttl_minutes: get("TOKEN_TTL_MINUTES", "60")
                .parse()
                .context("TOKEN_TTL_MINUTES must be an integer")?,
            store_timeout_secs: get("DB_QUERY_TIMEOUT_SECS", "5")
                .parse()
                .context("DB_QUERY_TIMEOUT_SECS must be a positive integer")?,
        };
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&auth.token_ttl_minutes) {
            bail!("TOKEN_TTL_MINUTES must be between 1 and {MAX_TOKEN_TTL_MINUTES}");
        }
        if auth.store_timeout_secs == 0 {
            bail!("DB_QUERY_TIMEOUT_SECS must be a positive integer");
        }

        Ok(Self {
            database,
            server,
            auth,
        })
    }
}
