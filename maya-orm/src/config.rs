//! # Connection Configuration
//!
//! Resolves a connection name into the settings needed to open it.
//!
//! Two resolvers are provided:
//!
//! - [`DatabaseConfig`]: an in-memory map, usually deserialized from JSON.
//! - [`EnvConfig`]: process environment (after loading `.env`), one variable
//!   per setting: `DB_<NAME>_DRIVER`, `DB_<NAME>_HOST`, `DB_<NAME>_PORT`,
//!   `DB_<NAME>_DATABASE`, `DB_<NAME>_USERNAME`, `DB_<NAME>_PASSWORD`,
//!   `DB_<NAME>_APPLY_TIMEZONE`, `DB_<NAME>_TIMEZONE`.
//!
//! ```rust,ignore
//! let config = DatabaseConfig::from_json_str(r#"{
//!     "default": { "driver": "mysql", "host": "127.0.0.1", "database": "app",
//!                  "username": "root", "password": "secret" }
//! }"#)?;
//! let registry = ConnectionRegistry::new(config);
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, database::Dialect};

// ============================================================================
// Connection Settings
// ============================================================================

/// Settings for one named connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// `mysql`, `sqlsrv` or `sqlite` (aliases accepted, see [`Dialect::from_driver`]).
    pub driver: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    /// Database name, or a file path / `:memory:` for sqlite.
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Extra driver options, appended to the connection URL as query pairs.
    #[serde(default)]
    pub options: HashMap<String, String>,
    #[serde(default)]
    pub apply_timezone: bool,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl ConnectionConfig {
    /// In-memory sqlite settings, handy for tests and tooling.
    pub fn sqlite_memory() -> Self {
        Self { driver: "sqlite".to_string(), database: ":memory:".to_string(), ..Default::default() }
    }

    pub fn dialect(&self) -> Result<Dialect, Error> {
        Dialect::from_driver(&self.driver)
    }

    /// Builds the sqlx connection URL for this configuration.
    pub fn url(&self) -> Result<String, Error> {
        match self.dialect()? {
            Dialect::Sqlite => {
                if self.database.is_empty() || self.database == ":memory:" {
                    Ok("sqlite::memory:".to_string())
                } else {
                    Ok(format!("sqlite://{}?mode=rwc", self.database))
                }
            }
            Dialect::MySql => {
                let host = if self.host.is_empty() { "localhost" } else { self.host.as_str() };
                let mut url = Url::parse(&format!("mysql://{}", host))
                    .map_err(|e| Error::Configuration(format!("Invalid host `{}`: {}", host, e)))?;

                let invalid = |_| Error::configuration("Connection URL cannot carry credentials");
                if !self.username.is_empty() {
                    url.set_username(&self.username).map_err(invalid)?;
                }
                if !self.password.is_empty() {
                    url.set_password(Some(&self.password)).map_err(invalid)?;
                }
                url.set_port(self.port).map_err(|_| Error::configuration("Connection URL cannot carry a port"))?;
                url.set_path(&self.database);

                let mut options: Vec<(&String, &String)> = self.options.iter().collect();
                options.sort();
                if !options.is_empty() {
                    let mut pairs = url.query_pairs_mut();
                    for (key, value) in options {
                        pairs.append_pair(key, value);
                    }
                }

                Ok(url.to_string())
            }
            Dialect::SqlServer => Err(Error::configuration(
                "sqlsrv connections can build statements but no runtime driver is available to open them",
            )),
        }
    }

    /// Statement run on every new session, if any.
    pub fn session_init(&self) -> Option<String> {
        match (self.dialect(), self.apply_timezone, &self.timezone) {
            (Ok(Dialect::MySql), true, Some(tz)) => Some(format!("SET time_zone = '{}'", tz.replace('\'', "''"))),
            _ => None,
        }
    }
}

// ============================================================================
// Resolvers
// ============================================================================

/// Looks up connection settings by name.
pub trait ConfigResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<ConnectionConfig>;
}

/// In-memory connection map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseConfig {
    connections: HashMap<String, ConnectionConfig>,
}

impl DatabaseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, config: ConnectionConfig) -> Self {
        self.connections.insert(name.to_string(), config);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }
}

impl ConfigResolver for DatabaseConfig {
    fn resolve(&self, name: &str) -> Option<ConnectionConfig> {
        self.connections.get(name).cloned()
    }
}

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Environment-backed resolver.
pub struct EnvConfig {
    lookup: Lookup,
}

impl EnvConfig {
    /// Loads `.env` (if present) and reads from the process environment.
    pub fn load() -> Self {
        if let Err(e) = dotenvy::dotenv()
            && !e.not_found()
        {
            log::warn!("Failed to load .env file: {}", e);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads variables through a custom lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self { lookup: Box::new(lookup) }
    }

    fn var(&self, name: &str, key: &str) -> Option<String> {
        (self.lookup)(&format!("DB_{}_{}", name.to_ascii_uppercase(), key))
    }
}

impl ConfigResolver for EnvConfig {
    fn resolve(&self, name: &str) -> Option<ConnectionConfig> {
        let driver = self.var(name, "DRIVER")?;

        Some(ConnectionConfig {
            driver,
            host: self.var(name, "HOST").unwrap_or_default(),
            port: self.var(name, "PORT").and_then(|p| p.parse().ok()),
            database: self.var(name, "DATABASE").unwrap_or_default(),
            username: self.var(name, "USERNAME").unwrap_or_default(),
            password: self.var(name, "PASSWORD").unwrap_or_default(),
            options: HashMap::new(),
            apply_timezone: self.var(name, "APPLY_TIMEZONE").is_some_and(|v| v == "true" || v == "1"),
            timezone: self.var(name, "TIMEZONE"),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
