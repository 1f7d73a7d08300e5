use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use busroutes_parser::CsvOptions;
use serde::Deserialize;
use sqlx::mysql::MySqlConnectOptions;

use crate::cleaning::CleaningRules;
use crate::error::{PipelineError, Result};
use crate::loader::LoaderSettings;

/// Everything a run needs from the outside world, assembled from an optional
/// TOML file and `BUSROUTES_*` environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub pipeline: PipelineSettings,
}

impl AppConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|err| PipelineError::Config(err.to_string()))
    }

    /// Loads `.env`, then the optional config file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                Self::from_toml_str(&contents)?
            }
            None => Self::default(),
        };

        config.database.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// A full `mysql://` URL; when set it wins over the individual fields.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: None,
            database: "redbus".to_string(),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .finish()
    }
}

impl DatabaseConfig {
    /// Overrides fields from `BUSROUTES_*` variables (and `DATABASE_URL`) found by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("BUSROUTES_DATABASE_URL").or_else(|| lookup("DATABASE_URL")) {
            self.url = Some(url);
        }
        if let Some(host) = lookup("BUSROUTES_DB_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("BUSROUTES_DB_PORT") {
            self.port = port.parse().map_err(|_| {
                PipelineError::Config(format!("BUSROUTES_DB_PORT must be a port number, got '{port}'"))
            })?;
        }
        if let Some(user) = lookup("BUSROUTES_DB_USER") {
            self.user = user;
        }
        if let Some(password) = lookup("BUSROUTES_DB_PASSWORD") {
            self.password = Some(password);
        }
        if let Some(database) = lookup("BUSROUTES_DB_NAME") {
            self.database = database;
        }
        Ok(())
    }

    pub fn connect_options(&self) -> Result<MySqlConnectOptions> {
        if let Some(url) = &self.url {
            return MySqlConnectOptions::from_str(url)
                .map_err(|err| PipelineError::Config(format!("invalid database url: {err}")));
        }

        let mut options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.database);
        if let Some(password) = &self.password {
            options = options.password(password);
        }
        Ok(options)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub csv: CsvOptions,
    pub cleaning: CleaningRules,
    pub loader: LoaderSettings,
    /// Rows shown in the combined and cleaned previews.
    pub preview_rows: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            csv: CsvOptions::default(),
            cleaning: CleaningRules::default(),
            loader: LoaderSettings::default(),
            preview_rows: 5,
        }
    }
}
