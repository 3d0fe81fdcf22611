use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::path::Path;

use chrono::Duration;
use serde::Deserialize;

use crate::db::{self, ConnectionParts, Dialect};
use crate::error::ConfigError;

pub const DEFAULT_ENV_FILE: &str = ".env";

#[derive(Debug, Deserialize)]
struct RawSettings {
    secret_key: String,
    algorithm: String,
    access_token_expire_minutes: i64,
    db_dialect: String,
    database_url: Option<String>,
    db_host: Option<String>,
    db_user: Option<String>,
    db_password: Option<String>,
    db_name: Option<String>,
    db_port: Option<u16>,
}

#[derive(Clone)]
pub struct Settings {
    pub secret_key: String,
    pub algorithm: String,
    pub access_token_expire_minutes: i64,
    pub db_dialect: Dialect,
    pub database_url: Option<String>,
    pub db_host: Option<String>,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub db_name: Option<String>,
    pub db_port: Option<u16>,
    pub sqlalchemy_database_uri: String,
}

impl Settings {
    /// Reads `.env` from the working directory, if present, and the process
    /// environment. Environment variables win over file values.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env_file(DEFAULT_ENV_FILE)
    }

    pub fn load_with_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let process_env = env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)));
        Self::load_from(path, process_env)
    }

    pub fn load_from<I, K, V>(path: impl AsRef<Path>, environment: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut vars = read_env_file(path.as_ref())?;
        vars.extend(normalize(environment));
        Self::from_normalized(vars)
    }

    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::from_normalized(normalize(vars).collect())
    }

    fn from_normalized(vars: BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let raw: RawSettings = envy::from_iter(vars).map_err(|e| match e {
            envy::Error::MissingValue(field) => ConfigError::MissingVar(field.to_ascii_uppercase()),
            other => ConfigError::Env(other),
        })?;
        Self::derive(raw)
    }

    fn derive(raw: RawSettings) -> Result<Self, ConfigError> {
        if Duration::try_minutes(raw.access_token_expire_minutes).is_none() {
            return Err(ConfigError::TokenExpiryOutOfRange(
                raw.access_token_expire_minutes,
            ));
        }

        let db_dialect: Dialect = raw.db_dialect.parse()?;

        let parts = ConnectionParts {
            database_url: raw.database_url.as_deref(),
            host: raw.db_host.as_deref(),
            user: raw.db_user.as_deref(),
            password: raw.db_password.as_deref(),
            name: raw.db_name.as_deref(),
            port: raw.db_port,
        };
        let sqlalchemy_database_uri = db::build_database_uri(db_dialect, &parts)?;

        tracing::debug!(dialect = %db_dialect, "Database URI derived");

        Ok(Self {
            secret_key: raw.secret_key,
            algorithm: raw.algorithm,
            access_token_expire_minutes: raw.access_token_expire_minutes,
            db_dialect,
            database_url: raw.database_url,
            db_host: raw.db_host,
            db_user: raw.db_user,
            db_password: raw.db_password,
            db_name: raw.db_name,
            db_port: raw.db_port,
            sqlalchemy_database_uri,
        })
    }

    pub fn access_token_expires(&self) -> Duration {
        Duration::try_minutes(self.access_token_expire_minutes).unwrap_or(Duration::MAX)
    }

    /// The connection URI with its password masked, for logs.
    pub fn redacted_database_uri(&self) -> String {
        match self.db_dialect {
            Dialect::Postgresql => db::redact_password(&self.sqlalchemy_database_uri).into_owned(),
            // Built from parts, so mask the known password rather than parse
            // a URI that may contain unescaped separators.
            Dialect::Mysql => db::mysql_uri(
                self.db_user.as_deref().unwrap_or_default(),
                "***",
                self.db_host.as_deref().unwrap_or_default(),
                self.db_port.unwrap_or_default(),
                self.db_name.as_deref().unwrap_or_default(),
            ),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("secret_key", &"***")
            .field("algorithm", &self.algorithm)
            .field("access_token_expire_minutes", &self.access_token_expire_minutes)
            .field("db_dialect", &self.db_dialect)
            .field(
                "database_url",
                &self.database_url.as_deref().map(db::redact_password),
            )
            .field("db_host", &self.db_host)
            .field("db_user", &self.db_user)
            .field("db_password", &self.db_password.as_ref().map(|_| "***"))
            .field("db_name", &self.db_name)
            .field("db_port", &self.db_port)
            .field("sqlalchemy_database_uri", &self.redacted_database_uri())
            .finish()
    }
}

fn normalize<I, K, V>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    vars.into_iter()
        .map(|(key, value)| (key.into().to_ascii_uppercase(), value.into()))
}

fn read_env_file(path: &Path) -> Result<BTreeMap<String, String>, ConfigError> {
    let file_error = |source: dotenvy::Error| ConfigError::EnvFile {
        path: path.to_path_buf(),
        source,
    };

    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => {
            tracing::debug!(path = %path.display(), "No settings file, using environment only");
            return Ok(BTreeMap::new());
        }
        Err(e) => return Err(file_error(e)),
    };

    let vars = iter
        .map(|item| item.map_err(file_error))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(path = %path.display(), count = vars.len(), "Settings file read");

    Ok(normalize(vars).collect())
}
