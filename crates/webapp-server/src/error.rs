use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    MissingVar(String),

    #[error("Invalid environment: {0}")]
    Env(#[from] envy::Error),

    #[error("ACCESS_TOKEN_EXPIRE_MINUTES is out of range: {0}")]
    TokenExpiryOutOfRange(i64),

    #[error("Failed to read settings file {}: {source}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("Unsupported database dialect: '{0}' (expected 'postgresql' or 'mysql')")]
    UnsupportedDialect(String),

    #[error("DATABASE_URL must be set for the 'postgresql' dialect")]
    MissingDatabaseUrl,

    #[error("All DB_* variables must be set for the 'mysql' dialect (missing: {})", .0.join(", "))]
    MissingMysqlParts(Vec<&'static str>),

    #[error("Invalid DATABASE_URL: {0}")]
    InvalidDatabaseUrl(String),
}

