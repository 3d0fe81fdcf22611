use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use sqlx::postgres::PgConnectOptions;

use crate::error::ConfigError;

pub const MYSQL_DRIVER: &str = "pymysql";

const REDACTED: &str = "***";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Postgresql,
    Mysql,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Postgresql => "postgresql",
            Dialect::Mysql => "mysql",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgresql" => Ok(Dialect::Postgresql),
            "mysql" => Ok(Dialect::Mysql),
            other => Err(ConfigError::UnsupportedDialect(other.to_string())),
        }
    }
}

// Empty strings and a zero port count as absent.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConnectionParts<'a> {
    pub database_url: Option<&'a str>,
    pub host: Option<&'a str>,
    pub user: Option<&'a str>,
    pub password: Option<&'a str>,
    pub name: Option<&'a str>,
    pub port: Option<u16>,
}

pub fn build_database_uri(
    dialect: Dialect,
    parts: &ConnectionParts<'_>,
) -> Result<String, ConfigError> {
    match dialect {
        Dialect::Postgresql => {
            let url = present(parts.database_url).ok_or(ConfigError::MissingDatabaseUrl)?;
            validate_postgres_url(url)?;
            Ok(url.to_string())
        }
        Dialect::Mysql => {
            let host = present(parts.host);
            let user = present(parts.user);
            let password = present(parts.password);
            let name = present(parts.name);
            let port = parts.port.filter(|p| *p != 0);

            match (host, user, password, name, port) {
                (Some(host), Some(user), Some(password), Some(name), Some(port)) => {
                    Ok(mysql_uri(user, password, host, port, name))
                }
                _ => {
                    let missing = [
                        ("DB_HOST", host.is_none()),
                        ("DB_USER", user.is_none()),
                        ("DB_PASSWORD", password.is_none()),
                        ("DB_NAME", name.is_none()),
                        ("DB_PORT", port.is_none()),
                    ]
                    .into_iter()
                    .filter_map(|(var, is_missing)| is_missing.then_some(var))
                    .collect();
                    Err(ConfigError::MissingMysqlParts(missing))
                }
            }
        }
    }
}

pub(crate) fn mysql_uri(user: &str, password: &str, host: &str, port: u16, name: &str) -> String {
    format!("mysql+{MYSQL_DRIVER}://{user}:{password}@{host}:{port}/{name}")
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn validate_postgres_url(url: &str) -> Result<(), ConfigError> {
    let scheme = url
        .split_once("://")
        .map(|(scheme, _)| scheme)
        .ok_or_else(|| ConfigError::InvalidDatabaseUrl("missing scheme".to_string()))?;

    if !scheme.starts_with("postgres") {
        return Err(ConfigError::InvalidDatabaseUrl(format!(
            "scheme '{scheme}' does not match the 'postgresql' dialect"
        )));
    }

    PgConnectOptions::from_str(url)
        .map_err(|e| ConfigError::InvalidDatabaseUrl(e.to_string()))?;

    Ok(())
}

pub fn redact_password(uri: &str) -> Cow<'_, str> {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return Cow::Borrowed(uri);
    };
    let authority_end = rest
        .find(|c| matches!(c, '/' | '?' | '#'))
        .unwrap_or(rest.len());
    let Some(at) = rest[..authority_end].rfind('@') else {
        return Cow::Borrowed(uri);
    };
    let Some((user, _)) = rest[..at].split_once(':') else {
        return Cow::Borrowed(uri);
    };

    Cow::Owned(format!("{scheme}://{user}:{REDACTED}{}", &rest[at..]))
}
