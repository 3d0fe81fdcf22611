use std::io::Write;

use tempfile::NamedTempFile;
use webapp_server::{ConfigError, Dialect, Settings};

fn env_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

const MYSQL_FILE: &str = "\
SECRET_KEY=from-file
ALGORITHM=HS256
ACCESS_TOKEN_EXPIRE_MINUTES=60
DB_DIALECT=mysql
DB_HOST=localhost
DB_USER=u
DB_PASSWORD=p
DB_NAME=db
DB_PORT=3306
";

#[test]
fn test_file_alone_is_enough() {
    let file = env_file(MYSQL_FILE);
    let settings = Settings::load_from(file.path(), Vec::<(String, String)>::new()).unwrap();

    assert_eq!(settings.db_dialect, Dialect::Mysql);
    assert_eq!(settings.secret_key, "from-file");
    assert_eq!(
        settings.sqlalchemy_database_uri,
        "mysql+pymysql://u:p@localhost:3306/db"
    );
}

#[test]
fn test_environment_wins_over_file() {
    let file = env_file(MYSQL_FILE);
    let settings = Settings::load_from(
        file.path(),
        [("SECRET_KEY", "from-env"), ("DB_HOST", "db.internal")],
    )
    .unwrap();

    assert_eq!(settings.secret_key, "from-env");
    assert_eq!(settings.algorithm, "HS256");
    assert_eq!(
        settings.sqlalchemy_database_uri,
        "mysql+pymysql://u:p@db.internal:3306/db"
    );
}

#[test]
fn test_environment_can_switch_dialect() {
    let file = env_file(MYSQL_FILE);
    let settings = Settings::load_from(
        file.path(),
        [
            ("DB_DIALECT", "postgresql"),
            ("DATABASE_URL", "postgresql://app:pw@neon.example.com/app?sslmode=require"),
        ],
    )
    .unwrap();

    assert_eq!(settings.db_dialect, Dialect::Postgresql);
    assert_eq!(
        settings.sqlalchemy_database_uri,
        "postgresql://app:pw@neon.example.com/app?sslmode=require"
    );
}

#[test]
fn test_file_with_lowercase_keys() {
    let file = env_file(
        "secret_key=k\nalgorithm=HS256\naccess_token_expire_minutes=15\n\
         db_dialect=postgresql\ndatabase_url=postgres://localhost/app\n",
    );
    let settings = Settings::load_from(file.path(), [("DATABASE_URL", "postgres://db/app")]).unwrap();

    assert_eq!(settings.sqlalchemy_database_uri, "postgres://db/app");
}

#[test]
fn test_missing_file_uses_environment_only() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load_from(
        dir.path().join(".env"),
        [
            ("SECRET_KEY", "k"),
            ("ALGORITHM", "HS256"),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "30"),
            ("DB_DIALECT", "postgresql"),
            ("DATABASE_URL", "postgres://localhost/app"),
        ],
    )
    .unwrap();

    assert_eq!(settings.sqlalchemy_database_uri, "postgres://localhost/app");
}

#[test]
fn test_file_cannot_hide_unsupported_dialect() {
    let file = env_file(MYSQL_FILE);
    let err = Settings::load_from(file.path(), [("DB_DIALECT", "sqlite")]).unwrap_err();

    assert!(matches!(err, ConfigError::UnsupportedDialect(ref v) if v == "sqlite"));
}

#[test]
fn test_malformed_file_is_reported() {
    let file = env_file("SECRET_KEY='unterminated\n");
    let err = Settings::load_from(file.path(), Vec::<(String, String)>::new()).unwrap_err();

    assert!(matches!(err, ConfigError::EnvFile { .. }));
}
