use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use webapp_server::Settings;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webapp_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;

    report(&settings);

    Ok(())
}

fn report(settings: &Settings) {
    tracing::info!(
        dialect = %settings.db_dialect,
        database = %settings.redacted_database_uri(),
        algorithm = %settings.algorithm,
        token_ttl_minutes = settings.access_token_expire_minutes,
        "Settings loaded"
    );
}
