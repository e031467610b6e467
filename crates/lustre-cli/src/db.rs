//! `db` subcommands: connectivity, migrations, and shipping-rate seeding.

use lustre_core::AppConfig;

/// Open a pool using the configured URL and pool limits.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is unset or the database is unreachable.
pub(crate) async fn connect(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let database_url = config.database_url()?;
    let pool =
        lustre_db::connect_pool(database_url, lustre_db::PoolConfig::from_app_config(config))
            .await
            .map_err(|e| anyhow::anyhow!("failed to connect to database: {e}"))?;
    Ok(pool)
}

pub(crate) async fn run_db_ping(config: &AppConfig) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    lustre_db::health_check(&pool).await?;
    println!("database ok");
    Ok(())
}

pub(crate) async fn run_db_migrate(config: &AppConfig) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    let applied = lustre_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations complete");
    println!("applied {applied} migration(s)");
    Ok(())
}

/// Upsert every rate from the shipping rates YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or the upsert fails. The
/// upsert is transactional, so a failure leaves the table untouched.
pub(crate) async fn run_db_seed(config: &AppConfig) -> anyhow::Result<()> {
    let file = lustre_core::load_shipping_rates(&config.shipping_rates_path)?;
    let pool = connect(config).await?;
    let count = lustre_db::seed_shipping_rates(&pool, &file.rates).await?;
    println!(
        "seeded {count} shipping rate(s) from {}",
        config.shipping_rates_path.display()
    );
    Ok(())
}
