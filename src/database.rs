use sqlx::{postgres::PgPoolOptions, Connection, Executor, PgConnection, PgPool};

use crate::configuration::DatabaseConfig;

pub fn get_connection_pool(configuration: &DatabaseConfig) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(
            configuration.acquire_timeout,
        ))
        .max_connections(configuration.max_connections)
        .min_connections(configuration.min_connections)
        .connect_lazy_with(configuration.with_db())
}

#[tracing::instrument(name = "Create database if missing", skip(config))]
pub async fn create_database(config: &DatabaseConfig) -> Result<(), anyhow::Error> {
    let mut connection = PgConnection::connect_with(&config.without_db()).await?;
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(&config.name)
            .fetch_one(&mut connection)
            .await?;
    if !exists {
        connection
            .execute(format!(r#"CREATE DATABASE "{}";"#, config.name).as_str())
            .await?;
        tracing::info!("Created database {}", config.name);
    }
    Ok(())
}

#[tracing::instrument(name = "Run database migrations", skip(config))]
pub async fn migrate_database(config: &DatabaseConfig) -> Result<PgPool, anyhow::Error> {
    create_database(config).await?;
    let connection_pool = PgPool::connect_with(config.with_db()).await?;
    sqlx::migrate!("./migrations").run(&connection_pool).await?;
    Ok(connection_pool)
}
