//! Query a live MySQL server through a monitored client.
//!
//! Expects `DATABASE_CONFIG` to point at a TOML file with `[connections.<name>]`
//! tables (see `myorm::config`), e.g. via `.env`.
//!
//! Run with: RUST_LOG=myorm=debug cargo run --example mysql_client

use myorm::{
    ConnectionRegistry, DatabaseConfig, InstrumentedClient, LoggingMonitor, MonitorConfig, qb,
};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let path = env::var("DATABASE_CONFIG").unwrap_or_else(|_| "myorm.toml".to_string());
    let config = DatabaseConfig::load(&path)?;
    let mut registry = ConnectionRegistry::connect_all(&config).await?;

    let name = config.default_name().unwrap_or("main");
    let monitor = MonitorConfig::from_connection(config.get(Some(name))?);
    let client = InstrumentedClient::new(registry.get(name)?.clone())
        .with_config(monitor.enable_monitoring())
        .with_monitor(LoggingMonitor::new().max_sql_length(120));

    let tables = qb::table("information_schema.tables")
        .select(["table_name"])
        .where_raw("table_schema = database()");

    println!("{} tables", tables.count(&client).await?);
    for name in tables.order_by_asc("table_name").limit(10).values(&client, "table_name").await? {
        println!("  {name}");
    }

    registry.close_all().await;
    Ok(())
}
