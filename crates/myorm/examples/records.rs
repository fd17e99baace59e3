//! Insert, load, update and delete a row through `Record`.
//!
//! Needs a `people` table:
//!
//! ```sql
//! create table people (
//!     id bigint unsigned auto_increment primary key,
//!     name varchar(64) not null,
//!     email varchar(128) not null,
//!     password varchar(128) not null default ''
//! );
//! ```
//!
//! Run with: DATABASE_CONFIG=myorm.toml cargo run --example records

use myorm::{DatabaseConfig, MySqlClient, Record, qb};
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
    let client = MySqlClient::connect(config.get(None)?).await?;

    let mut person = Record::new("people")
        .with_primary_key(["id"])
        .with_hidden(["password"]);
    person.set("name", "Ada");
    person.set("email", "ada@example.com");
    person.set("password", "not-a-real-hash");
    person.save(&client).await?;
    println!("inserted: {}", serde_json::to_string(&person)?);

    let id = person.try_get::<u64>("id")?;
    let mut loaded = Record::find(&client, "people", "id", id).await?;
    loaded.set("email", "ada@lovelace.dev");
    loaded.save(&client).await?;

    let again = Record::first_or_new(&client, "people", [("email", "ada@lovelace.dev")]).await?;
    println!("found again: new={} row={:?}", again.is_new(), again.row());

    loaded.delete(&client).await?;
    println!(
        "remaining: {}",
        qb::table("people").where_eq("id", id).count(&client).await?
    );

    client.close().await;
    Ok(())
}
