//! # checkin-admin
//!
//! ```bash
//! cargo run -p checkin-admin -- create-admin --username maria --email maria@example.com
//! ```

use checkin_admin::{run, stdin_password_prompt, Cli};
use checkin_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, DatabaseConfig},
};
use clap::Parser;
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so command output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "checkin_admin=info,checkin_shared=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let pool = create_pool(DatabaseConfig {
        url: cli.database_url.clone(),
        max_connections: 1,
        ..Default::default()
    })
    .await?;
    run_migrations(&pool).await?;

    let mut passwords = stdin_password_prompt();
    let result = run(&pool, cli.command, &mut *passwords).await;
    close_pool(pool).await;

    println!("{}", result?);
    Ok(())
}
