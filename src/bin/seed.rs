//! Writes a demo user with accounts, campaigns and metrics into the data file.
//!
//! `SEED_EMAIL` and `SEED_PASSWORD` override the demo credentials. An existing
//! data file is merged into; a user with the same email is replaced.

use ads_dashboard::{load_data, persist_data, seed::build_demo_data, Config};
use std::env;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_EMAIL: &str = "demo@example.com";
const DEFAULT_PASSWORD: &str = "password123";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    if let Err(err) = run().await {
        error!("seeding failed: {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let email = env::var("SEED_EMAIL").unwrap_or_else(|_| DEFAULT_EMAIL.to_string());
    let password = env::var("SEED_PASSWORD").unwrap_or_else(|_| DEFAULT_PASSWORD.to_string());

    let demo = build_demo_data(&email, &password)?;
    let mut data = load_data(&config.data_path).await;

    if let Some(existing) = data.user_by_email(&email.trim().to_ascii_lowercase()).map(|u| u.id.clone()) {
        info!("replacing existing user {email}");
        data.remove_user(&existing);
    }

    data.users.extend(demo.users);
    data.settings.extend(demo.settings);
    data.ad_accounts.extend(demo.ad_accounts);
    data.campaigns.extend(demo.campaigns);
    data.campaign_metrics.extend(demo.campaign_metrics);

    persist_data(&config.data_path, &data).await?;
    info!(
        path = %config.data_path.display(),
        campaigns = data.campaigns.len(),
        metrics = data.campaign_metrics.len(),
        "seeded demo data for {email}"
    );
    Ok(())
}
