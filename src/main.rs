use anyhow::Context;
use coffee_shop::{server::start_server, EnvironmentConfig, Profile, Settings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coffee_shop=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = envy::prefixed("COFFEE_SHOP_")
        .from_env::<Settings>()
        .context("failed reading COFFEE_SHOP_ settings")?;

    let environment = EnvironmentConfig::current();
    tracing::info!(
        profile = %Profile::current(),
        api = environment.api_server_url(),
        tenant = environment.auth0().url(),
        "starting coffee shop API"
    );

    start_server(environment, settings).await?;

    Ok(())
}
