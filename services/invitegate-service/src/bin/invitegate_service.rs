use std::sync::Arc;

use anyhow::Result;

use invitegate_clients::{TelegramClient, UpdatePoller};
use invitegate_common::{EnvVars, ModuleClient};
use invitegate_runtime::{AttributionStore, InMemoryAttributionStore, ReferralEngine, ReferralEnv};
use invitegate_service_api::{serve, setup_tracing, ApiServerEnv};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    setup_tracing();

    let referral_env = ReferralEnv::load()?;
    let api_env = ApiServerEnv::load()?;
    let telegram = TelegramClient::setup_connection().await?;

    let me = telegram.get_me().await?;
    tracing::info!(
        "Running as @{} for channel {}",
        me.username.as_deref().unwrap_or(&me.first_name),
        referral_env.channel_id
    );

    let store = Arc::new(InMemoryAttributionStore::new());
    let engine = Arc::new(ReferralEngine::new(telegram.clone(), store.clone(), referral_env.into()));
    let poller = UpdatePoller::new(telegram, engine);

    tokio::select! {
        result = serve(api_env.port) => result?,
        _ = poller.run() => {}
        _ = tokio::signal::ctrl_c() => {
            let stats = store.stats();
            tracing::info!(
                "Shutting down: {} users known, {} links issued, {} unlocked",
                stats.known_users, stats.issued_links, stats.unlocked_users
            );
        }
    }

    Ok(())
}
