use std::sync::Arc;
use std::time::Duration;

use invitegate_runtime::{AttributionStore, ReferralEngine};

use crate::{TelegramClient, TelegramError, Update, LONG_POLL_TIMEOUT_SECS, POLL_RETRY_DELAY_SECS};

/// Long-polls `getUpdates` and hands every membership change to the engine on
/// its own task.
pub struct UpdatePoller<S: AttributionStore> {
    client: TelegramClient,
    engine: Arc<ReferralEngine<TelegramClient, S>>,
    offset: Option<i64>,
    timeout_secs: u64,
    retry_delay: Duration,
}

impl<S: AttributionStore> UpdatePoller<S> {
    pub fn new(client: TelegramClient, engine: Arc<ReferralEngine<TelegramClient, S>>) -> Self {
        Self {
            client,
            engine,
            offset: None,
            timeout_secs: LONG_POLL_TIMEOUT_SECS,
            retry_delay: Duration::from_secs(POLL_RETRY_DELAY_SECS),
        }
    }

    pub async fn run(mut self) {
        tracing::info!("[UpdatePoller::run] Polling for chat member updates");

        loop {
            let updates = match self.client.get_updates(self.offset, self.timeout_secs).await {
                Ok(updates) => updates,
                Err(e) => {
                    let delay = retry_delay_for(&e, self.retry_delay);
                    tracing::warn!("[UpdatePoller::run] getUpdates failed, retrying in {:?}: {:?}", delay, e);
                    tokio::time::sleep(delay).await;
                    continue;
                }
            };

            for update in updates {
                self.dispatch(update);
            }
        }
    }

    fn dispatch(&mut self, update: Update) {
        self.offset = next_offset(self.offset, update.update_id);

        let Some(event) = update.to_member_update() else {
            tracing::debug!("[UpdatePoller::dispatch] Skipping update {}", update.update_id);
            return;
        };

        let engine = self.engine.clone();
        tokio::spawn(async move {
            let outcome = engine.handle(&event).await;
            tracing::debug!("[UpdatePoller::dispatch] Handled {:?}: {:?}", event, outcome);
        });
    }
}

/// Honors the flood-control wait the Bot API asks for, if any.
fn retry_delay_for(error: &anyhow::Error, default: Duration) -> Duration {
    match error.downcast_ref::<TelegramError>() {
        Some(TelegramError::Api { retry_after: Some(secs), .. }) => Duration::from_secs(*secs).max(default),
        _ => default,
    }
}

/// The offset that acknowledges `update_id` without moving backwards.
fn next_offset(current: Option<i64>, update_id: i64) -> Option<i64> {
    let next = update_id + 1;
    Some(current.map_or(next, |current| current.max(next)))
}
