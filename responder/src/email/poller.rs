use std::{sync::Arc, time::Duration};

use rand::Rng;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::Instrument;

use crate::email::{
    client::EmailClient,
    processor::{process_message, MessageOutcome},
    reply::ReplySender,
    seen::SeenMessages,
};

// Re-arm window for the next poll cycle, both ends inclusive
pub const MIN_POLL_DELAY_MS: u64 = 45_000;
pub const MAX_POLL_DELAY_MS: u64 = 120_000;

/// Uniform draw from `[MIN_POLL_DELAY_MS, MAX_POLL_DELAY_MS]`.
pub fn next_poll_delay<R: Rng + ?Sized>(rng: &mut R) -> Duration {
    Duration::from_millis(rng.gen_range(MIN_POLL_DELAY_MS..=MAX_POLL_DELAY_MS))
}

/// Unread inbox ids, or nothing when the list call fails.
async fn list_unread(client: &EmailClient) -> Vec<String> {
    match client.list_unread_inbox_messages().await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!("Error listing emails: {}", e);
            Vec::new()
        }
    }
}

pub struct MailboxPoller {
    client: Arc<EmailClient>,
    replier: Arc<ReplySender>,
    push_topic: String,
    seen: SeenMessages,
    pipelines: TaskTracker,
}

impl MailboxPoller {
    pub fn new(client: Arc<EmailClient>, replier: Arc<ReplySender>, push_topic: impl Into<String>) -> Self {
        Self {
            client,
            replier,
            push_topic: push_topic.into(),
            seen: SeenMessages::new(),
            pipelines: TaskTracker::new(),
        }
    }

    pub fn seen(&self) -> &SeenMessages {
        &self.seen
    }

    /// Registers the push subscription in the background.
    pub fn register_push(&self) -> JoinHandle<()> {
        let client = self.client.clone();
        let topic = self.push_topic.clone();
        tokio::spawn(async move {
            match client.watch_mailbox(&topic).await {
                Ok(resp) => tracing::info!("Mailbox watch started: {:?}", resp),
                Err(e) => tracing::error!("Error watching mailbox: {}", e),
            }
        })
    }

    /// Lists unread mail and dispatches it in one step.
    #[cfg(test)]
    pub async fn poll(&mut self) -> Vec<JoinHandle<()>> {
        let ids = list_unread(&self.client).await;
        self.dispatch_unseen(ids)
    }

    /// Marks every id not seen before and spawns its pipeline. Returned
    /// handles may be dropped, the tasks run regardless.
    pub fn dispatch_unseen(&mut self, ids: Vec<String>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        for id in ids {
            if self.seen.is_seen(&id) {
                continue;
            }
            self.seen.mark_seen(id.as_str());
            handles.push(self.dispatch(id));
        }
        handles
    }

    fn dispatch(&self, message_id: String) -> JoinHandle<()> {
        let client = self.client.clone();
        let replier = self.replier.clone();
        let span = tracing::info_span!("message", id = %message_id);

        self.pipelines.spawn(
            async move {
                match process_message(&client, &replier, &message_id).await {
                    Ok(MessageOutcome::Replied(outcome)) if outcome.was_sent() => {
                        tracing::debug!("Reply sent: {:?}", outcome)
                    }
                    Ok(MessageOutcome::Replied(outcome)) => {
                        tracing::debug!("Reply abandoned: {:?}", outcome)
                    }
                    Ok(MessageOutcome::SenderNotFound) | Ok(MessageOutcome::NoThread) => {}
                    Err(e) => tracing::error!("Error retrieving email: {}", e),
                }
            }
            .instrument(span),
        )
    }

    /// Starts one cycle: push registration plus a list call whose ids come
    /// back through `ids_tx`. Neither is awaited here.
    fn start_cycle(&self, ids_tx: mpsc::UnboundedSender<Vec<String>>) {
        self.register_push();

        let client = self.client.clone();
        tokio::spawn(async move {
            let ids = list_unread(&client).await;
            if !ids.is_empty() {
                // The loop is gone once shutdown fired
                let _ = ids_tx.send(ids);
            }
        });
    }

    /// Runs cycles until `shutdown` fires. Each cycle starts on its timer no
    /// matter how the previous list call went. On shutdown, pipelines
    /// already dispatched are waited on, pending list calls are dropped.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let (ids_tx, mut ids_rx) = mpsc::unbounded_channel();
        let mut next_cycle = Instant::now();

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,
                Some(ids) = ids_rx.recv() => {
                    self.dispatch_unseen(ids);
                }
                _ = sleep_until(next_cycle) => {
                    let delay = next_poll_delay(&mut rand::thread_rng());
                    next_cycle = Instant::now() + delay;
                    self.start_cycle(ids_tx.clone());
                    tracing::debug!(
                        "Next poll in {:?}, {} messages seen so far",
                        delay,
                        self.seen.len()
                    );
                }
            }
        }

        self.pipelines.close();
        tracing::info!(
            "Poller stopped after seeing {} messages, waiting on {} in-flight",
            self.seen.len(),
            self.pipelines.len()
        );
        self.pipelines.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn test_next_poll_delay_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let min = Duration::from_millis(MIN_POLL_DELAY_MS);
        let max = Duration::from_millis(MAX_POLL_DELAY_MS);

        for _ in 0..5_000 {
            let delay = next_poll_delay(&mut rng);
            assert!(delay >= min && delay <= max, "{delay:?} out of range");
        }
    }

    #[test]
    fn test_next_poll_delay_spreads_across_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let draws: Vec<Duration> = (0..2_000).map(|_| next_poll_delay(&mut rng)).collect();
        let midpoint = Duration::from_millis((MIN_POLL_DELAY_MS + MAX_POLL_DELAY_MS) / 2);

        assert!(draws.iter().any(|d| *d < midpoint));
        assert!(draws.iter().any(|d| *d > midpoint));
    }
}
