//! Message dispatcher - Feeds inbound events to the router

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

use crate::application::services::Router;
use crate::domain::entities::InboundMessage;
use crate::domain::traits::InboundSource;

/// Pause after a failed poll before asking the source again
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Pulls messages from a source and handles each one on its own task
pub struct Dispatcher {
    router: Arc<Router>,
    retry_delay: Duration,
}

impl Dispatcher {
    pub fn new(router: Arc<Router>) -> Self {
        Self {
            router,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Run until the source is exhausted or `shutdown` completes.
    ///
    /// When the source runs dry, in-flight messages are allowed to finish.
    /// On shutdown they are aborted. Returns the number of messages taken
    /// from the source.
    pub async fn run<S, F>(&self, source: &mut S, shutdown: F) -> usize
    where
        S: InboundSource + ?Sized,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut tasks = JoinSet::new();
        let mut received = 0;

        tracing::info!("Starting message loop...");

        loop {
            // The poll stays alive while finished tasks are reaped, so a
            // long poll is not restarted after every handled message.
            let event = {
                let mut next = source.next_event();
                loop {
                    tokio::select! {
                        _ = &mut shutdown => {
                            tracing::info!(in_flight = tasks.len(), "Shutdown requested");
                            tasks.shutdown().await;
                            return received;
                        }
                        Some(joined) = tasks.join_next(), if !tasks.is_empty() => log_panic(joined),
                        event = &mut next => break event,
                    }
                }
            };

            match event {
                Ok(Some(message)) => {
                    received += 1;
                    tasks.spawn(handle(Arc::clone(&self.router), message));
                }
                Ok(None) => {
                    tracing::info!("Inbound source closed");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to get updates");
                    tokio::select! {
                        _ = &mut shutdown => {
                            tracing::info!(in_flight = tasks.len(), "Shutdown requested");
                            tasks.shutdown().await;
                            return received;
                        }
                        _ = tokio::time::sleep(self.retry_delay) => {}
                    }
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            log_panic(joined);
        }

        received
    }
}

fn log_panic(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "Message task panicked");
    }
}

async fn handle(router: Arc<Router>, message: InboundMessage) {
    let chat_id = message.chat_id.clone();
    match router.handle_message(message).await {
        Ok(Some(reply)) => {
            tracing::debug!(chat_id = %chat_id, "Sent reply: {}", preview(&reply));
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!(chat_id = %chat_id, error = %e, "Failed to handle message");
        }
    }
}

fn preview(text: &str) -> String {
    text.chars().take(100).collect()
}
