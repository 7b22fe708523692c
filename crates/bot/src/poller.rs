//! Telegram long-polling loop.
//!
//! Updates are handled one at a time, each to completion before the next
//! batch is requested. The offset advances past every update seen, text or
//! not, so nothing is delivered twice.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use courier_core::messaging::Update;
use courier_core::{Dispatcher, MessagingError, TelegramClient};

use crate::metrics::{POLL_BACKOFF_SECONDS, POLL_ERRORS, UPDATES_RECEIVED};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Source of chat updates.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn fetch_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, MessagingError>;
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn fetch_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, MessagingError> {
        self.get_updates(offset).await
    }
}

/// Exponential backoff between failed polls.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Option<Duration>,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: None,
        }
    }

    /// Delay before the next attempt; doubles on every call up to the cap.
    pub fn next_delay(&mut self) -> Duration {
        let delay = match self.current {
            None => self.initial,
            Some(current) => (current * 2).min(self.max),
        };
        self.current = Some(delay);
        delay
    }

    pub fn reset(&mut self) {
        self.current = None;
    }

    pub fn is_backing_off(&self) -> bool {
        self.current.is_some()
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(INITIAL_BACKOFF, MAX_BACKOFF)
    }
}

pub struct Poller<S> {
    source: Arc<S>,
    dispatcher: Arc<Dispatcher>,
    offset: Option<i64>,
    backoff: Backoff,
}

impl<S: UpdateSource> Poller<S> {
    pub fn new(source: Arc<S>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            source,
            dispatcher,
            offset: None,
            backoff: Backoff::default(),
        }
    }

    #[cfg(test)]
    fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Offset sent with the next request.
    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    /// Fetch one batch and handle it. Returns the number of text messages dispatched.
    pub async fn poll_once(&mut self) -> Result<usize, MessagingError> {
        let updates = self.source.fetch_updates(self.offset).await?;
        Ok(self.process(updates).await)
    }

    async fn process(&mut self, updates: Vec<Update>) -> usize {
        let mut handled = 0;
        for update in updates {
            let update_id = update.update_id;
            self.offset = Some(update_id + 1);

            let Some(message) = update.into_inbound() else {
                UPDATES_RECEIVED.with_label_values(&["ignored"]).inc();
                debug!(update_id, "Ignoring non-text update");
                continue;
            };

            UPDATES_RECEIVED.with_label_values(&["text"]).inc();
            debug!(
                update_id,
                user_id = message.user_id.0,
                chat_id = message.chat_id.0,
                "Dispatching message"
            );
            self.dispatcher.handle(&message).await;
            handled += 1;
        }
        handled
    }

    /// Poll until a shutdown signal arrives.
    ///
    /// Only the fetch is raced against shutdown; a batch that has been
    /// received is always handled to the end.
    pub async fn run(mut self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!("Polling for chat updates");
        loop {
            let fetched = tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Poll loop received shutdown signal");
                    break;
                }
                result = self.source.fetch_updates(self.offset) => result,
            };

            match fetched {
                Ok(updates) => {
                    if self.backoff.is_backing_off() {
                        info!("Chat API reachable again");
                        self.backoff.reset();
                        POLL_BACKOFF_SECONDS.set(0);
                    }
                    self.process(updates).await;
                }
                Err(e) => {
                    POLL_ERRORS.inc();
                    let delay = self.backoff.next_delay();
                    POLL_BACKOFF_SECONDS.set(delay.as_secs() as i64);
                    warn!(error = %e, delay_secs = delay.as_secs(), "Polling failed, backing off");

                    tokio::select! {
                        _ = shutdown_rx.recv() => {
                            info!("Poll loop received shutdown signal");
                            break;
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
        info!("Poll loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use tokio::sync::Mutex;

    use courier_core::testing::{MockMessenger, MockTorrentClient};
    use courier_core::{
        messages, InteractiveSession, NoneAuthenticator, RelocationConfig, RelocationService,
    };

    /// Scripted update source recording the offsets it was asked for.
    #[derive(Default)]
    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<Vec<Update>, MessagingError>>>,
        offsets: Mutex<Vec<Option<i64>>>,
    }

    impl ScriptedSource {
        async fn push(&self, response: Result<Vec<Update>, MessagingError>) {
            self.responses.lock().await.push_back(response);
        }

        async fn offsets(&self) -> Vec<Option<i64>> {
            self.offsets.lock().await.clone()
        }
    }

    #[async_trait]
    impl UpdateSource for ScriptedSource {
        async fn fetch_updates(
            &self,
            offset: Option<i64>,
        ) -> Result<Vec<Update>, MessagingError> {
            self.offsets.lock().await.push(offset);
            let next = self.responses.lock().await.pop_front();
            match next {
                Some(response) => response,
                None => {
                    // Stand-in for an empty long poll.
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    Ok(Vec::new())
                }
            }
        }
    }

    fn text_update(update_id: i64, user: i64, text: &str) -> Update {
        serde_json::from_value(serde_json::json!({
            "update_id": update_id,
            "message": {
                "message_id": update_id,
                "from": { "id": user },
                "chat": { "id": user },
                "text": text,
            }
        }))
        .unwrap()
    }

    fn sticker_update(update_id: i64) -> Update {
        serde_json::from_value(serde_json::json!({
            "update_id": update_id,
            "message": {
                "message_id": update_id,
                "from": { "id": 7 },
                "chat": { "id": 7 },
            }
        }))
        .unwrap()
    }

    fn dispatcher(messenger: &MockMessenger) -> Arc<Dispatcher> {
        let client = Arc::new(MockTorrentClient::new());
        let relocation = Arc::new(RelocationService::from_client(
            client.clone(),
            RelocationConfig::default(),
        ));
        let session = Arc::new(InteractiveSession::new(
            relocation.clone(),
            Arc::new(messenger.clone()),
            Arc::new(messenger.clone()),
        ));
        Arc::new(Dispatcher::new(
            Arc::new(NoneAuthenticator::new()),
            client,
            relocation,
            session,
            Arc::new(messenger.clone()),
        ))
    }

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let mut backoff = Backoff::default();
        let delays: Vec<u64> = (0..8).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 32, 60, 60]);
    }

    #[test]
    fn test_backoff_reset_starts_over() {
        let mut backoff = Backoff::default();
        backoff.next_delay();
        backoff.next_delay();
        assert!(backoff.is_backing_off());

        backoff.reset();
        assert!(!backoff.is_backing_off());
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_offset_advances_past_every_update() {
        let messenger = MockMessenger::new();
        let source = Arc::new(ScriptedSource::default());
        source
            .push(Ok(vec![text_update(10, 1, "/help"), sticker_update(11)]))
            .await;
        let mut poller = Poller::new(source.clone(), dispatcher(&messenger));

        let handled = poller.poll_once().await.unwrap();
        assert_eq!(handled, 1);
        assert_eq!(poller.offset(), Some(12));

        poller.poll_once().await.unwrap();
        assert_eq!(source.offsets().await, vec![None, Some(12)]);
    }

    #[tokio::test]
    async fn test_updates_are_dispatched_in_order() {
        let messenger = MockMessenger::new();
        let source = Arc::new(ScriptedSource::default());
        source
            .push(Ok(vec![
                text_update(1, 5, "/help"),
                text_update(2, 5, "/cancel"),
            ]))
            .await;
        let mut poller = Poller::new(source, dispatcher(&messenger));

        poller.poll_once().await.unwrap();

        assert_eq!(
            messenger.notifications().await,
            vec![messages::HELP_TEXT, messages::NOTHING_TO_CANCEL]
        );
    }

    #[tokio::test]
    async fn test_poll_error_keeps_offset() {
        let messenger = MockMessenger::new();
        let source = Arc::new(ScriptedSource::default());
        source.push(Ok(vec![text_update(3, 1, "/help")])).await;
        source.push(Err(MessagingError::Timeout)).await;
        let mut poller = Poller::new(source, dispatcher(&messenger));

        poller.poll_once().await.unwrap();
        assert!(poller.poll_once().await.is_err());
        assert_eq!(poller.offset(), Some(4));
    }

    #[tokio::test]
    async fn test_run_recovers_after_errors_and_stops_on_shutdown() {
        let messenger = MockMessenger::new();
        let source = Arc::new(ScriptedSource::default());
        source.push(Err(MessagingError::Timeout)).await;
        source.push(Ok(vec![text_update(1, 9, "/help")])).await;

        let poller = Poller::new(source.clone(), dispatcher(&messenger)).with_backoff(
            Backoff::new(Duration::from_millis(1), Duration::from_millis(5)),
        );
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(poller.run(shutdown_rx));

        for _ in 0..200 {
            if !messenger.notifications().await.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();

        assert_eq!(messenger.notifications().await, vec![messages::HELP_TEXT]);
        let offsets = source.offsets().await;
        assert_eq!(&offsets[..2], &[None, None]);
        assert!(offsets[2..].iter().all(|o| *o == Some(2)));
    }
}
