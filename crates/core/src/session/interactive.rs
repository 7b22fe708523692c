//! Two-step conversational move.

use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};

use super::store::SessionStore;
use super::types::{SessionPhase, SessionState, StepOutcome};
use crate::messages;
use crate::messaging::{ChatId, ConversationHost, Notifier, UserId};
use crate::metrics::SESSION_TRANSITIONS;
use crate::relocation::{
    render_error, render_report, RelocationMode, RelocationRequest, RelocationService,
};

/// Collects a pattern and a destination over two replies, then relocates.
///
/// `AwaitingPattern -> AwaitingDestination -> (completed | cancelled)`.
/// Callers serialize each user's messages with [`InteractiveSession::lock_user`].
pub struct InteractiveSession {
    store: SessionStore,
    relocation: Arc<RelocationService>,
    notifier: Arc<dyn Notifier>,
    host: Arc<dyn ConversationHost>,
}

impl InteractiveSession {
    pub fn new(
        relocation: Arc<RelocationService>,
        notifier: Arc<dyn Notifier>,
        host: Arc<dyn ConversationHost>,
    ) -> Self {
        Self {
            store: SessionStore::new(),
            relocation,
            notifier,
            host,
        }
    }

    /// Waits for exclusive handling of `user`'s messages.
    pub async fn lock_user(&self, user: UserId) -> OwnedMutexGuard<()> {
        self.store.lock_user(user).await
    }

    pub async fn is_active(&self, user: UserId) -> bool {
        self.store.contains(user).await
    }

    /// Current state of `user`'s flow, if any.
    pub async fn state(&self, user: UserId) -> Option<SessionState> {
        self.store.get(user).await
    }

    /// Begins a flow and asks for the pattern. Replaces any earlier flow.
    pub async fn start(&self, user: UserId, chat: ChatId) -> SessionState {
        let state = SessionState::new(user, chat);
        if let Some(stale) = self.store.insert(state.clone()).await {
            debug!(user = %user, phase = stale.phase.as_str(), "Discarding earlier move session");
            SESSION_TRANSITIONS.with_label_values(&["superseded"]).inc();
        }
        SESSION_TRANSITIONS.with_label_values(&["started"]).inc();

        self.host.ask(chat, messages::PATTERN_PROMPT).await;
        state
    }

    /// Feeds one free-text reply into `user`'s flow.
    pub async fn step(&self, user: UserId, text: &str) -> StepOutcome {
        let Some(mut state) = self.store.get(user).await else {
            return StepOutcome::NoSession;
        };
        let reply = text.trim();

        match state.phase {
            SessionPhase::AwaitingPattern => {
                if reply.is_empty() {
                    self.host.ask(state.chat_id, messages::PATTERN_PROMPT).await;
                    return StepOutcome::Reprompted(state.phase);
                }

                state.pattern = Some(reply.to_string());
                state.phase = SessionPhase::AwaitingDestination;
                self.store.insert(state.clone()).await;
                SESSION_TRANSITIONS.with_label_values(&["pattern"]).inc();

                self.host
                    .ask(state.chat_id, messages::DESTINATION_PROMPT)
                    .await;
                StepOutcome::PatternAccepted {
                    pattern: reply.to_string(),
                }
            }
            SessionPhase::AwaitingDestination => {
                if reply.is_empty() {
                    self.host
                        .ask(state.chat_id, messages::DESTINATION_PROMPT)
                        .await;
                    return StepOutcome::Reprompted(state.phase);
                }

                // The flow ends here whatever the relocation result.
                self.store.remove(user).await;
                SESSION_TRANSITIONS.with_label_values(&["completed"]).inc();

                let pattern = state.pattern.unwrap_or_default();
                let request = RelocationRequest::new(&pattern, reply);
                let result = self
                    .relocation
                    .relocate(&request, RelocationMode::Interactive)
                    .await;

                let text = match &result {
                    Ok(outcome) => render_report(outcome),
                    Err(e) => render_error(e),
                };
                self.notifier.notify(state.chat_id, &text).await;

                StepOutcome::Completed(result)
            }
        }
    }

    /// Ends `user`'s flow without relocating. Returns false when none was active.
    pub async fn cancel(&self, user: UserId) -> bool {
        match self.store.remove(user).await {
            Some(state) => {
                info!(user = %user, phase = state.phase.as_str(), "Move session cancelled");
                SESSION_TRANSITIONS.with_label_values(&["cancelled"]).inc();
                self.notifier
                    .notify(state.chat_id, messages::OPERATION_CANCELLED)
                    .await;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relocation::RelocationConfig;
    use crate::testing::fixtures::{torrent_info, write_file};
    use crate::testing::{MockMessenger, MockTorrentClient};
    use crate::torrent_client::TorrentFile;
    use tempfile::TempDir;

    struct Harness {
        session: InteractiveSession,
        messenger: MockMessenger,
        client: Arc<MockTorrentClient>,
    }

    fn harness() -> Harness {
        let client = Arc::new(MockTorrentClient::new());
        let messenger = MockMessenger::new();
        let service = Arc::new(RelocationService::from_client(
            client.clone(),
            RelocationConfig::default(),
        ));
        let session = InteractiveSession::new(
            service,
            Arc::new(messenger.clone()),
            Arc::new(messenger.clone()),
        );
        Harness {
            session,
            messenger,
            client,
        }
    }

    #[tokio::test]
    async fn test_full_flow_moves_files() {
        let h = harness();
        let temp = TempDir::new().unwrap();
        let save = temp.path().join("dl");
        let out = temp.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        write_file(&save, "info.nfo", b"nfo").unwrap();
        h.client
            .add_mock_torrent_with_files(
                torrent_info("h1", "Movie", &save),
                vec![TorrentFile::named("info.nfo")],
            )
            .await;

        let user = UserId(7);
        h.session.start(user, ChatId(7)).await;
        assert_eq!(h.messenger.prompts().await, vec![messages::PATTERN_PROMPT]);

        let step = h.session.step(user, "*.nfo").await;
        assert!(matches!(step, StepOutcome::PatternAccepted { ref pattern } if pattern == "*.nfo"));
        assert_eq!(
            h.session.state(user).await.unwrap().phase,
            SessionPhase::AwaitingDestination
        );

        let step = h.session.step(user, out.to_str().unwrap()).await;
        assert!(step.is_terminal());
        assert!(!h.session.is_active(user).await);
        assert!(out.join("info.nfo").exists());
        assert_eq!(
            h.messenger.notifications().await,
            vec![format!("Moved files:\ninfo.nfo\nto {}", out.display())]
        );
    }

    #[tokio::test]
    async fn test_cancel_while_awaiting_destination() {
        let h = harness();
        let user = UserId(1);
        h.session.start(user, ChatId(1)).await;
        h.session.step(user, "*.mkv").await;

        assert!(h.session.cancel(user).await);

        assert!(!h.session.is_active(user).await);
        assert_eq!(
            h.messenger.notifications().await,
            vec![messages::OPERATION_CANCELLED]
        );
        assert!(h.client.list_files_calls().await.is_empty());
        assert!(matches!(h.session.step(user, "/out").await, StepOutcome::NoSession));
    }

    #[tokio::test]
    async fn test_cancel_without_session() {
        let h = harness();
        assert!(!h.session.cancel(UserId(1)).await);
        assert!(h.messenger.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_blank_pattern_reprompts() {
        let h = harness();
        let user = UserId(1);
        h.session.start(user, ChatId(1)).await;

        let step = h.session.step(user, "   ").await;

        assert!(matches!(step, StepOutcome::Reprompted(SessionPhase::AwaitingPattern)));
        assert_eq!(
            h.messenger.prompts().await,
            vec![messages::PATTERN_PROMPT, messages::PATTERN_PROMPT]
        );
    }

    #[tokio::test]
    async fn test_restart_discards_stale_session() {
        let h = harness();
        let user = UserId(1);
        h.session.start(user, ChatId(1)).await;
        h.session.step(user, "*.mkv").await;

        let state = h.session.start(user, ChatId(1)).await;

        assert_eq!(state.phase, SessionPhase::AwaitingPattern);
        assert!(h.session.state(user).await.unwrap().pattern.is_none());
    }

    #[tokio::test]
    async fn test_missing_destination_ends_flow() {
        let h = harness();
        let user = UserId(1);
        h.session.start(user, ChatId(1)).await;
        h.session.step(user, "*.mkv").await;

        let step = h.session.step(user, "/no/such/dir").await;

        assert!(matches!(step, StepOutcome::Completed(Err(_))));
        assert!(!h.session.is_active(user).await);
        assert_eq!(
            h.messenger.notifications().await,
            vec![messages::DESTINATION_NOT_FOUND]
        );
    }

    #[tokio::test]
    async fn test_sessions_are_per_user() {
        let h = harness();
        h.session.start(UserId(1), ChatId(1)).await;
        h.session.start(UserId(2), ChatId(2)).await;
        h.session.step(UserId(1), "*.mkv").await;

        assert_eq!(
            h.session.state(UserId(2)).await.unwrap().phase,
            SessionPhase::AwaitingPattern
        );
        h.session.cancel(UserId(2)).await;
        assert!(h.session.is_active(UserId(1)).await);
    }
}
