//! Conversation integration tests.
//!
//! These tests push chat messages through the dispatcher and verify what
//! the user sees and what happens on disk:
//! authorize -> command or session step -> relocation -> report

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use courier_core::{
    messages,
    testing::{fixtures, MockMessenger, MockTorrentClient},
    torrent_client::TorrentFile,
    AllowListAuthenticator, Dispatch, Dispatcher, InboundMessage, InteractiveSession,
    RelocationConfig, RelocationService, SessionPhase, StepOutcome, UserId,
};

const ALICE: i64 = 1001;
const BOB: i64 = 1002;
const MALLORY: i64 = 666;

struct TestHarness {
    dispatcher: Dispatcher,
    session: Arc<InteractiveSession>,
    messenger: MockMessenger,
    client: Arc<MockTorrentClient>,
    downloads: PathBuf,
    out: PathBuf,
    _temp_dir: TempDir,
}

impl TestHarness {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let downloads = temp_dir.path().join("dl");
        let out = temp_dir.path().join("out");
        std::fs::create_dir_all(&out).expect("Failed to create destination");

        let client = Arc::new(MockTorrentClient::new());
        let messenger = MockMessenger::new();
        let relocation = Arc::new(RelocationService::from_client(
            client.clone(),
            RelocationConfig::default(),
        ));
        let session = Arc::new(InteractiveSession::new(
            relocation.clone(),
            Arc::new(messenger.clone()),
            Arc::new(messenger.clone()),
        ));
        let dispatcher = Dispatcher::new(
            Arc::new(AllowListAuthenticator::new([ALICE, BOB])),
            client.clone(),
            relocation,
            session.clone(),
            Arc::new(messenger.clone()),
        );

        let harness = Self {
            dispatcher,
            session,
            messenger,
            client,
            downloads,
            out,
            _temp_dir: temp_dir,
        };
        harness.add_torrent("h1", &["movie.mkv", "movie.nfo"]).await;
        harness.add_torrent("h2", &["Show/info.nfo", "Show/ep1.mkv"]).await;
        harness
    }

    async fn add_torrent(&self, hash: &str, files: &[&str]) {
        let save_path = self.downloads.join(hash);
        for file in files {
            fixtures::write_file(&save_path, file, b"data").expect("Failed to write file");
        }
        self.client
            .add_mock_torrent_with_files(
                fixtures::torrent_info(hash, hash, &save_path),
                files.iter().map(|f| TorrentFile::named(*f)).collect(),
            )
            .await;
    }

    async fn send(&self, user: i64, text: &str) -> Dispatch {
        self.dispatcher
            .handle(&InboundMessage::private(user, text))
            .await
    }

    fn out_str(&self) -> &str {
        self.out.to_str().expect("utf-8 temp path")
    }
}

#[tokio::test]
async fn scenario_d_interactive_flow_matches_inline_report() {
    let h = TestHarness::new().await;

    h.send(ALICE, "/move").await;
    assert_eq!(h.messenger.prompts().await, vec![messages::PATTERN_PROMPT]);

    h.send(ALICE, "*.nfo").await;
    assert_eq!(
        h.messenger.prompts().await.last().map(String::as_str),
        Some(messages::DESTINATION_PROMPT)
    );

    let result = h.send(ALICE, h.out_str()).await;
    assert!(matches!(result, Dispatch::Step(StepOutcome::Completed(Ok(_)))));
    assert!(!h.session.is_active(UserId(ALICE)).await);

    let interactive_report = h.messenger.last_text().await.unwrap();
    assert_eq!(
        interactive_report,
        format!("Moved files:\nmovie.nfo\nShow/info.nfo\nto {}", h.out.display())
    );

    // The equivalent inline call on identical state reports the same thing.
    let inline = TestHarness::new().await;
    inline
        .send(ALICE, &format!("/move_specific *.nfo {}", inline.out_str()))
        .await;
    let inline_report = inline.messenger.last_text().await.unwrap();
    assert_eq!(
        inline_report.replace(inline.out_str(), "<out>"),
        interactive_report.replace(h.out_str(), "<out>")
    );
}

#[tokio::test]
async fn scenario_e_cancel_while_awaiting_destination() {
    let h = TestHarness::new().await;

    h.send(ALICE, "/move").await;
    h.send(ALICE, "*.mkv").await;
    assert_eq!(
        h.session.state(UserId(ALICE)).await.unwrap().phase,
        SessionPhase::AwaitingDestination
    );

    h.send(ALICE, "/cancel").await;

    assert!(!h.session.is_active(UserId(ALICE)).await);
    assert_eq!(
        h.messenger.last_text().await.as_deref(),
        Some(messages::OPERATION_CANCELLED)
    );
    assert!(h.client.list_files_calls().await.is_empty());
    assert!(h.downloads.join("h1/movie.mkv").exists());
}

#[tokio::test]
async fn inline_move_with_two_arguments() {
    let h = TestHarness::new().await;

    h.send(ALICE, &format!("/move *.mkv {}", h.out_str())).await;

    assert!(h.out.join("movie.mkv").exists());
    assert!(h.out.join("ep1.mkv").exists());
    assert!(!h.session.is_active(UserId(ALICE)).await);
}

#[tokio::test]
async fn unauthorized_user_cannot_touch_sessions() {
    let h = TestHarness::new().await;
    h.send(ALICE, "/move").await;

    let result = h.send(MALLORY, "/move").await;
    assert!(matches!(result, Dispatch::Denied));
    let result = h.send(MALLORY, "*.mkv").await;
    assert!(matches!(result, Dispatch::Denied));

    assert!(!h.session.is_active(UserId(MALLORY)).await);
    assert_eq!(
        h.session.state(UserId(ALICE)).await.unwrap().phase,
        SessionPhase::AwaitingPattern
    );
}

#[tokio::test]
async fn flows_of_different_users_do_not_interfere() {
    let h = TestHarness::new().await;

    h.send(ALICE, "/move").await;
    h.send(BOB, "/move").await;
    h.send(ALICE, "*.mkv").await;
    h.send(BOB, "/cancel").await;

    assert!(!h.session.is_active(UserId(BOB)).await);
    assert_eq!(
        h.session.state(UserId(ALICE)).await.unwrap().pattern.as_deref(),
        Some("*.mkv")
    );

    h.send(ALICE, h.out_str()).await;
    assert!(h.out.join("movie.mkv").exists());
}

#[tokio::test]
async fn commands_mid_flow_are_refused_until_cancel() {
    let h = TestHarness::new().await;
    h.send(ALICE, "/move").await;

    let result = h.send(ALICE, "/remove h1").await;
    assert!(matches!(result, Dispatch::Blocked { name: "remove" }));
    assert!(h.client.has_torrent("h1").await);
    assert_eq!(
        h.messenger.last_text().await.as_deref(),
        Some(messages::FLOW_IN_PROGRESS)
    );

    h.send(ALICE, "/cancel").await;
    h.send(ALICE, "/remove h1").await;
    assert!(!h.client.has_torrent("h1").await);
}

#[tokio::test]
async fn concurrent_messages_from_one_user_are_serialized() {
    let h = Arc::new(TestHarness::new().await);
    h.send(ALICE, "/move").await;

    let a = {
        let h = h.clone();
        tokio::spawn(async move { h.send(ALICE, "*.mkv").await })
    };
    let b = {
        let h = h.clone();
        tokio::spawn(async move { h.send(ALICE, "/cancel").await })
    };
    let _ = a.await.unwrap();
    let _ = b.await.unwrap();

    // Either order ends the flow: cancel last, or cancel first and the
    // pattern arrives as plain text.
    assert!(h.session.state(UserId(ALICE)).await.is_none());
}
