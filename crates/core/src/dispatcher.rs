//! Routes inbound chat messages to commands and interactive sessions.

use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::{AuthRequest, Authenticator};
use crate::commands::{format_file_list, format_status, Command};
use crate::messages;
use crate::messaging::{ChatId, InboundMessage, Notifier, UserId};
use crate::metrics::{AUTH_DENIALS, COMMANDS_HANDLED};
use crate::relocation::{render_error, render_report, RelocationRequest, RelocationService};
use crate::session::{InteractiveSession, StepOutcome};
use crate::torrent_client::{AddTorrentRequest, TorrentClient, TorrentClientError};

/// What happened to one inbound message.
#[derive(Debug)]
pub enum Dispatch {
    /// The sender failed the authorization gate.
    Denied,
    /// A command ran; `result` is "ok", "usage" or "error".
    Command {
        name: &'static str,
        result: &'static str,
    },
    /// The message was a reply inside an interactive move.
    Step(StepOutcome),
    /// A command arrived during an interactive move and was refused.
    Blocked { name: &'static str },
    /// Free text outside any flow.
    Hint,
}

/// Entry point for every message the bot receives.
///
/// Order: authorize, take the sender's lock, then either drive the
/// sender's interactive move or run the command. While a move is in
/// progress only `/cancel` and a bare `/move` (which restarts it) are
/// accepted as commands.
pub struct Dispatcher {
    authenticator: Arc<dyn Authenticator>,
    torrents: Arc<dyn TorrentClient>,
    relocation: Arc<RelocationService>,
    session: Arc<InteractiveSession>,
    notifier: Arc<dyn Notifier>,
    download_path: Option<String>,
}

impl Dispatcher {
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        torrents: Arc<dyn TorrentClient>,
        relocation: Arc<RelocationService>,
        session: Arc<InteractiveSession>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            authenticator,
            torrents,
            relocation,
            session,
            notifier,
            download_path: None,
        }
    }

    /// Save path passed to the daemon for `/add`.
    pub fn with_download_path(mut self, path: Option<String>) -> Self {
        self.download_path = path;
        self
    }

    pub async fn handle(&self, message: &InboundMessage) -> Dispatch {
        let request = AuthRequest::new(message.user_id, message.username.clone());
        let identity = match self.authenticator.authenticate(&request).await {
            Ok(identity) => identity,
            Err(e) => {
                AUTH_DENIALS.inc();
                warn!(user = %message.user_id, error = %e, "Rejected message");
                self.notifier
                    .notify(message.chat_id, messages::NOT_AUTHORIZED)
                    .await;
                return Dispatch::Denied;
            }
        };

        let user = message.user_id;
        let chat = message.chat_id;
        let _guard = self.session.lock_user(user).await;
        let command = Command::parse(&message.text);

        if self.session.is_active(user).await {
            return match command {
                Some(Command::Cancel) => {
                    self.session.cancel(user).await;
                    COMMANDS_HANDLED.with_label_values(&["cancel", "ok"]).inc();
                    Dispatch::Command {
                        name: "cancel",
                        result: "ok",
                    }
                }
                Some(Command::Move(args)) if args.is_empty() => {
                    self.session.start(user, chat).await;
                    COMMANDS_HANDLED.with_label_values(&["move", "ok"]).inc();
                    Dispatch::Command {
                        name: "move",
                        result: "ok",
                    }
                }
                // Unrecognized slash text is a path reply, e.g. "/out".
                None | Some(Command::Unknown(_)) => {
                    Dispatch::Step(self.session.step(user, &message.text).await)
                }
                Some(other) => {
                    let name = other.name();
                    COMMANDS_HANDLED.with_label_values(&[name, "rejected"]).inc();
                    self.notifier.notify(chat, messages::FLOW_IN_PROGRESS).await;
                    Dispatch::Blocked { name }
                }
            };
        }

        let Some(command) = command else {
            self.notifier.notify(chat, messages::FREE_TEXT_HINT).await;
            return Dispatch::Hint;
        };

        let name = command.name();
        info!(user = %identity.label(), command = name, "Handling command");

        let (reply, result) = self.run(user, chat, command).await;
        COMMANDS_HANDLED.with_label_values(&[name, result]).inc();
        if let Some(reply) = reply {
            self.notifier.notify(chat, &reply).await;
        }

        Dispatch::Command { name, result }
    }

    async fn run(
        &self,
        user: UserId,
        chat: ChatId,
        command: Command,
    ) -> (Option<String>, &'static str) {
        match command {
            Command::Start | Command::Help => ok(messages::HELP_TEXT),
            Command::Add(None) => usage(messages::ADD_USAGE),
            Command::Add(Some(uri)) => daemon_reply(self.add(uri).await),
            Command::Status => daemon_reply(
                self.torrents
                    .list_torrents()
                    .await
                    .map(|torrents| format_status(&torrents)),
            ),
            Command::Remove(None) => usage(messages::REMOVE_USAGE),
            Command::Remove(Some(name)) => daemon_reply(self.remove(&name).await),
            Command::List(None) => usage(messages::LIST_USAGE),
            Command::List(Some(name)) => daemon_reply(self.list(&name).await),
            Command::Move(args) if args.is_empty() => {
                self.session.start(user, chat).await;
                (None, "ok")
            }
            Command::Move(args) | Command::MoveSpecific(args) if args.len() == 2 => {
                self.move_inline(&args[0], &args[1]).await
            }
            Command::Move(_) => usage(messages::MOVE_USAGE),
            Command::MoveSpecific(_) => usage(messages::MOVE_SPECIFIC_USAGE),
            Command::Cancel => usage(messages::NOTHING_TO_CANCEL),
            Command::Unknown(_) => usage(messages::UNKNOWN_COMMAND),
        }
    }

    async fn add(&self, uri: String) -> Result<String, TorrentClientError> {
        let mut request = AddTorrentRequest::new(uri);
        if let Some(path) = &self.download_path {
            request = request.with_download_path(path.clone());
        }
        let result = self.torrents.add_torrent(request).await?;
        info!(hash = %result.hash, "Torrent added");
        Ok(messages::TORRENT_ADDED.to_string())
    }

    async fn remove(&self, name_or_hash: &str) -> Result<String, TorrentClientError> {
        let Some(torrent) = self.torrents.find_torrent(name_or_hash).await? else {
            return Ok(messages::TORRENT_NOT_FOUND.to_string());
        };
        self.torrents.remove_torrent(&torrent.hash, true).await?;
        info!(hash = %torrent.hash, name = %torrent.name, "Torrent removed");
        Ok(messages::torrent_removed(&torrent.name))
    }

    async fn list(&self, name_or_hash: &str) -> Result<String, TorrentClientError> {
        let Some(torrent) = self.torrents.find_torrent(name_or_hash).await? else {
            return Ok(messages::TORRENT_NOT_FOUND.to_string());
        };
        let files = self.torrents.list_files(&torrent.hash).await?;
        Ok(format_file_list(name_or_hash, &files))
    }

    async fn move_inline(&self, pattern: &str, destination: &str) -> (Option<String>, &'static str) {
        let request = RelocationRequest::new(pattern, destination);
        match self.relocation.move_inline(&request).await {
            Ok(outcome) => (Some(render_report(&outcome)), "ok"),
            Err(e) => (Some(render_error(&e)), "error"),
        }
    }
}

fn ok(text: &str) -> (Option<String>, &'static str) {
    (Some(text.to_string()), "ok")
}

fn usage(text: &str) -> (Option<String>, &'static str) {
    (Some(text.to_string()), "usage")
}

fn daemon_reply(result: Result<String, TorrentClientError>) -> (Option<String>, &'static str) {
    match result {
        Ok(text) => (Some(text), "ok"),
        Err(e) => {
            warn!(error = %e, "Torrent daemon request failed");
            let text = if e.is_connectivity() {
                messages::DAEMON_UNREACHABLE.to_string()
            } else {
                messages::error_occurred(&e)
            };
            (Some(text), "error")
        }
    }
}
