pub mod auth;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod messages;
pub mod messaging;
pub mod metrics;
pub mod relocation;
pub mod session;
pub mod testing;
pub mod torrent_client;

pub use auth::{
    create_authenticator, AllowListAuthenticator, AuthError, AuthRequest, Authenticator, Identity,
    NoneAuthenticator,
};
pub use commands::Command;
pub use config::{
    load_config, load_config_from_str, validate_config, AuthMethod, Config, ConfigError,
    SanitizedConfig,
};
pub use dispatcher::{Dispatch, Dispatcher};
pub use messaging::{
    ChatId, ConversationHost, InboundMessage, MessagingError, Notifier, TelegramClient, UserId,
};
pub use relocation::{
    FsExecutor, MoveError, RelocationConfig, RelocationError, RelocationOutcome, RelocationPlan,
    RelocationPlanEntry, RelocationPlanner, RelocationRequest, RelocationService, TorrentHandle,
};
pub use session::{InteractiveSession, SessionPhase, SessionState, StepOutcome};
pub use torrent_client::{QBittorrentClient, TorrentClient, TorrentClientError};
