//! Chat command parsing.

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// `/name`, optional `@BotName`, then the rest of the message.
static COMMAND_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?s)^/([A-Za-z0-9_]+)(?:@[A-Za-z0-9_]+)?(?:\s+(.*))?$").ok());

/// A recognized bot command and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// Magnet link or torrent URL.
    Add(Option<String>),
    Status,
    /// Torrent name or hash.
    Remove(Option<String>),
    /// Torrent name or hash.
    List(Option<String>),
    MoveSpecific(Vec<String>),
    Move(Vec<String>),
    Cancel,
    Unknown(String),
}

impl Command {
    /// Parses `text`, returning `None` for free text.
    pub fn parse(text: &str) -> Option<Command> {
        let text = text.trim();
        let re = COMMAND_RE.as_ref()?;
        let caps = re.captures(text)?;

        let name = caps.get(1)?.as_str().to_ascii_lowercase();
        let args: Vec<String> = caps
            .get(2)
            .map(|m| m.as_str().split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let joined = (!args.is_empty()).then(|| args.join(" "));

        Some(match name.as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "add" => Command::Add(args.into_iter().next()),
            "status" => Command::Status,
            "remove" => Command::Remove(joined),
            "list" => Command::List(joined),
            "move_specific" => Command::MoveSpecific(args),
            "move" => Command::Move(args),
            "cancel" => Command::Cancel,
            _ => Command::Unknown(name),
        })
    }

    /// Label used for the commands metric.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Help => "help",
            Command::Add(_) => "add",
            Command::Status => "status",
            Command::Remove(_) => "remove",
            Command::List(_) => "list",
            Command::MoveSpecific(_) => "move_specific",
            Command::Move(_) => "move",
            Command::Cancel => "cancel",
            Command::Unknown(_) => "unknown",
        }
    }
}
