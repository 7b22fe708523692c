//! Types for the interactive move session.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::messaging::{ChatId, UserId};
use crate::relocation::{RelocationError, RelocationOutcome};

/// Non-terminal phases of an interactive move.
///
/// Completed and cancelled flows have no state: their record is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    AwaitingPattern,
    AwaitingDestination,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::AwaitingPattern => "awaiting_pattern",
            SessionPhase::AwaitingDestination => "awaiting_destination",
        }
    }
}

/// Per-user record of an in-flight interactive move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub user_id: UserId,
    /// Chat the flow was started in; prompts and the report go there.
    pub chat_id: ChatId,
    pub phase: SessionPhase,
    /// Set once the first step is answered.
    pub pattern: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new(user_id: UserId, chat_id: ChatId) -> Self {
        Self {
            user_id,
            chat_id,
            phase: SessionPhase::AwaitingPattern,
            pattern: None,
            started_at: Utc::now(),
        }
    }
}

/// Result of feeding one free-text reply into a session.
#[derive(Debug)]
pub enum StepOutcome {
    /// The user has no interactive move in progress.
    NoSession,
    /// The reply was blank; the same question was asked again.
    Reprompted(SessionPhase),
    /// Pattern stored, destination requested.
    PatternAccepted { pattern: String },
    /// Relocation ran and was reported; the session is gone.
    Completed(Result<RelocationOutcome, RelocationError>),
}

impl StepOutcome {
    /// Whether the flow reached a terminal state with this step.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepOutcome::Completed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_awaits_pattern() {
        let state = SessionState::new(UserId(1), ChatId(1));
        assert_eq!(state.phase, SessionPhase::AwaitingPattern);
        assert!(state.pattern.is_none());
    }

    #[test]
    fn test_phase_serialization() {
        assert_eq!(
            serde_json::to_string(&SessionPhase::AwaitingDestination).unwrap(),
            "\"awaiting_destination\""
        );
        assert_eq!(SessionPhase::AwaitingPattern.as_str(), "awaiting_pattern");
    }
}
