//! Error types shared by the registry, voting engine and game orchestrator.
//!
//! Every failure is recoverable. Operations validate before they mutate, so an
//! `Err` always means the game state is exactly as it was before the call.

use serde::Serialize;
use thiserror::Error;

use super::phase::{GamePhase, InvalidTransition};

/// Voting rule violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VotingRule {
    #[error("Eliminated players cannot vote")]
    VoterEliminated,
    #[error("You cannot vote for an eliminated player")]
    TargetEliminated,
    #[error("You cannot vote for yourself")]
    SelfVote,
}

/// Game errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("A player named '{0}' already exists")]
    DuplicateName(String),

    #[error("Player '{0}' not found")]
    NotFound(String),

    #[error("Cannot {action} during {phase}")]
    IllegalPhase {
        action: &'static str,
        phase: GamePhase,
    },

    #[error("Maximum number of players reached ({max})")]
    CapacityExceeded { max: usize },

    #[error(transparent)]
    VotingRule(#[from] VotingRule),

    #[error("Not everyone has voted ({cast}/{required})")]
    IncompleteVoting { cast: usize, required: usize },
}

/// Coarse error category, for callers that map failures to status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    InvalidInput,
    DuplicateName,
    NotFound,
    IllegalPhase,
    CapacityExceeded,
    VotingRule,
    IncompleteVoting,
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::DuplicateName(_) => ErrorKind::DuplicateName,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::IllegalPhase { .. } => ErrorKind::IllegalPhase,
            Self::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Self::VotingRule(_) => ErrorKind::VotingRule,
            Self::IncompleteVoting { .. } => ErrorKind::IncompleteVoting,
        }
    }
}

impl From<InvalidTransition> for GameError {
    fn from(err: InvalidTransition) -> Self {
        Self::IllegalPhase {
            action: err.event.action(),
            phase: err.from,
        }
    }
}

/// Success flag plus message, the shape handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!(self)
    }
}

impl From<Result<String, GameError>> for ActionResult {
    fn from(result: Result<String, GameError>) -> Self {
        match result {
            Ok(message) => Self::ok(message),
            Err(err) => Self {
                success: false,
                message: err.to_string(),
                error: Some(err.kind()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_result_from_error() {
        let result: ActionResult = Err(GameError::CapacityExceeded { max: 20 }).into();
        assert!(!result.success);
        assert_eq!(result.message, "Maximum number of players reached (20)");
        assert_eq!(result.error, Some(ErrorKind::CapacityExceeded));
    }

    #[test]
    fn test_voting_rule_is_transparent() {
        let err = GameError::from(VotingRule::SelfVote);
        assert_eq!(err.to_string(), "You cannot vote for yourself");
        assert_eq!(err.kind(), ErrorKind::VotingRule);
    }

    #[test]
    fn test_illegal_phase_message() {
        let err = GameError::IllegalPhase {
            action: "register players",
            phase: GamePhase::Voting,
        };
        assert_eq!(err.to_string(), "Cannot register players during Voting");
    }

    #[test]
    fn test_action_result_json_omits_error_on_success() {
        let json = ActionResult::ok("done").to_json();
        assert_eq!(json, serde_json::json!({"success": true, "message": "done"}));
    }
}
