//! Game phase state machine.
//!
//! Tracks which part of a round the table is in and validates transitions.
//!
//! # State Diagram
//!
//! ```text
//! ┌──────────┐  start   ┌────────────┐  begin_discussion  ┌────────────┐
//! │  Lobby   │─────────▶│ RoleReveal │───────────────────▶│ Discussion │◀─┐
//! └──────────┘          └────────────┘                    └─────┬──────┘  │
//!      ▲                                                        │         │
//!      │                                          begin_voting  │         │ round_continues
//!      │ reset (from any phase)                                 ▼         │
//!      │                ┌────────────┐     game_over      ┌────────────┐  │
//!      └────────────────│  Finished  │◀───────────────────│   Voting   │──┘
//!                       └────────────┘                    └────────────┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Current phase of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Registering players
    #[default]
    Lobby,
    /// Each player privately looks at their role and word
    RoleReveal,
    /// Players give verbal clues
    Discussion,
    /// Players vote someone out (or skip)
    Voting,
    /// A side has won
    Finished,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lobby => "Lobby",
            Self::RoleReveal => "RoleReveal",
            Self::Discussion => "Discussion",
            Self::Voting => "Voting",
            Self::Finished => "Finished",
        }
    }

    /// Check if a game is underway (roles have been dealt and nobody has won).
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::RoleReveal | Self::Discussion | Self::Voting)
    }

    /// Apply an event, returning the next phase or an error.
    pub fn transition(&self, event: PhaseEvent) -> Result<GamePhase, InvalidTransition> {
        use GamePhase::*;
        use PhaseEvent::*;

        let invalid = |reason: &'static str| InvalidTransition {
            from: *self,
            event,
            reason,
        };

        match (self, event) {
            // Reset: Any -> Lobby
            (_, Reset) => Ok(Lobby),

            // Start: Lobby -> RoleReveal
            (Lobby, Start) => Ok(RoleReveal),
            (_, Start) => Err(invalid("Game is already in progress")),

            // BeginDiscussion: RoleReveal/Discussion/Voting -> Discussion
            (RoleReveal | Discussion | Voting, BeginDiscussion) => Ok(Discussion),
            (Lobby, BeginDiscussion) => Err(invalid("Game has not started")),
            (Finished, BeginDiscussion) => Err(invalid("Game is over")),

            // BeginVoting: Discussion -> Voting
            (Discussion, BeginVoting) => Ok(Voting),
            (Voting, BeginVoting) => Err(invalid("Voting is already open")),
            (_, BeginVoting) => Err(invalid("Voting only follows a discussion")),

            // Tally outcome: Voting -> Discussion | Finished
            (Voting, RoundContinues) => Ok(Discussion),
            (Voting, GameOver) => Ok(Finished),
            (_, RoundContinues | GameOver) => Err(invalid("No vote is open")),
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase transition events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    Start,
    BeginDiscussion,
    BeginVoting,
    RoundContinues,
    GameOver,
    Reset,
}

impl PhaseEvent {
    /// Verb phrase used in error messages.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Start => "start the game",
            Self::BeginDiscussion => "start the discussion",
            Self::BeginVoting => "start voting",
            Self::RoundContinues | Self::GameOver => "process the vote",
            Self::Reset => "reset the game",
        }
    }
}

/// Error when a phase transition is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: GamePhase,
    pub event: PhaseEvent,
    pub reason: &'static str,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid transition from {} via {:?}: {}",
            self.from, self.event, self.reason
        )
    }
}

impl std::error::Error for InvalidTransition {}
