//! State management module for the impostor party game.
//!
//! This module provides the core state types and managers:
//!
//! - `player` - Roster with normalized-name lookup and role dealing
//! - `voting` - Per-round votes and the tally rules
//! - `phase` - Game phase state machine
//! - `game` - The orchestrator tying the above together
//! - `session` - Session key to game mapping with idle expiry
//! - `config` - Game rules and session tuning
//! - `error` - Error taxonomy shared by all of the above
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         SessionDirectory                            │
//! │                                                                     │
//! │   session key ──▶ Session { Mutex<Game>, last access }              │
//! │                                                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐  │
//! │  │                            Game                               │  │
//! │  │                                                               │  │
//! │  │  ┌─────────────────┐  ┌─────────────────┐  ┌──────────────┐   │  │
//! │  │  │ PlayerRegistry  │  │  VotingEngine   │  │  GamePhase   │   │  │
//! │  │  │                 │  │                 │  │              │   │  │
//! │  │  │ ordered roster  │  │ voter → target  │  │ Lobby ─▶ ... │   │  │
//! │  │  │ name → player   │  │   (or skip)     │  │  ─▶ Finished │   │  │
//! │  │  └─────────────────┘  └─────────────────┘  └──────────────┘   │  │
//! │  └───────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use impostor_state::state::{Categories, GameSettings, SessionConfig, SessionDirectory};
//!
//! let directory = SessionDirectory::new(GameSettings::default(), SessionConfig::default());
//! let session = directory.get_or_create("table-1");
//!
//! let mut game = session.game();
//! game.register_player("Alice")?;
//! ```

pub mod config;
pub mod error;
pub mod game;
pub mod phase;
pub mod player;
pub mod session;
pub mod voting;

// Re-export commonly used types
pub use config::{ConfigError, GameSettings, SessionConfig};
pub use error::{ActionResult, ErrorKind, GameError, VotingRule};
pub use game::{
    Categories, Game, GameEnd, GameResult, MenuAction, PlayerRoundInfo, RoundOutcome,
    VotingStatus,
};
pub use phase::{GamePhase, InvalidTransition, PhaseEvent};
pub use player::{normalize_name, Player, PlayerRegistry, Role};
pub use session::{Session, SessionDirectory, SweeperHandle};
pub use voting::{VoteResult, VotingEngine};
