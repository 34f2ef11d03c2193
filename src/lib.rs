//! Impostor State Library
//!
//! This crate provides state management for the "find the impostor" party
//! game, where one group shares a single device per table.
//!
//! # Overview
//!
//! The state module provides:
//!
//! - **Player Registry** - Ordered roster, case-insensitive names, random
//!   role dealing with at least one crewmate guaranteed.
//!
//! - **Voting Engine** - One vote per active player per round, with skip
//!   votes and tie rules.
//!
//! - **Game Orchestrator** - Phase state machine, secret word selection and
//!   win-condition checks.
//!
//! - **Session Directory** - Independent games per session key, with idle
//!   expiry swept in the background.
//!
//! # Design Principles
//!
//! 1. **State machines validate transitions** - Illegal phase changes are
//!    rejected with clear errors and leave state untouched.
//!
//! 2. **No global state** - Categories are passed in at game start and every
//!    session clones its own settings.
//!
//! 3. **No networking** - This crate is pure state, no HTTP or persistence.
//!
//! 4. **Serialization-ready** - Views can be converted to JSON for clients.
//!
//! # Example
//!
//! ```rust
//! use impostor_state::state::{Categories, GamePhase, GameSettings, SessionConfig, SessionDirectory};
//!
//! let directory = SessionDirectory::new(GameSettings::default(), SessionConfig::default());
//! let session = directory.get_or_create("table-1");
//!
//! let mut game = session.game();
//! for name in ["Alice", "Bob", "Carol"] {
//!     game.register_player(name).unwrap();
//! }
//!
//! let categories = Categories::from([(
//!     "Fruits".to_string(),
//!     vec!["Apple".to_string(), "Banana".to_string()],
//! )]);
//! game.start_game(&categories).unwrap();
//! assert_eq!(game.phase(), GamePhase::RoleReveal);
//!
//! let info = game.player_info("alice").unwrap();
//! assert_eq!(info.category, "Fruits");
//! ```

pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
