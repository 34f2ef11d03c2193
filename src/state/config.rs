//! Game and session configuration.
//!
//! Both structs deserialize from JSON with every field optional; missing
//! fields fall back to the defaults below.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default minimum players to start a game.
pub const DEFAULT_MIN_PLAYERS: usize = 3;

/// Default maximum players in a lobby.
pub const DEFAULT_MAX_PLAYERS: usize = 20;

/// Default chance of a second impostor.
pub const DEFAULT_TWO_IMPOSTORS_PROBABILITY: f64 = 0.04;

/// Default player count at which a second impostor becomes possible.
pub const DEFAULT_MIN_PLAYERS_FOR_TWO_IMPOSTORS: usize = 5;

/// Default idle timeout before a session is swept (4 hours).
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(4 * 60 * 60);

/// Default interval between sweeps (30 minutes).
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Per-game rules.
///
/// Each session gets its own clone, so changing one session's settings never
/// affects another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Minimum registered players to start
    pub min_players: usize,

    /// Maximum registered players
    pub max_players: usize,

    /// Chance (0.0 to 1.0) of two impostors when enough players are present
    pub two_impostors_probability: f64,

    /// Active players needed before two impostors are possible
    pub min_players_for_two_impostors: usize,

    /// Whether impostors see who their accomplices are
    pub impostors_know_each_other: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            min_players: DEFAULT_MIN_PLAYERS,
            max_players: DEFAULT_MAX_PLAYERS,
            two_impostors_probability: DEFAULT_TWO_IMPOSTORS_PROBABILITY,
            min_players_for_two_impostors: DEFAULT_MIN_PLAYERS_FOR_TWO_IMPOSTORS,
            impostors_know_each_other: true,
        }
    }
}

impl GameSettings {
    /// Parse and validate settings from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_players < 2 {
            return Err(ConfigError::Invalid("min_players must be at least 2"));
        }
        if self.max_players < self.min_players {
            return Err(ConfigError::Invalid("max_players must be >= min_players"));
        }
        if !(0.0..=1.0).contains(&self.two_impostors_probability) {
            return Err(ConfigError::Invalid(
                "two_impostors_probability must be between 0 and 1",
            ));
        }
        Ok(())
    }

    /// Roll how many impostors a game gets.
    ///
    /// Always 1, unless `active_players` reaches the threshold and the draw
    /// lands under the configured probability, in which case 2.
    pub fn impostor_count<R: Rng>(&self, rng: &mut R, active_players: usize) -> usize {
        if active_players >= self.min_players_for_two_impostors
            && rng.gen::<f64>() < self.two_impostors_probability
        {
            2
        } else {
            1
        }
    }
}

/// Session directory tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds without access before a session is swept
    pub idle_timeout_secs: u64,

    /// Seconds between sweeps
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT.as_secs(),
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL.as_secs(),
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.idle_timeout_secs == 0 {
            return Err(ConfigError::Invalid("idle_timeout_secs must be non-zero"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid("sweep_interval_secs must be non-zero"));
        }
        Ok(())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
