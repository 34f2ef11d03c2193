//! Game orchestrator.
//!
//! One `Game` per table: it owns the roster, the votes for the current round,
//! the phase and round counter, and the category/word in play. Every mutating
//! operation validates first and only then changes state, so an `Err` leaves
//! the game untouched.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info};

use super::config::GameSettings;
use super::error::GameError;
use super::phase::{GamePhase, PhaseEvent};
use super::player::{PlayerRegistry, Role};
use super::voting::{VoteResult, VotingEngine};

/// Category name to candidate secret words.
pub type Categories = BTreeMap<String, Vec<String>>;

/// Win-condition status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameResult {
    InProgress,
    /// Impostors reached parity with crewmates
    ImpostorsWin,
    /// Every impostor was voted out
    CrewmatesWin,
}

impl GameResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "InProgress",
            Self::ImpostorsWin => "ImpostorsWin",
            Self::CrewmatesWin => "CrewmatesWin",
        }
    }

    pub fn is_over(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// What a single player sees when their role is revealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerRoundInfo {
    pub player_name: String,
    pub role: Role,
    pub category: String,
    /// Only crewmates get the word
    pub secret_word: Option<String>,
    /// Other active impostors, when impostors know each other
    pub fellow_impostors: Option<Vec<String>>,
}

/// Result of closing a voting round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundOutcome {
    pub vote_result: VoteResult,
    pub game_status: GameResult,
    pub message: String,
}

/// Final reveal once the game is finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameEnd {
    pub winner: GameResult,
    pub impostors: Vec<String>,
    pub secret_word: String,
}

/// Voting progress for the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VotingStatus {
    pub votes_cast: usize,
    pub total_voters: usize,
    pub all_votes_in: bool,
}

/// Actions offered by the in-game menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MenuAction {
    /// New game with the same players
    ResetGame,
    /// Forget everyone
    FullReset,
    /// Same as `ResetGame`, offered as "back to lobby"
    BackToLobby,
}

/// Game session state.
#[derive(Debug, Clone)]
pub struct Game {
    settings: GameSettings,

    /// Roster
    players: PlayerRegistry,

    /// Votes for the current round
    voting: VotingEngine,

    /// Current phase
    phase: GamePhase,

    /// Current round (0 in the lobby, 1 once started)
    round: u32,

    /// Category in play (empty in the lobby)
    category: String,

    /// Secret word in play (empty in the lobby)
    word: String,

    rng: ChaCha8Rng,
}

impl Default for Game {
    fn default() -> Self {
        Self::new(GameSettings::default())
    }
}

impl Game {
    /// Create a new game with its own entropy-seeded RNG.
    pub fn new(settings: GameSettings) -> Self {
        Self::with_rng(settings, ChaCha8Rng::from_entropy())
    }

    /// Create a new game whose draws are reproducible.
    pub fn with_seed(settings: GameSettings, seed: u64) -> Self {
        Self::with_rng(settings, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(settings: GameSettings, rng: ChaCha8Rng) -> Self {
        Self {
            settings,
            players: PlayerRegistry::new(),
            voting: VotingEngine::new(),
            phase: GamePhase::Lobby,
            round: 0,
            category: String::new(),
            word: String::new(),
            rng,
        }
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut GameSettings {
        &mut self.settings
    }

    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    pub fn voting(&self) -> &VotingEngine {
        &self.voting
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn secret_word(&self) -> &str {
        &self.word
    }

    fn ensure_lobby(&self, action: &'static str) -> Result<(), GameError> {
        if self.phase != GamePhase::Lobby {
            return Err(GameError::IllegalPhase {
                action,
                phase: self.phase,
            });
        }
        Ok(())
    }

    /// Register a player in the lobby.
    pub fn register_player(&mut self, name: &str) -> Result<String, GameError> {
        self.ensure_lobby("register players")?;

        if self.players.count() >= self.settings.max_players {
            return Err(GameError::CapacityExceeded {
                max: self.settings.max_players,
            });
        }

        let name = self.players.register(name)?;
        debug!(player = %name, count = self.players.count(), "Player registered");
        Ok(format!("Player '{}' registered", name))
    }

    /// Remove a player from the lobby.
    pub fn remove_player(&mut self, name: &str) -> Result<String, GameError> {
        self.ensure_lobby("remove players")?;

        if !self.players.remove(name) {
            return Err(GameError::NotFound(name.trim().to_string()));
        }

        debug!(player = %name.trim(), count = self.players.count(), "Player removed");
        Ok(format!("Player '{}' removed", name.trim()))
    }

    /// Deal roles and pick the secret word.
    pub fn start_game(&mut self, categories: &Categories) -> Result<String, GameError> {
        let next = self.phase.transition(PhaseEvent::Start)?;

        if self.players.count() < self.settings.min_players {
            return Err(GameError::InvalidInput(format!(
                "At least {} players are needed",
                self.settings.min_players
            )));
        }

        if categories.is_empty() {
            return Err(GameError::InvalidInput(
                "No categories available".to_string(),
            ));
        }

        if let Some((name, _)) = categories.iter().find(|(_, words)| words.is_empty()) {
            return Err(GameError::InvalidInput(format!(
                "Category '{}' has no words",
                name
            )));
        }

        let names: Vec<&String> = categories.keys().collect();
        let (category, words) = names
            .choose(&mut self.rng)
            .and_then(|name| categories.get_key_value(*name))
            .ok_or_else(|| GameError::InvalidInput("No categories available".to_string()))?;
        let word = words
            .choose(&mut self.rng)
            .ok_or_else(|| GameError::InvalidInput(format!("Category '{}' has no words", category)))?;

        let requested = self
            .settings
            .impostor_count(&mut self.rng, self.players.active_count());
        let impostors = self.players.assign_roles(requested, &mut self.rng);

        self.category = category.clone();
        self.word = word.clone();
        self.voting.reset_votes();
        self.phase = next;
        self.round = 1;

        info!(
            category = %self.category,
            players = self.players.count(),
            impostors,
            "Game started"
        );
        Ok(format!("Game started - Category: {}", self.category))
    }

    /// What `name` should see on their reveal screen.
    ///
    /// `None` for unknown or eliminated players.
    pub fn player_info(&self, name: &str) -> Option<PlayerRoundInfo> {
        let player = self.players.find(name)?;
        if player.is_eliminated() {
            return None;
        }

        let fellow_impostors = (player.is_impostor() && self.settings.impostors_know_each_other)
            .then(|| {
                self.players
                    .players_by_role(Role::Impostor, false)
                    .filter(|p| p.name() != player.name())
                    .map(|p| p.name().to_string())
                    .collect::<Vec<_>>()
            });

        Some(PlayerRoundInfo {
            player_name: player.name().to_string(),
            role: player.role(),
            category: self.category.clone(),
            secret_word: (!player.is_impostor()).then(|| self.word.clone()),
            fellow_impostors,
        })
    }

    /// Move to the discussion phase.
    pub fn start_discussion(&mut self) -> Result<String, GameError> {
        self.phase = self.phase.transition(PhaseEvent::BeginDiscussion)?;
        Ok(format!("Round {} discussion started", self.round))
    }

    /// Open voting, clearing any earlier votes.
    pub fn start_voting(&mut self) -> Result<String, GameError> {
        self.phase = self.phase.transition(PhaseEvent::BeginVoting)?;
        self.voting.reset_votes();
        Ok(format!("Round {} voting started", self.round))
    }

    /// Cast a vote by name. `None` is a skip.
    pub fn cast_vote(&mut self, voter: &str, target: Option<&str>) -> Result<String, GameError> {
        if self.phase != GamePhase::Voting {
            return Err(GameError::IllegalPhase {
                action: "vote",
                phase: self.phase,
            });
        }

        let voter = self
            .players
            .find(voter)
            .ok_or_else(|| GameError::NotFound(voter.trim().to_string()))?;
        let target = match target {
            Some(name) => Some(
                self.players
                    .find(name)
                    .ok_or_else(|| GameError::NotFound(name.trim().to_string()))?,
            ),
            None => None,
        };

        self.voting.cast_vote(voter, target)
    }

    pub fn voting_status(&self) -> VotingStatus {
        VotingStatus {
            votes_cast: self.voting.votes_cast(),
            total_voters: self.players.active_count(),
            all_votes_in: self.voting.all_votes_in(&self.players),
        }
    }

    /// Tally the round, apply the elimination and check for a winner.
    pub fn process_voting_result(&mut self) -> Result<RoundOutcome, GameError> {
        // Only legal while voting is open
        self.phase.transition(PhaseEvent::RoundContinues)?;

        if !self.voting.all_votes_in(&self.players) {
            return Err(GameError::IncompleteVoting {
                cast: self.voting.votes_cast(),
                required: self.players.active_count(),
            });
        }

        for player in self.players.active_players_mut() {
            player.increment_rounds();
        }

        let vote_result = self.voting.tally(&mut self.players);

        let mut message = if vote_result.was_tie {
            "The vote was tied. Nobody is eliminated.".to_string()
        } else if let Some(name) = &vote_result.eliminated {
            let was_impostor = self
                .players
                .find(name)
                .map(|p| p.is_impostor())
                .unwrap_or(false);
            info!(player = %name, was_impostor, round = self.round, "Player eliminated");
            if was_impostor {
                format!("{} was eliminated. They were an IMPOSTOR!", name)
            } else {
                format!("{} was eliminated. They were innocent...", name)
            }
        } else {
            "The majority voted to skip. Nobody is eliminated.".to_string()
        };

        let game_status = self.check_win_condition();

        if game_status.is_over() {
            self.phase = self.phase.transition(PhaseEvent::GameOver)?;
            message.push('\n');
            message.push_str(&self.win_message(game_status));
            info!(result = game_status.as_str(), rounds = self.round, "Game finished");
        } else {
            self.phase = self.phase.transition(PhaseEvent::RoundContinues)?;
            self.round += 1;
        }

        Ok(RoundOutcome {
            vote_result,
            game_status,
            message,
        })
    }

    /// Crewmates win with no impostors left; impostors win at parity.
    pub fn check_win_condition(&self) -> GameResult {
        let impostors = self.players.active_impostor_count();
        let crewmates = self.players.active_crewmate_count();

        if impostors == 0 {
            GameResult::CrewmatesWin
        } else if impostors >= crewmates {
            GameResult::ImpostorsWin
        } else {
            GameResult::InProgress
        }
    }

    fn impostor_names(&self) -> Vec<String> {
        self.players
            .players_by_role(Role::Impostor, true)
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Winner banner, revealing every impostor (eliminated ones included).
    pub fn win_message(&self, result: GameResult) -> String {
        let banner = match result {
            GameResult::CrewmatesWin => "CREWMATES WIN!",
            GameResult::ImpostorsWin => "IMPOSTORS WIN!",
            GameResult::InProgress => return "The game continues...".to_string(),
        };

        format!(
            "{}\nThe impostors were: {}\nThe word was: {}",
            banner,
            self.impostor_names().join(", "),
            self.word
        )
    }

    /// The final reveal. Only available once the game is finished.
    pub fn final_result(&self) -> Result<GameEnd, GameError> {
        if self.phase != GamePhase::Finished {
            return Err(GameError::IllegalPhase {
                action: "show the final result",
                phase: self.phase,
            });
        }

        Ok(GameEnd {
            winner: self.check_win_condition(),
            impostors: self.impostor_names(),
            secret_word: self.word.clone(),
        })
    }

    /// Back to the lobby keeping the roster.
    pub fn reset_game(&mut self) -> String {
        self.phase = self.phase.transition(PhaseEvent::Reset).unwrap_or_default();
        self.round = 0;
        self.category.clear();
        self.word.clear();
        self.voting.reset_votes();
        self.players.reset_for_new_game();

        info!(players = self.players.count(), "Game reset");
        "Game reset. Players are kept.".to_string()
    }

    /// Back to the lobby with an empty roster.
    pub fn full_reset(&mut self) -> String {
        self.reset_game();
        self.players.clear();
        "Game fully reset.".to_string()
    }

    /// Menu actions that make sense right now.
    pub fn available_actions(&self) -> Vec<MenuAction> {
        let mut actions = Vec::new();

        if self.phase != GamePhase::Lobby {
            actions.push(MenuAction::ResetGame);
            actions.push(MenuAction::BackToLobby);
        }

        if !self.players.is_empty() {
            actions.push(MenuAction::FullReset);
        }

        actions
    }

    pub fn execute(&mut self, action: MenuAction) -> String {
        match action {
            MenuAction::ResetGame => self.reset_game(),
            MenuAction::FullReset => self.full_reset(),
            MenuAction::BackToLobby => {
                self.reset_game();
                "Back to the lobby.".to_string()
            }
        }
    }

    /// Lobby snapshot.
    pub fn lobby_status(&self) -> serde_json::Value {
        serde_json::json!({
            "players": self.players.to_json(),
            "min_players": self.settings.min_players,
            "max_players": self.settings.max_players,
            "can_start": self.players.count() >= self.settings.min_players
        })
    }

    /// In-game snapshot. Never includes roles or the secret word.
    pub fn to_json(&self) -> serde_json::Value {
        let active: Vec<serde_json::Value> =
            self.players.active_players().map(|p| p.to_json()).collect();

        serde_json::json!({
            "phase": self.phase.as_str(),
            "round_number": self.round,
            "category": self.category,
            "active_players": active,
            "impostor_count": self.players.active_impostor_count()
        })
    }

    /// Multi-line summary for logs and debugging.
    pub fn status_text(&self) -> String {
        format!(
            "Phase: {}\nRound: {}\nCategory: {}\nActive players: {}/{}\nActive impostors: {}",
            self.phase,
            self.round,
            self.category,
            self.players.active_count(),
            self.players.count(),
            self.players.active_impostor_count()
        )
    }
}
