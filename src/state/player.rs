//! Player registry.
//!
//! Keeps the roster in registration order plus an index by normalized name.
//! Names are compared case-insensitively and ignoring surrounding whitespace;
//! every lookup goes through [`normalize_name`].

use std::collections::HashMap;
use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::GameError;

/// Secret role dealt at game start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Crewmate,
    Impostor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crewmate => "Crewmate",
            Self::Impostor => "Impostor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a player name for comparisons.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A registered player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Display name, trimmed but with original casing
    name: String,

    /// Dealt role (Crewmate until roles are assigned)
    role: Role,

    /// Voted out this game
    eliminated: bool,

    /// Rounds this player took part in
    rounds_played: u32,
}

impl Player {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            role: Role::Crewmate,
            eliminated: false,
            rounds_played: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_impostor(&self) -> bool {
        self.role == Role::Impostor
    }

    pub fn is_eliminated(&self) -> bool {
        self.eliminated
    }

    pub fn is_active(&self) -> bool {
        !self.eliminated
    }

    pub fn rounds_played(&self) -> u32 {
        self.rounds_played
    }

    pub(crate) fn assign_role(&mut self, role: Role) {
        self.role = role;
    }

    pub(crate) fn eliminate(&mut self) {
        self.eliminated = true;
    }

    pub(crate) fn increment_rounds(&mut self) {
        self.rounds_played += 1;
    }

    /// Restore the state a freshly registered player has.
    pub(crate) fn reset(&mut self) {
        self.role = Role::Crewmate;
        self.eliminated = false;
        self.rounds_played = 0;
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "is_eliminated": self.eliminated
        })
    }
}

/// Ordered roster with a normalized-name index.
#[derive(Debug, Clone, Default)]
pub struct PlayerRegistry {
    /// Players in registration order
    players: Vec<Player>,

    /// Normalized name to position in `players`
    index: HashMap<String, usize>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a player, returning the stored display name.
    pub fn register(&mut self, name: &str) -> Result<String, GameError> {
        let key = normalize_name(name);
        if key.is_empty() {
            return Err(GameError::InvalidInput("Name cannot be empty".to_string()));
        }

        if self.index.contains_key(&key) {
            return Err(GameError::DuplicateName(name.trim().to_string()));
        }

        let player = Player::new(name);
        let display = player.name.clone();
        self.index.insert(key, self.players.len());
        self.players.push(player);

        Ok(display)
    }

    /// Remove a player by name. Returns whether anyone was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let Some(position) = self.index.remove(&normalize_name(name)) else {
            return false;
        };

        self.players.remove(position);

        // Everyone after the removed player shifted down one slot
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }

        true
    }

    /// Find a player by name.
    pub fn find(&self, name: &str) -> Option<&Player> {
        self.index
            .get(&normalize_name(name))
            .map(|&position| &self.players[position])
    }

    pub(crate) fn find_mut(&mut self, name: &str) -> Option<&mut Player> {
        let position = *self.index.get(&normalize_name(name))?;
        self.players.get_mut(position)
    }

    /// Check if a player exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&normalize_name(name))
    }

    /// All players in registration order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Players still in the game, in registration order.
    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_active())
    }

    pub(crate) fn active_players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut().filter(|p| p.is_active())
    }

    /// Players with a role.
    ///
    /// Eliminated players are skipped unless `include_eliminated` is set,
    /// which the end-of-game reveal uses to show impostors voted out earlier.
    pub fn players_by_role(
        &self,
        role: Role,
        include_eliminated: bool,
    ) -> impl Iterator<Item = &Player> {
        self.players
            .iter()
            .filter(move |p| p.role == role && (include_eliminated || p.is_active()))
    }

    pub fn count(&self) -> usize {
        self.players.len()
    }

    pub fn active_count(&self) -> usize {
        self.active_players().count()
    }

    pub fn active_impostor_count(&self) -> usize {
        self.players_by_role(Role::Impostor, false).count()
    }

    pub fn active_crewmate_count(&self) -> usize {
        self.players_by_role(Role::Crewmate, false).count()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Deal roles.
    ///
    /// Everyone becomes a Crewmate, then the first
    /// `min(impostor_count, count - 1)` players of a uniform shuffle become
    /// Impostors, so at least one Crewmate always remains. Returns how many
    /// impostors were dealt.
    pub fn assign_roles<R: Rng>(&mut self, impostor_count: usize, rng: &mut R) -> usize {
        for player in &mut self.players {
            player.assign_role(Role::Crewmate);
        }

        let mut order: Vec<usize> = (0..self.players.len()).collect();
        order.shuffle(rng);

        let to_assign = impostor_count.min(self.players.len().saturating_sub(1));
        for &position in &order[..to_assign] {
            self.players[position].assign_role(Role::Impostor);
        }

        to_assign
    }

    /// Reset every player for a new game without touching the roster.
    pub fn reset_for_new_game(&mut self) {
        for player in &mut self.players {
            player.reset();
        }
    }

    /// Remove everyone.
    pub fn clear(&mut self) {
        self.players.clear();
        self.index.clear();
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.players.iter().map(|p| p.to_json()).collect())
    }
}
