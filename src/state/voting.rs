//! Voting engine.
//!
//! Collects one vote per active player per round and tallies them. Votes are
//! keyed by normalized player name; a `None` target is a skip.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::error::{GameError, VotingRule};
use super::player::{Player, PlayerRegistry};

/// Outcome of a tally. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteResult {
    /// Votes received, by target display name
    pub vote_counts: BTreeMap<String, usize>,

    /// Votes to skip
    pub skip_votes: usize,

    /// Player voted out, if any
    pub eliminated: Option<String>,

    /// Whether the vote ended in a tie
    pub was_tie: bool,
}

impl VoteResult {
    pub fn someone_eliminated(&self) -> bool {
        self.eliminated.is_some()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "eliminated_player": self.eliminated,
            "was_tie": self.was_tie,
            "vote_counts": self.vote_counts,
            "skip_votes": self.skip_votes
        })
    }
}

/// Votes for the current round.
#[derive(Debug, Clone, Default)]
pub struct VotingEngine {
    /// Voter key to target key (`None` = skip)
    votes: HashMap<String, Option<String>>,
}

impl VotingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all votes. Called when a voting phase opens.
    pub fn reset_votes(&mut self) {
        self.votes.clear();
    }

    /// Record a vote, replacing any earlier vote by the same voter.
    pub fn cast_vote(&mut self, voter: &Player, target: Option<&Player>) -> Result<String, GameError> {
        if voter.is_eliminated() {
            return Err(VotingRule::VoterEliminated.into());
        }

        if let Some(target) = target {
            if target.is_eliminated() {
                return Err(VotingRule::TargetEliminated.into());
            }
            if target.normalized_name() == voter.normalized_name() {
                return Err(VotingRule::SelfVote.into());
            }
        }

        self.votes.insert(
            voter.normalized_name(),
            target.map(|t| t.normalized_name()),
        );

        let target_name = target.map(|t| t.name()).unwrap_or("Skip");
        Ok(format!("{} voted for {}", voter.name(), target_name))
    }

    /// Check if a player has voted this round.
    pub fn has_voted(&self, player: &Player) -> bool {
        self.votes.contains_key(&player.normalized_name())
    }

    /// Number of distinct voters so far.
    pub fn votes_cast(&self) -> usize {
        self.votes.len()
    }

    /// Check if every active player has voted.
    pub fn all_votes_in(&self, registry: &PlayerRegistry) -> bool {
        registry.active_players().all(|p| self.has_voted(p))
    }

    /// Count the votes and eliminate the winner, if there is one.
    ///
    /// Skip wins outright when it beats every target. A tie at the top, or a
    /// single leader level with skip, eliminates nobody. Otherwise the single
    /// leader is marked eliminated in `registry`.
    pub fn tally(&self, registry: &mut PlayerRegistry) -> VoteResult {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut skip_votes = 0;

        for target in self.votes.values() {
            match target {
                Some(key) => *counts.entry(key.as_str()).or_insert(0) += 1,
                None => skip_votes += 1,
            }
        }

        let max_votes = counts.values().copied().max().unwrap_or(0);
        let top_voted: Vec<&str> = counts
            .iter()
            .filter(|(_, &count)| count == max_votes)
            .map(|(&key, _)| key)
            .collect();

        let vote_counts: BTreeMap<String, usize> = counts
            .iter()
            .map(|(&key, &count)| {
                let name = registry
                    .find(key)
                    .map(|p| p.name().to_string())
                    .unwrap_or_else(|| key.to_string());
                (name, count)
            })
            .collect();

        let result = |eliminated: Option<String>, was_tie: bool| VoteResult {
            vote_counts: vote_counts.clone(),
            skip_votes,
            eliminated,
            was_tie,
        };

        if skip_votes > max_votes {
            return result(None, false);
        }

        if top_voted.len() > 1 || (top_voted.len() == 1 && skip_votes == max_votes) {
            return result(None, true);
        }

        let eliminated = top_voted
            .first()
            .and_then(|key| registry.find_mut(key))
            .map(|player| {
                player.eliminate();
                player.name().to_string()
            });

        result(eliminated, false)
    }

    /// One "voter → target" line per vote, in registration order.
    pub fn vote_summary(&self, registry: &PlayerRegistry) -> String {
        registry
            .players()
            .iter()
            .filter_map(|voter| {
                let target = self.votes.get(&voter.normalized_name())?;
                let target_name = match target {
                    Some(key) => registry.find(key).map(|p| p.name()).unwrap_or(key),
                    None => "Skip",
                };
                Some(format!("  {} → {}", voter.name(), target_name))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn make_registry(names: &[&str]) -> PlayerRegistry {
        let mut registry = PlayerRegistry::new();
        for name in names {
            registry.register(name).unwrap();
        }
        registry
    }

    fn vote(engine: &mut VotingEngine, registry: &PlayerRegistry, voter: &str, target: Option<&str>) {
        let voter = registry.find(voter).unwrap();
        let target = target.map(|t| registry.find(t).unwrap());
        engine.cast_vote(voter, target).unwrap();
    }

    #[test]
    fn test_tie_between_two_targets() {
        let mut registry = make_registry(&["A", "B", "C"]);
        let mut engine = VotingEngine::new();

        vote(&mut engine, &registry, "A", Some("B"));
        vote(&mut engine, &registry, "B", Some("A"));
        vote(&mut engine, &registry, "C", None);

        let result = engine.tally(&mut registry);
        assert!(result.was_tie);
        assert_eq!(result.eliminated, None);
        assert_eq!(registry.active_count(), 3);
    }

    #[test]
    fn test_skip_majority() {
        let mut registry = make_registry(&["A", "B", "C"]);
        let mut engine = VotingEngine::new();

        vote(&mut engine, &registry, "A", None);
        vote(&mut engine, &registry, "B", None);
        vote(&mut engine, &registry, "C", Some("A"));

        let result = engine.tally(&mut registry);
        assert!(!result.was_tie);
        assert_eq!(result.skip_votes, 2);
        assert_eq!(result.eliminated, None);
    }

    #[test]
    fn test_single_leader_level_with_skip_is_tie() {
        let mut registry = make_registry(&["A", "B", "C", "D"]);
        let mut engine = VotingEngine::new();

        vote(&mut engine, &registry, "A", Some("D"));
        vote(&mut engine, &registry, "B", Some("D"));
        vote(&mut engine, &registry, "C", None);
        vote(&mut engine, &registry, "D", None);

        let result = engine.tally(&mut registry);
        assert!(result.was_tie);
        assert_eq!(result.eliminated, None);
        assert!(!registry.find("D").unwrap().is_eliminated());
    }

    #[test]
    fn test_clear_winner() {
        let mut registry = make_registry(&["A", "B", "C", "X"]);
        let mut engine = VotingEngine::new();

        vote(&mut engine, &registry, "A", Some("X"));
        vote(&mut engine, &registry, "B", Some("X"));
        vote(&mut engine, &registry, "C", Some("X"));
        vote(&mut engine, &registry, "X", Some("A"));

        let result = engine.tally(&mut registry);
        assert!(!result.was_tie);
        assert_eq!(result.eliminated.as_deref(), Some("X"));
        assert!(registry.find("x").unwrap().is_eliminated());
        assert_eq!(
            result.vote_counts,
            BTreeMap::from([("A".to_string(), 1), ("X".to_string(), 3)])
        );
    }

    #[test]
    fn test_leader_beats_skip() {
        let mut registry = make_registry(&["A", "B", "C", "D", "E"]);
        let mut engine = VotingEngine::new();

        vote(&mut engine, &registry, "A", Some("E"));
        vote(&mut engine, &registry, "B", Some("E"));
        vote(&mut engine, &registry, "C", Some("E"));
        vote(&mut engine, &registry, "D", None);
        vote(&mut engine, &registry, "E", None);

        let result = engine.tally(&mut registry);
        assert_eq!(result.eliminated.as_deref(), Some("E"));
        assert_eq!(result.skip_votes, 2);
    }

    #[test]
    fn test_no_votes() {
        let mut registry = make_registry(&["A", "B"]);
        let engine = VotingEngine::new();

        let result = engine.tally(&mut registry);
        assert!(!result.was_tie);
        assert_eq!(result.eliminated, None);
        assert!(result.vote_counts.is_empty());
    }

    #[test]
    fn test_second_tally_repeats_counts() {
        let mut registry = make_registry(&["A", "B", "C"]);
        let mut engine = VotingEngine::new();

        vote(&mut engine, &registry, "A", Some("C"));
        vote(&mut engine, &registry, "B", Some("C"));
        vote(&mut engine, &registry, "C", Some("A"));

        let first = engine.tally(&mut registry);
        let second = engine.tally(&mut registry);

        assert_eq!(first, second);
        assert_eq!(engine.votes_cast(), 3);
    }

    #[test]
    fn test_revote_overwrites() {
        let mut registry = make_registry(&["A", "B", "C"]);
        let mut engine = VotingEngine::new();

        vote(&mut engine, &registry, "A", Some("B"));
        vote(&mut engine, &registry, "A", Some("C"));
        vote(&mut engine, &registry, "B", Some("C"));
        assert_eq!(engine.votes_cast(), 2);

        vote(&mut engine, &registry, "C", None);
        let result = engine.tally(&mut registry);
        assert_eq!(result.vote_counts.get("B"), None);
        assert_eq!(result.eliminated.as_deref(), Some("C"));
    }

    #[test]
    fn test_rule_violations_leave_votes_untouched() {
        let mut registry = make_registry(&["A", "B", "C"]);
        registry.find_mut("c").unwrap().eliminate();
        let mut engine = VotingEngine::new();
        vote(&mut engine, &registry, "B", None);

        let a = registry.find("a").unwrap();
        let b = registry.find("b").unwrap();
        let c = registry.find("c").unwrap();

        assert_eq!(
            engine.cast_vote(a, Some(a)),
            Err(GameError::VotingRule(VotingRule::SelfVote))
        );
        assert_eq!(
            engine.cast_vote(a, Some(c)),
            Err(GameError::VotingRule(VotingRule::TargetEliminated))
        );
        assert_eq!(
            engine.cast_vote(c, Some(b)),
            Err(GameError::VotingRule(VotingRule::VoterEliminated))
        );
        assert_eq!(engine.votes_cast(), 1);
        assert!(!engine.has_voted(a));
    }

    #[test]
    fn test_all_votes_in_ignores_eliminated() {
        let mut registry = make_registry(&["A", "B", "C"]);
        let mut engine = VotingEngine::new();

        vote(&mut engine, &registry, "A", Some("B"));
        vote(&mut engine, &registry, "B", Some("A"));
        assert!(!engine.all_votes_in(&registry));

        registry.find_mut("c").unwrap().eliminate();
        assert!(engine.all_votes_in(&registry));

        engine.reset_votes();
        assert_eq!(engine.votes_cast(), 0);
        assert!(!engine.all_votes_in(&registry));
    }

    #[test]
    fn test_vote_summary() {
        let registry = make_registry(&["Alice", "Bob", "Carol"]);
        let mut engine = VotingEngine::new();

        vote(&mut engine, &registry, "carol", Some("alice"));
        vote(&mut engine, &registry, "alice", None);

        assert_eq!(
            engine.vote_summary(&registry),
            "  Alice → Skip\n  Carol → Alice"
        );
    }
}
