//! Score bookkeeping and the selection policy
//!
//! [`Rotation`] holds no lock and spawns nothing; [`crate::RoundRobin`] wraps it in a
//! mutex and feeds it advance signals. Keeping the policy here lets it be exercised
//! step by step without a runtime.

use crate::{
    participant::{Participant, ScoreSeed},
    Error, Result,
};
use indexmap::IndexMap;
use std::sync::Arc;

/// Penalty applied to the participant that just finished its turn
pub const PRIORITY_DELTA: i64 = 100;

/// Round counter and current participant as seen after the latest state change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub round: u64,
    pub current: Option<String>,
}

struct Slot {
    participant: Arc<dyn Participant>,
    score: i64,
}

/// Participants keyed by id in insertion order, each with its mutable score.
///
/// The current participant is tracked by id, so removing entries ahead of it never
/// shifts the selection onto a different participant.
pub struct Rotation {
    slots: IndexMap<String, Slot>,
    current: Option<String>,
    round: u64,
    seed: ScoreSeed,
}

impl Rotation {
    pub fn new(
        participants: impl IntoIterator<Item = Arc<dyn Participant>>,
        seed: ScoreSeed,
    ) -> Result<Self> {
        let mut rotation = Self {
            slots: IndexMap::new(),
            current: None,
            round: 0,
            seed,
        };

        for participant in participants {
            rotation.add(participant)?;
        }

        Ok(rotation)
    }

    /// Append a participant at the back of the default ranking
    pub fn add(&mut self, participant: Arc<dyn Participant>) -> Result<()> {
        let id = participant.id().to_string();
        if self.slots.contains_key(&id) {
            return Err(Error::DuplicateParticipant(id));
        }

        let score = self.seed.score(self.slots.len(), participant.as_ref());
        self.slots.insert(id, Slot { participant, score });
        Ok(())
    }

    /// Remove a participant and its score. Returns whether the id was present.
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        if self.current.as_deref() == Some(id) {
            return Err(Error::CurrentParticipant(id.to_string()));
        }

        Ok(self.slots.shift_remove(id).is_some())
    }

    /// Overwrite a participant's score
    pub fn update(&mut self, id: &str, score: i64) -> Result<()> {
        let slot = self
            .slots
            .get_mut(id)
            .ok_or_else(|| Error::NoSuchParticipant(id.to_string()))?;
        slot.score = score;
        Ok(())
    }

    /// Make the highest scoring participant current.
    ///
    /// Ties go to the participant inserted first.
    pub fn select(&mut self) -> Option<&str> {
        let mut best: Option<(&String, i64)> = None;
        for (id, slot) in &self.slots {
            match best {
                Some((_, score)) if slot.score <= score => {}
                _ => best = Some((id, slot.score)),
            }
        }

        self.current = best.map(|(id, _)| id.clone());
        self.current.as_deref()
    }

    /// Finish the current participant's turn and pick the next one.
    ///
    /// Returns true when the round closed a full cycle and scores were leveled back
    /// to their seeds.
    pub fn advance(&mut self) -> bool {
        self.round += 1;

        if let Some(slot) = self
            .current
            .as_deref()
            .and_then(|id| self.slots.get_mut(id))
        {
            slot.score = slot.score.saturating_sub(PRIORITY_DELTA);
        }

        self.select();

        let leveled = !self.slots.is_empty() && self.round % self.slots.len() as u64 == 0;
        if leveled {
            self.reseed();
        }

        leveled
    }

    /// Zero the round counter and restore seeded scores. The current participant stays.
    pub fn reset(&mut self) {
        self.round = 0;
        self.reseed();
    }

    fn reseed(&mut self) {
        let seed = self.seed;
        for (position, slot) in self.slots.values_mut().enumerate() {
            slot.score = seed.score(position, slot.participant.as_ref());
        }
    }

    pub fn current(&self) -> Option<&Arc<dyn Participant>> {
        self.current
            .as_deref()
            .and_then(|id| self.slots.get(id))
            .map(|slot| &slot.participant)
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn seed(&self) -> ScoreSeed {
        self.seed
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    pub fn score(&self, id: &str) -> Option<i64> {
        self.slots.get(id).map(|slot| slot.score)
    }

    /// Scores in insertion order
    pub fn scores(&self) -> Vec<(String, i64)> {
        self.slots
            .iter()
            .map(|(id, slot)| (id.clone(), slot.score))
            .collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            round: self.round,
            current: self.current.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::NamedParticipant;

    fn participants(ids: &[&str]) -> Vec<Arc<dyn Participant>> {
        ids.iter()
            .map(|id| NamedParticipant::new(*id).shared())
            .collect()
    }

    fn started(ids: &[&str]) -> Rotation {
        let mut rotation = Rotation::new(participants(ids), ScoreSeed::Positional).unwrap();
        rotation.select();
        rotation
    }

    fn advance_times(rotation: &mut Rotation, times: usize) {
        for _ in 0..times {
            rotation.advance();
        }
    }

    #[test]
    fn test_positional_seed() {
        let rotation = Rotation::new(participants(&["a", "b", "c"]), ScoreSeed::Positional)
            .unwrap();

        assert_eq!(
            rotation.scores(),
            vec![("a".into(), 0), ("b".into(), 1), ("c".into(), 2)]
        );
        assert_eq!(rotation.current_id(), None);
        assert_eq!(rotation.round(), 0);
    }

    #[test]
    fn test_priority_seed() {
        let participants: Vec<Arc<dyn Participant>> = vec![
            NamedParticipant::new("a").with_priority(50).shared(),
            NamedParticipant::new("b").with_priority(10).shared(),
        ];
        let mut rotation = Rotation::new(participants, ScoreSeed::Priority).unwrap();

        assert_eq!(rotation.select(), Some("a"));
        assert_eq!(rotation.score("b"), Some(10));
    }

    #[test]
    fn test_duplicate_on_construction() {
        let err = Rotation::new(participants(&["a", "b", "a"]), ScoreSeed::Positional)
            .err()
            .unwrap();

        assert_eq!(err, Error::DuplicateParticipant("a".into()));
    }

    #[test]
    fn test_select_highest_score() {
        let rotation = started(&["a", "b", "c", "d"]);
        assert_eq!(rotation.current_id(), Some("d"));
        assert_eq!(rotation.current().unwrap().id(), "d");
    }

    #[test]
    fn test_select_tie_goes_to_first_inserted() {
        let mut rotation = started(&["a", "b", "c"]);
        rotation.update("a", 5).unwrap();
        rotation.update("b", 5).unwrap();
        rotation.update("c", 5).unwrap();

        assert_eq!(rotation.select(), Some("a"));
    }

    #[test]
    fn test_select_empty() {
        let mut rotation = Rotation::new(Vec::new(), ScoreSeed::Positional).unwrap();
        assert_eq!(rotation.select(), None);
        assert!(rotation.current().is_none());
    }

    #[test]
    fn test_round_progression() {
        let mut rotation = started(&["a", "b", "c", "d"]);

        rotation.advance();
        assert_eq!(rotation.current_id(), Some("c"));
        rotation.advance();
        assert_eq!(rotation.current_id(), Some("b"));
        rotation.advance();
        assert_eq!(rotation.current_id(), Some("a"));
        rotation.advance();

        assert_eq!(rotation.round(), 4);
        assert_eq!(rotation.current_id(), Some("d"));
    }

    #[test]
    fn test_round_reset_after_loop() {
        let mut rotation = started(&["a", "b", "c", "d"]);
        advance_times(&mut rotation, 5);

        assert_eq!(rotation.round(), 5);
        assert_eq!(rotation.current_id(), Some("c"));
    }

    #[test]
    fn test_cycle_levels_scores() {
        let mut rotation = started(&["a", "b", "c"]);

        assert!(!rotation.advance());
        assert!(!rotation.advance());
        assert!(rotation.advance());

        assert_eq!(rotation.round(), 3);
        assert_eq!(
            rotation.scores(),
            vec![("a".into(), 0), ("b".into(), 1), ("c".into(), 2)]
        );
    }

    #[test]
    fn test_penalize_then_rotate() {
        let mut rotation = started(&["a", "b"]);
        assert_eq!(rotation.current_id(), Some("b"));

        rotation.advance();
        assert_eq!(rotation.current_id(), Some("a"));
    }

    #[test]
    fn test_single_participant_stays_current() {
        let mut rotation = started(&["a"]);
        advance_times(&mut rotation, 3);

        assert_eq!(rotation.round(), 3);
        assert_eq!(rotation.current_id(), Some("a"));
        assert_eq!(rotation.score("a"), Some(0));
    }

    #[test]
    fn test_penalty_saturates_at_min_score() {
        let mut rotation = started(&["a"]);
        rotation.update("a", i64::MIN).unwrap();
        advance_times(&mut rotation, 2);

        assert_eq!(rotation.round(), 2);
        assert_eq!(rotation.current_id(), Some("a"));

        let mut rotation = started(&["a", "b"]);
        rotation.update("b", i64::MIN + 1).unwrap();
        rotation.advance();

        assert_eq!(rotation.score("b"), Some(i64::MIN));
        assert_eq!(rotation.current_id(), Some("a"));

        rotation.advance();
        assert_eq!(rotation.round(), 2);
        assert_eq!(rotation.current_id(), Some("a"));
    }

    #[test]
    fn test_advance_empty_only_counts() {
        let mut rotation = Rotation::new(Vec::new(), ScoreSeed::Positional).unwrap();

        assert!(!rotation.advance());
        assert_eq!(rotation.round(), 1);
        assert_eq!(rotation.current_id(), None);
    }

    #[test]
    fn test_reset() {
        let mut rotation = started(&["a", "b", "c", "d"]);
        advance_times(&mut rotation, 2);
        assert_eq!(rotation.current_id(), Some("b"));

        rotation.reset();
        assert_eq!(rotation.round(), 0);
        assert_eq!(rotation.current_id(), Some("b"));
        assert_eq!(rotation.score("d"), Some(3));

        rotation.advance();
        assert_eq!(rotation.round(), 1);
        assert_eq!(rotation.current_id(), Some("d"));
    }

    #[test]
    fn test_add() {
        let mut rotation = started(&["a", "b", "c"]);
        rotation.advance();

        rotation.add(NamedParticipant::new("d").shared()).unwrap();
        assert_eq!(rotation.score("d"), Some(3));

        rotation.advance();
        assert_eq!(rotation.current_id(), Some("d"));
        rotation.advance();

        assert_eq!(rotation.round(), 3);
        assert_eq!(rotation.current_id(), Some("a"));
    }

    #[test]
    fn test_add_duplicate() {
        let mut rotation = started(&["a", "b"]);
        let err = rotation.add(NamedParticipant::new("a").shared()).unwrap_err();

        assert_eq!(err, Error::DuplicateParticipant("a".into()));
        assert_eq!(rotation.len(), 2);
    }

    #[test]
    fn test_remove_current_fails() {
        let mut rotation = started(&["a", "b", "c"]);
        let before = rotation.scores();

        let err = rotation.remove("c").unwrap_err();

        assert_eq!(err, Error::CurrentParticipant("c".into()));
        assert_eq!(rotation.scores(), before);
        assert_eq!(rotation.current_id(), Some("c"));
    }

    #[test]
    fn test_remove_before_current_keeps_selection() {
        let mut rotation = started(&["a", "b", "c"]);

        assert!(rotation.remove("a").unwrap());
        assert_eq!(rotation.current_id(), Some("c"));
        assert_eq!(rotation.current().unwrap().id(), "c");
        assert!(!rotation.contains("a"));

        rotation.advance();
        assert_eq!(rotation.current_id(), Some("b"));
    }

    #[test]
    fn test_remove_unknown() {
        let mut rotation = started(&["a", "b"]);
        assert!(!rotation.remove("z").unwrap());
        assert_eq!(rotation.len(), 2);
    }

    #[test]
    fn test_update() {
        let mut rotation = started(&["a", "b", "c", "d"]);
        rotation.advance();

        rotation.update("b", 100).unwrap();
        rotation.advance();

        assert_eq!(rotation.round(), 2);
        assert_eq!(rotation.current_id(), Some("b"));
    }

    #[test]
    fn test_update_many() {
        let mut rotation = started(&["a", "b", "c"]);
        rotation.update("b", 50).unwrap();
        rotation.update("a", 100).unwrap();
        rotation.update("c", 0).unwrap();

        advance_times(&mut rotation, 2);

        assert_eq!(rotation.round(), 2);
        assert_eq!(rotation.current_id(), Some("b"));
    }

    #[test]
    fn test_update_unknown() {
        let mut rotation = started(&["a"]);
        let err = rotation.update("z", 1).unwrap_err();
        assert_eq!(err, Error::NoSuchParticipant("z".into()));
    }

    #[test]
    fn test_snapshot() {
        let mut rotation = started(&["a", "b"]);
        rotation.advance();

        assert_eq!(
            rotation.snapshot(),
            Snapshot {
                round: 1,
                current: Some("a".into()),
            }
        );
    }
}
