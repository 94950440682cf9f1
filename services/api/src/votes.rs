//! Vote aggregation
//!
//! Each voter holds at most one signed vote per target. Repeating the same
//! vote withdraws it, casting the opposite one switches it. The outcome of a
//! cast is a pure function of the previous vote and the incoming one, and it
//! carries the counter delta the store applies in the same transaction as the
//! vote row change.

use serde::Serialize;
use thiserror::Error;

/// Rejected vote value or direction
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Vote value must be 1 or -1 (or voteType \"up\" or \"down\")")]
pub struct InvalidVoteValue;

/// A signed vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteValue {
    Up,
    Down,
}

impl VoteValue {
    /// Stored representation: `1` or `-1`
    pub fn as_i16(self) -> i16 {
        match self {
            VoteValue::Up => 1,
            VoteValue::Down => -1,
        }
    }

    /// Parse a `voteType` direction
    pub fn from_direction(direction: &str) -> Result<Self, InvalidVoteValue> {
        match direction {
            "up" => Ok(VoteValue::Up),
            "down" => Ok(VoteValue::Down),
            _ => Err(InvalidVoteValue),
        }
    }

    fn opposite(self) -> Self {
        match self {
            VoteValue::Up => VoteValue::Down,
            VoteValue::Down => VoteValue::Up,
        }
    }
}

impl TryFrom<i64> for VoteValue {
    type Error = InvalidVoteValue;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteValue::Up),
            -1 => Ok(VoteValue::Down),
            _ => Err(InvalidVoteValue),
        }
    }
}

/// What a cast does to the voter's record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// No previous vote; a record is created
    Cast(VoteValue),
    /// Same value repeated; the record is deleted
    Withdrawn(VoteValue),
    /// Opposite value; the record is updated
    Switched { from: VoteValue, to: VoteValue },
}

/// Decide the outcome of `incoming` given the voter's current vote
pub fn decide(existing: Option<VoteValue>, incoming: VoteValue) -> VoteOutcome {
    match existing {
        None => VoteOutcome::Cast(incoming),
        Some(current) if current == incoming => VoteOutcome::Withdrawn(current),
        Some(current) => VoteOutcome::Switched {
            from: current,
            to: incoming,
        },
    }
}

impl VoteOutcome {
    /// The voter's vote after this outcome is applied
    pub fn resulting_vote(self) -> Option<VoteValue> {
        match self {
            VoteOutcome::Cast(value) => Some(value),
            VoteOutcome::Withdrawn(_) => None,
            VoteOutcome::Switched { to, .. } => Some(to),
        }
    }

    /// Counter changes implied by this outcome
    pub fn delta(self) -> TallyDelta {
        match self {
            VoteOutcome::Cast(value) => TallyDelta::of(value, 1),
            VoteOutcome::Withdrawn(value) => TallyDelta::of(value, -1),
            VoteOutcome::Switched { from, to } => {
                debug_assert_eq!(from.opposite(), to);
                TallyDelta::of(from, -1).combine(TallyDelta::of(to, 1))
            }
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            VoteOutcome::Cast(_) => "Vote recorded",
            VoteOutcome::Withdrawn(_) => "Vote removed",
            VoteOutcome::Switched { .. } => "Vote changed",
        }
    }
}

/// Change to apply to a target's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TallyDelta {
    pub upvotes: i32,
    pub downvotes: i32,
}

impl TallyDelta {
    fn of(value: VoteValue, by: i32) -> Self {
        match value {
            VoteValue::Up => TallyDelta {
                upvotes: by,
                downvotes: 0,
            },
            VoteValue::Down => TallyDelta {
                upvotes: 0,
                downvotes: by,
            },
        }
    }

    fn combine(self, other: TallyDelta) -> Self {
        TallyDelta {
            upvotes: self.upvotes + other.upvotes,
            downvotes: self.downvotes + other.downvotes,
        }
    }
}

/// Up and down counters of a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    pub upvotes: i32,
    pub downvotes: i32,
}

impl Tally {
    pub fn rating(&self) -> i32 {
        self.upvotes - self.downvotes
    }

    pub fn apply(self, delta: TallyDelta) -> Self {
        Tally {
            upvotes: self.upvotes + delta.upvotes,
            downvotes: self.downvotes + delta.downvotes,
        }
    }
}

/// Counters as returned to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteStats {
    pub upvotes: i32,
    pub downvotes: i32,
    pub rating: i32,
}

impl From<Tally> for VoteStats {
    fn from(tally: Tally) -> Self {
        VoteStats {
            upvotes: tally.upvotes,
            downvotes: tally.downvotes,
            rating: tally.rating(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    /// One target's vote records and counters, updated the way the store does
    #[derive(Default)]
    struct Ballot {
        records: HashMap<u8, VoteValue>,
        tally: Tally,
    }

    impl Ballot {
        fn cast(&mut self, voter: u8, value: VoteValue) -> VoteOutcome {
            let outcome = decide(self.records.get(&voter).copied(), value);
            match outcome.resulting_vote() {
                Some(v) => self.records.insert(voter, v),
                None => self.records.remove(&voter),
            };
            self.tally = self.tally.apply(outcome.delta());
            outcome
        }

        fn recount(&self) -> Tally {
            self.records.values().fold(Tally::default(), |tally, v| {
                tally.apply(TallyDelta::of(*v, 1))
            })
        }
    }

    #[test]
    fn test_decide() {
        assert_eq!(decide(None, VoteValue::Up), VoteOutcome::Cast(VoteValue::Up));
        assert_eq!(
            decide(Some(VoteValue::Up), VoteValue::Up),
            VoteOutcome::Withdrawn(VoteValue::Up)
        );
        assert_eq!(
            decide(Some(VoteValue::Down), VoteValue::Up),
            VoteOutcome::Switched {
                from: VoteValue::Down,
                to: VoteValue::Up
            }
        );
    }

    #[test]
    fn test_same_vote_twice_toggles_off() {
        let mut ballot = Ballot::default();
        let baseline = ballot.tally.rating();

        ballot.cast(1, VoteValue::Up);
        ballot.cast(1, VoteValue::Up);

        assert!(ballot.records.is_empty());
        assert_eq!(ballot.tally.rating(), baseline);
    }

    #[test]
    fn test_opposite_vote_flips() {
        let mut ballot = Ballot::default();

        ballot.cast(1, VoteValue::Up);
        let after_up = ballot.tally.rating();
        let outcome = ballot.cast(1, VoteValue::Down);

        assert!(matches!(outcome, VoteOutcome::Switched { .. }));
        assert_eq!(ballot.records.len(), 1);
        assert_eq!(ballot.records[&1], VoteValue::Down);
        assert_eq!(ballot.tally.rating(), after_up - 2);
    }

    #[test]
    fn test_parse_values() {
        assert_eq!(VoteValue::try_from(1), Ok(VoteValue::Up));
        assert_eq!(VoteValue::try_from(-1), Ok(VoteValue::Down));
        assert_eq!(VoteValue::try_from(0), Err(InvalidVoteValue));
        assert_eq!(VoteValue::try_from(2), Err(InvalidVoteValue));
        assert_eq!(VoteValue::from_direction("up"), Ok(VoteValue::Up));
        assert_eq!(VoteValue::from_direction("down"), Ok(VoteValue::Down));
        assert_eq!(VoteValue::from_direction("sideways"), Err(InvalidVoteValue));
        assert_eq!(VoteValue::Down.as_i16(), -1);
    }

    #[test]
    fn test_stats_carry_rating() {
        let stats = VoteStats::from(Tally {
            upvotes: 5,
            downvotes: 7,
        });
        assert_eq!(stats.rating, -2);
    }

    fn vote_value() -> impl Strategy<Value = VoteValue> {
        prop_oneof![Just(VoteValue::Up), Just(VoteValue::Down)]
    }

    proptest! {
        #[test]
        fn prop_counters_match_records(
            casts in prop::collection::vec((0u8..6, vote_value()), 0..64)
        ) {
            let mut ballot = Ballot::default();
            for (voter, value) in casts {
                ballot.cast(voter, value);
            }

            let recount = ballot.recount();
            prop_assert_eq!(ballot.tally, recount);
            prop_assert_eq!(ballot.tally.rating(), ballot.tally.upvotes - ballot.tally.downvotes);
            prop_assert!(ballot.tally.upvotes >= 0 && ballot.tally.downvotes >= 0);
            prop_assert!(ballot.records.len() <= 6);
        }
    }
}
