use std::collections::BTreeMap;

use chrono::Utc;
use fundme_types::Address;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::OracleError;
use crate::PriceFeed;

/// One aggregator round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundData {
    pub round_id: u64,
    pub answer: i128,
    /// Unix seconds the round started.
    pub started_at: i64,
    /// Unix seconds the round was last updated.
    pub updated_at: i64,
    pub answered_in_round: u64,
}

/// Serializable aggregator state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorState {
    pub address: Address,
    pub decimals: u8,
    pub description: String,
    pub latest_round: u64,
    pub rounds: BTreeMap<u64, RoundData>,
}

/// Round-based aggregator for development chains.
///
/// Behaves like an on-chain V3 aggregator mock: every `update_answer` opens a new
/// round, and the latest round is what the contract reads. Answers can be updated
/// through a shared reference so a deployed contract keeps observing the same feed.
pub struct MockV3Aggregator {
    address: Address,
    decimals: u8,
    description: String,
    rounds: RwLock<Rounds>,
}

#[derive(Debug, Default)]
struct Rounds {
    latest_round: u64,
    data: BTreeMap<u64, RoundData>,
}

impl MockV3Aggregator {
    /// Version reported by the mock.
    pub const VERSION: u32 = 0;

    /// Create an aggregator and publish `initial_answer` as round 1.
    pub fn new(address: Address, decimals: u8, initial_answer: i128) -> Self {
        let aggregator = Self {
            address,
            decimals,
            description: "v0.6/tests/MockV3Aggregator.sol".to_string(),
            rounds: RwLock::new(Rounds::default()),
        };
        aggregator.update_answer(initial_answer);
        aggregator
    }

    /// Rebuild an aggregator from a snapshot.
    pub fn from_state(state: AggregatorState) -> Result<Self, OracleError> {
        if state.latest_round != 0 && !state.rounds.contains_key(&state.latest_round) {
            return Err(OracleError::InvalidState(format!(
                "latest round {} has no data",
                state.latest_round
            )));
        }
        if let Some((key, round)) = state
            .rounds
            .iter()
            .find(|(key, round)| **key != round.round_id)
        {
            return Err(OracleError::InvalidState(format!(
                "round stored under {} reports id {}",
                key, round.round_id
            )));
        }

        Ok(Self {
            address: state.address,
            decimals: state.decimals,
            description: state.description,
            rounds: RwLock::new(Rounds {
                latest_round: state.latest_round,
                data: state.rounds,
            }),
        })
    }

    pub fn state(&self) -> AggregatorState {
        let rounds = self.rounds.read();
        AggregatorState {
            address: self.address,
            decimals: self.decimals,
            description: self.description.clone(),
            latest_round: rounds.latest_round,
            rounds: rounds.data.clone(),
        }
    }

    /// Publish a new answer as the next round.
    pub fn update_answer(&self, answer: i128) -> u64 {
        let now = Utc::now().timestamp();
        let mut rounds = self.rounds.write();
        rounds.latest_round += 1;
        let round_id = rounds.latest_round;
        rounds.data.insert(
            round_id,
            RoundData {
                round_id,
                answer,
                started_at: now,
                updated_at: now,
                answered_in_round: round_id,
            },
        );
        info!(
            feed = %self.address,
            round = round_id,
            answer = answer,
            "Mock aggregator answer updated"
        );
        round_id
    }

    /// Overwrite a specific round and make it the latest.
    pub fn update_round_data(&self, round_id: u64, answer: i128, timestamp: i64, started_at: i64) {
        let mut rounds = self.rounds.write();
        rounds.latest_round = round_id;
        rounds.data.insert(
            round_id,
            RoundData {
                round_id,
                answer,
                started_at,
                updated_at: timestamp,
                answered_in_round: round_id,
            },
        );
    }

    pub fn get_round_data(&self, round_id: u64) -> Result<RoundData, OracleError> {
        self.rounds
            .read()
            .data
            .get(&round_id)
            .copied()
            .ok_or(OracleError::RoundNotFound(round_id))
    }

    pub fn latest_round_data(&self) -> Result<RoundData, OracleError> {
        let latest = self.rounds.read().latest_round;
        self.get_round_data(latest)
    }

    pub fn latest_round(&self) -> u64 {
        self.rounds.read().latest_round
    }

    pub fn latest_timestamp(&self) -> i64 {
        self.latest_round_data()
            .map(|round| round.updated_at)
            .unwrap_or_default()
    }

    pub fn version(&self) -> u32 {
        Self::VERSION
    }
}

impl PriceFeed for MockV3Aggregator {
    fn address(&self) -> Address {
        self.address
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn latest_answer(&self) -> i128 {
        self.latest_round_data()
            .map(|round| round.answer)
            .unwrap_or_default()
    }

    fn description(&self) -> String {
        self.description.clone()
    }
}

impl std::fmt::Debug for MockV3Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockV3Aggregator")
            .field("address", &self.address)
            .field("decimals", &self.decimals)
            .field("latest_round", &self.latest_round())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECIMALS: u8 = 8;
    const INITIAL_ANSWER: i128 = 2000 * 100_000_000;

    fn aggregator() -> MockV3Aggregator {
        MockV3Aggregator::new(Address::derive("feed", b"mock"), DECIMALS, INITIAL_ANSWER)
    }

    #[test]
    fn initial_answer_is_round_one() {
        let feed = aggregator();
        let round = feed.latest_round_data().unwrap();
        assert_eq!(round.round_id, 1);
        assert_eq!(round.answer, INITIAL_ANSWER);
        assert_eq!(round.answered_in_round, 1);
        assert_eq!(feed.latest_answer(), INITIAL_ANSWER);
        assert_eq!(feed.decimals(), DECIMALS);
    }

    #[test]
    fn update_answer_opens_new_round() {
        let feed = aggregator();
        let round = feed.update_answer(1500 * 100_000_000);
        assert_eq!(round, 2);
        assert_eq!(feed.latest_answer(), 1500 * 100_000_000);
        // previous round stays queryable
        assert_eq!(feed.get_round_data(1).unwrap().answer, INITIAL_ANSWER);
    }

    #[test]
    fn update_round_data_overrides_latest() {
        let feed = aggregator();
        feed.update_round_data(7, 42, 1_700_000_000, 1_699_999_000);
        let round = feed.latest_round_data().unwrap();
        assert_eq!(round.round_id, 7);
        assert_eq!(round.answer, 42);
        assert_eq!(round.updated_at, 1_700_000_000);
        assert_eq!(round.started_at, 1_699_999_000);
        assert_eq!(feed.latest_timestamp(), 1_700_000_000);
    }

    #[test]
    fn missing_round_is_an_error() {
        let feed = aggregator();
        assert_eq!(feed.get_round_data(99), Err(OracleError::RoundNotFound(99)));
    }

    #[test]
    fn state_restores_rounds() {
        let feed = aggregator();
        feed.update_answer(1234);
        let restored = MockV3Aggregator::from_state(feed.state()).unwrap();
        assert_eq!(restored.address(), feed.address());
        assert_eq!(restored.latest_round(), 2);
        assert_eq!(restored.latest_answer(), 1234);

        let json = serde_json::to_string(&feed.state()).unwrap();
        let parsed: AggregatorState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, feed.state());
    }

    #[test]
    fn rejects_state_without_latest_round() {
        let mut state = aggregator().state();
        state.latest_round = 5;
        assert!(matches!(
            MockV3Aggregator::from_state(state),
            Err(OracleError::InvalidState(_))
        ));
    }
}
