//! v1 cross-boundary contracts for the engine, API facade, persistence, and clients.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SCHEMA_VERSION_V1: &str = "1.0";

pub const DEFAULT_PLAYER_NAME: &str = "You";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Boss,
}

impl Difficulty {
    /// Fixed reward scalar applied before accuracy scaling.
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Easy => 1.0,
            Self::Medium => 2.0,
            Self::Hard => 3.5,
            Self::Boss => 5.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Boss => "boss",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One fixture of a problem's suite. `input` is absent for zero-argument
/// problems; multi-argument problems pack their arguments into one list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    pub expected: Value,
}

impl TestCase {
    pub fn new(input: Value, expected: Value) -> Self {
        Self {
            input: Some(input),
            expected,
        }
    }

    pub fn without_input(expected: Value) -> Self {
        Self {
            input: None,
            expected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProblemDefinition {
    pub id: String,
    pub title: String,
    pub zone: String,
    pub difficulty: Difficulty,
    pub description: String,
    pub starter_source: String,
    pub tests: Vec<TestCase>,
    pub base_reward: u64,
    pub kb_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ZoneDefinition {
    pub id: String,
    pub display_name: String,
    pub icon: String,
    pub unlock_threshold: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct McqDefinition {
    pub id: String,
    pub zone: String,
    pub prompt: String,
    pub choices: Vec<String>,
    pub answer_index: usize,
    pub reward: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RankThreshold {
    pub min_xp: u64,
    pub name: String,
    pub symbol: String,
}

impl RankThreshold {
    pub fn new(min_xp: u64, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            min_xp,
            name: name.into(),
            symbol: symbol.into(),
        }
    }
}

/// The one mutable entity. Mutated only by the progression model; persisted
/// whole as a single document. Fields added after the first release carry
/// `#[serde(default)]` so older documents decode and are backfilled at load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerRecord {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default = "default_player_name")]
    pub name: String,
    #[serde(default)]
    pub experience: u64,
    #[serde(default)]
    pub rank: String,
    #[serde(default)]
    pub solved: BTreeSet<String>,
    #[serde(default)]
    pub solved_mcq: BTreeSet<String>,
    #[serde(default = "default_accuracy")]
    pub accuracy: f64,
    #[serde(default)]
    pub mastery: BTreeMap<String, u8>,
}

fn default_schema_version() -> String {
    SCHEMA_VERSION_V1.to_string()
}

fn default_player_name() -> String {
    DEFAULT_PLAYER_NAME.to_string()
}

fn default_accuracy() -> f64 {
    1.0
}

impl Default for PlayerRecord {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            name: default_player_name(),
            experience: 0,
            rank: String::new(),
            solved: BTreeSet::new(),
            solved_mcq: BTreeSet::new(),
            accuracy: default_accuracy(),
            mastery: BTreeMap::new(),
        }
    }
}

impl PlayerRecord {
    pub fn mastery_for(&self, zone_id: &str) -> u8 {
        self.mastery.get(zone_id).copied().unwrap_or(0)
    }
}

/// Sandbox resource ceilings. Every limit is enforced per invocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SandboxLimits {
    pub max_steps: u64,
    pub max_call_depth: usize,
    pub max_collection_len: usize,
    pub wall_clock_ms: u64,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            max_steps: 250_000,
            max_call_depth: 64,
            max_collection_len: 65_536,
            wall_clock_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    pub schema_version: String,
    #[serde(default)]
    pub sandbox: SandboxLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            sandbox: SandboxLimits::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmissionRequest {
    pub problem_id: String,
    pub zone_id: String,
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct McqAnswerRequest {
    pub mcq_id: String,
    pub choice: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Accepted {
        accuracy: f64,
        reward: u64,
        experience_total: u64,
        rank: String,
        mastery: u8,
    },
    Rejected {
        accuracy: f64,
        explanation: String,
    },
}

impl SubmissionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn accuracy(&self) -> f64 {
        match self {
            Self::Accepted { accuracy, .. } | Self::Rejected { accuracy, .. } => *accuracy,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum McqOutcome {
    Accepted {
        reward: u64,
        experience_total: u64,
        rank: String,
    },
    Rejected {
        explanation: String,
    },
}

/// Problem as shown to a learner: remediation key stripped, potential reward
/// precomputed. Test fixtures stay visible as part of the statement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProblemView {
    pub id: String,
    pub title: String,
    pub zone: String,
    pub difficulty: Difficulty,
    pub description: String,
    pub starter_source: String,
    pub tests: Vec<TestCase>,
    pub potential_reward: u64,
    pub solved: bool,
}

/// MCQ as shown to a learner: the answer index is the secret and is stripped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct McqView {
    pub id: String,
    pub zone: String,
    pub prompt: String,
    pub choices: Vec<String>,
    pub reward: u64,
    pub answered: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NextProblem {
    Ready { problem: ProblemView },
    Cleared { zone_id: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NextMcq {
    Ready { mcq: McqView },
    Cleared { zone_id: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneSummary {
    pub zone_id: String,
    pub display_name: String,
    pub icon: String,
    pub unlocked: bool,
    pub unlock_threshold: u64,
    pub total_problems: usize,
    pub solved_count: usize,
    pub mastery: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerProfile {
    pub schema_version: String,
    pub name: String,
    pub experience: u64,
    pub rank: String,
    pub rank_symbol: String,
    pub next_rank_xp: Option<u64>,
    pub accuracy: f64,
    pub solved: BTreeSet<String>,
    pub solved_mcq: BTreeSet<String>,
    pub mastery: BTreeMap<String, u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub experience: u64,
    pub rank: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ZoneNotFound,
    ProblemNotFound,
    McqNotFound,
    ZoneLocked,
    ValidationFailed,
    InternalError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub schema_version: String,
    pub error_code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(error_code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            error_code,
            message: message.into(),
            details,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.error_code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn older_player_document_backfills_missing_fields() {
        let document = serde_json::json!({
            "schema_version": "1.0",
            "experience": 120,
            "solved": ["A1"]
        });

        let record: PlayerRecord = serde_json::from_value(document).expect("decode");
        assert_eq!(record.experience, 120);
        assert!(record.solved.contains("A1"));
        assert!(record.mastery.is_empty());
        assert!(record.solved_mcq.is_empty());
        assert_eq!(record.accuracy, 1.0);
        assert_eq!(record.name, DEFAULT_PLAYER_NAME);
    }

    #[test]
    fn difficulty_multipliers_match_reward_table() {
        assert_eq!(Difficulty::Easy.multiplier(), 1.0);
        assert_eq!(Difficulty::Medium.multiplier(), 2.0);
        assert_eq!(Difficulty::Hard.multiplier(), 3.5);
        assert_eq!(Difficulty::Boss.multiplier(), 5.0);
    }

    #[test]
    fn submission_outcome_round_trip_serialization() {
        let outcome = SubmissionOutcome::Accepted {
            accuracy: 1.0,
            reward: 40,
            experience_total: 40,
            rank: "Trainee".to_string(),
            mastery: 25,
        };

        let serialized = serde_json::to_string(&outcome).expect("serialize");
        let decoded: SubmissionOutcome = serde_json::from_str(&serialized).expect("deserialize");
        assert_eq!(outcome, decoded);
    }
}
