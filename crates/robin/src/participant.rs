//! Participant trait and a plain named implementation

use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// Anything the scheduler can select as current.
///
/// `id` must be unique within one scheduler and stable for the participant's lifetime.
pub trait Participant: Send + Sync {
    fn id(&self) -> &str;

    /// Weighting hint, only consulted under [`ScoreSeed::Priority`]
    fn priority(&self) -> i64 {
        0
    }
}

/// How scores are seeded on construction, `add`, `reset` and the per-cycle leveling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSeed {
    /// Score is the participant's insertion index, so later entries rank higher
    #[default]
    Positional,
    /// Score is taken from [`Participant::priority`]
    Priority,
}

impl ScoreSeed {
    pub(crate) fn score(&self, position: usize, participant: &dyn Participant) -> i64 {
        match self {
            ScoreSeed::Positional => position as i64,
            ScoreSeed::Priority => participant.priority(),
        }
    }
}

impl std::str::FromStr for ScoreSeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positional" => Ok(ScoreSeed::Positional),
            "priority" => Ok(ScoreSeed::Priority),
            _ => Err(format!(
                "Invalid score seed {s}, must be one of: positional, priority"
            )),
        }
    }
}

impl fmt::Display for ScoreSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreSeed::Positional => write!(f, "positional"),
            ScoreSeed::Priority => write!(f, "priority"),
        }
    }
}

/// Participant identified by a configured name, e.g. a signer key alias
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedParticipant {
    pub id: String,
    #[serde(default)]
    pub priority: i64,
}

impl NamedParticipant {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            priority: 0,
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn shared(self) -> Arc<dyn Participant> {
        Arc::new(self)
    }
}

impl Participant for NamedParticipant {
    fn id(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> i64 {
        self.priority
    }
}

impl fmt::Display for NamedParticipant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}
