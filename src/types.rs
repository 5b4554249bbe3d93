use serde::{Deserialize, Serialize};

/// Participant identity, assigned by the roster and never taken from input
pub type ParticipantId = u64;
/// Squad label as it appears on the roster (not necessarily numeric)
pub type SquadLabel = String;
pub type DrawId = String;

/// Squad assigned to imported records that carry none
pub const DEFAULT_SQUAD: &str = "9";

/// Number of history entries sent to clients
pub const HISTORY_WINDOW: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub squad: SquadLabel,
}

impl Participant {
    pub fn full_name(&self) -> String {
        format!("{} {} {}", self.last_name, self.first_name, self.middle_name)
    }
}

/// An incoming participant record from an import or an admin form.
///
/// Fields are raw user input; validation and trimming happen in the roster.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParticipantRecord {
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    #[serde(default)]
    pub squad: Option<String>,
}

impl ParticipantRecord {
    pub fn new(last_name: &str, first_name: &str, middle_name: &str, squad: &str) -> Self {
        Self {
            last_name: last_name.to_string(),
            first_name: first_name.to_string(),
            middle_name: middle_name.to_string(),
            squad: Some(squad.to_string()),
        }
    }
}

/// One completed draw
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub winner: Participant,
    /// RFC 3339 wall-clock time of settlement
    pub timestamp: String,
    /// Local `HH:MM:SS` rendering of `timestamp` for display
    pub time_label: String,
    /// Squads still available after this draw
    pub remaining: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrawPhase {
    Idle,
    Drawing,
    Settled,
}

/// Full broadcastable state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// Eligible participants (squad not yet used)
    pub participants: Vec<Participant>,
    pub used_squads: Vec<SquadLabel>,
    pub spin_history: Vec<HistoryEntry>,
    pub remaining_squads: usize,
    pub phase: DrawPhase,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Viewer,
}
