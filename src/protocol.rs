use crate::types::*;
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start a draw
    Spin,
    /// Clear used squads and history
    Reset,
    // Admin-only messages
    AdminRedistribute {
        squad_count: usize,
    },
    AdminUpdateSquad {
        participant_id: ParticipantId,
        new_squad: String,
    },
    AdminAddParticipant {
        last_name: String,
        first_name: String,
        middle_name: String,
        #[serde(default)]
        squad: Option<String>,
    },
    AdminRemoveParticipant {
        participant_id: ParticipantId,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        role: Role,
        snapshot: Snapshot,
        /// Heartbeat interval, so clients can detect a stale connection
        broadcast_interval_ms: u64,
        server_now: String,
    },
    /// Full state, sent after every mutation and on every heartbeat
    Snapshot {
        snapshot: Snapshot,
    },
    /// A draw has begun; `spinning` frames follow
    SpinStarted {
        draw_id: DrawId,
        frames: u32,
    },
    /// Cosmetic frame of the reveal, not the outcome
    Spinning {
        draw_id: DrawId,
        person: Participant,
        /// Percentage of frames emitted before this one
        progress: f64,
        iteration: u32,
    },
    SpinResult {
        draw_id: DrawId,
        winner: Participant,
        /// Eligible participants after the draw
        participants: Vec<Participant>,
        used_squads: Vec<SquadLabel>,
        spin_history: Vec<HistoryEntry>,
    },
    /// Reply to an admin roster command
    RosterUpdated {
        message: String,
        participants: Vec<Participant>,
    },
    Error {
        code: String,
        msg: String,
    },
}

impl From<&crate::error::DrawError> for ServerMessage {
    fn from(err: &crate::error::DrawError) -> Self {
        ServerMessage::Error {
            code: err.code().to_string(),
            msg: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DrawError;

    #[test]
    fn test_client_message_tags() {
        let msg: ClientMessage = serde_json::from_str(r#"{"t":"spin"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Spin));

        let msg: ClientMessage =
            serde_json::from_str(r#"{"t":"admin_redistribute","squad_count":3}"#).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::AdminRedistribute { squad_count: 3 }
        ));

        let msg: ClientMessage = serde_json::from_str(
            r#"{"t":"admin_add_participant","last_name":"A","first_name":"B","middle_name":"C"}"#,
        )
        .unwrap();
        assert!(matches!(
            msg,
            ClientMessage::AdminAddParticipant { squad: None, .. }
        ));
    }

    #[test]
    fn test_error_from_draw_error() {
        let json = serde_json::to_value(ServerMessage::from(&DrawError::NoCandidates)).unwrap();
        assert_eq!(json["t"], "error");
        assert_eq!(json["code"], "NO_CANDIDATES");
    }

    #[test]
    fn test_snapshot_shape() {
        let msg = ServerMessage::Snapshot {
            snapshot: Snapshot {
                participants: vec![],
                used_squads: vec!["2".to_string()],
                spin_history: vec![],
                remaining_squads: 1,
                phase: DrawPhase::Settled,
            },
        };
        let json = serde_json::to_value(msg).unwrap();
        assert_eq!(json["t"], "snapshot");
        assert_eq!(json["snapshot"]["used_squads"][0], "2");
        assert_eq!(json["snapshot"]["remaining_squads"], 1);
        assert_eq!(json["snapshot"]["phase"], "SETTLED");
    }
}
