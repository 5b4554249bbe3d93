//! Admin-only command handlers
//!
//! Authorization is checked in the dispatch layer before calling these.

use crate::error::DrawError;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::{ParticipantId, ParticipantRecord};
use std::sync::Arc;

fn error_reply(action: &str, err: DrawError) -> Option<ServerMessage> {
    tracing::warn!("Admin {} failed: {}", action, err);
    Some(ServerMessage::from(&err))
}

pub async fn handle_redistribute(
    state: &Arc<AppState>,
    squad_count: usize,
) -> Option<ServerMessage> {
    tracing::info!("Admin redistributing into {} squads", squad_count);
    match state.redistribute_squads(squad_count).await {
        Ok(participants) => Some(ServerMessage::RosterUpdated {
            message: format!("Participants redistributed into {} squads", squad_count),
            participants,
        }),
        Err(e) => error_reply("redistribute", e),
    }
}

pub async fn handle_update_squad(
    state: &Arc<AppState>,
    participant_id: ParticipantId,
    new_squad: String,
) -> Option<ServerMessage> {
    tracing::info!(
        "Admin moving participant {} to squad {}",
        participant_id,
        new_squad
    );
    match state
        .update_participant_squad(participant_id, &new_squad)
        .await
    {
        Ok(participant) => Some(ServerMessage::RosterUpdated {
            message: format!(
                "{} moved to squad {}",
                participant.full_name(),
                participant.squad
            ),
            participants: state.get_participants().await,
        }),
        Err(e) => error_reply("update squad", e),
    }
}

pub async fn handle_add_participant(
    state: &Arc<AppState>,
    record: ParticipantRecord,
) -> Option<ServerMessage> {
    tracing::info!("Admin adding participant {}", record.last_name);
    match state.add_participant(&record).await {
        Ok(participant) => Some(ServerMessage::RosterUpdated {
            message: format!("{} added", participant.full_name()),
            participants: state.get_participants().await,
        }),
        Err(e) => error_reply("add participant", e),
    }
}

pub async fn handle_remove_participant(
    state: &Arc<AppState>,
    participant_id: ParticipantId,
) -> Option<ServerMessage> {
    tracing::info!("Admin removing participant {}", participant_id);
    match state.remove_participant(participant_id).await {
        Ok(participants) => Some(ServerMessage::RosterUpdated {
            message: "Participant removed".to_string(),
            participants,
        }),
        Err(e) => error_reply("remove participant", e),
    }
}
