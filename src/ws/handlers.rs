//! WebSocket message dispatch
//!
//! Authorization is checked here, then messages are dispatched to the
//! role-specific handler modules.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::{ParticipantRecord, Role};
use std::sync::Arc;

use super::{admin, viewer};

/// Check admin authorization and return early if unauthorized
macro_rules! check_admin {
    ($role:expr, $action:expr) => {
        if *$role != Role::Admin {
            return Some(ServerMessage::Error {
                code: "UNAUTHORIZED".to_string(),
                msg: format!("Only the admin can {}", $action),
            });
        }
    };
}

/// Handle client messages and return optional response to the sender
pub async fn handle_message(
    msg: ClientMessage,
    role: &Role,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Spin => viewer::handle_spin(state).await,

        ClientMessage::Reset => viewer::handle_reset(state).await,

        ClientMessage::AdminRedistribute { squad_count } => {
            check_admin!(role, "redistribute squads");
            admin::handle_redistribute(state, squad_count).await
        }

        ClientMessage::AdminUpdateSquad {
            participant_id,
            new_squad,
        } => {
            check_admin!(role, "move participants");
            admin::handle_update_squad(state, participant_id, new_squad).await
        }

        ClientMessage::AdminAddParticipant {
            last_name,
            first_name,
            middle_name,
            squad,
        } => {
            check_admin!(role, "add participants");
            let record = ParticipantRecord {
                last_name,
                first_name,
                middle_name,
                squad,
            };
            admin::handle_add_participant(state, record).await
        }

        ClientMessage::AdminRemoveParticipant { participant_id } => {
            check_admin!(role, "remove participants");
            admin::handle_remove_participant(state, participant_id).await
        }
    }
}
