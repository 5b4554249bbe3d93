//! Viewer message handlers
//!
//! Any connected session may spin the wheel or reset the elimination.

use crate::protocol::ServerMessage;
use crate::spin;
use crate::state::AppState;
use std::sync::Arc;

pub async fn handle_spin(state: &Arc<AppState>) -> Option<ServerMessage> {
    match spin::start_spin(state).await {
        Ok(draw_id) => {
            tracing::info!("Spin requested, draw {}", draw_id);
            None
        }
        Err(e) => {
            tracing::info!("Spin rejected: {}", e);
            Some(ServerMessage::from(&e))
        }
    }
}

pub async fn handle_reset(state: &Arc<AppState>) -> Option<ServerMessage> {
    tracing::info!("Reset requested");
    state.reset_draw().await;
    None
}
