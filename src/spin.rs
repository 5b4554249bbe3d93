//! Spin sequencer
//!
//! Runs the animated reveal for one draw: a fixed number of cosmetic
//! `spinning` frames drawn from the round's frozen candidate pool, separated
//! by decelerating delays, then settles the round and broadcasts the result.

use crate::error::{DrawError, DrawResult};
use crate::protocol::ServerMessage;
use crate::state::{AppState, DrawTicket};
use crate::types::DrawId;
use std::sync::Arc;

/// Begin a draw and start animating it in the background.
///
/// Fails without side effects when no squad is left or another draw is
/// still spinning.
pub async fn start_spin(state: &Arc<AppState>) -> DrawResult<DrawId> {
    let ticket = state.begin_draw().await?;
    let draw_id = ticket.draw_id.clone();

    state.broadcast_to_all(ServerMessage::SpinStarted {
        draw_id: draw_id.clone(),
        frames: state.config.spin.frames,
    });

    state
        .spawn_spin(draw_id.clone(), run_sequence(state.clone(), ticket))
        .await;
    Ok(draw_id)
}

fn progress(frame: u32, frames: u32) -> f64 {
    f64::from(frame) / f64::from(frames) * 100.0
}

async fn run_sequence(state: Arc<AppState>, ticket: DrawTicket) {
    let timing = state.config.spin.clone();
    let draw_id = ticket.draw_id.clone();

    for frame in 0..timing.frames {
        if !state.board.read().await.draw.is_active(&draw_id) {
            tracing::debug!("Draw {} no longer active, stopping spin", draw_id);
            state.clear_spin(&draw_id).await;
            return;
        }

        let person = ticket.sample(&mut rand::rng()).clone();
        tracing::debug!("Draw {} frame {}: {}", draw_id, frame, person.full_name());
        state.broadcast_to_all(ServerMessage::Spinning {
            draw_id: draw_id.clone(),
            person,
            progress: progress(frame, timing.frames),
            iteration: frame,
        });

        if frame + 1 < timing.frames {
            tokio::time::sleep(timing.delay_after(frame)).await;
        }
    }

    match state.settle_draw(&draw_id).await {
        Ok((outcome, snapshot)) => {
            state.broadcast_to_all(ServerMessage::SpinResult {
                draw_id: draw_id.clone(),
                winner: outcome.winner,
                participants: snapshot.participants.clone(),
                used_squads: snapshot.used_squads.clone(),
                spin_history: snapshot.spin_history.clone(),
            });
            state.broadcast_snapshot(snapshot);
        }
        Err(DrawError::DrawCancelled) => {
            tracing::debug!("Draw {} was cancelled before settling", draw_id);
        }
        Err(e) => {
            tracing::error!("Failed to settle draw {}: {}", draw_id, e);
        }
    }

    state.clear_spin(&draw_id).await;
}
