mod draw;
pub mod export;
mod redistribute;
mod roster;

pub use draw::{DrawOutcome, DrawState, DrawTicket};
pub use redistribute::{partition_sizes, redistribute};
pub use roster::{compare_squads, possible_squad_counts, Roster};

use crate::config::WheelConfig;
use crate::error::DrawResult;
use crate::protocol::ServerMessage;
use crate::types::*;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::AbortHandle;

/// Roster and draw state, mutated only as a whole under one lock
#[derive(Debug, Clone, Default)]
pub struct Board {
    pub roster: Roster,
    pub draw: DrawState,
}

impl Board {
    pub fn new(roster: Roster) -> Self {
        Self {
            roster,
            draw: DrawState::default(),
        }
    }
}

/// The spin task currently animating a round
struct RunningSpin {
    draw_id: DrawId,
    handle: AbortHandle,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub board: Arc<RwLock<Board>>,
    pub config: Arc<WheelConfig>,
    /// Broadcast channel for sending messages to every connected session
    pub broadcast: broadcast::Sender<ServerMessage>,
    spin: Arc<Mutex<Option<RunningSpin>>>,
}

impl AppState {
    pub fn new(config: WheelConfig) -> Self {
        Self::with_roster(config, Roster::default())
    }

    pub fn with_roster(config: WheelConfig, roster: Roster) -> Self {
        let (tx, _rx) = broadcast::channel(256);
        Self {
            board: Arc::new(RwLock::new(Board::new(roster))),
            config: Arc::new(config),
            broadcast: tx,
            spin: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.board.read().await.snapshot()
    }

    /// Send a message to every connected session.
    /// No receivers connected is fine.
    pub fn broadcast_to_all(&self, msg: ServerMessage) {
        let _ = self.broadcast.send(msg);
    }

    pub fn broadcast_snapshot(&self, snapshot: Snapshot) {
        self.broadcast_to_all(ServerMessage::Snapshot { snapshot });
    }

    /// Apply a roster mutation, then reset the draw and broadcast.
    ///
    /// `mutate` must validate before it writes so a failure leaves the board
    /// as it was.
    async fn mutate_and_reset<T>(
        &self,
        mutate: impl FnOnce(&mut Board) -> DrawResult<T>,
    ) -> DrawResult<(T, Vec<Participant>)> {
        let mut board = self.board.write().await;
        let value = mutate(&mut board)?;
        let cancelled = board.reset_draw();
        let participants = board.roster.participants().to_vec();
        let snapshot = board.snapshot();
        drop(board);

        if let Some(draw_id) = cancelled {
            self.cancel_spin(&draw_id).await;
        }
        self.broadcast_snapshot(snapshot);
        Ok((value, participants))
    }

    /// Spawn the task animating `draw_id` and remember it for cancellation.
    ///
    /// The slot stays locked until the task is recorded, so the task cannot
    /// clear itself before it has been registered.
    pub(crate) async fn spawn_spin<F>(&self, draw_id: DrawId, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut spin = self.spin.lock().await;
        let handle = tokio::spawn(task).abort_handle();
        *spin = Some(RunningSpin { draw_id, handle });
    }

    pub(crate) async fn clear_spin(&self, draw_id: &str) {
        let mut spin = self.spin.lock().await;
        if spin.as_ref().is_some_and(|s| s.draw_id == draw_id) {
            *spin = None;
        }
    }

    /// Abort the spin task animating `draw_id`. A task for any other round
    /// is left alone.
    async fn cancel_spin(&self, draw_id: &str) {
        let mut spin = self.spin.lock().await;
        if spin.as_ref().is_some_and(|s| s.draw_id == draw_id) {
            if let Some(running) = spin.take() {
                running.handle.abort();
                tracing::info!("Cancelled spin for draw {}", draw_id);
            }
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(WheelConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DrawError;

    fn record(last: &str, squad: &str) -> ParticipantRecord {
        ParticipantRecord::new(last, "First", "Middle", squad)
    }

    async fn seeded_state() -> AppState {
        let state = AppState::default();
        state
            .replace_roster(&[
                record("A", "1"),
                record("B", "1"),
                record("C", "2"),
                record("D", "3"),
                record("E", "2"),
            ])
            .await
            .unwrap();
        state
    }

    #[tokio::test]
    async fn test_replace_broadcasts_snapshot() {
        let state = AppState::default();
        let mut rx = state.broadcast.subscribe();

        let participants = state.replace_roster(&[record("A", "1")]).await.unwrap();
        assert_eq!(participants.len(), 1);

        match rx.recv().await.unwrap() {
            ServerMessage::Snapshot { snapshot } => {
                assert_eq!(snapshot.participants.len(), 1);
                assert_eq!(snapshot.remaining_squads, 1);
            }
            other => panic!("Expected Snapshot, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_mutation_does_not_broadcast() {
        let state = seeded_state().await;
        let mut rx = state.broadcast.subscribe();

        let result = state.replace_roster(&[record("", "1")]).await;
        assert!(matches!(result, Err(DrawError::Validation(_))));
        assert!(rx.try_recv().is_err());
        assert_eq!(state.get_participants().await.len(), 5);
    }

    #[tokio::test]
    async fn test_roster_mutations_reset_draw() {
        let state = seeded_state().await;
        let ticket = state.begin_draw().await.unwrap();
        state.settle_draw(&ticket.draw_id).await.unwrap();
        assert_eq!(state.used_squads().await.len(), 1);

        state.add_participant(&record("F", "4")).await.unwrap();
        let snapshot = state.snapshot().await;
        assert!(snapshot.used_squads.is_empty());
        assert!(snapshot.spin_history.is_empty());
        assert_eq!(snapshot.participants.len(), 6);
    }

    #[tokio::test]
    async fn test_squad_edit_keeps_draw_state() {
        let state = seeded_state().await;
        let ticket = state.begin_draw().await.unwrap();
        let (outcome, _) = state.settle_draw(&ticket.draw_id).await.unwrap();

        let other = state
            .get_participants()
            .await
            .into_iter()
            .find(|p| p.squad != outcome.winner.squad)
            .unwrap();
        state
            .update_participant_squad(other.id, &other.squad)
            .await
            .unwrap();

        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.used_squads, vec![outcome.winner.squad.clone()]);
        assert_eq!(snapshot.spin_history.len(), 1);
    }

    #[tokio::test]
    async fn test_squad_edit_refused_while_drawing() {
        let state = seeded_state().await;
        let ticket = state.begin_draw().await.unwrap();
        let member = ticket.candidates[0].id;
        let mut rx = state.broadcast.subscribe();

        assert_eq!(
            state.update_participant_squad(member, "7").await.unwrap_err(),
            DrawError::DrawInProgress
        );
        assert!(rx.try_recv().is_err());

        let (outcome, snapshot) = state.settle_draw(&ticket.draw_id).await.unwrap();
        assert_eq!(outcome.winner.squad, ticket.target_squad);
        assert_eq!(snapshot.used_squads, vec![ticket.target_squad.clone()]);
        assert!(snapshot
            .participants
            .iter()
            .all(|p| p.squad != ticket.target_squad));

        // Allowed again once the round has settled
        state.update_participant_squad(member, "7").await.unwrap();
    }

    #[tokio::test]
    async fn test_update_unknown_participant() {
        let state = seeded_state().await;
        assert_eq!(
            state.update_participant_squad(99, "1").await.unwrap_err(),
            DrawError::NotFound(99)
        );
    }

    #[tokio::test]
    async fn test_remove_unknown_participant_succeeds() {
        let state = seeded_state().await;
        let participants = state.remove_participant(99).await.unwrap();
        assert_eq!(participants.len(), 5);
    }

    #[tokio::test]
    async fn test_redistribute_respects_ceiling() {
        let state = AppState::with_roster(
            WheelConfig {
                max_squads: 3,
                ..WheelConfig::default()
            },
            Roster::default(),
        );
        state
            .replace_roster(&[
                record("A", "1"),
                record("B", "1"),
                record("C", "1"),
                record("D", "1"),
            ])
            .await
            .unwrap();

        assert_eq!(state.possible_squad_counts().await, vec![1, 2, 3]);
        assert!(state.redistribute_squads(4).await.is_err());

        let participants = state.redistribute_squads(3).await.unwrap();
        assert_eq!(participants.len(), 4);
        assert_eq!(state.available_squads().await, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_reset_after_draws() {
        let state = seeded_state().await;
        for _ in 0..2 {
            let ticket = state.begin_draw().await.unwrap();
            state.settle_draw(&ticket.draw_id).await.unwrap();
        }
        assert!(state.eligible_participants().await.len() < 5);

        state.reset_draw().await;
        state.reset_draw().await;
        let snapshot = state.snapshot().await;
        assert!(snapshot.used_squads.is_empty());
        assert_eq!(snapshot.participants.len(), 5);
        assert!(snapshot.spin_history.is_empty());
    }
}
