use crate::state::AppState;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Spawn a background task that re-broadcasts the full snapshot every
/// `broadcast_interval`, so clients that missed an event catch up.
pub fn spawn_snapshot_heartbeat(state: Arc<AppState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(state.config.broadcast_interval);
        // The first tick completes immediately; sessions already get a
        // snapshot in their welcome message.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            // Nobody listening, nothing to do
            if state.broadcast.receiver_count() == 0 {
                continue;
            }

            let snapshot = state.snapshot().await;
            tracing::trace!(
                "Heartbeat snapshot: {} eligible, {} squads remaining",
                snapshot.participants.len(),
                snapshot.remaining_squads
            );
            state.broadcast_snapshot(snapshot);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WheelConfig;
    use crate::protocol::ServerMessage;
    use crate::types::ParticipantRecord;
    use std::time::Duration;

    #[tokio::test]
    async fn test_heartbeat_rebroadcasts_snapshot() {
        let state = Arc::new(AppState::new(WheelConfig {
            broadcast_interval: Duration::from_millis(20),
            ..WheelConfig::default()
        }));
        state
            .replace_roster(&[ParticipantRecord::new("A", "B", "C", "1")])
            .await
            .unwrap();

        let mut rx = state.broadcast.subscribe();
        let handle = spawn_snapshot_heartbeat(state.clone());

        for _ in 0..2 {
            let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("no heartbeat")
                .unwrap();
            match msg {
                ServerMessage::Snapshot { snapshot } => {
                    assert_eq!(snapshot.participants.len(), 1);
                }
                other => panic!("Expected Snapshot, got {:?}", other),
            }
        }
        handle.abort();
    }
}
