//! Elimination engine
//!
//! Squads move one way from eligible to used. A draw round goes
//! `Idle -> Drawing -> Settled`; only one round can be drawing at a time.

use super::{AppState, Board};
use crate::error::{DrawError, DrawResult};
use crate::types::*;
use rand::Rng;

/// A round in flight. The candidate pool is the target squad's membership
/// at the moment the round began and stays fixed until settlement.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawTicket {
    pub draw_id: DrawId,
    pub target_squad: SquadLabel,
    pub candidates: Vec<Participant>,
}

impl DrawTicket {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &Participant {
        &self.candidates[rng.random_range(0..self.candidates.len())]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawOutcome {
    pub draw_id: DrawId,
    pub winner: Participant,
    pub entry: HistoryEntry,
}

#[derive(Debug, Clone)]
pub struct DrawState {
    /// In elimination order
    used_squads: Vec<SquadLabel>,
    /// Newest first
    history: Vec<HistoryEntry>,
    phase: DrawPhase,
    current: Option<DrawTicket>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            used_squads: Vec::new(),
            history: Vec::new(),
            phase: DrawPhase::Idle,
            current: None,
        }
    }
}

impl DrawState {
    pub fn used_squads(&self) -> &[SquadLabel] {
        &self.used_squads
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn phase(&self) -> DrawPhase {
        self.phase.clone()
    }

    pub fn current(&self) -> Option<&DrawTicket> {
        self.current.as_ref()
    }

    pub fn is_active(&self, draw_id: &str) -> bool {
        self.current.as_ref().is_some_and(|t| t.draw_id == draw_id)
    }

    pub fn is_used(&self, squad: &str) -> bool {
        self.used_squads.iter().any(|s| s == squad)
    }
}

impl Board {
    /// Squads present on the roster that have not been drawn yet
    pub fn available_squads(&self) -> Vec<SquadLabel> {
        self.roster
            .squads()
            .into_iter()
            .filter(|s| !self.draw.is_used(s))
            .collect()
    }

    pub fn eligible_participants(&self) -> Vec<Participant> {
        self.roster
            .participants()
            .iter()
            .filter(|p| !self.draw.is_used(&p.squad))
            .cloned()
            .collect()
    }

    /// Pick the target squad for a new round and freeze its candidate pool
    pub fn begin_draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> DrawResult<DrawTicket> {
        if self.draw.current.is_some() {
            return Err(DrawError::DrawInProgress);
        }
        let available = self.available_squads();
        if available.is_empty() {
            return Err(DrawError::NoCandidates);
        }

        let target_squad = available[rng.random_range(0..available.len())].clone();
        let ticket = DrawTicket {
            draw_id: ulid::Ulid::new().to_string(),
            candidates: self.roster.members_of(&target_squad),
            target_squad,
        };

        self.draw.current = Some(ticket.clone());
        self.draw.phase = DrawPhase::Drawing;
        Ok(ticket)
    }

    /// Commit the outcome of the round `draw_id`
    pub fn settle<R: Rng + ?Sized>(
        &mut self,
        draw_id: &str,
        rng: &mut R,
    ) -> DrawResult<DrawOutcome> {
        if !self.draw.is_active(draw_id) {
            return Err(DrawError::DrawCancelled);
        }
        let Some(ticket) = self.draw.current.take() else {
            return Err(DrawError::DrawCancelled);
        };

        // The pool is frozen, but the winner's label is whatever the roster
        // says now
        let sampled = ticket.sample(rng).clone();
        let winner = self.roster.get(sampled.id).cloned().unwrap_or(sampled);
        if !self.draw.is_used(&winner.squad) {
            self.draw.used_squads.push(winner.squad.clone());
        }
        self.prune_used_squads();

        let now = chrono::Local::now();
        let entry = HistoryEntry {
            winner: winner.clone(),
            timestamp: now.to_rfc3339(),
            time_label: now.format("%H:%M:%S").to_string(),
            remaining: self.available_squads().len(),
        };
        self.draw.history.insert(0, entry.clone());
        self.draw.phase = DrawPhase::Settled;

        Ok(DrawOutcome {
            draw_id: ticket.draw_id,
            winner,
            entry,
        })
    }

    /// Clear used squads and history. Returns the id of a round that was
    /// cancelled by the reset, if any.
    pub fn reset_draw(&mut self) -> Option<DrawId> {
        let cancelled = self.draw.current.take().map(|t| t.draw_id);
        self.draw.used_squads.clear();
        self.draw.history.clear();
        self.draw.phase = DrawPhase::Idle;
        cancelled
    }

    /// Drop used labels that no participant carries any more
    pub fn prune_used_squads(&mut self) {
        let roster = &self.roster;
        self.draw.used_squads.retain(|s| roster.has_squad(s));
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            participants: self.eligible_participants(),
            used_squads: self.draw.used_squads.clone(),
            spin_history: self.recent_history(),
            remaining_squads: self.available_squads().len(),
            phase: self.draw.phase(),
        }
    }

    pub fn recent_history(&self) -> Vec<HistoryEntry> {
        self.draw.history.iter().take(HISTORY_WINDOW).cloned().collect()
    }
}

impl AppState {
    pub async fn available_squads(&self) -> Vec<SquadLabel> {
        self.board.read().await.available_squads()
    }

    pub async fn eligible_participants(&self) -> Vec<Participant> {
        self.board.read().await.eligible_participants()
    }

    pub async fn used_squads(&self) -> Vec<SquadLabel> {
        self.board.read().await.draw.used_squads().to_vec()
    }

    pub async fn begin_draw(&self) -> DrawResult<DrawTicket> {
        let mut board = self.board.write().await;
        let ticket = board.begin_draw(&mut rand::rng())?;
        tracing::info!(
            "Draw {} started: squad {} with {} candidates",
            ticket.draw_id,
            ticket.target_squad,
            ticket.candidates.len()
        );
        Ok(ticket)
    }

    /// Settle a round and broadcast the new snapshot
    pub async fn settle_draw(&self, draw_id: &str) -> DrawResult<(DrawOutcome, Snapshot)> {
        let mut board = self.board.write().await;
        let outcome = board.settle(draw_id, &mut rand::rng())?;
        let snapshot = board.snapshot();
        drop(board);

        tracing::info!(
            "Draw {} settled: {} (squad {}), {} squads remaining",
            draw_id,
            outcome.winner.full_name(),
            outcome.winner.squad,
            outcome.entry.remaining
        );
        Ok((outcome, snapshot))
    }

    /// Restart the elimination: nothing used, everyone eligible, no history.
    /// Cancels a running spin.
    pub async fn reset_draw(&self) {
        let mut board = self.board.write().await;
        let cancelled = board.reset_draw();
        let snapshot = board.snapshot();
        drop(board);

        if let Some(draw_id) = cancelled {
            self.cancel_spin(&draw_id).await;
        }
        tracing::info!("Draw state reset");
        self.broadcast_snapshot(snapshot);
    }
}
