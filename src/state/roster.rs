use super::{AppState, Board};
use crate::error::{DrawError, DrawResult};
use crate::types::*;
use std::cmp::Ordering;

/// Canonical participant list. Squads are derived from it, never stored.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    participants: Vec<Participant>,
}

/// Validated, trimmed record ready to receive an id
#[derive(Debug, Clone)]
struct CleanRecord {
    last_name: String,
    first_name: String,
    middle_name: String,
    squad: SquadLabel,
}

impl CleanRecord {
    fn into_participant(self, id: ParticipantId) -> Participant {
        Participant {
            id,
            last_name: self.last_name,
            first_name: self.first_name,
            middle_name: self.middle_name,
            squad: self.squad,
        }
    }
}

fn clean_record(record: &ParticipantRecord, position: usize) -> DrawResult<CleanRecord> {
    let field = |value: &str, name: &str| -> DrawResult<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Err(DrawError::validation(format!(
                "Record {}: {} is required",
                position + 1,
                name
            )))
        } else {
            Ok(trimmed.to_string())
        }
    };

    let squad = record
        .squad
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SQUAD)
        .to_string();

    Ok(CleanRecord {
        last_name: field(&record.last_name, "last name")?,
        first_name: field(&record.first_name, "first name")?,
        middle_name: field(&record.middle_name, "middle name")?,
        squad,
    })
}

fn clean_records(records: &[ParticipantRecord]) -> DrawResult<Vec<CleanRecord>> {
    if records.is_empty() {
        return Err(DrawError::validation("No participant records provided"));
    }
    records
        .iter()
        .enumerate()
        .map(|(i, r)| clean_record(r, i))
        .collect()
}

/// Order squad labels numerically when both are numbers, otherwise textually.
/// Numeric labels sort before non-numeric ones.
pub fn compare_squads(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Every redistribution size on offer: `1..=min(max_allowed, total)`
pub fn possible_squad_counts(total_participants: usize, max_allowed: usize) -> Vec<usize> {
    (1..=max_allowed.min(total_participants)).collect()
}

/// Roster a fresh server starts with, so the wheel is never blank
const DEMO_ROSTER: [(&str, &str, &str, &str); 5] = [
    ("Иванов", "Иван", "Иванович", "1"),
    ("Петров", "Петр", "Петрович", "2"),
    ("Сидоров", "Алексей", "Николаевич", "1"),
    ("Кузнецова", "Мария", "Сергеевна", "3"),
    ("Смирнов", "Дмитрий", "Владимирович", "2"),
];

impl Roster {
    pub fn new(participants: Vec<Participant>) -> Self {
        Self { participants }
    }

    pub fn demo() -> Self {
        let participants = DEMO_ROSTER
            .iter()
            .zip(1..)
            .map(|(&(last, first, middle, squad), id)| Participant {
                id,
                last_name: last.to_string(),
                first_name: first.to_string(),
                middle_name: middle.to_string(),
                squad: squad.to_string(),
            })
            .collect();
        Self { participants }
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    fn next_id(&self) -> ParticipantId {
        self.participants.iter().map(|p| p.id).max().unwrap_or(0) + 1
    }

    /// Distinct squad labels, in squad order
    pub fn squads(&self) -> Vec<SquadLabel> {
        let mut squads: Vec<SquadLabel> = self.participants.iter().map(|p| p.squad.clone()).collect();
        squads.sort_by(|a, b| compare_squads(a, b));
        squads.dedup();
        squads
    }

    pub fn has_squad(&self, squad: &str) -> bool {
        self.participants.iter().any(|p| p.squad == squad)
    }

    pub fn members_of(&self, squad: &str) -> Vec<Participant> {
        self.participants
            .iter()
            .filter(|p| p.squad == squad)
            .cloned()
            .collect()
    }

    /// Replace the whole roster, numbering from 1
    pub fn replace(&mut self, records: &[ParticipantRecord]) -> DrawResult<()> {
        let cleaned = clean_records(records)?;
        self.participants = cleaned
            .into_iter()
            .zip(1..)
            .map(|(r, id)| r.into_participant(id))
            .collect();
        Ok(())
    }

    /// Append records, numbering from the current maximum id
    pub fn append(&mut self, records: &[ParticipantRecord]) -> DrawResult<usize> {
        let cleaned = clean_records(records)?;
        let added = cleaned.len();
        let start = self.next_id();
        self.participants.extend(
            cleaned
                .into_iter()
                .zip(start..)
                .map(|(r, id)| r.into_participant(id)),
        );
        Ok(added)
    }

    pub fn add(&mut self, record: &ParticipantRecord) -> DrawResult<Participant> {
        let participant = clean_record(record, 0)?.into_participant(self.next_id());
        self.participants.push(participant.clone());
        Ok(participant)
    }

    /// Returns whether a participant was removed
    pub fn remove(&mut self, id: ParticipantId) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| p.id != id);
        self.participants.len() != before
    }

    pub fn update_squad(&mut self, id: ParticipantId, squad: &str) -> DrawResult<Participant> {
        let squad = squad.trim();
        if squad.is_empty() {
            return Err(DrawError::validation("New squad must not be empty"));
        }
        let participant = self
            .participants
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(DrawError::NotFound(id))?;
        participant.squad = squad.to_string();
        Ok(participant.clone())
    }

    pub(super) fn set_participants(&mut self, participants: Vec<Participant>) {
        self.participants = participants;
    }
}

impl Board {
    /// Relabel one participant without starting a new round.
    ///
    /// Refused while a round is drawing, since its target squad must stay
    /// on the roster until settlement.
    pub fn move_participant(
        &mut self,
        id: ParticipantId,
        squad: &str,
    ) -> DrawResult<Participant> {
        if self.draw.current().is_some() {
            return Err(DrawError::DrawInProgress);
        }
        let participant = self.roster.update_squad(id, squad)?;
        self.prune_used_squads();
        Ok(participant)
    }
}

impl AppState {
    /// Full roster, including participants of already drawn squads
    pub async fn get_participants(&self) -> Vec<Participant> {
        self.board.read().await.roster.participants().to_vec()
    }

    pub async fn possible_squad_counts(&self) -> Vec<usize> {
        let total = self.board.read().await.roster.len();
        possible_squad_counts(total, self.config.max_squads)
    }

    /// Replace the roster with imported records
    pub async fn replace_roster(
        &self,
        records: &[ParticipantRecord],
    ) -> DrawResult<Vec<Participant>> {
        self.mutate_and_reset(|board| board.roster.replace(records))
            .await
            .map(|(_, participants)| participants)
    }

    /// Append imported records. Returns how many were added and the new roster.
    pub async fn append_roster(
        &self,
        records: &[ParticipantRecord],
    ) -> DrawResult<(usize, Vec<Participant>)> {
        self.mutate_and_reset(|board| board.roster.append(records))
            .await
    }

    pub async fn add_participant(&self, record: &ParticipantRecord) -> DrawResult<Participant> {
        self.mutate_and_reset(|board| board.roster.add(record))
            .await
            .map(|(participant, _)| participant)
    }

    /// Removing an unknown id is not an error
    pub async fn remove_participant(&self, id: ParticipantId) -> DrawResult<Vec<Participant>> {
        let (removed, participants) = self
            .mutate_and_reset(|board| Ok(board.roster.remove(id)))
            .await?;
        if !removed {
            tracing::debug!("Remove of unknown participant {} ignored", id);
        }
        Ok(participants)
    }

    /// Move one participant to another squad.
    ///
    /// A manual edit keeps used squads and history; it is not a new round.
    pub async fn update_participant_squad(
        &self,
        id: ParticipantId,
        squad: &str,
    ) -> DrawResult<Participant> {
        let mut board = self.board.write().await;
        let participant = board.move_participant(id, squad)?;
        let snapshot = board.snapshot();
        drop(board);

        tracing::info!("Participant {} moved to squad {}", id, participant.squad);
        self.broadcast_snapshot(snapshot);
        Ok(participant)
    }
}
