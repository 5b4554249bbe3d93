use super::{AppState, Board};
use crate::error::{DrawError, DrawResult};
use crate::types::*;
use rand::seq::SliceRandom;
use rand::Rng;

/// Group sizes for `total` participants in `squads` groups.
///
/// The first `squads - 1` groups get `total / squads`; the last one also
/// takes the remainder.
pub fn partition_sizes(total: usize, squads: usize) -> Vec<usize> {
    if squads == 0 {
        return Vec::new();
    }
    let base = total / squads;
    let mut sizes = vec![base; squads];
    sizes[squads - 1] += total % squads;
    sizes
}

/// Shuffle participants uniformly and relabel them into squads `"1"..="K"`
pub fn redistribute<R: Rng + ?Sized>(
    participants: &[Participant],
    squads: usize,
    rng: &mut R,
) -> Vec<Participant> {
    let mut shuffled = participants.to_vec();
    shuffled.shuffle(rng);

    let mut offset = 0;
    for (index, size) in partition_sizes(shuffled.len(), squads).into_iter().enumerate() {
        let label = (index + 1).to_string();
        for participant in &mut shuffled[offset..offset + size] {
            participant.squad = label.clone();
        }
        offset += size;
    }
    shuffled
}

impl Board {
    /// Validate the requested squad count and redistribute the roster in place
    pub fn redistribute<R: Rng + ?Sized>(
        &mut self,
        squads: usize,
        max_squads: usize,
        rng: &mut R,
    ) -> DrawResult<Vec<Participant>> {
        let total = self.roster.len();
        if total == 0 {
            return Err(DrawError::validation("Roster is empty"));
        }
        let ceiling = max_squads.min(total);
        if squads == 0 || squads > ceiling {
            return Err(DrawError::validation(format!(
                "Squad count must be between 1 and {}",
                ceiling
            )));
        }

        let participants = redistribute(self.roster.participants(), squads, rng);
        self.roster.set_participants(participants.clone());
        Ok(participants)
    }
}

impl AppState {
    /// Reshuffle everyone into `squads` squads and start a fresh round
    pub async fn redistribute_squads(&self, squads: usize) -> DrawResult<Vec<Participant>> {
        let max_squads = self.config.max_squads;
        let (participants, _) = self
            .mutate_and_reset(|board| board.redistribute(squads, max_squads, &mut rand::rng()))
            .await?;
        tracing::info!(
            "Redistributed {} participants into {} squads",
            participants.len(),
            squads
        );
        Ok(participants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Roster;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn roster_of(n: usize) -> Vec<Participant> {
        (1..=n as u64)
            .map(|id| Participant {
                id,
                last_name: format!("L{}", id),
                first_name: format!("F{}", id),
                middle_name: format!("M{}", id),
                squad: "1".to_string(),
            })
            .collect()
    }

    fn sizes_by_label(participants: &[Participant], squads: usize) -> Vec<usize> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for p in participants {
            *counts.entry(p.squad.as_str()).or_default() += 1;
        }
        (1..=squads)
            .map(|k| counts.get(k.to_string().as_str()).copied().unwrap_or(0))
            .collect()
    }

    #[test]
    fn test_partition_sizes() {
        assert_eq!(partition_sizes(6, 4), vec![1, 1, 1, 3]);
        assert_eq!(partition_sizes(5, 2), vec![2, 3]);
        assert_eq!(partition_sizes(9, 3), vec![3, 3, 3]);
        assert_eq!(partition_sizes(4, 1), vec![4]);
        assert!(partition_sizes(4, 0).is_empty());
    }

    #[test]
    fn test_every_participant_assigned_once() {
        let mut rng = StdRng::seed_from_u64(42);
        for n in 1..=25 {
            let participants = roster_of(n);
            for k in 1..=n {
                let result = redistribute(&participants, k, &mut rng);
                assert_eq!(result.len(), n);

                let mut ids: Vec<_> = result.iter().map(|p| p.id).collect();
                ids.sort_unstable();
                assert_eq!(ids, (1..=n as u64).collect::<Vec<_>>());

                let sizes = sizes_by_label(&result, k);
                assert_eq!(sizes.iter().sum::<usize>(), n);
                assert_eq!(sizes, partition_sizes(n, k));
            }
        }
    }

    #[test]
    fn test_one_squad_and_one_per_squad() {
        let mut rng = StdRng::seed_from_u64(1);
        let participants = roster_of(5);

        let one = redistribute(&participants, 1, &mut rng);
        assert!(one.iter().all(|p| p.squad == "1"));

        let each = redistribute(&participants, 5, &mut rng);
        assert_eq!(sizes_by_label(&each, 5), vec![1; 5]);
    }

    #[test]
    fn test_shuffle_moves_people_around() {
        let participants = roster_of(8);
        let mut first_in_squad_one = std::collections::HashSet::new();
        for seed in 0..40 {
            let result = redistribute(&participants, 2, &mut StdRng::seed_from_u64(seed));
            first_in_squad_one.insert(result[0].id);
        }
        assert!(first_in_squad_one.len() > 1);
    }

    #[test]
    fn test_board_validates_squad_count() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut board = Board::new(Roster::new(roster_of(5)));

        assert!(board.redistribute(0, 10, &mut rng).is_err());
        assert!(board.redistribute(6, 10, &mut rng).is_err());
        assert!(board.redistribute(4, 3, &mut rng).is_err());
        assert!(board.roster.participants().iter().all(|p| p.squad == "1"));

        let result = board.redistribute(2, 10, &mut rng).unwrap();
        let mut sizes = sizes_by_label(&result, 2);
        sizes.sort_unstable();
        assert_eq!(sizes, vec![2, 3]);
        assert_eq!(board.roster.squads(), vec!["1", "2"]);
    }

    #[test]
    fn test_board_keeps_shuffled_order() {
        let mut board = Board::new(Roster::new(roster_of(12)));
        let result = board
            .redistribute(3, 10, &mut StdRng::seed_from_u64(21))
            .unwrap();

        assert_eq!(board.roster.participants(), result.as_slice());
        // Each squad is a contiguous run of the stored order
        let mut runs: Vec<&str> = result.iter().map(|p| p.squad.as_str()).collect();
        runs.dedup();
        assert_eq!(runs, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_empty_roster_cannot_be_redistributed() {
        let mut board = Board::default();
        assert!(matches!(
            board.redistribute(1, 10, &mut StdRng::seed_from_u64(0)),
            Err(DrawError::Validation(_))
        ));
    }
}
