//! Roster text import and export.
//!
//! The export format is one participant per line,
//! `lastName;firstName;middleName;squad`, without a header.

use super::{AppState, Roster};
use crate::types::*;
use chrono::NaiveDate;

const BOM: char = '\u{feff}';
const DELIMITERS: [char; 3] = [';', ',', '\t'];

impl Roster {
    pub fn to_csv(&self) -> String {
        self.participants()
            .iter()
            .map(|p| {
                format!(
                    "{};{};{};{}",
                    p.last_name, p.first_name, p.middle_name, p.squad
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("participants-export-{}.csv", date.format("%Y-%m-%d"))
}

/// Pick the delimiter for a file: `;` wins whenever it appears, otherwise
/// whichever of `,` and tab occurs most.
fn detect_delimiter(text: &str) -> char {
    DELIMITERS
        .iter()
        .copied()
        .map(|d| (d, text.matches(d).count()))
        .filter(|(_, count)| *count > 0)
        .max_by(|(da, a), (db, b)| {
            let a_semi = *da == ';';
            let b_semi = *db == ';';
            a_semi.cmp(&b_semi).then(a.cmp(b))
        })
        .map(|(d, _)| d)
        .unwrap_or(';')
}

fn unquote(field: &str) -> &str {
    field.trim().trim_matches('"').trim()
}

/// Parse uploaded roster text into records.
///
/// Lines with a missing name are skipped; a missing or blank squad falls
/// back to the default squad when the record reaches the roster.
pub fn parse_roster_text(text: &str) -> Vec<ParticipantRecord> {
    let text = text.trim_start_matches(BOM);
    let delimiter = detect_delimiter(text);

    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            // Columns past the fourth are ignored
            let mut fields = line.split(delimiter).map(unquote);
            let last_name = fields.next().unwrap_or_default();
            let first_name = fields.next().unwrap_or_default();
            let middle_name = fields.next().unwrap_or_default();
            let squad = fields.next().filter(|s| !s.is_empty());

            if [last_name, first_name, middle_name]
                .iter()
                .any(|f| f.is_empty())
            {
                tracing::debug!("Skipping incomplete roster line: {:?}", line);
                return None;
            }

            Some(ParticipantRecord {
                last_name: last_name.to_string(),
                first_name: first_name.to_string(),
                middle_name: middle_name.to_string(),
                squad: squad.map(str::to_string),
            })
        })
        .collect()
}

impl AppState {
    /// Current roster as export text
    pub async fn export_roster(&self) -> String {
        self.board.read().await.roster.to_csv()
    }
}
