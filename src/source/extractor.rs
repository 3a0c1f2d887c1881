//! Match extraction: tournament records -> canonical players and win/loss edges

use crate::error::{RankingError, Result};
use crate::roster::AliasTable;
use crate::source::provider::TournamentSource;
use crate::types::{ExtractedTournament, MatchEdge, ParticipantId, PlayerId, TournamentData};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Turns fetched tournament data into alias-resolved edges
#[derive(Debug, Clone, Default)]
pub struct MatchExtractor {
    aliases: AliasTable,
}

impl MatchExtractor {
    pub fn new(aliases: AliasTable) -> Self {
        Self { aliases }
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Extract canonical players and ordered edges from `data`
    ///
    /// Matches without a winner or loser (byes, pending games) are skipped.
    /// A match naming a participant id missing from the participant list makes
    /// the whole tournament invalid.
    pub fn extract(&self, tournament: &str, data: &TournamentData) -> Result<ExtractedTournament> {
        let mut by_id: HashMap<ParticipantId, PlayerId> =
            HashMap::with_capacity(data.participants.len());
        let mut players: Vec<PlayerId> = Vec::with_capacity(data.participants.len());

        for participant in &data.participants {
            let canonical = self.aliases.resolve(&participant.name);
            if !players.contains(&canonical) {
                players.push(canonical.clone());
            }
            by_id.insert(participant.id, canonical);
        }

        let lookup = |id: ParticipantId, match_id: u64| -> Result<PlayerId> {
            by_id.get(&id).cloned().ok_or_else(|| {
                RankingError::InvalidTournamentData {
                    tournament: tournament.to_string(),
                    reason: format!("match {} references unknown participant {}", match_id, id),
                }
                .into()
            })
        };

        let mut edges = Vec::with_capacity(data.matches.len());
        let mut skipped = 0usize;
        for record in &data.matches {
            let (winner_id, loser_id) = match (record.winner_id, record.loser_id) {
                (Some(winner), Some(loser)) => (winner, loser),
                _ => {
                    skipped += 1;
                    continue;
                }
            };

            let winner = lookup(winner_id, record.id)?;
            let loser = lookup(loser_id, record.id)?;
            if winner == loser {
                warn!(
                    "Match {} in '{}' resolves to '{}' on both sides, skipping",
                    record.id, tournament, winner
                );
                skipped += 1;
                continue;
            }

            edges.push(MatchEdge { winner, loser });
        }

        debug!(
            "Extracted '{}': {} players, {} edges, {} matches skipped",
            tournament,
            players.len(),
            edges.len(),
            skipped
        );

        Ok(ExtractedTournament { players, edges })
    }

    /// Fetch `tournament` from `source` and extract it
    pub async fn extract_from<S: TournamentSource + ?Sized>(
        &self,
        source: &S,
        tournament: &str,
    ) -> Result<ExtractedTournament> {
        let data = source.fetch_tournament(tournament).await?;
        self.extract(tournament, &data)
    }
}
