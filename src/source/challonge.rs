//! HTTP client for the Challonge v1 API
//!
//! Fetches tournament metadata, participants and matches, unwraps Challonge's
//! per-record envelopes and hands back validated `TournamentData`.

use crate::error::{RankingError, Result};
use crate::source::credentials::Credentials;
use crate::source::provider::TournamentSource;
use crate::types::{MatchRecord, Participant, TournamentData, TournamentInfo};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct TournamentEnvelope {
    tournament: ApiTournament,
}

#[derive(Debug, Deserialize)]
struct ApiTournament {
    id: u64,
    name: String,
    url: String,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ParticipantEnvelope {
    participant: ApiParticipant,
}

#[derive(Debug, Deserialize)]
struct ApiParticipant {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    /// Ids the participant plays under inside group stages
    #[serde(default)]
    group_player_ids: Vec<u64>,
}

#[derive(Debug, Deserialize)]
struct MatchEnvelope {
    #[serde(rename = "match")]
    record: ApiMatch,
}

#[derive(Debug, Deserialize)]
struct ApiMatch {
    id: u64,
    #[serde(default)]
    winner_id: Option<u64>,
    #[serde(default)]
    loser_id: Option<u64>,
}

/// Tournament source talking to the Challonge REST API
#[derive(Debug, Clone)]
pub struct ChallongeClient {
    client: Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl ChallongeClient {
    /// Create a client; without credentials every fetch fails
    pub fn new(
        base_url: impl Into<String>,
        credentials: Option<Credentials>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RankingError::ConfigurationError {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, tournament: &str, path: &str) -> Result<T> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| RankingError::fetch(tournament, "no API credentials configured"))?;

        let url = format!("{}/{}", self.base_url, path);
        debug!("Making API request to: {}", url);

        let response = self
            .client
            .get(&url)
            .basic_auth(&credentials.username, Some(&credentials.api_key))
            .send()
            .await
            .map_err(|e| RankingError::fetch(tournament, e))?;

        let status = response.status();
        debug!("API response status: {}", status);
        if !status.is_success() {
            return Err(
                RankingError::fetch(tournament, format!("{} returned HTTP {}", path, status)).into(),
            );
        }

        response.json::<T>().await.map_err(|e| {
            RankingError::fetch(tournament, format!("invalid payload from {}: {}", path, e)).into()
        })
    }
}

fn participant_name(tournament: &str, participant: &ApiParticipant) -> Result<String> {
    [&participant.name, &participant.display_name]
        .into_iter()
        .flatten()
        .map(|n| n.trim())
        .find(|n| !n.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            RankingError::InvalidTournamentData {
                tournament: tournament.to_string(),
                reason: format!("participant {} has no name", participant.id),
            }
            .into()
        })
}

#[async_trait]
impl TournamentSource for ChallongeClient {
    async fn fetch_tournament(&self, tournament: &str) -> Result<TournamentData> {
        let envelope: TournamentEnvelope = self
            .get_json(tournament, &format!("tournaments/{}.json", tournament))
            .await?;
        let info = envelope.tournament;

        let participants: Vec<ParticipantEnvelope> = self
            .get_json(
                tournament,
                &format!("tournaments/{}/participants.json", info.id),
            )
            .await?;
        let matches: Vec<MatchEnvelope> = self
            .get_json(tournament, &format!("tournaments/{}/matches.json", info.id))
            .await?;

        let mut flattened = Vec::with_capacity(participants.len());
        for ParticipantEnvelope { participant } in participants {
            let name = participant_name(tournament, &participant)?;
            // Group-stage matches refer to these ids instead of the participant id
            for group_id in &participant.group_player_ids {
                flattened.push(Participant {
                    id: *group_id,
                    name: name.clone(),
                });
            }
            flattened.push(Participant {
                id: participant.id,
                name,
            });
        }

        let matches: Vec<MatchRecord> = matches
            .into_iter()
            .map(|MatchEnvelope { record }| MatchRecord {
                id: record.id,
                winner_id: record.winner_id,
                loser_id: record.loser_id,
            })
            .collect();

        info!(
            "Fetched tournament '{}' ({}): {} participants, {} matches",
            tournament,
            info.name,
            flattened.len(),
            matches.len()
        );

        Ok(TournamentData {
            tournament: TournamentInfo {
                id: info.id,
                name: info.name,
                url: info.url,
                state: info.state,
            },
            participants: flattened,
            matches,
        })
    }
}
