//! HTTP-level tests for the Challonge client against a mock server

use bracket_rank::error::ranking_error;
use bracket_rank::source::{ChallongeClient, Credentials, TournamentSource};
use bracket_rank::RankingError;
use httpmock::prelude::*;
use serde_json::json;
use std::time::Duration;

const AUTH_HEADER: &str = "Basic b3JnYW5pemVyOmtleTEyMw==";

fn client(server: &MockServer) -> ChallongeClient {
    let credentials = Credentials::parse("organizer\nkey123\n").unwrap();
    ChallongeClient::new(server.base_url(), Some(credentials), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_fetch_unwraps_envelopes() {
    let server = MockServer::start_async().await;

    let tournament_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/tournaments/weekly-1.json")
                .header("authorization", AUTH_HEADER);
            then.status(200).json_body(json!({
                "tournament": {
                    "id": 4242,
                    "name": "Weekly #1",
                    "url": "weekly-1",
                    "state": "complete",
                    "game_name": "Super Smash Bros. for Wii U"
                }
            }));
        })
        .await;
    let participants_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/tournaments/4242/participants.json");
            then.status(200).json_body(json!([
                { "participant": { "id": 1, "name": "Alice", "group_player_ids": [11] } },
                { "participant": { "id": 2, "name": "", "display_name": "Bob" } }
            ]));
        })
        .await;
    let matches_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/tournaments/4242/matches.json");
            then.status(200).json_body(json!([
                { "match": { "id": 90, "winner_id": 11, "loser_id": 2, "round": 1 } },
                { "match": { "id": 91, "winner_id": null, "loser_id": null, "state": "open" } }
            ]));
        })
        .await;

    let data = client(&server).fetch_tournament("weekly-1").await.unwrap();

    tournament_mock.assert_async().await;
    participants_mock.assert_async().await;
    matches_mock.assert_async().await;

    assert_eq!(data.tournament.id, 4242);
    assert_eq!(data.tournament.state.as_deref(), Some("complete"));

    let participants: Vec<(u64, &str)> = data
        .participants
        .iter()
        .map(|p| (p.id, p.name.as_str()))
        .collect();
    assert_eq!(participants, vec![(11, "Alice"), (1, "Alice"), (2, "Bob")]);

    assert_eq!(data.matches.len(), 2);
    assert_eq!(data.matches[0].winner_id, Some(11));
    assert_eq!(data.matches[1].winner_id, None);
}

#[tokio::test]
async fn test_not_found_is_fetch_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/tournaments/missing.json");
            then.status(404).json_body(json!({ "errors": ["Requested tournament not found"] }));
        })
        .await;

    let err = client(&server).fetch_tournament("missing").await.unwrap_err();

    assert!(matches!(
        ranking_error(&err),
        Some(RankingError::FetchFailure { tournament, reason })
            if tournament == "missing" && reason.contains("404")
    ));
}

#[tokio::test]
async fn test_malformed_payload_is_fetch_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/tournaments/weekly-1.json");
            then.status(200).body("<html>maintenance</html>");
        })
        .await;

    let err = client(&server).fetch_tournament("weekly-1").await.unwrap_err();

    assert!(matches!(
        ranking_error(&err),
        Some(RankingError::FetchFailure { .. })
    ));
}
