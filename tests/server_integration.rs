//! Integration tests for the operator HTTP surface and the HTTP lookups.
//!
//! Each test spins up an Axum server on a random port and drives it with a
//! real reqwest client.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use contact_enrich::config::DirectoryConfig;
use contact_enrich::contacts::{CandidatePerson, ContactSeed, ContactStatus, PersonSummary};
use contact_enrich::error::{LookupError, OrchestratorError};
use contact_enrich::gate::OperatorDesk;
use contact_enrich::lookup::{
    DirectoryClient, EnrichmentLookup, EnrichmentOutcome, RemoteLookup,
};
use contact_enrich::orchestrator::{Orchestrator, OrchestratorState, RunOutcome};
use contact_enrich::server::operator_routes;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Lookup answering from a fixed table; unknown keys fail.
struct TableLookup;

#[async_trait]
impl EnrichmentLookup for TableLookup {
    fn name(&self) -> &str {
        "table"
    }

    async fn lookup(&self, key: &str) -> Result<EnrichmentOutcome, LookupError> {
        match key {
            "acme" => Ok(EnrichmentOutcome::Multiple(vec![
                candidate("Ada Lovelace", "CEO"),
                candidate("Alan Turing", "CTO"),
                candidate("Grace Hopper", "Founder"),
            ])),
            "globex" => Ok(EnrichmentOutcome::Single(PersonSummary {
                name: "Hank Scorpio".to_string(),
                title: Some("CEO".to_string()),
                location: None,
                profile_url: None,
            })),
            "initech" => Ok(EnrichmentOutcome::NotFound),
            other => Err(LookupError::Rejected {
                provider: "table".to_string(),
                message: format!("unknown company {other}"),
            }),
        }
    }
}

fn candidate(name: &str, title: &str) -> CandidatePerson {
    CandidatePerson {
        name: name.to_string(),
        title: Some(title.to_string()),
        location: None,
        profile_url: None,
        avatar_url: None,
    }
}

/// Serve `app` on a random port and return the port.
async fn serve(app: Router) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;
    port
}

type RunHandle = JoinHandle<(Result<RunOutcome, OrchestratorError>, OrchestratorState)>;

/// Start a run over `seeds` gated by an operator desk and serve its routes.
async fn start_run(seeds: Vec<ContactSeed>) -> (u16, Arc<OperatorDesk>, RunHandle) {
    let desk = OperatorDesk::new();
    let lookup: Arc<dyn EnrichmentLookup> = Arc::new(TableLookup);
    let mut orchestrator = Orchestrator::new(seeds, Arc::clone(&lookup), desk.clone());
    let port = serve(operator_routes(desk.clone(), orchestrator.watch(), lookup)).await;

    let handle = tokio::spawn(async move {
        let outcome = orchestrator.run().await;
        (outcome, orchestrator.into_state())
    });
    (port, desk, handle)
}

fn seeds() -> Vec<ContactSeed> {
    vec![
        ContactSeed::new("Jane Doe", "jane@acme.com"),
        ContactSeed::new("Hank", "hank@globex.com"),
        ContactSeed::new("Ivy", "ivy@initech.io"),
    ]
}

// ── Operator surface ─────────────────────────────────────────────────

#[tokio::test]
async fn health_endpoint() {
    timeout(TEST_TIMEOUT, async {
        let (port, _desk, _run) = start_run(vec![]).await;

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/health"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn selection_flow_over_http() {
    timeout(TEST_TIMEOUT, async {
        let (port, desk, run) = start_run(seeds()).await;
        let client = reqwest::Client::new();
        let base = format!("http://127.0.0.1:{port}");

        desk.next_request().await.unwrap();

        // Progress reflects the blocked first contact.
        let progress: Value = client
            .get(format!("{base}/api/progress"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(progress["phase"], "awaiting_selection");
        assert_eq!(progress["processedCount"], 0);
        assert_eq!(progress["totalCount"], 3);
        assert_eq!(progress["currentOrganizationKey"], "acme");
        assert!(progress["startedAt"].is_string());
        assert!(progress.get("completedAt").is_none());

        // The pending request lists the candidates in provider order.
        let pending: Value = client
            .get(format!("{base}/api/selection"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(pending["organizationKey"], "acme");
        assert_eq!(pending["contact"]["email"], "jane@acme.com");
        assert_eq!(pending["candidates"].as_array().unwrap().len(), 3);
        assert_eq!(pending["candidates"][1]["name"], "Alan Turing");
        let ticket = pending["ticket"].clone();

        // A ticket from some other run is refused.
        let foreign = json!({
            "ticket": {"runId": uuid::Uuid::new_v4(), "cursor": 0},
            "index": 0
        });
        let resp = client
            .post(format!("{base}/api/selection"))
            .json(&foreign)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        // Out-of-range index is refused and leaves the request pending.
        let resp = client
            .post(format!("{base}/api/selection"))
            .json(&json!({"ticket": ticket, "index": 3}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = client
            .post(format!("{base}/api/selection"))
            .json(&json!({"ticket": ticket, "index": 1}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let chosen: Value = resp.json().await.unwrap();
        assert_eq!(chosen["name"], "Alan Turing");

        let (outcome, state) = run.await.unwrap();
        assert_eq!(outcome.unwrap(), RunOutcome::Completed);

        let contacts = state.contacts();
        assert_eq!(contacts[0].summary.as_ref().unwrap().name, "Alan Turing");
        assert_eq!(contacts[0].status, ContactStatus::Selected);
        assert_eq!(contacts[1].summary.as_ref().unwrap().name, "Hank Scorpio");
        assert_eq!(contacts[2].status, ContactStatus::NotFound);

        // Nothing pending anymore.
        let resp = client
            .get(format!("{base}/api/selection"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let progress: Value = client
            .get(format!("{base}/api/progress"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(progress["phase"], "completed");
        assert_eq!(progress["progress"], 1.0);
        assert!(progress["completedAt"].is_string());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn abandon_suspends_the_run() {
    timeout(TEST_TIMEOUT, async {
        let (port, desk, run) = start_run(seeds()).await;
        let client = reqwest::Client::new();
        let base = format!("http://127.0.0.1:{port}");

        let request = desk.next_request().await.unwrap();

        let resp = client
            .post(format!("{base}/api/selection/abandon"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let (outcome, state) = run.await.unwrap();
        assert_eq!(outcome.unwrap(), RunOutcome::Suspended);
        assert_eq!(state.cursor(), 0);
        assert_eq!(state.pending().unwrap().ticket, request.ticket);

        // A late selection finds nothing to resolve.
        let resp = client
            .post(format!("{base}/api/selection"))
            .json(&json!({"ticket": request.ticket, "index": 0}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = client
            .post(format!("{base}/api/selection/abandon"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn selection_after_run_dropped_is_gone() {
    timeout(TEST_TIMEOUT, async {
        let (port, desk, run) = start_run(seeds()).await;
        let request = desk.next_request().await.unwrap();

        run.abort();
        let _ = run.await;

        let resp = reqwest::Client::new()
            .post(format!("http://127.0.0.1:{port}/api/selection"))
            .json(&json!({"ticket": request.ticket, "index": 0}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::GONE);
    })
    .await
    .expect("test timed out");
}

// ── Search service ───────────────────────────────────────────────────

#[tokio::test]
async fn remote_lookup_round_trips_through_search_endpoint() {
    timeout(TEST_TIMEOUT, async {
        let (port, _desk, _run) = start_run(vec![]).await;
        let remote =
            RemoteLookup::new(format!("http://127.0.0.1:{port}/api/search"), TEST_TIMEOUT)
                .unwrap();

        match remote.lookup("acme").await.unwrap() {
            EnrichmentOutcome::Multiple(candidates) => {
                let names: Vec<_> = candidates.iter().map(|c| c.name.as_str()).collect();
                assert_eq!(names, ["Ada Lovelace", "Alan Turing", "Grace Hopper"]);
            }
            other => panic!("expected multiple, got {other:?}"),
        }

        match remote.lookup("globex").await.unwrap() {
            EnrichmentOutcome::Single(person) => assert_eq!(person.name, "Hank Scorpio"),
            other => panic!("expected single, got {other:?}"),
        }

        assert_eq!(
            remote.lookup("initech").await.unwrap(),
            EnrichmentOutcome::NotFound
        );

        // Upstream failure comes back as an error reply, not NotFound.
        assert!(matches!(
            remote.lookup("umbrella").await,
            Err(LookupError::Rejected { .. })
        ));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn search_endpoint_wire_format() {
    timeout(TEST_TIMEOUT, async {
        let (port, _desk, _run) = start_run(vec![]).await;
        let client = reqwest::Client::new();
        let url = format!("http://127.0.0.1:{port}/api/search");

        let body: Value = client
            .post(&url)
            .json(&json!({"company": "initech"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, json!({"outcome": "not_found"}));

        let body: Value = client
            .post(&url)
            .json(&json!({"company": "umbrella"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["outcome"], "error");

        let resp = client
            .post(&url)
            .json(&json!({"company": "  "}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    })
    .await
    .expect("test timed out");
}

// ── Directory provider ───────────────────────────────────────────────

async fn people_search(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if headers.get("x-rapidapi-key").and_then(|v| v.to_str().ok()) != Some("test-key")
        || headers.get("x-rapidapi-host").and_then(|v| v.to_str().ok()) != Some("directory.test")
    {
        return (StatusCode::UNAUTHORIZED, "bad credentials").into_response();
    }
    assert_eq!(params.get("start").map(String::as_str), Some("0"));

    let body = match params.get("keywords").map(String::as_str) {
        Some("Acme") => json!({
            "success": true,
            "message": "",
            "data": {
                "total": 2,
                "items": [
                    {"fullName": "Ada Lovelace", "headline": "CEO at Acme", "location": "London",
                     "profileURL": "https://example.com/in/ada", "profilePicture": "https://example.com/ada.png"},
                    {"fullName": "Alan Turing", "headline": "CTO at Acme"}
                ]
            }
        }),
        Some("Solo") => json!({
            "success": true,
            "message": "",
            "data": {"total": 1, "items": [{"fullName": "Sam Solo", "headline": "Founder"}]}
        }),
        Some("Empty") => json!({"success": true, "message": "", "data": {"total": 0, "items": []}}),
        _ => json!({"success": false, "message": "quota exceeded"}),
    };
    axum::Json(body).into_response()
}

async fn directory_client(api_key: &str) -> DirectoryClient {
    let port = serve(Router::new().route("/search-people", get(people_search))).await;
    let config = DirectoryConfig {
        api_key: SecretString::from(api_key.to_string()),
        host: "directory.test".to_string(),
        base_url: format!("http://127.0.0.1:{port}"),
    };
    DirectoryClient::new(&config, TEST_TIMEOUT).unwrap()
}

#[tokio::test]
async fn directory_client_classifies_search_results() {
    timeout(TEST_TIMEOUT, async {
        let client = directory_client("test-key").await;

        match client.lookup("Acme").await.unwrap() {
            EnrichmentOutcome::Multiple(candidates) => {
                assert_eq!(candidates.len(), 2);
                assert_eq!(candidates[0].name, "Ada Lovelace");
                assert_eq!(candidates[0].title.as_deref(), Some("CEO at Acme"));
                assert_eq!(
                    candidates[0].avatar_url.as_deref(),
                    Some("https://example.com/ada.png")
                );
                assert_eq!(candidates[1].name, "Alan Turing");
            }
            other => panic!("expected multiple, got {other:?}"),
        }

        match client.lookup("Solo").await.unwrap() {
            EnrichmentOutcome::Single(person) => {
                assert_eq!(person.name, "Sam Solo");
                assert_eq!(person.title.as_deref(), Some("Founder"));
            }
            other => panic!("expected single, got {other:?}"),
        }

        assert_eq!(
            client.lookup("Empty").await.unwrap(),
            EnrichmentOutcome::NotFound
        );
        assert!(matches!(
            client.lookup("Nobody").await,
            Err(LookupError::Rejected { .. })
        ));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn directory_client_surfaces_http_status() {
    timeout(TEST_TIMEOUT, async {
        let client = directory_client("wrong-key").await;
        match client.lookup("Acme").await {
            Err(LookupError::Status { status, body, .. }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad credentials");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    })
    .await
    .expect("test timed out");
}
