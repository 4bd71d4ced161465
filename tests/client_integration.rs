use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use actix_web::{http::StatusCode, web, App, HttpRequest, HttpResponse, HttpServer};
use megaverse::api::{MegaverseApi, MegaverseClient, RetryPolicy};
use megaverse::config::Config;
use megaverse::error::ApiError;
use megaverse::logic::service::MegaverseService;
use megaverse::models::object::ObjectKind;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const CANDIDATE: &str = "candidate-1";
const API_KEY: &str = "api-key";

#[derive(Debug, Clone)]
struct RecordedRequest {
    method: String,
    path: String,
    authorization: Option<String>,
    body: Option<serde_json::Value>,
}

/// Fake megaverse service: records requests and replays scripted failure statuses.
#[derive(Default)]
struct FakeState {
    requests: Mutex<Vec<RecordedRequest>>,
    scripted: Mutex<VecDeque<u16>>,
}

impl FakeState {
    fn script(&self, statuses: &[u16]) {
        self.scripted.lock().unwrap().extend(statuses.iter().copied());
    }

    fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn handle(req: HttpRequest, body: web::Bytes, state: web::Data<FakeState>) -> HttpResponse {
    state.requests.lock().unwrap().push(RecordedRequest {
        method: req.method().to_string(),
        path: req.path().to_string(),
        authorization: req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body: serde_json::from_slice(&body).ok(),
    });

    let scripted = state.scripted.lock().unwrap().pop_front();
    if let Some(status) = scripted {
        let status = StatusCode::from_u16(status).unwrap();
        return HttpResponse::build(status).json(json!({ "error": "scripted failure" }));
    }

    match req.path() {
        "/map/candidate-1" => HttpResponse::Ok().json(json!({
            "map": {
                "_id": "abc",
                "content": [[null, { "type": 0 }], [{ "type": 1, "color": "blue" }, null]]
            }
        })),
        "/map/candidate-1/goal" => HttpResponse::Ok().json(json!({
            "goal": [["SPACE", "POLYANET"], ["BLUE_SOLOON", "SPACE"]]
        })),
        "/map/garbled/goal" => HttpResponse::Ok().body("<html>not json</html>"),
        _ => HttpResponse::Ok().json(json!({})),
    }
}

async fn start_fake() -> (web::Data<FakeState>, String) {
    let state = web::Data::new(FakeState::default());
    let app_state = state.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .default_service(web::to(handle))
    })
    .workers(1)
    .disable_signals()
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    (state, format!("http://{addr}/"))
}

fn client(base_url: &str, candidate: &str) -> MegaverseClient {
    let config = Config::new(base_url, API_KEY, candidate)
        .with_retry(RetryPolicy::new(5, Duration::from_millis(1)));
    MegaverseClient::new(config).unwrap()
}

// ---------------------------------------------------------------------------
// Placement and removal bodies
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_place_polyanet_posts_body_with_bearer_auth() {
    let (state, base) = start_fake().await;
    client(&base, CANDIDATE).place_polyanet(1, 2).await.unwrap();

    let requests = state.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/polyanets");
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer api-key"));
    assert_eq!(
        requests[0].body,
        Some(json!({ "row": 1, "column": 2, "candidateId": "candidate-1" }))
    );
}

#[actix_web::test]
async fn test_place_soloon_lowercases_color() {
    let (state, base) = start_fake().await;
    client(&base, CANDIDATE)
        .place_soloon(3, 4, "BLUE")
        .await
        .unwrap();

    let requests = state.requests();
    assert_eq!(requests[0].path, "/soloons");
    assert_eq!(
        requests[0].body,
        Some(json!({ "row": 3, "column": 4, "color": "blue", "candidateId": "candidate-1" }))
    );
}

#[actix_web::test]
async fn test_place_cometh_lowercases_direction() {
    let (state, base) = start_fake().await;
    client(&base, CANDIDATE).place_cometh(5, 6, "UP").await.unwrap();

    let requests = state.requests();
    assert_eq!(requests[0].path, "/comeths");
    assert_eq!(
        requests[0].body,
        Some(json!({ "row": 5, "column": 6, "direction": "up", "candidateId": "candidate-1" }))
    );
}

#[actix_web::test]
async fn test_removals_send_delete_with_body() {
    let (state, base) = start_fake().await;
    let client = client(&base, CANDIDATE);
    client.remove_polyanet(1, 2).await.unwrap();
    client.remove_soloon(3, 4).await.unwrap();
    client.remove_cometh(5, 6).await.unwrap();

    let requests = state.requests();
    let paths: Vec<&str> = requests.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["/polyanets", "/soloons", "/comeths"]);
    assert!(requests.iter().all(|r| r.method == "DELETE"));
    assert_eq!(
        requests[1].body,
        Some(json!({ "row": 3, "column": 4, "candidateId": "candidate-1" }))
    );
}

// ---------------------------------------------------------------------------
// Grid fetching
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_current_map_is_fetched_by_candidate_id() {
    let (state, base) = start_fake().await;
    let map = client(&base, CANDIDATE).current_map().await.unwrap();

    assert_eq!(state.requests()[0].method, "GET");
    assert_eq!(state.requests()[0].path, "/map/candidate-1");
    let content = map.content().unwrap();
    assert_eq!(content.len(), 2);
    assert_eq!(content[0][1].as_ref().map(|c| c.kind), Some(0));
}

#[actix_web::test]
async fn test_goal_map_is_fetched_by_candidate_id() {
    let (state, base) = start_fake().await;
    let goal = client(&base, CANDIDATE).goal_map().await.unwrap();

    assert_eq!(state.requests()[0].path, "/map/candidate-1/goal");
    let labels = goal.goal.unwrap();
    assert_eq!(labels[1][0].as_deref(), Some("BLUE_SOLOON"));
}

#[actix_web::test]
async fn test_undecodable_body_is_a_decode_error() {
    let (_state, base) = start_fake().await;
    let err = client(&base, "garbled").goal_map().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode { .. }), "got {err:?}");
    assert_eq!(err.operation(), "fetch goal grid");
}

// ---------------------------------------------------------------------------
// Retry behaviour over HTTP
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_retries_on_429_and_500() {
    let (state, base) = start_fake().await;
    state.script(&[429, 500]);

    client(&base, CANDIDATE).place_polyanet(1, 2).await.unwrap();

    assert_eq!(state.requests().len(), 3);
}

#[actix_web::test]
async fn test_not_found_is_not_retried() {
    let (state, base) = start_fake().await;
    state.script(&[404]);

    let err = client(&base, CANDIDATE)
        .remove(ObjectKind::Soloon, megaverse::models::Coordinate::new(3, 4))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert_eq!(err.operation(), "remove soloon at (3, 4)");
    assert_eq!(state.requests().len(), 1);
}

#[actix_web::test]
async fn test_retry_ceiling_propagates_failure() {
    let (state, base) = start_fake().await;
    state.script(&[500, 500, 500, 500]);
    let config = Config::new(&base, API_KEY, CANDIDATE)
        .with_retry(RetryPolicy::new(2, Duration::from_millis(1)));
    let client = MegaverseClient::new(config).unwrap();

    let err = client.place_polyanet(0, 0).await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(state.requests().len(), 3);
}

#[actix_web::test]
async fn test_unreachable_server_fails_without_retrying() {
    let config = Config::new("http://127.0.0.1:1", API_KEY, CANDIDATE)
        .with_retry(RetryPolicy::new(5, Duration::from_millis(300)));
    let client = MegaverseClient::new(config).unwrap();

    let started = Instant::now();
    let err = client.place_polyanet(2, 3).await.unwrap_err();

    assert!(matches!(err, ApiError::Transport { .. }), "got {err:?}");
    assert_eq!(err.operation(), "place polyanet at (2, 3)");
    assert!(
        started.elapsed() < Duration::from_millis(300),
        "no backoff may be waited out, took {:?}",
        started.elapsed()
    );
}

/// Raw server whose first answer is a 500 with a truncated body, then a valid goal.
async fn start_truncating_server() -> (Arc<AtomicUsize>, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepted);
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(read) => request.extend_from_slice(&buf[..read]),
                }
            }
            let response = if n == 0 {
                "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 64\r\nconnection: close\r\n\r\npartial".to_string()
            } else {
                let body = r#"{"goal":[["POLYANET"]]}"#;
                format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                )
            };
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });
    (accepted, format!("http://{addr}"))
}

#[tokio::test]
async fn test_server_fault_with_unreadable_body_is_still_retried() {
    let (accepted, base) = start_truncating_server().await;

    let goal = client(&base, CANDIDATE).goal_map().await.unwrap();

    assert_eq!(goal.goal.unwrap()[0][0].as_deref(), Some("POLYANET"));
    assert_eq!(accepted.load(Ordering::SeqCst), 2);
}

// ---------------------------------------------------------------------------
// Service over HTTP
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_validate_over_http() {
    let (_state, base) = start_fake().await;
    let service = MegaverseService::new(Arc::new(client(&base, CANDIDATE)));

    let report = service.validate().await.unwrap();

    assert!(report.matches, "mismatches: {:?}", report.mismatches);
}
