//! Integration tests for resonote-server API endpoints
//!
//! Tests cover:
//! - GET /api/tags and /api/tracks (verbatim documents, 500 on failure)
//! - POST /api/annotate (validation, persistence, index bookkeeping)
//! - GET /api/annotation/:trackId (round trip, null when absent)
//! - Static file fallback and health endpoint

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use resonote_server::{build_router, config, AppState, DataLayout};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

struct TestServer {
    data: TempDir,
    public: TempDir,
}

impl TestServer {
    /// Data root with a small vocabulary and corpus, initialized annotations dir
    async fn new() -> Self {
        let server = Self::empty().await;
        server.write_tags(&json!({
            "Emotional_Tone": ["joyful", "melancholic"],
            "Thematic_Content": ["love", "loss"],
            "Narrative_Structure": ["linear"],
            "Lyrical_Style": ["rhyming"]
        }));
        server.write_tracks(&json!([
            {"track_id": "t1", "track_name": "One", "artist_name": "A", "lyrics": "first"},
            {"track_id": "t2", "track_name": "Two", "artist_name": "B", "lyrics": ""}
        ]));
        server
    }

    /// Data root with no documents at all
    async fn empty() -> Self {
        let server = Self {
            data: TempDir::new().unwrap(),
            public: TempDir::new().unwrap(),
        };
        server.state().annotations.initialize().await.unwrap();
        server
    }

    fn state(&self) -> AppState {
        AppState::new(DataLayout::new(self.data.path()), self.public.path())
    }

    fn app(&self) -> axum::Router {
        build_router(self.state())
    }

    fn write_tags(&self, tags: &Value) {
        std::fs::write(self.data.path().join(config::TAGS_FILE), tags.to_string()).unwrap();
    }

    fn write_tracks(&self, tracks: &Value) {
        std::fs::write(self.data.path().join(config::TRACKS_FILE), tracks.to_string()).unwrap();
    }

    fn read_index(&self) -> Value {
        let raw = std::fs::read_to_string(self.data.path().join("annotations/_index.json")).unwrap();
        serde_json::from_str(&raw).unwrap()
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_tags_served_verbatim() {
    let server = TestServer::new().await;

    let response = server.app().oneshot(get("/api/tags")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["Emotional_Tone"], json!(["joyful", "melancholic"]));
    assert_eq!(body["Lyrical_Style"], json!(["rhyming"]));
}

#[tokio::test]
async fn test_tracks_include_ineligible_entries() {
    let server = TestServer::new().await;

    let response = server.app().oneshot(get("/api/tracks")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_empty_corpus_returns_empty_array() {
    let server = TestServer::new().await;
    server.write_tracks(&json!([]));

    let response = server.app().oneshot(get("/api/tracks")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response.into_body()).await, json!([]));
}

#[tokio::test]
async fn test_missing_documents_return_500() {
    let server = TestServer::empty().await;

    let response = server.app().oneshot(get("/api/tags")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Failed to load tags");

    std::fs::write(server.data.path().join(config::TRACKS_FILE), "not json").unwrap();
    let response = server.app().oneshot(get("/api/tracks")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Failed to load tracks");
}

#[tokio::test]
async fn test_documents_reloaded_per_request() {
    let server = TestServer::new().await;
    let app = server.app();

    server.write_tags(&json!({"Emotional_Tone": ["calm"]}));
    let response = app.oneshot(get("/api/tags")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body, json!({"Emotional_Tone": ["calm"]}));
}

// =============================================================================
// Annotate
// =============================================================================

#[tokio::test]
async fn test_annotate_persists_record_and_index() {
    let server = TestServer::new().await;

    let payload = json!({
        "track_id": "t1",
        "selections": {"Emotional_Tone": ["joyful"], "Thematic_Content": []}
    });
    let response = server.app().oneshot(post_json("/api/annotate", &payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response.into_body()).await, json!({"ok": true}));

    let index = server.read_index();
    assert_eq!(index["total"], 1);
    assert_eq!(index["by_track"]["t1"]["path"], "annotations/t1.json");
    assert!(index["by_track"]["t1"]["saved_at"].is_string());
}

#[tokio::test]
async fn test_annotate_missing_fields_is_400() {
    let server = TestServer::new().await;

    for payload in [
        json!({"selections": {"Emotional_Tone": ["joyful"]}}),
        json!({"track_id": "t1"}),
        json!({"track_id": "", "selections": {}}),
        json!({"track_id": null, "selections": {}}),
        json!({"track_id": ["t1"], "selections": {}}),
    ] {
        let response = server.app().oneshot(post_json("/api/annotate", &payload)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "payload: {}", payload);
        let body = extract_json(response.into_body()).await;
        assert_eq!(body["error"], "track_id and selections required");
    }

    assert_eq!(server.read_index()["total"], 0);
}

#[tokio::test]
async fn test_annotate_accepts_numeric_track_id() {
    let server = TestServer::new().await;

    let payload = json!({"track_id": 1042, "selections": {"Lyrical_Style": ["rhyming"]}});
    let response = server.app().oneshot(post_json("/api/annotate", &payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let raw = std::fs::read_to_string(server.data.path().join("annotations/1042.json")).unwrap();
    let record: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(record["track_id"], "1042");
    assert_eq!(server.read_index()["by_track"]["1042"]["path"], "annotations/1042.json");

    let response = server.app().oneshot(get("/api/annotation/1042")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["selections"]["Lyrical_Style"][0], "rhyming");
}

#[tokio::test]
async fn test_annotate_malformed_body_is_400() {
    let server = TestServer::new().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/annotate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"track_id\": "))
        .unwrap();
    let response = server.app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_annotate_rejects_path_like_track_id() {
    let server = TestServer::new().await;

    let payload = json!({"track_id": "../escape", "selections": {"Emotional_Tone": ["joyful"]}});
    let response = server.app().oneshot(post_json("/api/annotate", &payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!server.data.path().join("escape.json").exists());
}

#[tokio::test]
async fn test_resave_keeps_total_and_overwrites_record() {
    let server = TestServer::new().await;

    let first = json!({"track_id": "t1", "selections": {"Emotional_Tone": ["joyful"]}});
    let second = json!({"track_id": "t1", "selections": {"Emotional_Tone": ["melancholic"]}});
    for payload in [&first, &second] {
        let response = server.app().oneshot(post_json("/api/annotate", payload)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(server.read_index()["total"], 1);

    let response = server.app().oneshot(get("/api/annotation/t1")).await.unwrap();
    let record = extract_json(response.into_body()).await;
    assert_eq!(record["selections"], second["selections"]);
}

#[tokio::test]
async fn test_two_tracks_give_total_two() {
    let server = TestServer::new().await;

    for id in ["t1", "t3"] {
        let payload = json!({"track_id": id, "selections": {"Lyrical_Style": ["rhyming"]}});
        let response = server.app().oneshot(post_json("/api/annotate", &payload)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let index = server.read_index();
    assert_eq!(index["total"], 2);
    assert!(server.data.path().join("annotations/t1.json").exists());
    assert!(server.data.path().join("annotations/t3.json").exists());
}

// =============================================================================
// Read back
// =============================================================================

#[tokio::test]
async fn test_annotation_round_trip() {
    let server = TestServer::new().await;

    let selections = json!({
        "Emotional_Tone": ["joyful", "melancholic"],
        "Narrative_Structure": ["linear"]
    });
    let payload = json!({"track_id": "t1", "selections": selections});
    server.app().oneshot(post_json("/api/annotate", &payload)).await.unwrap();

    let response = server.app().oneshot(get("/api/annotation/t1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let record = extract_json(response.into_body()).await;
    assert_eq!(record["track_id"], "t1");
    assert_eq!(record["selections"], selections);
    assert!(record["saved_at"].is_string());
}

#[tokio::test]
async fn test_unknown_annotation_is_null() {
    let server = TestServer::new().await;

    let response = server.app().oneshot(get("/api/annotation/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response.into_body()).await, Value::Null);
}

#[tokio::test]
async fn test_corrupt_record_is_500() {
    let server = TestServer::new().await;
    std::fs::write(server.data.path().join("annotations/bad.json"), "{{").unwrap();

    let response = server.app().oneshot(get("/api/annotation/bad")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Failed to read annotation");
}

// =============================================================================
// Static files and health
// =============================================================================

#[tokio::test]
async fn test_static_files_served_from_public_root() {
    let server = TestServer::new().await;
    std::fs::write(server.public.path().join("index.html"), "<h1>resonote</h1>").unwrap();

    let response = server.app().oneshot(get("/index.html")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<h1>resonote</h1>");

    let response = server.app().oneshot(get("/missing.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = TestServer::new().await;

    let response = server.app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "resonote-server");
    assert!(body["build"].is_string());
    assert!(body["uptime_seconds"].is_number());
    assert_eq!(body["data"]["tags_present"], true);
    assert_eq!(body["data"]["tracks_present"], true);
    assert_eq!(body["data"]["annotations"], 0);
}

#[tokio::test]
async fn test_health_degraded_without_documents() {
    let server = TestServer::empty().await;

    let response = server.app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["data"]["tags_present"], false);
    assert_eq!(body["data"]["annotations"], 0);
}

#[tokio::test]
async fn test_health_counts_saved_annotations() {
    let server = TestServer::new().await;
    let app = server.app();

    let body = json!({"track_id": "t1", "selections": {"Emotional_Tone": ["joyful"]}});
    let response = app.clone().oneshot(post_json("/api/annotate", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/health")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["annotations"], 1);
}
