use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

use event_directory::{
    api::create_router,
    app_state::AppState,
    config::{Config, DatabaseConfig, GeneratorConfig, ServerConfig},
    infrastructure::{local_generator_router, IdService, SqliteGraphStore},
};

const CDN: &str = "https://cdn.example.com";

async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn test_config(generator: &str) -> Config {
    Config {
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        generator: GeneratorConfig {
            uri: generator.to_string(),
            timeout_ms: 2000,
            listen_port: 0,
        },
        cdn_uri: CDN.to_string(),
    }
}

async fn app_with(generator: Router) -> Router {
    let base = spawn(generator).await;
    let store = SqliteGraphStore::new_in_memory().await.unwrap();
    let ids = IdService::new(CDN, &base, Duration::from_secs(2)).unwrap();

    create_router(AppState::from_parts(
        Arc::new(store),
        Arc::new(ids),
        test_config(&base),
    ))
}

async fn app() -> Router {
    app_with(local_generator_router()).await
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn venue_body(name: &str) -> Value {
    json!({
        "name": name,
        "latitude": 52.5112,
        "longitude": 13.4431,
        "country": "DEU",
        "municipality": "Berlin",
        "postcode": "10243",
        "address": "Am Wriezener Bahnhof",
        "avatar": "image-front",
        "highlights": [
            { "title": "VIP", "cover": "image-cover1", "videos": ["video-ab12"] }
        ],
        "type": "club"
    })
}

fn event_body(venue: &str) -> Value {
    json!({
        "name": "Klubnacht",
        "video": "video-teaser",
        "media": ["image-flyer", "video-aftermovie"],
        "accessPolicies": r#"[{"type":"ticket","minPrice":"20.00","maxPrice":"25.00","currency":"EUR","info":"Door only"}]"#,
        "rules": [
            { "title": "Photography", "rules": [{ "icon": "camera", "text": "Stickers on lenses" }] }
        ],
        "datetime": "2024-07-06T23:00:00Z",
        "duration": 129600,
        "hostedBy": venue
    })
}

async fn create_venue(app: &Router, name: &str) -> String {
    let (status, venue) = send(app, Method::POST, "/api/v1/venues", Some(venue_body(name))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", venue);
    venue["id"].as_str().unwrap().to_string()
}

async fn create_user(app: &Router, handle: &str, auth_id: &str) {
    let body = json!({
        "handle": handle,
        "authId": auth_id,
        "name": handle,
        "birthday": "1996-02-29",
        "visibility": "FRIENDS_ONLY"
    });
    let (status, user) = send(app, Method::POST, "/api/v1/users", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", user);
}

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_media_resolution() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/api/v1/media/video-ab12", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "video-ab12");
    assert_eq!(body["uri"], "https://cdn.example.com/video/video-ab12");

    let (status, body) = send(&app, Method::GET, "/api/v1/media/unknownprefix-abc123", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_event_round_trip_over_http() {
    let app = app().await;
    let venue_id = create_venue(&app, "Berghain").await;
    assert!(venue_id.starts_with("venue-"));

    let (status, event) = send(&app, Method::POST, "/api/v1/events", Some(event_body(&venue_id))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", event);
    let event_id = event["id"].as_str().unwrap().to_string();
    assert!(event_id.starts_with("event-"));

    // Complex fields come back as canonical string literals
    assert_eq!(
        event["accessPolicies"],
        r#"[{"type":"ticket","minPrice":"20.00","maxPrice":"25.00","currency":"EUR","info":"Door only"}]"#
    );
    assert_eq!(
        event["rules"],
        r#"[{"title":"Photography","rules":[{"icon":"camera","text":"Stickers on lenses"}]}]"#
    );
    assert_eq!(event["videoUri"], "https://cdn.example.com/video/video-teaser");
    assert_eq!(
        event["mediaUris"],
        json!([
            "https://cdn.example.com/image/image-flyer",
            "https://cdn.example.com/video/video-aftermovie"
        ])
    );

    let (status, fetched) = send(&app, Method::GET, &format!("/api/v1/events/{}", event_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, event);

    let (status, host) = send(&app, Method::GET, &format!("/api/v1/events/{}/venue", event_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(host["id"], venue_id.as_str());
    assert_eq!(
        host["highlights"],
        r#"[{"title":"VIP","cover":"image-cover1","videos":["video-ab12"]}]"#
    );
    assert_eq!(host["avatarUri"], "https://cdn.example.com/image/image-front");

    let (status, hosted) = send(&app, Method::GET, &format!("/api/v1/venues/{}/events", venue_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hosted.as_array().unwrap().len(), 1);

    let (status, listed) = send(&app, Method::GET, "/api/v1/events?limit=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed[0]["id"], event_id.as_str());
}

#[tokio::test]
async fn test_malformed_complex_input_is_rejected() {
    let app = app().await;
    let venue_id = create_venue(&app, "Tresor").await;

    let mut body = event_body(&venue_id);
    body["accessPolicies"] = json!("[{\"type\":\"ticket\"");
    let (status, error) = send(&app, Method::POST, "/api/v1/events", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["status"], 400);

    let mut body = event_body(&venue_id);
    body["rules"] = json!([{ "title": "Missing rules list" }]);
    let (status, _) = send(&app, Method::POST, "/api/v1/events", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, listed) = send(&app, Method::GET, "/api/v1/events", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_partial_update_literals() {
    let app = app().await;
    let venue_id = create_venue(&app, "Sisyphos").await;
    let (_, event) = send(&app, Method::POST, "/api/v1/events", Some(event_body(&venue_id))).await;
    let uri = format!("/api/v1/events/{}", event["id"].as_str().unwrap());

    // Null keeps the stored value
    let (status, updated) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(json!({ "name": "Renamed", "accessPolicies": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Renamed");
    assert_eq!(updated["accessPolicies"], event["accessPolicies"]);

    // An undecodable string literal is ignored
    let (status, updated) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(json!({ "accessPolicies": "not json" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["accessPolicies"], event["accessPolicies"]);

    // Non-string literals are refused
    let (status, _) = send(&app, Method::PATCH, &uri, Some(json!({ "accessPolicies": 42 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = send(&app, Method::PATCH, &uri, Some(json!({ "accessPolicies": "[]" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["accessPolicies"], "[]");
}

#[tokio::test]
async fn test_dates_cross_as_scalars() {
    let app = app().await;
    let venue_id = create_venue(&app, "About Blank").await;
    let (status, event) = send(&app, Method::POST, "/api/v1/events", Some(event_body(&venue_id))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", event);

    // Responses carry the canonical literal
    assert_eq!(event["datetime"], "\"2024-07-06T23:00:00Z\"");
    assert!(event["created"].as_str().unwrap().starts_with('"'));
    let uri = format!("/api/v1/events/{}", event["id"].as_str().unwrap());

    // Plain and canonical forms are both accepted
    let (status, updated) = send(&app, Method::PATCH, &uri, Some(json!({ "datetime": "2024-08-01T22:00:00Z" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["datetime"], "\"2024-08-01T22:00:00Z\"");

    let (status, updated) = send(&app, Method::PATCH, &uri, Some(json!({ "datetime": "\"2024-09-01T22:00:00Z\"" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["datetime"], "\"2024-09-01T22:00:00Z\"");

    let (status, _) = send(&app, Method::PATCH, &uri, Some(json!({ "datetime": "next friday" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut body = event_body(&venue_id);
    body["datetime"] = json!(1720306800);
    let (status, _) = send(&app, Method::POST, "/api/v1/events", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    create_user(&app, "frank", "auth|frank").await;
    let (status, user) = send(&app, Method::GET, "/api/v1/users/frank", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["birthday"], "\"1996-02-29\"");

    let (status, user) = send(&app, Method::PATCH, "/api/v1/users/frank", Some(json!({ "birthday": "1997-03-01" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["birthday"], "\"1997-03-01\"");

    let (status, _) = send(&app, Method::PATCH, "/api/v1/users/frank", Some(json!({ "birthday": "1997-02-30" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generator_outage_is_service_unavailable() {
    let app = app_with(Router::new().route("/generate", get(|| async { "not-an-id at all" }))).await;

    let (status, body) = send(&app, Method::POST, "/api/v1/venues", Some(venue_body("Nowhere"))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], 503);
}

#[tokio::test]
async fn test_event_for_missing_venue_is_not_found() {
    let app = app().await;
    let (status, _) = send(&app, Method::POST, "/api/v1/events", Some(event_body("venue-ghost"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_social_graph_over_http() {
    let app = app().await;
    create_user(&app, "alice", "auth|alice").await;
    create_user(&app, "bob", "auth|bob").await;

    let (status, _) = send(&app, Method::POST, "/api/v1/users", Some(json!({
        "handle": "alice2",
        "authId": "auth|alice",
        "name": "Impostor",
        "birthday": "2000-01-01"
    })))
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, Method::PUT, "/api/v1/users/alice/follows/bob", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, followers) = send(&app, Method::GET, "/api/v1/users/bob/followers", None).await;
    assert_eq!(followers[0]["handle"], "alice");
    assert_eq!(followers[0]["visibility"], "FRIENDS_ONLY");
    let (_, follows) = send(&app, Method::GET, "/api/v1/users/bob/follows", None).await;
    assert!(follows.as_array().unwrap().is_empty());

    let venue_id = create_venue(&app, "Watergate").await;
    let (_, event) = send(&app, Method::POST, "/api/v1/events", Some(event_body(&venue_id))).await;
    let event_id = event["id"].as_str().unwrap();

    let (status, _) = send(&app, Method::PUT, &format!("/api/v1/users/alice/likes/{}", event_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::PUT, &format!("/api/v1/users/alice/likes/{}", venue_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, liked) = send(&app, Method::GET, "/api/v1/users/alice/likes", None).await;
    let kinds: Vec<&str> = liked
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds.len(), 2);
    assert!(kinds.contains(&"event") && kinds.contains(&"venue"));

    let (_, likers) = send(&app, Method::GET, &format!("/api/v1/events/{}/likes", event_id), None).await;
    assert_eq!(likers[0]["handle"], "alice");

    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/venues/{}", venue_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, Method::DELETE, "/api/v1/users/alice", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, "/api/v1/users/alice", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_concurrent_creates_get_distinct_ids() {
    let app = app().await;

    let requests = (0..8).map(|i| {
        let app = app.clone();
        async move {
            let (status, venue) = send(
                &app,
                Method::POST,
                "/api/v1/venues",
                Some(venue_body(&format!("Venue {}", i))),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            venue["id"].as_str().unwrap().to_string()
        }
    });
    let mut ids = futures::future::join_all(requests).await;

    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
}
