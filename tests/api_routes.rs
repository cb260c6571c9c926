mod support;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use playlist_curator::{
    app::{ComponentRegistry, build_router},
    config::Config,
};
use serde_json::{Value, json};
use support::{FakeCatalog, FakeCollections, PLAYLIST_URL, concept_json, fixture};
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, body_string_contains, header as header_matcher, method, path},
};

fn router_with(catalog: FakeCatalog) -> Router {
    let support::Fixture {
        telemetry,
        pipeline,
        ..
    } = fixture(
        &concept_json(
            "Late Night Drive",
            &[("Nightcall", "Kavinsky"), ("Not On Spotify", "Nobody")],
        ),
        catalog,
        FakeCollections::default(),
    );
    build_router(ComponentRegistry::new(telemetry, pipeline))
}

fn create_playlist(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/create-playlist")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .expect("request builds")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn create_playlist_returns_url_and_diagnostics() {
    let router = router_with(FakeCatalog::with_hits(["Nightcall"]));
    let payload = json!({
        "mood": "driving through the city at 2am",
        "spotifyAccessToken": "BQD-user-token",
        "spotifyUserId": "listener-42"
    });

    let response = router
        .oneshot(create_playlist(payload.to_string()))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["playlistUrl"], PLAYLIST_URL);
    assert_eq!(body["tracksAdded"], 1);
    assert_eq!(body["tracksRequested"], 2);
    assert_eq!(
        body["unresolvedTracks"],
        json!([{ "trackName": "Not On Spotify", "artistName": "Nobody" }])
    );
}

#[tokio::test]
async fn request_aliases_are_accepted() {
    let router = router_with(FakeCatalog::with_hits(["Nightcall"]));
    let payload = json!({
        "moodText": "synthwave",
        "requesterAuthToken": "BQD-user-token",
        "requesterCatalogId": "listener-42"
    });

    let response = router
        .oneshot(create_playlist(payload.to_string()))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_fields_are_invalid_requests() {
    let router = router_with(FakeCatalog::default());
    let payload = json!({ "mood": "   ", "spotifyUserId": "listener-42" });

    let response = router
        .oneshot(create_playlist(payload.to_string()))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["errorKind"], "invalid_request");
    let message = body["message"].as_str().expect("message");
    assert!(message.contains("mood"));
    assert!(message.contains("spotifyAccessToken"));
}

#[tokio::test]
async fn malformed_json_is_an_invalid_request() {
    let router = router_with(FakeCatalog::default());

    let response = router
        .oneshot(create_playlist("{\"mood\": "))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["errorKind"], "invalid_request");
}

#[tokio::test]
async fn no_matches_is_not_found() {
    let router = router_with(FakeCatalog::default());
    let payload = json!({
        "mood": "music nobody has recorded",
        "spotifyAccessToken": "BQD-user-token",
        "spotifyUserId": "listener-42"
    });

    let response = router
        .oneshot(create_playlist(payload.to_string()))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["errorKind"], "no_matches_found");
    assert_eq!(body["message"], "No songs found on Spotify for the given mood.");
}

#[tokio::test]
async fn health_and_metrics_endpoints_respond() {
    let router = router_with(FakeCatalog::default());

    let live = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health/live")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(live.status(), StatusCode::OK);
    assert_eq!(json_body(live).await["status"], "live");

    let ready = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health/ready")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(ready.status(), StatusCode::OK);

    let metrics = router
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(metrics.status(), StatusCode::OK);
    let bytes = to_bytes(metrics.into_body(), usize::MAX)
        .await
        .expect("body reads");
    let text = String::from_utf8(bytes.to_vec()).expect("utf8");
    assert!(text.contains("playlist_runs_started_total"));
}

#[tokio::test]
async fn end_to_end_against_mock_services() {
    let gemini = MockServer::start().await;
    let spotify = MockServer::start().await;

    let concept = concept_json("Morning Run", &[("Eye of the Tiger", "Survivor")]);
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-pro-latest:generateContent"))
        .and(header_matcher("x-goog-api-key", "gemini-test-key"))
        .and(body_string_contains("User Input: \\\"morning run\\\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": concept }] } }]
        })))
        .expect(1)
        .mount(&gemini)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "app-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(&spotify)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(header_matcher("authorization", "Bearer app-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": { "items": [{ "uri": "spotify:track:2HHtWyy5CgaQbC7XSoOb0e" }] }
        })))
        .expect(1)
        .mount(&spotify)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/users/runner/playlists"))
        .and(header_matcher("authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "run-pl",
            "external_urls": { "spotify": "https://open.spotify.com/playlist/run-pl" }
        })))
        .expect(1)
        .mount(&spotify)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/playlists/run-pl/tracks"))
        .and(body_json(json!({ "uris": ["spotify:track:2HHtWyy5CgaQbC7XSoOb0e"] })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "snapshot_id": "s" })))
        .expect(1)
        .mount(&spotify)
        .await;

    let gemini_url = gemini.uri();
    let spotify_url = spotify.uri();
    let config = temp_env::with_vars(
        [
            ("GEMINI_API_KEY", Some("gemini-test-key")),
            ("SPOTIFY_CLIENT_ID", Some("client-id")),
            ("SPOTIFY_CLIENT_SECRET", Some("client-secret")),
            ("GEMINI_BASE_URL", Some(gemini_url.as_str())),
            ("GEMINI_MODEL", None),
            ("SPOTIFY_API_BASE_URL", Some(spotify_url.as_str())),
            ("SPOTIFY_ACCOUNTS_BASE_URL", Some(spotify_url.as_str())),
            ("CONCEPT_MAX_TRACKS", None),
            ("SEARCH_MAX_CONCURRENCY", None),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", None),
        ],
        Config::from_env,
    )
    .expect("config loads");

    let router = build_router(ComponentRegistry::build(&config).expect("registry builds"));
    let payload = json!({
        "mood": "morning run",
        "spotifyAccessToken": "user-token",
        "spotifyUserId": "runner"
    });

    let response = router
        .oneshot(create_playlist(payload.to_string()))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["playlistUrl"], "https://open.spotify.com/playlist/run-pl");
    assert_eq!(body["tracksAdded"], 1);
}
