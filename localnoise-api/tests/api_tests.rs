//! Integration tests for the LocalNoise API
//!
//! Each test builds the real router over a fresh tempfile SQLite database
//! and drives it with oneshot requests. External catalog endpoints are not
//! exercised here (no credentials, no network); the provider clients are
//! covered by unit tests against their mapping logic and the resolver is
//! covered against fake sources.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

use localnoise_api::{build_router, AppState};
use localnoise_common::db::init_database;
use localnoise_common::Config;

/// Test helper: build the app over a fresh temp database
///
/// The TempDir must stay alive for the duration of the test.
async fn setup_app() -> (Router, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("localnoise-test.db");

    let pool = init_database(&db_path).await.expect("database init");

    let config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_path: db_path,
        allowed_origins: vec!["http://localhost:5173".to_string()],
        jwt_secret: "integration-test-secret".to_string(),
        token_ttl_hours: 1,
        spotify_client_id: None,
        spotify_client_secret: None,
        spotify_market: "US".to_string(),
        youtube_api_key: None,
    };

    let state = AppState::new(pool, config).expect("app state");
    (build_router(state), dir)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get_authed(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse JSON")
}

/// Register a user and return their bearer token
async fn register_user(app: &Router, username: &str) -> String {
    let body = json!({
        "username": username,
        "email": format!("{}@example.com", username),
        "password": "hunter22",
    });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/auth/register", None, &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = extract_json(response.into_body()).await;
    json["token"].as_str().expect("token").to_string()
}

/// Create a band and return the response JSON
async fn create_band(app: &Router, token: &str, body: &Value) -> Value {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/bands", Some(token), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    extract_json(response.into_body()).await
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn health_endpoint_reports_module_and_uptime() {
    let (app, _dir) = setup_app().await;

    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "localnoise-api");
    assert!(body["version"].is_string());
    assert!(body["uptime_seconds"].is_number());
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn register_login_profile_round_trip() {
    let (app, _dir) = setup_app().await;

    let token = register_user(&app, "frida").await;

    // Profile with the registration token
    let response = app
        .clone()
        .oneshot(get_authed("/api/auth/profile", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let profile = extract_json(response.into_body()).await;
    assert_eq!(profile["username"], "frida");
    assert_eq!(profile["email"], "frida@example.com");

    // Fresh login issues a working token too
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            &json!({"email": "frida@example.com", "password": "hunter22"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let login = extract_json(response.into_body()).await;
    assert!(login["token"].is_string());
    assert_eq!(login["user"]["username"], "frida");
}

#[tokio::test]
async fn profile_requires_bearer_token() {
    let (app, _dir) = setup_app().await;

    let response = app
        .clone()
        .oneshot(get("/api/auth/profile"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(get_authed("/api/auth/profile", "not-a-jwt"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let (app, _dir) = setup_app().await;
    register_user(&app, "miles").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            &json!({"email": "miles@example.com", "password": "wrong-password"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let (app, _dir) = setup_app().await;
    register_user(&app, "ella").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            &json!({
                "username": "ella",
                "email": "other@example.com",
                "password": "hunter22",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn registration_validates_input() {
    let (app, _dir) = setup_app().await;

    // Username too short
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            &json!({"username": "ab", "email": "ab@example.com", "password": "hunter22"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Password too short
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            &json!({"username": "abel", "email": "abel@example.com", "password": "abc"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Band creation and marker placement
// ============================================================================

#[tokio::test]
async fn band_creation_requires_auth() {
    let (app, _dir) = setup_app().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/bands",
            None,
            &json!({
                "name": "Dogleg",
                "city": "Detroit",
                "country": "USA",
                "latitude": 42.3314,
                "longitude": -83.0458,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn first_band_in_a_city_keeps_its_coordinates() {
    let (app, _dir) = setup_app().await;
    let token = register_user(&app, "reporter").await;

    let band = create_band(
        &app,
        &token,
        &json!({
            "name": "Dogleg",
            "city": "Detroit",
            "country": "USA",
            "latitude": 42.3314,
            "longitude": -83.0458,
            "genre": "Punk",
        }),
    )
    .await;

    assert!((band["latitude"].as_f64().unwrap() - 42.3314).abs() < 1e-12);
    assert!((band["longitude"].as_f64().unwrap() - (-83.0458)).abs() < 1e-12);
    assert_eq!(band["isVerified"], false);
    assert_eq!(band["isActive"], true);
    assert_eq!(band["contributor"]["username"], "reporter");
}

#[tokio::test]
async fn second_band_at_same_spot_is_nudged() {
    let (app, _dir) = setup_app().await;
    let token = register_user(&app, "porteno").await;

    let first = create_band(
        &app,
        &token,
        &json!({
            "name": "Primera Banda",
            "city": "Buenos Aires",
            "country": "Argentina",
            "latitude": -34.6037,
            "longitude": -58.3816,
        }),
    )
    .await;

    let second = create_band(
        &app,
        &token,
        &json!({
            "name": "Segunda Banda",
            "city": "Buenos Aires",
            "country": "Argentina",
            "latitude": -34.6037,
            "longitude": -58.3816,
        }),
    )
    .await;

    // One neighbor: offset 0.0002 degrees at 60 degrees from east
    let lat = second["latitude"].as_f64().unwrap();
    let lon = second["longitude"].as_f64().unwrap();
    assert!((lat - (-34.6037 + 0.0001)).abs() < 1e-9);
    assert!((lon - (-58.3816 + 0.000_173_205_080_756_9)).abs() < 1e-9);

    // First band's point is untouched
    let first_lat = first["latitude"].as_f64().unwrap();
    assert!((first_lat - (-34.6037)).abs() < 1e-12);

    // Stored coordinates are never bit-identical within the city
    assert_ne!(lat, first_lat);
}

#[tokio::test]
async fn same_coordinates_in_different_cities_do_not_collide() {
    let (app, _dir) = setup_app().await;
    let token = register_user(&app, "traveler").await;

    create_band(
        &app,
        &token,
        &json!({
            "name": "Northern Band",
            "city": "Springfield",
            "country": "USA",
            "latitude": 40.0,
            "longitude": -90.0,
        }),
    )
    .await;

    // Same point, different city: no neighbors, no nudge
    let other = create_band(
        &app,
        &token,
        &json!({
            "name": "Other Band",
            "city": "Shelbyville",
            "country": "USA",
            "latitude": 40.0,
            "longitude": -90.0,
        }),
    )
    .await;

    assert!((other["latitude"].as_f64().unwrap() - 40.0).abs() < 1e-12);
    assert!((other["longitude"].as_f64().unwrap() - (-90.0)).abs() < 1e-12);
}

#[tokio::test]
async fn out_of_range_coordinates_are_rejected() {
    let (app, _dir) = setup_app().await;
    let token = register_user(&app, "cartographer").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/bands",
            Some(&token),
            &json!({
                "name": "Nowhere Band",
                "city": "Nowhere",
                "country": "Nowhere",
                "latitude": 91.0,
                "longitude": 0.0,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "INVALID_COORDINATES");
}

#[tokio::test]
async fn linking_a_catalog_artist_marks_the_band_verified() {
    let (app, _dir) = setup_app().await;
    let token = register_user(&app, "linker").await;

    let band = create_band(
        &app,
        &token,
        &json!({
            "name": "Turnover",
            "city": "Virginia Beach",
            "country": "USA",
            "latitude": 36.8529,
            "longitude": -75.978,
            "spotifyId": "1IEWDPde9SGbvWQuQYu4nQ",
            "spotifyUrl": "https://open.spotify.com/artist/1IEWDPde9SGbvWQuQYu4nQ",
        }),
    )
    .await;

    assert_eq!(band["isVerified"], true);
    assert_eq!(band["spotifyId"], "1IEWDPde9SGbvWQuQYu4nQ");
}

// ============================================================================
// Band listing, fetch and search
// ============================================================================

#[tokio::test]
async fn listing_filters_by_city_and_pages() {
    let (app, _dir) = setup_app().await;
    let token = register_user(&app, "lister").await;

    for (name, city, lon) in [
        ("Band A", "Detroit", -83.0),
        ("Band B", "Detroit", -83.1),
        ("Band C", "Chicago", -87.6),
    ] {
        create_band(
            &app,
            &token,
            &json!({
                "name": name,
                "city": city,
                "country": "USA",
                "latitude": 42.0,
                "longitude": lon,
            }),
        )
        .await;
    }

    let response = app.clone().oneshot(get("/api/bands")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["bands"].as_array().unwrap().len(), 3);

    let response = app
        .clone()
        .oneshot(get("/api/bands?city=Detroit"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 2);

    let response = app
        .clone()
        .oneshot(get("/api/bands?limit=1&offset=0"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["bands"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn fetching_a_band_by_id() {
    let (app, _dir) = setup_app().await;
    let token = register_user(&app, "fetcher").await;

    let band = create_band(
        &app,
        &token,
        &json!({
            "name": "Dogleg",
            "city": "Detroit",
            "country": "USA",
            "latitude": 42.3314,
            "longitude": -83.0458,
        }),
    )
    .await;
    let id = band["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(get(&format!("/api/bands/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = extract_json(response.into_body()).await;
    assert_eq!(fetched["name"], "Dogleg");

    // Malformed id
    let response = app
        .clone()
        .oneshot(get("/api/bands/not-a-uuid"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown id
    let response = app
        .clone()
        .oneshot(get("/api/bands/00000000-0000-0000-0000-000000000000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_requires_two_characters_and_matches_fields() {
    let (app, _dir) = setup_app().await;
    let token = register_user(&app, "searcher").await;

    create_band(
        &app,
        &token,
        &json!({
            "name": "Café Tacvba",
            "city": "Mexico City",
            "country": "Mexico",
            "latitude": 19.4326,
            "longitude": -99.1332,
            "genre": "Rock en Español",
        }),
    )
    .await;

    let response = app.clone().oneshot(get("/api/bands/search?q=c")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get("/api/bands/search?q=tacvba"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let results = extract_json(response.into_body()).await;
    assert_eq!(results.as_array().unwrap().len(), 1);

    // City matches too
    let response = app
        .clone()
        .oneshot(get("/api/bands/search?q=mexico"))
        .await
        .unwrap();
    let results = extract_json(response.into_body()).await;
    assert_eq!(results.as_array().unwrap().len(), 1);
}

// ============================================================================
// Ownership
// ============================================================================

#[tokio::test]
async fn only_the_owner_can_update_or_delete() {
    let (app, _dir) = setup_app().await;
    let owner = register_user(&app, "owner").await;
    let other = register_user(&app, "intruder").await;

    let band = create_band(
        &app,
        &owner,
        &json!({
            "name": "Original Name",
            "city": "Oslo",
            "country": "Norway",
            "latitude": 59.9139,
            "longitude": 10.7522,
        }),
    )
    .await;
    let uri = format!("/api/bands/{}", band["id"].as_str().unwrap());

    // Another user cannot edit
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &uri,
            Some(&other),
            &json!({"name": "Hijacked"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Another user cannot delete
    let response = app
        .clone()
        .oneshot(json_request("DELETE", &uri, Some(&other), &json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The owner can edit
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &uri,
            Some(&owner),
            &json!({"name": "Renamed", "genre": "Jazz"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = extract_json(response.into_body()).await;
    assert_eq!(updated["name"], "Renamed");
    assert_eq!(updated["genre"], "Jazz");

    // The owner can delete, after which the band is gone
    let response = app
        .clone()
        .oneshot(json_request("DELETE", &uri, Some(&owner), &json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_requires_both_coordinates_together() {
    let (app, _dir) = setup_app().await;
    let token = register_user(&app, "mover").await;

    let band = create_band(
        &app,
        &token,
        &json!({
            "name": "Movers",
            "city": "Lisbon",
            "country": "Portugal",
            "latitude": 38.7223,
            "longitude": -9.1393,
        }),
    )
    .await;
    let uri = format!("/api/bands/{}", band["id"].as_str().unwrap());

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &uri,
            Some(&token),
            &json!({"latitude": 38.73}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Both together is fine, and the submitted point is stored as-is
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &uri,
            Some(&token),
            &json!({"latitude": 38.73, "longitude": -9.14}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = extract_json(response.into_body()).await;
    assert!((updated["latitude"].as_f64().unwrap() - 38.73).abs() < 1e-12);
}
