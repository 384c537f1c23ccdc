// HTTP API tests for Study Spot Match

use actix_web::{http::StatusCode, test, web, App};
use mockito::{Matcher, Server};
use serde_json::{json, Value};
use study_spot_match::config::Settings;
use study_spot_match::routes::{self, AppState};

fn default_state() -> AppState {
    AppState::from_settings(&Settings::default()).expect("app state")
}

fn state_with(configure: impl FnOnce(&mut Settings)) -> AppState {
    let mut settings = Settings::default();
    configure(&mut settings);
    AppState::from_settings(&settings).expect("app state")
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .app_data(web::JsonConfig::default().error_handler(routes::handle_json_payload_error))
                .app_data(web::QueryConfig::default().error_handler(routes::handle_query_payload_error))
                .configure(routes::configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_health_check() {
    let app = init_app!(default_state());

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["catalogSize"], 34);
}

#[actix_web::test]
async fn test_list_and_get_spots() {
    let app = init_app!(default_state());

    let req = test::TestRequest::get().uri("/api/studyspots/all").to_request();
    let spots: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(spots.len(), 34);
    assert_eq!(spots[0]["closeTime"], "24:00");
    assert_eq!(spots[0]["amenities"]["WiFi"], 1);

    let req = test::TestRequest::get().uri("/api/studyspots/5").to_request();
    let spot: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(spot["name"], "Koerner Library");
    assert_eq!(spot["noiseLevel"], "Silent");
}

#[actix_web::test]
async fn test_unknown_spot_is_404() {
    let app = init_app!(default_state());

    let req = test::TestRequest::get().uri("/api/studyspots/999").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status_code"], 404);
}

#[actix_web::test]
async fn test_apply_ranks_with_supplied_distances() {
    let app = init_app!(default_state());

    let req = test::TestRequest::post()
        .uri("/api/preferences/apply")
        .set_json(json!({
            "maxDistance": 100,
            "distancesFromUser": {"1": 50.0, "2": 100.0, "3": 200.0}
        }))
        .to_request();
    let ranked: Vec<Value> = test::call_and_read_body_json(&app, req).await;

    assert_eq!(ranked.len(), 34);
    assert_eq!(ranked[0]["id"], "1");
    assert_eq!(ranked[0]["score"], 100.0);
    assert_eq!(ranked[0]["distance"], 50.0);
    assert_eq!(ranked[33]["score"], 0.0);
    assert!(ranked[0]["breakdown"]["proximity"].is_number());
}

#[actix_web::test]
async fn test_apply_show_all() {
    let app = init_app!(default_state());

    let req = test::TestRequest::post()
        .uri("/api/preferences/apply")
        .set_json(json!({"showAll": true, "noiseLevel": "Loud"}))
        .to_request();
    let ranked: Vec<Value> = test::call_and_read_body_json(&app, req).await;

    assert_eq!(ranked.len(), 34);
    assert!(ranked.iter().all(|s| s["score"] == 100.0));
    assert_eq!(ranked[0]["id"], "1");
    assert_eq!(ranked[33]["id"], "34");
}

#[actix_web::test]
async fn test_apply_rejects_unknown_noise_level() {
    let app = init_app!(default_state());

    let req = test::TestRequest::post()
        .uri("/api/preferences/apply")
        .set_json(json!({"noiseLevel": "Deafening"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_apply_rejects_negative_max_distance() {
    let app = init_app!(default_state());

    let req = test::TestRequest::post()
        .uri("/api/preferences/apply")
        .set_json(json!({"maxDistance": -5}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Validation failed");
}

#[actix_web::test]
async fn test_apply_rejects_negative_supplied_distance() {
    let app = init_app!(default_state());

    let req = test::TestRequest::post()
        .uri("/api/preferences/apply")
        .set_json(json!({"maxDistance": 100, "distancesFromUser": {"1": -50.0}}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Validation failed");
}

#[actix_web::test]
async fn test_malformed_json_is_400() {
    let app = init_app!(default_state());

    let req = test::TestRequest::post()
        .uri("/api/preferences/apply")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"noiseLevel\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_json");
}

#[actix_web::test]
async fn test_apply_degrades_when_origin_cannot_be_geocoded() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;
    let url = server.url();
    let app = init_app!(state_with(|s| s.routing.nominatim_url = url));

    let req = test::TestRequest::post()
        .uri("/api/preferences/apply")
        .set_json(json!({"noiseLevel": "Silent", "originAddress": "Nowhere"}))
        .to_request();
    let ranked: Vec<Value> = test::call_and_read_body_json(&app, req).await;

    assert_eq!(ranked.len(), 34);
    assert!(ranked.iter().all(|s| s["distance"].is_null()));
    assert_eq!(ranked[0]["noiseLevel"], "Silent");
}

#[actix_web::test]
async fn test_apply_resolves_distances_from_origin() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", Matcher::Regex(r"^/route/v1/foot/".to_string()))
        .with_status(200)
        .with_body(r#"{"code":"Ok","routes":[{"distance":400.0,"duration":300.0}]}"#)
        .expect(34)
        .create_async()
        .await;
    let url = server.url();
    let app = init_app!(state_with(|s| s.routing.osrm_url = url));

    let req = test::TestRequest::post()
        .uri("/api/preferences/apply")
        .set_json(json!({"originLat": 49.2606, "originLng": -123.2460}))
        .to_request();
    let ranked: Vec<Value> = test::call_and_read_body_json(&app, req).await;

    assert!(ranked.iter().all(|s| s["distance"] == 400.0));
}

#[actix_web::test]
async fn test_spot_details_explains_match() {
    let app = init_app!(default_state());

    let req = test::TestRequest::post()
        .uri("/api/studyspots/14/details")
        .set_json(json!({
            "noiseLevel": "Silent",
            "selectedAmenities": ["projectors"],
            "distancesFromUser": {"14": 120.0}
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["spot"]["id"], "14");
    assert_eq!(body["distance"], 120.0);
    let explanation = body["explanation"].as_str().unwrap();
    assert!(explanation.starts_with("Match factors:"));
    assert!(explanation.contains("- Noise Level: Silent"));
    assert!(explanation.contains("- Has amenity: Projector"));
    assert_eq!(body["breakdown"]["noise"], 15.0);
}

#[actix_web::test]
async fn test_reset_returns_defaults() {
    let app = init_app!(default_state());

    let req = test::TestRequest::post().uri("/api/preferences/reset").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "success");
    assert_eq!(body["preferences"]["noiseLevel"], "Any");
    assert_eq!(body["preferences"]["closeTime"], "24:00");
    assert_eq!(body["preferences"]["amenities"]["Projector"], false);
}

#[actix_web::test]
async fn test_walk_rejects_invalid_coordinates() {
    let app = init_app!(default_state());

    let req = test::TestRequest::get()
        .uri("/api/walk?originLat=91&originLng=-123.25&destLat=49.26&destLng=-123.24")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_walk_missing_parameters_is_400() {
    let app = init_app!(default_state());

    let req = test::TestRequest::get().uri("/api/walk?originLat=49.26").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_query");
}

#[actix_web::test]
async fn test_walk_returns_route() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", Matcher::Regex(r"^/route/v1/foot/".to_string()))
        .with_status(200)
        .with_body(r#"{"code":"Ok","routes":[{"distance":812.4,"duration":610.0}]}"#)
        .create_async()
        .await;
    let url = server.url();
    let app = init_app!(state_with(|s| s.routing.osrm_url = url));

    let req = test::TestRequest::get()
        .uri("/api/walk?originLat=49.2606&originLng=-123.2460&destLat=49.2667&destLng=-123.2562")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["distanceMeters"], 812.4);
    assert_eq!(body["durationSeconds"], 610.0);
}

#[actix_web::test]
async fn test_walk_upstream_failure_is_502() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", Matcher::Regex(r"^/route/v1/foot/".to_string()))
        .with_status(503)
        .create_async()
        .await;
    let url = server.url();
    let app = init_app!(state_with(|s| s.routing.osrm_url = url));

    let req = test::TestRequest::get()
        .uri("/api/walk?originLat=49.2606&originLng=-123.2460&destLat=49.2667&destLng=-123.2562")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

#[actix_web::test]
async fn test_geocode_endpoint() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/search")
        .match_query(Matcher::UrlEncoded("q".into(), "2366 Main Mall".into()))
        .with_status(200)
        .with_body(r#"[{"lat":"49.2612","lon":"-123.2489"}]"#)
        .create_async()
        .await;
    let url = server.url();
    let app = init_app!(state_with(|s| s.routing.nominatim_url = url));

    let req = test::TestRequest::get()
        .uri("/api/geocode?address=2366%20Main%20Mall")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["latitude"], 49.2612);
    assert_eq!(body["longitude"], -123.2489);
}

#[actix_web::test]
async fn test_geocode_empty_address_is_400() {
    let app = init_app!(default_state());

    let req = test::TestRequest::get().uri("/api/geocode?address=").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_maps_key_endpoint() {
    let app = init_app!(default_state());
    let req = test::TestRequest::get().uri("/api/google-maps-api-key").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let app = init_app!(state_with(|s| s.maps.api_key = Some("test-key".to_string())));
    let req = test::TestRequest::get().uri("/api/google-maps-api-key").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["apiKey"], "test-key");
}
