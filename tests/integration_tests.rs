use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use salon_bookings::config::{AppConfig, DeleteMode};
use salon_bookings::db;
use salon_bookings::handlers;
use salon_bookings::models::WildcardPolicy;
use salon_bookings::services::booking::BookingService;
use salon_bookings::services::store::offline::OfflineStore;
use salon_bookings::services::store::sqlite::SqliteStore;
use salon_bookings::services::store::BookingStore;
use salon_bookings::state::AppState;

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        database_url: ":memory:".to_string(),
        environment: "test".to_string(),
        cors_origins: vec!["http://localhost:3000".to_string()],
        ..AppConfig::default()
    }
}

fn state_with(config: AppConfig, store: Arc<dyn BookingStore>) -> Arc<AppState> {
    Arc::new(AppState {
        bookings: BookingService::new(store, config.wildcard_policy, config.degraded_mode()),
        config,
    })
}

fn test_state_with_config(config: AppConfig) -> Arc<AppState> {
    let conn = db::init_db(":memory:").unwrap();
    state_with(config, Arc::new(SqliteStore::new(conn)))
}

fn test_state() -> Arc<AppState> {
    test_state_with_config(test_config())
}

fn test_app(state: Arc<AppState>) -> Router {
    handlers::router(state)
}

const HAIRCUT: &str = r#"{"date":"2024-06-01","time":"10:00","service":"Haircut","stylist":"Alex","customer":{"name":"Sam","phone":"555-0100"}}"#;

fn booking_body(time: &str, stylist: &str) -> String {
    format!(
        r#"{{"date":"2024-06-01","time":"{time}","service":"Haircut","stylist":"{stylist}","customer":{{"name":"Sam","phone":"555-0100"}}}}"#
    )
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(state: &Arc<AppState>, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let res = test_app(state.clone()).oneshot(req).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

// ── Service info ──

#[tokio::test]
async fn test_root_message() {
    let state = test_state();
    let (status, json) = send(&state, empty_request("GET", "/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Barber Shop Backend API is running!");
}

#[tokio::test]
async fn test_health_reports_database_state() {
    let state = test_state();
    let (status, json) = send(&state, empty_request("GET", "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"]["state"], "connected");
    assert_eq!(json["environment"], "test");

    let offline = state_with(test_config(), Arc::new(OfflineStore));
    let (_, json) = send(&offline, empty_request("GET", "/health")).await;
    assert_eq!(json["database"]["state"], "disconnected");
}

// ── Create ──

#[tokio::test]
async fn test_booking_lifecycle() {
    let state = test_state();

    let (status, json) = send(&state, json_request("POST", "/api/bookings", HAIRCUT)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Booking created successfully");
    assert_eq!(json["data"]["status"], "confirmed");
    let booking_id = json["data"]["bookingId"].as_str().unwrap().to_string();
    assert!(booking_id.starts_with("BK"));
    assert!(booking_id[2..].chars().all(|c| c.is_ascii_digit()));
    let id = json["data"]["id"].as_str().unwrap().to_string();

    // identical slot is refused
    let (status, json) = send(&state, json_request("POST", "/api/bookings", HAIRCUT)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "This time slot is already booked");
    assert_eq!(json["error"], "ConflictError");

    // cancel via DELETE
    let (status, json) = send(&state, empty_request("DELETE", &format!("/api/bookings/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Booking cancelled successfully");
    assert_eq!(json["data"]["status"], "cancelled");

    // cancelled bookings do not block
    let (status, _) = send(&state, json_request("POST", "/api/bookings", HAIRCUT)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, json) = send(&state, empty_request("GET", "/api/bookings")).await;
    assert_eq!(json["count"], 2);
}

#[tokio::test]
async fn test_create_missing_phone_is_validation_error() {
    let state = test_state();
    let body = r#"{"date":"2024-06-01","time":"10:00","service":"Haircut","stylist":"Alex","customer":{"name":"Sam"}}"#;

    let (status, json) = send(&state, json_request("POST", "/api/bookings", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "ValidationError");
    assert_eq!(json["message"], "customer.phone is required");

    let (_, json) = send(&state, empty_request("GET", "/api/bookings")).await;
    assert_eq!(json["count"], 0);
}

#[tokio::test]
async fn test_create_malformed_json() {
    let state = test_state();
    let (status, json) = send(&state, json_request("POST", "/api/bookings", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "ValidationError");
}

#[tokio::test]
async fn test_any_stylist_does_not_collide_with_specific_under_exact() {
    let state = test_state_with_config(AppConfig {
        wildcard_policy: WildcardPolicy::Exact,
        ..test_config()
    });

    let (status, _) = send(&state, json_request("POST", "/api/bookings", &booking_body("10:00", "Alex"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&state, json_request("POST", "/api/bookings", &booking_body("10:00", "any"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&state, json_request("POST", "/api/bookings", &booking_body("10:00", "any"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_any_stylist_blocked_by_booked_slot_by_default() {
    let state = test_state();

    let (status, _) = send(&state, json_request("POST", "/api/bookings", &booking_body("10:00", "Alex"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = send(&state, json_request("POST", "/api/bookings", &booking_body("10:00", "any"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "ConflictError");
}

#[tokio::test]
async fn test_update_cannot_move_any_stylist_onto_booked_slot() {
    let state = test_state();
    send(&state, json_request("POST", "/api/bookings", &booking_body("10:00", "Alex"))).await;
    let (_, created) = send(&state, json_request("POST", "/api/bookings", &booking_body("11:00", "any"))).await;
    let id = created["data"]["id"].as_str().unwrap();

    let (status, json) = send(
        &state,
        json_request("PUT", &format!("/api/bookings/{id}"), r#"{"time":"10:00"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "ConflictError");

    let (_, fetched) = send(&state, empty_request("GET", &format!("/api/bookings/{id}"))).await;
    assert_eq!(fetched["data"]["time"], "11:00");
}

#[tokio::test]
async fn test_record_id_cannot_be_reused_as_booking_id() {
    let state = test_state();
    let (_, created) = send(&state, json_request("POST", "/api/bookings", HAIRCUT)).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let body = format!(
        r#"{{"bookingId":"{id}","date":"2024-06-01","time":"11:00","service":"Haircut","stylist":"Alex","customer":{{"name":"Sam","phone":"555-0100"}}}}"#
    );
    let (status, json) = send(&state, json_request("POST", "/api/bookings", &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "ValidationError");

    send(&state, json_request("POST", "/api/bookings", &booking_body("12:00", "Alex"))).await;
    let (status, _) = send(&state, empty_request("DELETE", &format!("/api/bookings/{id}"))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = send(&state, empty_request("GET", "/api/bookings")).await;
    let statuses: Vec<&str> = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, vec!["confirmed", "cancelled"]);
}

#[tokio::test]
async fn test_concurrent_creates_only_one_wins() {
    let state = test_state();

    let mut handles = vec![];
    for _ in 0..8 {
        let app = test_app(state.clone());
        handles.push(tokio::spawn(async move {
            app.oneshot(json_request("POST", "/api/bookings", HAIRCUT))
                .await
                .unwrap()
                .status()
        }));
    }

    let mut created = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::BAD_REQUEST => refused += 1,
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(refused, 7);
}

// ── Read ──

#[tokio::test]
async fn test_get_booking_matches_created() {
    let state = test_state();
    let (_, created) = send(&state, json_request("POST", "/api/bookings", HAIRCUT)).await;
    let id = created["data"]["id"].as_str().unwrap();
    let booking_id = created["data"]["bookingId"].as_str().unwrap();

    let (status, json) = send(&state, empty_request("GET", &format!("/api/bookings/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"], created["data"]);

    let (_, json) = send(&state, empty_request("GET", &format!("/api/bookings/{booking_id}"))).await;
    assert_eq!(json["data"], created["data"]);
}

#[tokio::test]
async fn test_get_unknown_booking() {
    let state = test_state();
    let (status, json) = send(&state, empty_request("GET", "/api/bookings/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "NotFoundError");
}

#[tokio::test]
async fn test_list_newest_first() {
    let state = test_state();
    send(&state, json_request("POST", "/api/bookings", &booking_body("10:00", "Alex"))).await;
    send(&state, json_request("POST", "/api/bookings", &booking_body("11:00", "Alex"))).await;

    let (status, json) = send(&state, empty_request("GET", "/api/bookings")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 2);
    assert_eq!(json["data"][0]["time"], "11:00");
    assert_eq!(json["data"][1]["time"], "10:00");
}

// ── Availability ──

#[tokio::test]
async fn test_availability_empty_day() {
    let state = test_state();
    let (status, json) = send(&state, empty_request("GET", "/api/bookings/availability/2024-06-01")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["date"], "2024-06-01");
    assert_eq!(json["count"], 0);
    assert_eq!(json["bookedSlots"], serde_json::json!([]));
}

#[tokio::test]
async fn test_availability_projects_time_and_stylist() {
    let state = test_state();
    send(&state, json_request("POST", "/api/bookings", HAIRCUT)).await;

    let (_, json) = send(&state, empty_request("GET", "/api/bookings/availability/2024-06-01")).await;
    assert_eq!(json["count"], 1);
    assert_eq!(
        json["bookedSlots"],
        serde_json::json!([{ "time": "10:00", "stylist": "Alex" }])
    );
}

#[tokio::test]
async fn test_availability_rejects_bad_dates() {
    let state = test_state();
    for date in ["2024-13-40", "06%2F01%2F2024", "tomorrow"] {
        let (status, json) = send(
            &state,
            empty_request("GET", &format!("/api/bookings/availability/{date}")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "date {date}");
        assert_eq!(json["error"], "ValidationError");
    }
}

// ── Update ──

#[tokio::test]
async fn test_update_booking() {
    let state = test_state();
    let (_, created) = send(&state, json_request("POST", "/api/bookings", HAIRCUT)).await;
    let id = created["data"]["id"].as_str().unwrap();

    let (status, json) = send(
        &state,
        json_request(
            "PUT",
            &format!("/api/bookings/{id}"),
            r#"{"status":"pending","notes":"running late","price":30}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Booking updated successfully");
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["notes"], "running late");
    assert_eq!(json["data"]["price"], 30.0);
    assert_eq!(json["data"]["service"], "Haircut");
}

#[tokio::test]
async fn test_update_validation_and_not_found() {
    let state = test_state();
    let (_, created) = send(&state, json_request("POST", "/api/bookings", HAIRCUT)).await;
    let id = created["data"]["id"].as_str().unwrap();

    let (status, json) = send(
        &state,
        json_request("PUT", &format!("/api/bookings/{id}"), r#"{"service":""}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "ValidationError");

    let (status, _) = send(
        &state,
        json_request("PUT", &format!("/api/bookings/{id}"), r#"{"status":"archived"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &state,
        json_request("PUT", "/api/bookings/missing", r#"{"notes":"x"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Delete ──

#[tokio::test]
async fn test_cancel_twice_succeeds() {
    let state = test_state();
    let (_, created) = send(&state, json_request("POST", "/api/bookings", HAIRCUT)).await;
    let uri = format!("/api/bookings/{}", created["data"]["bookingId"].as_str().unwrap());

    for _ in 0..2 {
        let (status, json) = send(&state, empty_request("DELETE", &uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"], "cancelled");
    }

    let (status, json) = send(&state, empty_request("GET", &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "cancelled");
}

#[tokio::test]
async fn test_delete_unknown_booking() {
    let state = test_state();
    let (status, json) = send(&state, empty_request("DELETE", "/api/bookings/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_hard_delete_mode() {
    let state = test_state_with_config(AppConfig {
        delete_mode: DeleteMode::Hard,
        ..test_config()
    });
    let (_, created) = send(&state, json_request("POST", "/api/bookings", HAIRCUT)).await;
    let uri = format!("/api/bookings/{}", created["data"]["id"].as_str().unwrap());

    let (status, json) = send(&state, empty_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Booking deleted successfully");
    assert!(json.get("data").is_none());

    let (status, _) = send(&state, empty_request("GET", &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Store unavailable ──

#[tokio::test]
async fn test_offline_store_returns_500() {
    let state = state_with(test_config(), Arc::new(OfflineStore));

    let (status, json) = send(&state, json_request("POST", "/api/bookings", HAIRCUT)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "StoreError");

    let (status, _) = send(&state, empty_request("GET", "/api/bookings")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_degraded_mode_flags_non_durable_responses() {
    let config = AppConfig {
        dev_fallback: true,
        ..test_config()
    };
    let state = state_with(config, Arc::new(OfflineStore));

    let (status, json) = send(&state, json_request("POST", "/api/bookings", HAIRCUT)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["message"], "Booking created successfully (development mode)");
    assert_eq!(json["note"], "Development mode - database not connected");
    assert!(json["data"]["id"].as_str().unwrap().starts_with("mock_"));

    let (status, json) = send(&state, empty_request("GET", "/api/bookings/availability/2024-06-01")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 0);
    assert!(json.get("note").is_some());
}

#[tokio::test]
async fn test_degraded_mode_unreachable_in_production() {
    let config = AppConfig {
        dev_fallback: true,
        environment: "production".to_string(),
        ..test_config()
    };
    let state = state_with(config, Arc::new(OfflineStore));

    let (status, _) = send(&state, json_request("POST", "/api/bookings", HAIRCUT)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

// ── CORS ──

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let state = test_state();
    let res = test_app(state)
        .oneshot(
            Request::builder()
                .uri("/api/bookings")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:3000")
    );
}
