use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, StateObject};
use serde_json::Value;
use tower::ServiceExt;

const TOKEN: &str = "test-token";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- auth ---

#[tokio::test]
async fn missing_token_returns_401() {
    let resp = app(TOKEN)
        .oneshot(Request::builder().uri("/api/").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_token_returns_401() {
    let resp = app(TOKEN)
        .oneshot(
            Request::builder()
                .uri("/api/states")
                .header(http::header::AUTHORIZATION, "Bearer nope")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn api_status_running() {
    let resp = app(TOKEN).oneshot(get("/api/")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["message"], "API running.");
}

// --- states ---

#[tokio::test]
async fn list_states_is_seeded() {
    let resp = app(TOKEN).oneshot(get("/api/states")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let states: Vec<StateObject> = body_json(resp).await;
    assert!(states.iter().any(|s| s.entity_id == "light.kitchen"));
}

#[tokio::test]
async fn get_state_not_found() {
    let resp = app(TOKEN).oneshot(get("/api/states/light.nope")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_state_decodes_percent_encoded_id() {
    use tower::Service;

    let mut app = app(TOKEN).into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/api/states/sensor.outdoor%20temp%231",
            r#"{"state":"3"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/api/states/sensor.outdoor%20temp%231"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let state: StateObject = body_json(resp).await;
    assert_eq!(state.entity_id, "sensor.outdoor temp#1");
}

#[tokio::test]
async fn set_state_malformed_json_returns_422() {
    let resp = app(TOKEN)
        .oneshot(json_request("POST", "/api/states/sensor.x", r#"{"not_state":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn delete_state_not_found() {
    let resp = app(TOKEN)
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/states/sensor.ghost")
                .header(http::header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- services ---

#[tokio::test]
async fn call_service_reports_changed_states() {
    let resp = app(TOKEN)
        .oneshot(json_request(
            "POST",
            "/api/services/light/turn_on",
            r#"{"entity_id":"light.living_room","brightness":80}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let changed: Vec<StateObject> = body_json(resp).await;
    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0].state, "on");
    assert_eq!(changed[0].attributes["brightness"], 80);
}

#[tokio::test]
async fn script_service_answers_with_empty_body() {
    let resp = app(TOKEN)
        .oneshot(json_request("POST", "/api/services/script/noop", "{}"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn unknown_service_domain_returns_400() {
    let resp = app(TOKEN)
        .oneshot(json_request("POST", "/api/services/vacuum/start", "{}"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- history, logbook, calendars ---

#[tokio::test]
async fn history_without_timestamp_filters_entities() {
    let resp = app(TOKEN)
        .oneshot(get(
            "/api/history/period/?filter_entity_id=light.kitchen,switch.coffee_maker",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let series: Vec<Vec<Value>> = body_json(resp).await;
    assert_eq!(series.len(), 2);
    assert_eq!(series[0][0]["entity_id"], "light.kitchen");
}

#[tokio::test]
async fn logbook_with_timestamp() {
    let resp = app(TOKEN)
        .oneshot(get("/api/logbook/2024-05-01T00:00:00?entity=light.kitchen"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let entries: Vec<Value> = body_json(resp).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["when"], "2024-05-01T00:00:00");
}

#[tokio::test]
async fn calendar_events_require_range() {
    let resp = app(TOKEN)
        .oneshot(get("/api/calendars/calendar.family?start=2024-05-01"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_calendar_returns_404() {
    let resp = app(TOKEN)
        .oneshot(get("/api/calendars/calendar.work?start=a&end=b"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- text endpoints ---

#[tokio::test]
async fn template_renders_as_plain_text() {
    let resp = app(TOKEN)
        .oneshot(json_request(
            "POST",
            "/api/template",
            r#"{"template":"Kitchen is {{ states('light.kitchen') }}"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers()[http::header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));
    assert_eq!(body_bytes(resp).await, "Kitchen is on");
}

#[tokio::test]
async fn error_log_is_plain_text() {
    let resp = app(TOKEN).oneshot(get("/api/error_log")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_bytes(resp).await;
    assert!(std::str::from_utf8(&body).unwrap().contains("ERROR"));
}

// --- full state lifecycle ---

#[tokio::test]
async fn state_lifecycle() {
    use tower::Service;

    let mut app = app(TOKEN).into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/api/states/sensor.ghost",
            r#"{"state":"boo","attributes":{"friendly_name":"Ghost"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: StateObject = body_json(resp).await;
    assert_eq!(created.state, "boo");

    // overwrite
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/api/states/sensor.ghost", r#"{"state":"gone"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // delete answers 200 with an empty body
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("DELETE")
                .uri("/api/states/sensor.ghost")
                .header(http::header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());

    // get after delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/api/states/sensor.ghost"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
