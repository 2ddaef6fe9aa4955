//! Tool invocations against the live mock server.

use hass_core::{ClientConfig, ErrorKind, HassClient};
use hass_tools::{invoke, Failure};
use serde_json::{json, Value};

const TOKEN: &str = "tools-token";

async fn client_with_token(token: &str) -> HassClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener, TOKEN));
    HassClient::new(ClientConfig::new(&format!("http://{addr}"), token)).unwrap()
}

async fn client() -> HassClient {
    client_with_token(TOKEN).await
}

fn json_text(text: &str) -> Value {
    serde_json::from_str(text).unwrap()
}

#[tokio::test]
async fn get_states_filters_by_domain() {
    let client = client().await;

    let result = invoke(&client, "ha_get_states", &json!({ "domain": "light" })).await;
    assert!(!result.is_error());
    let out = json_text(&result.text);
    assert_eq!(out["count"], 2);
    assert_eq!(out["entities"][0]["entity_id"], "light.kitchen");
    assert_eq!(out["entities"][1]["entity_id"], "light.living_room");
}

#[tokio::test]
async fn get_state_not_found_renders_suggestions() {
    let client = client().await;

    let result = invoke(&client, "ha_get_state", &json!({ "entity_id": "light.nope" })).await;
    assert_eq!(
        result.failure,
        Some(Failure::Api {
            kind: ErrorKind::NotFound,
            status: 404
        })
    );
    let out = json_text(&result.text);
    assert_eq!(out["error"], true);
    assert_eq!(out["statusCode"], 404);
    assert_eq!(out["suggestions"][1], "Use ha_get_states to list all available entities");
}

#[tokio::test]
async fn bad_token_renders_authentication_error() {
    let client = client_with_token("wrong").await;

    let result = invoke(&client, "ha_check_api", &Value::Null).await;
    assert!(matches!(
        result.failure,
        Some(Failure::Api {
            kind: ErrorKind::Authentication,
            status: 401
        })
    ));
    assert!(result.text.contains("Long-Lived Access Token"));
}

#[tokio::test]
async fn call_service_reports_changes() {
    let client = client().await;

    let result = invoke(
        &client,
        "ha_call_service",
        &json!({
            "domain": "switch",
            "service": "toggle",
            "target": { "entity_id": "switch.coffee_maker" }
        }),
    )
    .await;
    assert!(!result.is_error(), "{}", result.text);
    assert!(result.text.contains("`switch.coffee_maker` → `on`"));
}

#[tokio::test]
async fn render_template_and_error_log() {
    let client = client().await;

    let result = invoke(
        &client,
        "ha_render_template",
        &json!({ "template": "{{ states('sensor.outdoor_temperature') }}" }),
    )
    .await;
    assert!(result.text.contains("```\n21.5\n```"));

    let result = invoke(&client, "ha_get_error_log", &json!({})).await;
    let out = json_text(&result.text);
    assert_eq!(out["total_lines"], 2);
    assert_eq!(out["error_count"], 1);
    assert_eq!(out["warning_count"], 1);
}

#[tokio::test]
async fn set_and_delete_state() {
    let client = client().await;

    let result = invoke(
        &client,
        "ha_set_state",
        &json!({ "entity_id": "sensor.custom", "state": "12", "attributes": { "unit": "W" } }),
    )
    .await;
    assert!(result.text.contains("**New State:** `12`"));

    let result = invoke(&client, "ha_delete_state", &json!({ "entity_id": "sensor.custom" })).await;
    assert!(!result.is_error());
    assert!(result.text.contains("**Result:** Deleted successfully"));
}

#[tokio::test]
async fn calendar_events_and_intent() {
    let client = client().await;

    let result = invoke(
        &client,
        "ha_get_calendar_events",
        &json!({ "calendar_entity_id": "calendar.family", "start": "2024-05-01", "end": "2024-05-31" }),
    )
    .await;
    let out = json_text(&result.text);
    assert_eq!(out["count"], 2);
    assert_eq!(out["time_range"]["end"], "2024-05-31");

    let result = invoke(
        &client,
        "ha_handle_intent",
        &json!({ "name": "HassTurnOn", "data": { "name": { "value": "kitchen" } } }),
    )
    .await;
    assert!(result.text.contains("> Handled HassTurnOn"));
    assert!(result.text.contains("**Language:** en"));
}
