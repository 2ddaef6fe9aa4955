//! In-memory stand-in for a Home Assistant instance.
//!
//! Serves the REST endpoints the client core talks to, behind bearer-token
//! authentication, with a small seeded set of entities. Some responses are
//! deliberately shaped like the quirky ones real servers send: `DELETE` on a
//! state answers 200 with an empty body, and a `script` service call returns
//! no body at all.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

const TIMESTAMP: &str = "2024-05-01T12:00:00+00:00";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Context {
    pub id: String,
    pub parent_id: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateObject {
    pub entity_id: String,
    pub state: String,
    pub attributes: Map<String, Value>,
    pub last_changed: String,
    pub last_updated: String,
    pub context: Context,
}

impl StateObject {
    fn new(entity_id: &str, state: &str, attributes: Value) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            state: state.to_string(),
            attributes: match attributes {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            last_changed: TIMESTAMP.to_string(),
            last_updated: TIMESTAMP.to_string(),
            context: Context {
                id: Uuid::new_v4().simple().to_string(),
                parent_id: None,
                user_id: None,
            },
        }
    }
}

#[derive(Deserialize)]
pub struct SetState {
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct RenderTemplate {
    pub template: String,
    #[serde(default)]
    pub variables: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct HandleIntent {
    pub name: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct HistoryParams {
    pub filter_entity_id: Option<String>,
    #[serde(default)]
    pub minimal_response: Option<String>,
    #[serde(default)]
    pub no_attributes: Option<String>,
}

#[derive(Deserialize)]
pub struct LogbookParams {
    pub entity: Option<String>,
}

#[derive(Deserialize)]
pub struct CalendarRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

pub struct Hass {
    token: String,
    states: RwLock<BTreeMap<String, StateObject>>,
}

pub type Shared = Arc<Hass>;

fn seed() -> BTreeMap<String, StateObject> {
    [
        StateObject::new(
            "light.kitchen",
            "on",
            json!({ "friendly_name": "Kitchen Light", "brightness": 255 }),
        ),
        StateObject::new("light.living_room", "off", json!({ "friendly_name": "Living Room" })),
        StateObject::new(
            "sensor.outdoor_temperature",
            "21.5",
            json!({ "friendly_name": "Outdoor Temperature", "unit_of_measurement": "°C" }),
        ),
        StateObject::new("switch.coffee_maker", "off", json!({ "friendly_name": "Coffee Maker" })),
        StateObject::new("calendar.family", "off", json!({ "friendly_name": "Family" })),
    ]
    .into_iter()
    .map(|s| (s.entity_id.clone(), s))
    .collect()
}

/// Router accepting only `Authorization: Bearer <token>`.
pub fn app(token: &str) -> Router {
    let hass: Shared = Arc::new(Hass {
        token: token.to_string(),
        states: RwLock::new(seed()),
    });
    Router::new()
        .route("/api/", get(api_status))
        .route("/api/config", get(config))
        .route("/api/components", get(components))
        .route("/api/states", get(list_states))
        .route(
            "/api/states/{entity_id}",
            get(get_state).post(set_state).delete(delete_state),
        )
        .route("/api/services", get(list_services))
        .route("/api/services/{domain}/{service}", post(call_service))
        .route("/api/events", get(list_events))
        .route("/api/events/{event_type}", post(fire_event))
        .route("/api/history/period/", get(history_default))
        .route("/api/history/period/{timestamp}", get(history_since))
        .route("/api/logbook/", get(logbook_default))
        .route("/api/logbook/{timestamp}", get(logbook_since))
        .route("/api/error_log", get(error_log))
        .route("/api/calendars", get(list_calendars))
        .route("/api/calendars/{entity_id}", get(calendar_events))
        .route("/api/template", post(render_template))
        .route("/api/config/core/check_config", post(check_config))
        .route("/api/intent/handle", post(handle_intent))
        .route_layer(middleware::from_fn_with_state(hass.clone(), require_token))
        .with_state(hass)
}

pub async fn run(listener: TcpListener, token: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(token)).await
}

async fn require_token(State(hass): State<Shared>, request: Request, next: Next) -> Response {
    if bearer(request.headers()) != Some(hass.token.as_str()) {
        debug!(path = %request.uri().path(), "rejecting unauthenticated request");
        return (StatusCode::UNAUTHORIZED, "401: Unauthorized").into_response();
    }
    next.run(request).await
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn not_found(what: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "message": format!("{what} not found.") }))).into_response()
}

fn plain_text(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

async fn api_status() -> Json<Value> {
    Json(json!({ "message": "API running." }))
}

async fn config() -> Json<Value> {
    Json(json!({
        "components": ["api", "calendar", "light", "sensor", "switch"],
        "config_dir": "/config",
        "elevation": 12,
        "latitude": 52.37,
        "longitude": 4.89,
        "location_name": "Home",
        "time_zone": "Europe/Amsterdam",
        "unit_system": {
            "length": "km",
            "mass": "g",
            "pressure": "Pa",
            "temperature": "°C",
            "volume": "L"
        },
        "version": "2024.5.0",
        "whitelist_external_dirs": ["/config/www"],
        "state": "RUNNING"
    }))
}

async fn components() -> Json<Vec<&'static str>> {
    Json(vec!["api", "calendar", "light", "sensor", "switch"])
}

async fn list_states(State(hass): State<Shared>) -> Json<Vec<StateObject>> {
    Json(hass.states.read().await.values().cloned().collect())
}

async fn get_state(State(hass): State<Shared>, Path(entity_id): Path<String>) -> Response {
    match hass.states.read().await.get(&entity_id) {
        Some(state) => Json(state.clone()).into_response(),
        None => not_found("Entity"),
    }
}

async fn set_state(
    State(hass): State<Shared>,
    Path(entity_id): Path<String>,
    Json(input): Json<SetState>,
) -> (StatusCode, Json<StateObject>) {
    let mut states = hass.states.write().await;
    let created = !states.contains_key(&entity_id);
    let state = StateObject::new(&entity_id, &input.state, Value::Object(input.attributes));
    states.insert(entity_id, state.clone());
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    (status, Json(state))
}

async fn delete_state(State(hass): State<Shared>, Path(entity_id): Path<String>) -> Response {
    match hass.states.write().await.remove(&entity_id) {
        Some(_) => StatusCode::OK.into_response(),
        None => not_found("Entity"),
    }
}

async fn list_services() -> Json<Value> {
    Json(json!([
        {
            "domain": "light",
            "services": {
                "turn_on": {
                    "name": "Turn on",
                    "description": "Turn on one or more lights.",
                    "fields": {
                        "brightness": { "description": "Brightness 0-255", "example": 120 }
                    }
                },
                "turn_off": { "name": "Turn off", "description": "Turn off one or more lights.", "fields": {} },
                "toggle": { "name": "Toggle", "description": "Toggle one or more lights.", "fields": {} }
            }
        },
        {
            "domain": "switch",
            "services": {
                "turn_on": { "name": "Turn on", "fields": {} },
                "turn_off": { "name": "Turn off", "fields": {} },
                "toggle": { "name": "Toggle", "fields": {} }
            }
        },
        {
            "domain": "script",
            "services": { "noop": { "name": "No-op", "fields": {} } }
        }
    ]))
}

fn target_ids(body: &Map<String, Value>) -> Vec<String> {
    match body.get("entity_id") {
        Some(Value::String(id)) => vec![id.clone()],
        Some(Value::Array(ids)) => ids.iter().filter_map(|v| v.as_str().map(String::from)).collect(),
        _ => Vec::new(),
    }
}

async fn call_service(
    State(hass): State<Shared>,
    Path((domain, service)): Path<(String, String)>,
    Json(body): Json<Map<String, Value>>,
) -> Response {
    match domain.as_str() {
        "light" | "switch" => {}
        // Scripts run without reporting state changes and answer with no body.
        "script" => return StatusCode::OK.into_response(),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": format!("Service {domain}.{service} not found.") })),
            )
                .into_response()
        }
    }

    let mut states = hass.states.write().await;
    let mut changed = Vec::new();
    for id in target_ids(&body) {
        let Some(current) = states.get(&id) else {
            continue;
        };
        let next = match service.as_str() {
            "turn_on" => "on",
            "turn_off" => "off",
            "toggle" if current.state == "on" => "off",
            "toggle" => "on",
            _ => continue,
        };
        let mut attributes = current.attributes.clone();
        for (key, value) in body.iter().filter(|(k, _)| k.as_str() != "entity_id") {
            attributes.insert(key.clone(), value.clone());
        }
        let updated = StateObject::new(&id, next, Value::Object(attributes));
        states.insert(id, updated.clone());
        changed.push(updated);
    }
    debug!(%domain, %service, changed = changed.len(), "service called");
    Json(changed).into_response()
}

async fn list_events() -> Json<Value> {
    Json(json!([
        { "event": "state_changed", "listener_count": 5 },
        { "event": "call_service", "listener_count": 1 },
        { "event": "homeassistant_start", "listener_count": 2 }
    ]))
}

async fn fire_event(Path(event_type): Path<String>) -> Json<Value> {
    Json(json!({ "message": format!("Event {event_type} fired.") }))
}

async fn history_default(
    State(hass): State<Shared>,
    Query(params): Query<HistoryParams>,
) -> Json<Vec<Vec<Value>>> {
    history(&hass, TIMESTAMP, params).await
}

async fn history_since(
    State(hass): State<Shared>,
    Path(start): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Json<Vec<Vec<Value>>> {
    history(&hass, &start, params).await
}

async fn history(hass: &Hass, start: &str, params: HistoryParams) -> Json<Vec<Vec<Value>>> {
    let minimal = params.minimal_response.is_some();
    let no_attributes = params.no_attributes.is_some();
    let wanted: Option<Vec<&str>> = params
        .filter_entity_id
        .as_deref()
        .map(|ids| ids.split(',').map(str::trim).collect());

    let states = hass.states.read().await;
    let series = states
        .values()
        .filter(|s| wanted.as_ref().is_none_or(|ids| ids.contains(&s.entity_id.as_str())))
        .map(|s| {
            let first = if no_attributes {
                json!({ "entity_id": s.entity_id, "state": s.state, "last_changed": start })
            } else {
                json!({
                    "entity_id": s.entity_id,
                    "state": s.state,
                    "attributes": s.attributes,
                    "last_changed": start,
                    "last_updated": start
                })
            };
            // Minimal responses carry only state and timestamp after the first entry.
            let latest = if minimal {
                json!({ "state": s.state, "last_changed": s.last_changed })
            } else {
                json!({
                    "entity_id": s.entity_id,
                    "state": s.state,
                    "last_changed": s.last_changed,
                    "last_updated": s.last_updated
                })
            };
            vec![first, latest]
        })
        .collect();
    Json(series)
}

async fn logbook_default(
    State(hass): State<Shared>,
    Query(params): Query<LogbookParams>,
) -> Json<Vec<Value>> {
    logbook(&hass, TIMESTAMP, params).await
}

async fn logbook_since(
    State(hass): State<Shared>,
    Path(when): Path<String>,
    Query(params): Query<LogbookParams>,
) -> Json<Vec<Value>> {
    logbook(&hass, &when, params).await
}

async fn logbook(hass: &Hass, when: &str, params: LogbookParams) -> Json<Vec<Value>> {
    let states = hass.states.read().await;
    let entries = states
        .values()
        .filter(|s| params.entity.as_deref().is_none_or(|id| id == s.entity_id))
        .map(|s| {
            json!({
                "when": when,
                "name": s.attributes.get("friendly_name").cloned().unwrap_or(json!(s.entity_id)),
                "entity_id": s.entity_id,
                "state": s.state,
                "domain": s.entity_id.split('.').next().unwrap_or_default(),
                "message": format!("changed to {}", s.state)
            })
        })
        .collect();
    Json(entries)
}

async fn error_log() -> Response {
    plain_text(
        "2024-05-01 11:59:58 WARNING (MainThread) [homeassistant.components.http] Login attempt failed\n\
         2024-05-01 12:00:00 ERROR (MainThread) [homeassistant.components.sensor] Error while setting up platform\n"
            .to_string(),
    )
}

async fn list_calendars() -> Json<Value> {
    Json(json!([{ "entity_id": "calendar.family", "name": "Family" }]))
}

async fn calendar_events(Path(entity_id): Path<String>, Query(range): Query<CalendarRange>) -> Response {
    if entity_id != "calendar.family" {
        return not_found("Calendar");
    }
    let (Some(start), Some(_end)) = (range.start, range.end) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Missing start or end" })),
        )
            .into_response();
    };
    Json(json!([
        {
            "summary": "Dentist",
            "start": { "dateTime": start },
            "end": { "dateTime": start },
            "location": "Main Street 1"
        },
        {
            "summary": "Holiday",
            "start": { "date": "2024-05-20" },
            "end": { "date": "2024-05-21" },
            "description": "Whit Monday"
        }
    ]))
    .into_response()
}

/// Expand `{{ states('<id>') }}` and `{{ <variable> }}` placeholders.
fn render(template: &str, variables: &Map<String, Value>, states: &BTreeMap<String, StateObject>) -> String {
    let mut out = String::new();
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let Some(close) = rest[open..].find("}}") else {
            rest = &rest[open..];
            break;
        };
        let expr = rest[open + 2..open + close].trim();
        let value = match expr
            .strip_prefix("states('")
            .and_then(|e| e.strip_suffix("')"))
        {
            Some(id) => states.get(id).map(|s| s.state.clone()).unwrap_or_else(|| "unknown".to_string()),
            None => match variables.get(expr) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            },
        };
        out.push_str(&value);
        rest = &rest[open + close + 2..];
    }
    out.push_str(rest);
    out
}

async fn render_template(State(hass): State<Shared>, Json(input): Json<RenderTemplate>) -> Response {
    let states = hass.states.read().await;
    plain_text(render(&input.template, &input.variables, &states))
}

async fn check_config() -> Json<Value> {
    Json(json!({ "result": "valid", "errors": null }))
}

async fn handle_intent(Json(input): Json<HandleIntent>) -> Json<Value> {
    let slots: Vec<String> = input
        .data
        .iter()
        .map(|(slot, v)| format!("{slot}={}", v.get("value").unwrap_or(v)))
        .collect();
    let speech = if slots.is_empty() {
        format!("Handled {}", input.name)
    } else {
        format!("Handled {} with {}", input.name, slots.join(", "))
    };
    Json(json!({
        "speech": { "plain": { "speech": speech, "extra_data": null } },
        "card": {},
        "language": "en",
        "response_type": "action_done",
        "data": { "targets": [], "success": [], "failed": [] }
    }))
}
