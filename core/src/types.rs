//! DTOs for the Home Assistant REST API.
//!
//! # Design
//! Only the fields callers rely on are typed. Unknown fields are ignored (or
//! carried in a flattened map where the payload is open-ended) and optional
//! fields default, so minor server-version drift does not turn into decode
//! failures.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `{"message": "..."}` as returned by `GET /api/` and several writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiStatus {
    pub message: String,
}

/// Context attached to a state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityContext {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Current state of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub last_changed: String,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<EntityContext>,
}

impl EntityState {
    pub fn friendly_name(&self) -> Option<&str> {
        self.attributes.get("friendly_name").and_then(Value::as_str)
    }

    /// The part of `entity_id` before the first dot.
    pub fn domain(&self) -> &str {
        self.entity_id.split('.').next().unwrap_or("")
    }
}

/// Services offered by one integration domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDomain {
    pub domain: String,
    #[serde(default)]
    pub services: BTreeMap<String, ServiceDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, ServiceField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<Value>,
}

/// An event type and how many listeners it has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventType {
    pub event: String,
    #[serde(default)]
    pub listener_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogbookEntry {
    pub when: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_user_id: Option<String>,
}

/// One state sample in a history series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub state: String,
    #[serde(default)]
    pub last_changed: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntity {
    pub entity_id: String,
    #[serde(default)]
    pub name: String,
}

/// Start or end of a calendar event: a timestamp string, or an object with
/// `date` (all-day events) or `dateTime`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CalendarTime {
    Text(String),
    Object {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date: Option<String>,
        #[serde(default, rename = "dateTime", skip_serializing_if = "Option::is_none")]
        date_time: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub summary: String,
    pub start: CalendarTime,
    pub end: CalendarTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rrule: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSystem {
    #[serde(default)]
    pub length: String,
    #[serde(default)]
    pub accumulated_precipitation: String,
    #[serde(default)]
    pub mass: String,
    #[serde(default)]
    pub pressure: String,
    #[serde(default)]
    pub temperature: String,
    #[serde(default)]
    pub volume: String,
    #[serde(default)]
    pub wind_speed: String,
}

/// Server configuration from `GET /api/config`. Fields not modelled here are
/// kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeAssistantConfig {
    #[serde(default)]
    pub location_name: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub elevation: f64,
    #[serde(default)]
    pub unit_system: UnitSystem,
    #[serde(default)]
    pub time_zone: String,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub internal_url: Option<String>,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub language: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A string or a list of strings, as accepted by service call targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for OneOrMany {
    fn from(s: &str) -> Self {
        OneOrMany::One(s.to_string())
    }
}

/// Which entities, devices or areas a service call acts on. Unset selectors
/// are omitted from the request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCallTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<OneOrMany>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<OneOrMany>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_id: Option<OneOrMany>,
}

impl ServiceCallTarget {
    pub fn entity(entity_id: &str) -> Self {
        Self {
            entity_id: Some(entity_id.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entity_id.is_none() && self.device_id.is_none() && self.area_id.is_none()
    }
}

/// States changed by a service call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCallResponse {
    pub changed_states: Vec<EntityState>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireEventResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckConfigResponse {
    /// `"valid"` or `"invalid"`.
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub errors: Option<String>,
}

impl CheckConfigResponse {
    pub fn is_valid(&self) -> bool {
        self.result == "valid"
    }
}

/// Slot value passed to an intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentSlotValue {
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentSpeech {
    #[serde(default)]
    pub speech: String,
    #[serde(default)]
    pub extra_data: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentSpeechSet {
    #[serde(default)]
    pub plain: Option<IntentSpeech>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentResultData {
    #[serde(default)]
    pub targets: Vec<Value>,
    #[serde(default)]
    pub success: Vec<Value>,
    #[serde(default)]
    pub failed: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandleIntentResponse {
    #[serde(default)]
    pub speech: IntentSpeechSet,
    #[serde(default)]
    pub card: Map<String, Value>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub response_type: Option<String>,
    #[serde(default)]
    pub data: IntentResultData,
}

impl HandleIntentResponse {
    pub fn speech_text(&self) -> Option<&str> {
        self.speech
            .plain
            .as_ref()
            .map(|p| p.speech.as_str())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteStateResponse {
    pub message: String,
}

/// Filters for `GET /api/history/period/<start>`.
///
/// An empty or absent `start` lets the server pick its default window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub start: Option<String>,
    pub end_time: Option<String>,
    /// One entity id or a comma-separated list.
    pub entity_id: Option<String>,
    pub minimal_response: bool,
    pub significant_changes_only: bool,
    pub no_attributes: bool,
}

/// Filters for `GET /api/logbook/<start>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogbookQuery {
    pub start: Option<String>,
    pub end_time: Option<String>,
    pub entity_id: Option<String>,
}
