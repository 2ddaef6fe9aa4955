//! Validation of untyped parameter bags into typed tool calls.
//!
//! Hosts hand over a JSON value per invocation. `ToolCall::parse` checks it
//! against the tool's declared parameters and produces one variant per tool,
//! so nothing loosely typed reaches the client.

use std::collections::BTreeMap;

use hass_core::{HistoryQuery, IntentSlotValue, LogbookQuery, ServiceCallTarget};
use serde_json::{Map, Value};
use thiserror::Error;

/// A parameter bag that does not fit the tool it was sent to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("Unknown tool '{0}'")]
    UnknownTool(String),

    #[error("Tool parameters must be a JSON object")]
    NotAnObject,

    #[error("Required parameter '{0}' is missing")]
    MissingParameter(&'static str),

    #[error("Parameter '{name}' must be {expected}")]
    InvalidType {
        name: &'static str,
        expected: &'static str,
    },
}

/// A validated invocation of one tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    CheckApi,
    GetConfig,
    GetComponents,
    GetStates {
        domain: Option<String>,
        search: Option<String>,
    },
    GetState {
        entity_id: String,
    },
    GetServices {
        domain: Option<String>,
    },
    GetEvents,
    GetHistory(HistoryQuery),
    GetLogbook(LogbookQuery),
    GetErrorLog,
    GetCalendars,
    GetCalendarEvents {
        calendar_entity_id: String,
        start: String,
        end: String,
    },
    CallService {
        domain: String,
        service: String,
        service_data: Option<Map<String, Value>>,
        target: Option<ServiceCallTarget>,
    },
    FireEvent {
        event_type: String,
        event_data: Option<Map<String, Value>>,
    },
    SetState {
        entity_id: String,
        state: String,
        attributes: Option<Map<String, Value>>,
    },
    RenderTemplate {
        template: String,
        variables: Option<Map<String, Value>>,
    },
    CheckConfig,
    HandleIntent {
        name: String,
        data: Option<BTreeMap<String, IntentSlotValue>>,
    },
    DeleteState {
        entity_id: String,
    },
}

impl ToolCall {
    /// Validate `params` for the tool called `name`. `null` counts as an
    /// empty bag.
    pub fn parse(name: &str, params: &Value) -> Result<Self, ToolError> {
        let empty = Map::new();
        let p = match params {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return Err(ToolError::NotAnObject),
        };

        let call = match name {
            "ha_check_api" => ToolCall::CheckApi,
            "ha_get_config" => ToolCall::GetConfig,
            "ha_get_components" => ToolCall::GetComponents,
            "ha_get_states" => ToolCall::GetStates {
                domain: optional_str(p, "domain")?,
                search: optional_str(p, "search")?,
            },
            "ha_get_state" => ToolCall::GetState {
                entity_id: required_str(p, "entity_id")?,
            },
            "ha_get_services" => ToolCall::GetServices {
                domain: optional_str(p, "domain")?,
            },
            "ha_get_events" => ToolCall::GetEvents,
            "ha_get_history" => ToolCall::GetHistory(HistoryQuery {
                start: optional_str(p, "timestamp")?,
                end_time: optional_str(p, "end_time")?,
                entity_id: optional_str(p, "entity_id")?,
                minimal_response: optional_bool(p, "minimal_response")?.unwrap_or(false),
                significant_changes_only: optional_bool(p, "significant_changes_only")?
                    .unwrap_or(false),
                no_attributes: optional_bool(p, "no_attributes")?.unwrap_or(false),
            }),
            "ha_get_logbook" => ToolCall::GetLogbook(LogbookQuery {
                start: optional_str(p, "timestamp")?,
                end_time: optional_str(p, "end_time")?,
                entity_id: optional_str(p, "entity_id")?,
            }),
            "ha_get_error_log" => ToolCall::GetErrorLog,
            "ha_get_calendars" => ToolCall::GetCalendars,
            "ha_get_calendar_events" => ToolCall::GetCalendarEvents {
                calendar_entity_id: required_str(p, "calendar_entity_id")?,
                start: required_str(p, "start")?,
                end: required_str(p, "end")?,
            },
            "ha_call_service" => ToolCall::CallService {
                domain: required_str(p, "domain")?,
                service: required_str(p, "service")?,
                service_data: optional_object(p, "service_data")?,
                target: optional_typed(p, "target", "an object of entity_id, device_id or area_id")?,
            },
            "ha_fire_event" => ToolCall::FireEvent {
                event_type: required_str(p, "event_type")?,
                event_data: optional_object(p, "event_data")?,
            },
            "ha_set_state" => ToolCall::SetState {
                entity_id: required_str(p, "entity_id")?,
                state: required_str(p, "state")?,
                attributes: optional_object(p, "attributes")?,
            },
            "ha_render_template" => ToolCall::RenderTemplate {
                template: required_str(p, "template")?,
                variables: optional_object(p, "variables")?,
            },
            "ha_check_config" => ToolCall::CheckConfig,
            "ha_handle_intent" => ToolCall::HandleIntent {
                name: required_str(p, "name")?,
                data: optional_typed(p, "data", "an object of {\"value\": ...} slots")?,
            },
            "ha_delete_state" => ToolCall::DeleteState {
                entity_id: required_str(p, "entity_id")?,
            },
            other => return Err(ToolError::UnknownTool(other.to_string())),
        };
        Ok(call)
    }
}

fn present<'a>(params: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    params.get(name).filter(|v| !v.is_null())
}

pub fn required_str(params: &Map<String, Value>, name: &'static str) -> Result<String, ToolError> {
    match present(params, name) {
        None => Err(ToolError::MissingParameter(name)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ToolError::InvalidType {
            name,
            expected: "a string",
        }),
    }
}

pub fn optional_str(
    params: &Map<String, Value>,
    name: &'static str,
) -> Result<Option<String>, ToolError> {
    match present(params, name) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ToolError::InvalidType {
            name,
            expected: "a string",
        }),
    }
}

pub fn optional_bool(
    params: &Map<String, Value>,
    name: &'static str,
) -> Result<Option<bool>, ToolError> {
    match present(params, name) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(ToolError::InvalidType {
            name,
            expected: "a boolean",
        }),
    }
}

pub fn optional_object(
    params: &Map<String, Value>,
    name: &'static str,
) -> Result<Option<Map<String, Value>>, ToolError> {
    match present(params, name) {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map.clone())),
        Some(_) => Err(ToolError::InvalidType {
            name,
            expected: "an object",
        }),
    }
}

fn optional_typed<T: serde::de::DeserializeOwned>(
    params: &Map<String, Value>,
    name: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ToolError> {
    match present(params, name) {
        None => Ok(None),
        Some(value @ Value::Object(_)) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|_| ToolError::InvalidType { name, expected }),
        Some(_) => Err(ToolError::InvalidType { name, expected }),
    }
}
