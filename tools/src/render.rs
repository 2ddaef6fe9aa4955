//! Turns operation outcomes into the text handed back to the agent.
//!
//! Read tools answer with pretty-printed JSON summaries; write tools answer
//! with a short Markdown report. Failures are always JSON.

use hass_core::{
    ApiError, ApiStatus, CalendarEntity, CalendarEvent, CheckConfigResponse, DeleteStateResponse,
    EntityState, ErrorKind, EventType, FireEventResponse, HandleIntentResponse, HistoryEntry,
    HistoryQuery, LogbookEntry, LogbookQuery, ServiceCallResponse, ServiceCallTarget, ServiceDomain,
};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::params::ToolError;

const RECENT_LOG_LINES: usize = 100;

/// Pretty JSON with two-space indentation.
pub(crate) fn pretty<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(v) => format!("{v:#}"),
        Err(e) => format!("{{\"error\": true, \"message\": \"{e}\"}}"),
    }
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

/// Remediation hints for a failure category.
pub fn suggestions(kind: ErrorKind) -> &'static [&'static str] {
    match kind {
        ErrorKind::Authentication => &[
            "Check if your access token is valid",
            "Generate a new Long-Lived Access Token in Home Assistant",
            "Update the access token in the client settings",
        ],
        ErrorKind::NotFound => &[
            "Verify the entity ID exists",
            "Use ha_get_states to list all available entities",
        ],
        ErrorKind::Timeout => &[
            "Check if Home Assistant is running",
            "Verify the URL in settings",
            "Increase the request timeout in settings",
        ],
        ErrorKind::Network => &[
            "Check your network connection",
            "Verify the Home Assistant URL is correct",
            "Ensure Home Assistant is accessible from this machine",
        ],
        ErrorKind::Decode | ErrorKind::Unclassified => &[],
    }
}

pub fn api_error(err: &ApiError) -> String {
    pretty(&json!({
        "error": true,
        "message": err.message(),
        "statusCode": err.status(),
        "details": err.detail(),
        "kind": err.kind().as_str(),
        "suggestions": suggestions(err.kind()),
    }))
}

pub fn validation_error(err: &ToolError) -> String {
    pretty(&json!({ "error": true, "message": err.to_string() }))
}

// ---------------------------------------------------------------------------
// Read tools
// ---------------------------------------------------------------------------

pub fn check_api(status: &ApiStatus) -> String {
    pretty(&json!({ "success": true, "message": status.message }))
}

pub fn components(mut components: Vec<String>) -> String {
    components.sort();
    pretty(&json!({ "count": components.len(), "components": components }))
}

/// Filter, sort and summarize entity states.
///
/// `domain` matches the part before the first dot, case-insensitively, with
/// one trailing dot tolerated. `search` matches `entity_id` or the friendly
/// name as a case-insensitive substring.
pub fn states(states: &[EntityState], domain: Option<&str>, search: Option<&str>) -> String {
    let domain = domain.filter(|d| !d.is_empty());
    let search = search.filter(|s| !s.is_empty()).map(str::to_lowercase);
    let prefix = domain.map(|d| {
        let d = d.to_lowercase();
        format!("{}.", d.strip_suffix('.').unwrap_or(d.as_str()))
    });

    let mut matching: Vec<&EntityState> = states
        .iter()
        .filter(|s| {
            prefix
                .as_deref()
                .is_none_or(|p| s.entity_id.to_lowercase().starts_with(p))
        })
        .filter(|s| {
            search.as_deref().is_none_or(|needle| {
                s.entity_id.to_lowercase().contains(needle)
                    || s.friendly_name()
                        .is_some_and(|name| name.to_lowercase().contains(needle))
            })
        })
        .collect();
    matching.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));

    let entities: Vec<Value> = matching
        .iter()
        .map(|s| {
            json!({
                "entity_id": s.entity_id,
                "state": s.state,
                "friendly_name": s.friendly_name(),
                "last_changed": s.last_changed,
            })
        })
        .collect();

    pretty(&json!({
        "count": entities.len(),
        "total_entities": states.len(),
        "filters": { "domain": domain, "search": search },
        "entities": entities,
    }))
}

/// Flatten service domains into `domain.service` entries with their fields.
pub fn services(domains: &[ServiceDomain], domain: Option<&str>) -> String {
    let filter = domain.filter(|d| !d.is_empty()).map(str::to_lowercase);
    let mut matching: Vec<&ServiceDomain> = domains
        .iter()
        .filter(|d| filter.as_deref().is_none_or(|f| d.domain.to_lowercase() == f))
        .collect();
    matching.sort_by(|a, b| a.domain.cmp(&b.domain));

    let output: Vec<Value> = matching
        .iter()
        .map(|d| {
            let services: Vec<Value> = d
                .services
                .iter()
                .map(|(name, def)| {
                    let fields: Vec<Value> = def
                        .fields
                        .iter()
                        .map(|(field_name, field)| {
                            json!({
                                "name": field_name,
                                "description": field.description,
                                "required": field.required,
                                "example": field.example,
                            })
                        })
                        .collect();
                    json!({
                        "service": format!("{}.{name}", d.domain),
                        "name": def.name.as_deref().unwrap_or(name.as_str()),
                        "description": def.description,
                        "fields": fields,
                    })
                })
                .collect();
            json!({ "domain": d.domain, "services": services })
        })
        .collect();

    let count: usize = output
        .iter()
        .map(|d| d["services"].as_array().map_or(0, Vec::len))
        .sum();
    pretty(&json!({
        "count": count,
        "domains": output.len(),
        "filter": filter,
        "services": output,
    }))
}

pub fn events(mut events: Vec<EventType>) -> String {
    events.sort_by(|a, b| a.event.cmp(&b.event));
    pretty(&json!({ "count": events.len(), "events": events }))
}

pub fn history(history: &[Vec<HistoryEntry>], query: &HistoryQuery) -> String {
    let total: usize = history.iter().map(Vec::len).sum();
    pretty(&json!({
        "entities_with_history": history.len(),
        "total_entries": total,
        "filters": {
            "timestamp": query.start.as_deref().filter(|s| !s.is_empty()).unwrap_or("last 24 hours"),
            "end_time": query.end_time.as_deref().unwrap_or("now"),
            "entity_id": query.entity_id,
            "minimal_response": query.minimal_response,
        },
        "history": history,
    }))
}

pub fn logbook(entries: &[LogbookEntry], query: &LogbookQuery) -> String {
    pretty(&json!({
        "count": entries.len(),
        "filters": {
            "timestamp": query.start.as_deref().filter(|s| !s.is_empty()).unwrap_or("last 24 hours"),
            "end_time": query.end_time.as_deref().unwrap_or("now"),
            "entity_id": query.entity_id,
        },
        "entries": entries,
    }))
}

/// Summarize the last non-blank lines of the error log.
pub fn error_log(log: &str) -> String {
    let lines: Vec<&str> = log.lines().filter(|l| !l.trim().is_empty()).collect();
    let recent = &lines[lines.len().saturating_sub(RECENT_LOG_LINES)..];
    let error_count = lines
        .iter()
        .filter(|l| {
            let l = l.to_lowercase();
            l.contains("error") || l.contains("exception")
        })
        .count();
    let warning_count = lines
        .iter()
        .filter(|l| l.to_lowercase().contains("warning"))
        .count();

    pretty(&json!({
        "total_lines": lines.len(),
        "error_count": error_count,
        "warning_count": warning_count,
        "recent_entries": recent.len(),
        "log": recent.join("\n"),
    }))
}

pub fn calendars(mut calendars: Vec<CalendarEntity>) -> String {
    calendars.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
    pretty(&json!({ "count": calendars.len(), "calendars": calendars }))
}

pub fn calendar_events(calendar: &str, start: &str, end: &str, events: &[CalendarEvent]) -> String {
    pretty(&json!({
        "calendar": calendar,
        "time_range": { "start": start, "end": end },
        "count": events.len(),
        "events": events,
    }))
}

// ---------------------------------------------------------------------------
// Write tools
// ---------------------------------------------------------------------------

fn json_block(value: &impl Serialize) -> String {
    format!("```json\n{}\n```", pretty(value))
}

pub fn service_call(
    domain: &str,
    service: &str,
    service_data: Option<&Map<String, Value>>,
    target: Option<&ServiceCallTarget>,
    response: &ServiceCallResponse,
) -> String {
    let target = match target.filter(|t| !t.is_empty()) {
        Some(t) => pretty(t),
        None => "all".to_string(),
    };
    let data = service_data.cloned().unwrap_or_default();
    let mut out = format!(
        "## Service Call Result ✅\n\n**Action:** `{domain}.{service}`\n\n**Target:** {target}\n\n**Service Data:**\n{}\n\n",
        json_block(&data)
    );
    if response.changed_states.is_empty() {
        out.push_str("**Result:** Service called successfully (no state changes reported)\n");
    } else {
        out.push_str(&format!(
            "**Changed States ({}):**\n",
            response.changed_states.len()
        ));
        for s in &response.changed_states {
            out.push_str(&format!("- `{}` → `{}`\n", s.entity_id, s.state));
        }
    }
    out
}

pub fn fire_event(
    event_type: &str,
    event_data: Option<&Map<String, Value>>,
    response: &FireEventResponse,
) -> String {
    let data = event_data.cloned().unwrap_or_default();
    format!(
        "## Event Fired Successfully 🎯\n\n**Event Type:** `{event_type}`\n\n**Event Data:**\n{}\n\n**Response:** {}\n",
        json_block(&data),
        response.message.as_deref().unwrap_or("Event fired successfully")
    )
}

pub fn set_state(state: &EntityState) -> String {
    format!(
        "## Entity State Updated ✏️\n\n**Entity ID:** `{}`\n\n**New State:** `{}`\n\n**Attributes:**\n{}\n\n**Last Changed:** {}\n**Last Updated:** {}\n",
        state.entity_id,
        state.state,
        json_block(&state.attributes),
        state.last_changed,
        state.last_updated
    )
}

pub fn template(template: &str, variables: Option<&Map<String, Value>>, result: &str) -> String {
    let variables = variables
        .map(|v| format!("**Variables:**\n{}\n\n", json_block(v)))
        .unwrap_or_default();
    format!(
        "## Template Rendered 📝\n\n**Template:**\n```jinja2\n{template}\n```\n\n{variables}**Result:**\n```\n{result}\n```\n"
    )
}

pub fn check_config(check: &CheckConfigResponse) -> String {
    if check.result.is_empty() {
        return "## Configuration Check ⚠️\n\n**Status:** Unknown\n\nThe server did not report a check result.\n".to_string();
    }
    let (icon, status) = if check.is_valid() {
        ("✅", "Valid")
    } else {
        ("❌", "Invalid")
    };
    let mut out = format!("## Configuration Check {icon}\n\n**Status:** {status}\n");
    match check.errors.as_deref().filter(|e| !e.is_empty()) {
        Some(errors) => out.push_str(&format!("\n**Errors:**\n```\n{errors}\n```\n")),
        None => out.push_str("\nNo configuration errors found. Your configuration is valid!\n"),
    }
    out
}

pub fn intent(name: &str, data: Option<&Value>, response: &HandleIntentResponse) -> String {
    let data = data
        .map(|d| format!("**Intent Data:**\n{}\n\n", json_block(d)))
        .unwrap_or_default();
    let mut out = format!(
        "## Intent Handled 🗣️\n\n**Intent Name:** `{name}`\n\n{data}**Response Type:** {}\n\n**Speech Response:**\n> {}\n\n**Language:** {}\n",
        response.response_type.as_deref().unwrap_or("unknown"),
        response.speech_text().unwrap_or("No speech response"),
        response.language.as_deref().unwrap_or("unknown"),
    );
    for (label, list) in [
        ("Targets", &response.data.targets),
        ("Successful", &response.data.success),
        ("Failed", &response.data.failed),
    ] {
        if !list.is_empty() {
            out.push_str(&format!("\n**{label}:** {}", Value::Array(list.clone())));
        }
    }
    out
}

pub fn delete_state(entity_id: &str, ack: &DeleteStateResponse) -> String {
    format!(
        "## Entity State Deleted 🗑️\n\n**Entity ID:** `{entity_id}`\n\n**Result:** {}\n\n> **Note:** This removes the entity state from Home Assistant's state machine.\n> If the entity is provided by an integration, it will be recreated on the next update.\n",
        ack.message
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(id: &str, value: &str, friendly: Option<&str>) -> EntityState {
        let mut attributes = Map::new();
        if let Some(name) = friendly {
            attributes.insert("friendly_name".to_string(), json!(name));
        }
        EntityState {
            entity_id: id.to_string(),
            state: value.to_string(),
            attributes,
            last_changed: "2024-01-01T00:00:00+00:00".to_string(),
            last_updated: "2024-01-01T00:00:00+00:00".to_string(),
            context: None,
        }
    }

    fn parse(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn api_error_includes_suggestions_for_kind() {
        let err = ApiError::from_status(401, "Unauthorized", "401: Unauthorized");
        let out = parse(&api_error(&err));
        assert_eq!(out["error"], true);
        assert_eq!(out["statusCode"], 401);
        assert_eq!(out["kind"], "authentication");
        assert_eq!(out["details"], "401: Unauthorized");
        assert_eq!(out["suggestions"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn unclassified_error_has_no_suggestions() {
        let err = ApiError::from_status(500, "Internal Server Error", "boom");
        let out = parse(&api_error(&err));
        assert!(out["suggestions"].as_array().unwrap().is_empty());
    }

    #[test]
    fn validation_error_is_json() {
        let out = parse(&validation_error(&ToolError::MissingParameter("entity_id")));
        assert_eq!(out, json!({ "error": true, "message": "Required parameter 'entity_id' is missing" }));
    }

    #[test]
    fn states_filters_by_domain_with_trailing_dot() {
        let all = vec![
            state("sensor.b", "1", None),
            state("light.kitchen", "on", Some("Kitchen")),
            state("lightning.x", "off", None),
        ];
        let out = parse(&states(&all, Some("Light."), None));
        assert_eq!(out["count"], 1);
        assert_eq!(out["total_entities"], 3);
        assert_eq!(out["entities"][0]["entity_id"], "light.kitchen");
        assert_eq!(out["filters"]["domain"], "Light.");
    }

    #[test]
    fn states_search_matches_friendly_name_and_sorts() {
        let all = vec![
            state("switch.z", "off", Some("Kitchen kettle")),
            state("light.kitchen", "on", None),
            state("sensor.temp", "20", Some("Outdoor")),
        ];
        let out = parse(&states(&all, None, Some("KITCHEN")));
        assert_eq!(out["count"], 2);
        assert_eq!(out["entities"][0]["entity_id"], "light.kitchen");
        assert_eq!(out["entities"][1]["entity_id"], "switch.z");
        assert_eq!(out["filters"]["search"], "kitchen");
        assert_eq!(out["filters"]["domain"], Value::Null);
    }

    #[test]
    fn services_flattens_and_counts() {
        let domains: Vec<ServiceDomain> = serde_json::from_value(json!([
            { "domain": "switch", "services": { "toggle": {} } },
            { "domain": "light", "services": {
                "turn_on": { "name": "Turn on", "fields": { "brightness": { "description": "0-255", "example": 120 } } },
                "turn_off": {}
            } }
        ]))
        .unwrap();
        let out = parse(&services(&domains, None));
        assert_eq!(out["count"], 3);
        assert_eq!(out["domains"], 2);
        assert_eq!(out["services"][0]["domain"], "light");
        assert_eq!(out["services"][0]["services"][0]["service"], "light.turn_off");
        assert_eq!(out["services"][0]["services"][0]["name"], "turn_off");
        assert_eq!(out["services"][0]["services"][1]["fields"][0]["required"], false);

        let out = parse(&services(&domains, Some("SWITCH")));
        assert_eq!(out["count"], 1);
        assert_eq!(out["filter"], "switch");
    }

    #[test]
    fn error_log_counts_and_keeps_recent_lines() {
        let mut log = String::new();
        for i in 0..150 {
            log.push_str(&format!("line {i} INFO\n\n"));
        }
        log.push_str("WARNING something\nERROR broke\nTraceback Exception\n");
        let out = parse(&error_log(&log));
        assert_eq!(out["total_lines"], 153);
        assert_eq!(out["error_count"], 2);
        assert_eq!(out["warning_count"], 1);
        assert_eq!(out["recent_entries"], 100);
        assert!(out["log"].as_str().unwrap().ends_with("Traceback Exception"));
    }

    #[test]
    fn history_filters_describe_defaults() {
        let out = parse(&history(&[vec![]], &HistoryQuery::default()));
        assert_eq!(out["entities_with_history"], 1);
        assert_eq!(out["total_entries"], 0);
        assert_eq!(out["filters"]["timestamp"], "last 24 hours");
        assert_eq!(out["filters"]["end_time"], "now");
    }

    #[test]
    fn service_call_lists_changed_states() {
        let response = ServiceCallResponse {
            changed_states: vec![state("light.kitchen", "on", None)],
        };
        let target = ServiceCallTarget::entity("light.kitchen");
        let out = service_call("light", "turn_on", None, Some(&target), &response);
        assert!(out.contains("**Action:** `light.turn_on`"));
        assert!(out.contains("\"entity_id\": \"light.kitchen\""));
        assert!(out.contains("- `light.kitchen` → `on`"));
    }

    #[test]
    fn service_call_without_target_or_changes() {
        let response = ServiceCallResponse { changed_states: vec![] };
        let out = service_call("script", "noop", None, None, &response);
        assert!(out.contains("**Target:** all"));
        assert!(out.contains("no state changes reported"));
    }

    #[test]
    fn check_config_reports_errors() {
        let check = CheckConfigResponse {
            result: "invalid".to_string(),
            errors: Some("Integration error: foo".to_string()),
        };
        let out = check_config(&check);
        assert!(out.contains("**Status:** Invalid"));
        assert!(out.contains("Integration error: foo"));
    }

    #[test]
    fn check_config_without_result_is_unknown() {
        let out = check_config(&CheckConfigResponse::default());
        assert!(out.contains("**Status:** Unknown"));
        assert!(!out.contains("Invalid"));
    }

    #[test]
    fn template_omits_variables_section_when_absent() {
        let out = template("{{ 1 + 1 }}", None, "2");
        assert!(!out.contains("**Variables:**"));
        assert!(out.contains("```\n2\n```"));
    }

    #[test]
    fn intent_without_speech() {
        let out = intent("HassNevermind", None, &HandleIntentResponse::default());
        assert!(out.contains("> No speech response"));
        assert!(out.contains("**Response Type:** unknown"));
        assert!(!out.contains("**Targets:**"));
    }
}
