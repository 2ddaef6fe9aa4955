//! Catalog of invocable tools: names, descriptions and JSON input schemas.

use serde::Serialize;
use serde_json::{json, Value};

/// Metadata a host shows to the agent for one tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
    /// Tools that change server state; hosts ask the user before running them.
    pub requires_confirmation: bool,
}

impl ToolDefinition {
    /// Names listed under the schema's `required` key.
    pub fn required_params(&self) -> Vec<&str> {
        self.input_schema["required"]
            .as_array()
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

fn tool(
    name: &'static str,
    display_name: &'static str,
    description: &'static str,
    input_schema: Value,
) -> ToolDefinition {
    ToolDefinition {
        name,
        display_name,
        description,
        input_schema,
        requires_confirmation: false,
    }
}

fn no_params() -> Value {
    json!({ "type": "object", "properties": {}, "required": [] })
}

fn confirmed(mut def: ToolDefinition) -> ToolDefinition {
    def.requires_confirmation = true;
    def
}

/// Every tool, read-only ones first.
pub fn all_tools() -> Vec<ToolDefinition> {
    vec![
        tool(
            "ha_check_api",
            "Home Assistant: Check API",
            "Check if the Home Assistant API is running and accessible. Returns API status message.",
            no_params(),
        ),
        tool(
            "ha_get_config",
            "Home Assistant: Get Configuration",
            "Get Home Assistant configuration including location, timezone, version, and unit system. \
             Useful for understanding the system setup.",
            no_params(),
        ),
        tool(
            "ha_get_components",
            "Home Assistant: Get Components",
            "Get a list of all loaded Home Assistant components and integrations. \
             Useful for checking which integrations are available.",
            no_params(),
        ),
        tool(
            "ha_get_states",
            "Home Assistant: Get States",
            "Get all entity states from Home Assistant. This is the main tool for finding entity IDs \
             and their current states. Can filter by domain (e.g., \"light\", \"sensor\", \"switch\") \
             or search in entity_id and friendly_name.",
            json!({
                "type": "object",
                "properties": {
                    "domain": {
                        "type": "string",
                        "description": "Filter entities by domain (e.g., \"light\", \"sensor\", \"switch\", \"binary_sensor\", \"climate\", \"cover\")"
                    },
                    "search": {
                        "type": "string",
                        "description": "Search term to filter entities by entity_id or friendly_name (case-insensitive)"
                    }
                },
                "required": []
            }),
        ),
        tool(
            "ha_get_state",
            "Home Assistant: Get Entity State",
            "Get the current state and attributes of a specific entity. Returns detailed information \
             including all attributes, last changed time, and context.",
            json!({
                "type": "object",
                "properties": {
                    "entity_id": {
                        "type": "string",
                        "description": "The entity ID to get state for (e.g., \"light.living_room\", \"sensor.temperature\")"
                    }
                },
                "required": ["entity_id"]
            }),
        ),
        tool(
            "ha_get_services",
            "Home Assistant: Get Services",
            "Get all available services and their parameters. Services are actions you can call \
             (e.g., light.turn_on, switch.toggle). Can filter by domain to see services for a \
             specific entity type.",
            json!({
                "type": "object",
                "properties": {
                    "domain": {
                        "type": "string",
                        "description": "Filter services by domain (e.g., \"light\", \"switch\", \"climate\", \"automation\")"
                    }
                },
                "required": []
            }),
        ),
        tool(
            "ha_get_events",
            "Home Assistant: Get Events",
            "Get all available event types in Home Assistant. Events are used for automation triggers \
             (e.g., state_changed, call_service, automation_triggered).",
            no_params(),
        ),
        tool(
            "ha_get_history",
            "Home Assistant: Get History",
            "Get historical state changes for entities. Useful for analyzing trends and past states. \
             Can filter by entity ID and time range.",
            json!({
                "type": "object",
                "properties": {
                    "timestamp": {
                        "type": "string",
                        "description": "Start time in ISO 8601 format (e.g., \"2024-01-01T00:00:00\"). Defaults to 1 day ago."
                    },
                    "end_time": {
                        "type": "string",
                        "description": "End time in ISO 8601 format. Defaults to now."
                    },
                    "entity_id": {
                        "type": "string",
                        "description": "Filter by entity ID. Can be a single entity or comma-separated list."
                    },
                    "minimal_response": {
                        "type": "boolean",
                        "description": "Return minimal data (only state and last_changed). Recommended for large time ranges."
                    },
                    "significant_changes_only": {
                        "type": "boolean",
                        "description": "Only return significant state changes."
                    },
                    "no_attributes": {
                        "type": "boolean",
                        "description": "Skip returning attributes."
                    }
                },
                "required": []
            }),
        ),
        tool(
            "ha_get_logbook",
            "Home Assistant: Get Logbook",
            "Get logbook entries showing what happened in Home Assistant. Useful for debugging and \
             understanding system activity.",
            json!({
                "type": "object",
                "properties": {
                    "timestamp": {
                        "type": "string",
                        "description": "Start time in ISO 8601 format (e.g., \"2024-01-01T00:00:00\"). Defaults to 1 day ago."
                    },
                    "end_time": {
                        "type": "string",
                        "description": "End time in ISO 8601 format. Defaults to now."
                    },
                    "entity_id": {
                        "type": "string",
                        "description": "Filter by entity ID to see activity for a specific entity."
                    }
                },
                "required": []
            }),
        ),
        tool(
            "ha_get_error_log",
            "Home Assistant: Get Error Log",
            "Get the Home Assistant error log. Useful for troubleshooting issues and identifying \
             problems with integrations or configurations.",
            no_params(),
        ),
        tool(
            "ha_get_calendars",
            "Home Assistant: Get Calendars",
            "Get all calendar entities in Home Assistant. Use this to find calendar entity IDs before \
             querying calendar events.",
            no_params(),
        ),
        tool(
            "ha_get_calendar_events",
            "Home Assistant: Get Calendar Events",
            "Get events from a specific calendar within a time range. Requires calendar entity ID and \
             start/end times.",
            json!({
                "type": "object",
                "properties": {
                    "calendar_entity_id": {
                        "type": "string",
                        "description": "The calendar entity ID (e.g., \"calendar.personal\"). Use ha_get_calendars to find available calendars."
                    },
                    "start": {
                        "type": "string",
                        "description": "Start time in ISO 8601 format (e.g., \"2024-01-01T00:00:00\")"
                    },
                    "end": {
                        "type": "string",
                        "description": "End time in ISO 8601 format (e.g., \"2024-01-31T23:59:59\")"
                    }
                },
                "required": ["calendar_entity_id", "start", "end"]
            }),
        ),
        confirmed(tool(
            "ha_call_service",
            "Home Assistant: Call Service",
            "Call a Home Assistant service/action to control devices",
            json!({
                "type": "object",
                "properties": {
                    "domain": {
                        "type": "string",
                        "description": "Service domain (e.g., \"light\", \"switch\", \"climate\")"
                    },
                    "service": {
                        "type": "string",
                        "description": "Service name (e.g., \"turn_on\", \"turn_off\", \"toggle\")"
                    },
                    "service_data": {
                        "type": "object",
                        "description": "Additional service data (e.g., brightness, color)"
                    },
                    "target": {
                        "type": "object",
                        "description": "Target entities, devices, or areas",
                        "properties": {
                            "entity_id": { "type": ["string", "array"] },
                            "device_id": { "type": ["string", "array"] },
                            "area_id": { "type": ["string", "array"] }
                        }
                    }
                },
                "required": ["domain", "service"]
            }),
        )),
        tool(
            "ha_fire_event",
            "Home Assistant: Fire Event",
            "Fire a custom event in Home Assistant",
            json!({
                "type": "object",
                "properties": {
                    "event_type": {
                        "type": "string",
                        "description": "Event type name (e.g., \"my_custom_event\")"
                    },
                    "event_data": {
                        "type": "object",
                        "description": "Event data payload"
                    }
                },
                "required": ["event_type"]
            }),
        ),
        confirmed(tool(
            "ha_set_state",
            "Home Assistant: Set State",
            "Set or update an entity state in Home Assistant",
            json!({
                "type": "object",
                "properties": {
                    "entity_id": {
                        "type": "string",
                        "description": "Entity ID (e.g., \"sensor.custom_sensor\")"
                    },
                    "state": {
                        "type": "string",
                        "description": "New state value"
                    },
                    "attributes": {
                        "type": "object",
                        "description": "Entity attributes to set"
                    }
                },
                "required": ["entity_id", "state"]
            }),
        )),
        tool(
            "ha_render_template",
            "Home Assistant: Render Template",
            "Render a Jinja2 template in Home Assistant",
            json!({
                "type": "object",
                "properties": {
                    "template": {
                        "type": "string",
                        "description": "Jinja2 template string (e.g., \"{{ states.sensor.temperature.state }}\")"
                    },
                    "variables": {
                        "type": "object",
                        "description": "Variables to pass to the template"
                    }
                },
                "required": ["template"]
            }),
        ),
        tool(
            "ha_check_config",
            "Home Assistant: Check Configuration",
            "Check Home Assistant configuration for errors",
            no_params(),
        ),
        confirmed(tool(
            "ha_handle_intent",
            "Home Assistant: Handle Intent",
            "Handle a conversation intent in Home Assistant",
            json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Intent name (e.g., \"HassTurnOn\", \"HassTurnOff\")"
                    },
                    "data": {
                        "type": "object",
                        "description": "Intent slot values"
                    }
                },
                "required": ["name"]
            }),
        )),
        tool(
            "ha_delete_state",
            "Home Assistant: Delete State",
            "Delete an entity state from Home Assistant",
            json!({
                "type": "object",
                "properties": {
                    "entity_id": {
                        "type": "string",
                        "description": "Entity ID to delete (e.g., \"sensor.custom_sensor\")"
                    }
                },
                "required": ["entity_id"]
            }),
        ),
    ]
}

pub fn find(name: &str) -> Option<ToolDefinition> {
    all_tools().into_iter().find(|t| t.name == name)
}
