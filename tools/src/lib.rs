//! Tool-calling adapter over `hass_core`.
//!
//! # Overview
//! An agent host invokes tools by name with an untyped JSON parameter bag.
//! `invoke` validates the bag into a `ToolCall`, runs the matching client
//! operation and renders the outcome as text. It never fails: validation
//! errors and API errors are rendered too, and `ToolResult::failure` tags
//! what went wrong for hosts that need to branch on it.

pub mod definitions;
pub mod params;
pub mod render;

use hass_core::{ApiError, ErrorKind, HassClient};
use serde_json::Value;
use tracing::{info, warn};

pub use definitions::{all_tools, ToolDefinition};
pub use params::{ToolCall, ToolError};

/// Why an invocation did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The operation reached the client and failed there.
    Api { kind: ErrorKind, status: u16 },
    /// The parameters were rejected before any request was made.
    Validation(ToolError),
}

/// Rendered outcome of one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub text: String,
    pub failure: Option<Failure>,
}

impl ToolResult {
    fn success(text: String) -> Self {
        Self { text, failure: None }
    }

    fn api_failure(err: &ApiError) -> Self {
        Self {
            text: render::api_error(err),
            failure: Some(Failure::Api {
                kind: err.kind(),
                status: err.status(),
            }),
        }
    }

    fn validation_failure(err: ToolError) -> Self {
        Self {
            text: render::validation_error(&err),
            failure: Some(Failure::Validation(err)),
        }
    }

    pub fn is_error(&self) -> bool {
        self.failure.is_some()
    }
}

/// Validate `params`, run tool `name` against `client` and render the result.
pub async fn invoke(client: &HassClient, name: &str, params: &Value) -> ToolResult {
    let call = match ToolCall::parse(name, params) {
        Ok(call) => call,
        Err(err) => {
            warn!(tool = name, error = %err, "rejected tool parameters");
            return ToolResult::validation_failure(err);
        }
    };

    info!(tool = name, "invoking tool");
    match run(client, &call).await {
        Ok(text) => ToolResult::success(text),
        Err(err) => {
            warn!(
                tool = name,
                kind = err.kind().as_str(),
                status = err.status(),
                error = %err,
                "tool invocation failed"
            );
            ToolResult::api_failure(&err)
        }
    }
}

/// Execute a validated call and render its success value.
pub async fn run(client: &HassClient, call: &ToolCall) -> Result<String, ApiError> {
    let text = match call {
        ToolCall::CheckApi => render::check_api(&client.check_api().await?),
        ToolCall::GetConfig => render::pretty(&client.get_config().await?),
        ToolCall::GetComponents => render::components(client.get_components().await?),
        ToolCall::GetStates { domain, search } => {
            let states = client.get_states().await?;
            render::states(&states, domain.as_deref(), search.as_deref())
        }
        ToolCall::GetState { entity_id } => render::pretty(&client.get_state(entity_id).await?),
        ToolCall::GetServices { domain } => {
            render::services(&client.get_services().await?, domain.as_deref())
        }
        ToolCall::GetEvents => render::events(client.get_events().await?),
        ToolCall::GetHistory(query) => render::history(&client.get_history(query).await?, query),
        ToolCall::GetLogbook(query) => render::logbook(&client.get_logbook(query).await?, query),
        ToolCall::GetErrorLog => render::error_log(&client.get_error_log().await?),
        ToolCall::GetCalendars => render::calendars(client.get_calendars().await?),
        ToolCall::GetCalendarEvents {
            calendar_entity_id,
            start,
            end,
        } => {
            let events = client
                .get_calendar_events(calendar_entity_id, start, end)
                .await?;
            render::calendar_events(calendar_entity_id, start, end, &events)
        }
        ToolCall::CallService {
            domain,
            service,
            service_data,
            target,
        } => {
            let response = client
                .call_service(domain, service, service_data.as_ref(), target.as_ref())
                .await?;
            render::service_call(domain, service, service_data.as_ref(), target.as_ref(), &response)
        }
        ToolCall::FireEvent {
            event_type,
            event_data,
        } => {
            let response = client.fire_event(event_type, event_data.as_ref()).await?;
            render::fire_event(event_type, event_data.as_ref(), &response)
        }
        ToolCall::SetState {
            entity_id,
            state,
            attributes,
        } => render::set_state(&client.set_state(entity_id, state, attributes.as_ref()).await?),
        ToolCall::RenderTemplate {
            template,
            variables,
        } => {
            let result = client.render_template(template, variables.as_ref()).await?;
            render::template(template, variables.as_ref(), &result)
        }
        ToolCall::CheckConfig => render::check_config(&client.check_config().await?),
        ToolCall::HandleIntent { name, data } => {
            let response = client.handle_intent(name, data.as_ref()).await?;
            let shown = data.as_ref().and_then(|d| serde_json::to_value(d).ok());
            render::intent(name, shown.as_ref(), &response)
        }
        ToolCall::DeleteState { entity_id } => {
            render::delete_state(entity_id, &client.delete_state(entity_id).await?)
        }
    };
    Ok(text)
}
