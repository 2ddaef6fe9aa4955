//! Typed operations against the Home Assistant REST API.
//!
//! # Design
//! `HassClient` holds only immutable configuration and carries no mutable
//! state between calls, so one instance can serve concurrent operations.
//! Each operation is split into a `build_*` method that returns an
//! `Operation` (request + decoding strategy, no I/O) and an async method that
//! executes it. Identifiers interpolated into paths are percent-encoded per
//! segment so they can never be read as path separators.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::config::ClientConfig;
use crate::decode::{Decoding, EmptyBody};
use crate::error::{ApiError, ConfigError};
use crate::executor::Executor;
use crate::http::{HttpMethod, HttpRequest};
use crate::operation::Operation;
use crate::types::{
    ApiStatus, CalendarEntity, CalendarEvent, CheckConfigResponse, DeleteStateResponse, EntityState,
    EventType, FireEventResponse, HandleIntentResponse, HistoryEntry, HistoryQuery, HomeAssistantConfig,
    IntentSlotValue, LogbookEntry, LogbookQuery, ServiceCallResponse, ServiceCallTarget, ServiceDomain,
};

const DELETED_ACK: &str = "Deleted successfully";

/// Async client for the Home Assistant REST API.
#[derive(Debug, Clone)]
pub struct HassClient {
    base_url: String,
    executor: Executor,
}

impl HassClient {
    /// Create a client. Does not validate the configuration or contact the
    /// server.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let executor = Executor::new(&config)?;
        Ok(Self {
            base_url: config.base_url().to_string(),
            executor,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute a built operation and decode its result.
    pub async fn send<T: DeserializeOwned>(&self, operation: Operation<T>) -> Result<T, ApiError> {
        let response = self.executor.execute(&operation.request).await?;
        operation.parse(&response)
    }

    fn get(&self, endpoint: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, format!("{}{endpoint}", self.base_url))
    }

    fn post(&self, endpoint: &str, body: Option<&Value>) -> HttpRequest {
        let req = HttpRequest::new(HttpMethod::Post, format!("{}{endpoint}", self.base_url));
        match body {
            Some(body) => req.with_json(body),
            None => req,
        }
    }

    // -----------------------------------------------------------------------
    // Read operations
    // -----------------------------------------------------------------------

    pub fn build_check_api(&self) -> Operation<ApiStatus> {
        Operation::new(self.get("/api/"), Decoding::Json)
    }

    pub fn build_get_config(&self) -> Operation<HomeAssistantConfig> {
        Operation::new(self.get("/api/config"), Decoding::Json)
    }

    pub fn build_get_components(&self) -> Operation<Vec<String>> {
        Operation::new(self.get("/api/components"), Decoding::Json)
    }

    pub fn build_get_states(&self) -> Operation<Vec<EntityState>> {
        Operation::new(self.get("/api/states"), Decoding::Json)
    }

    pub fn build_get_state(&self, entity_id: &str) -> Operation<EntityState> {
        let endpoint = format!("/api/states/{}", encode(entity_id));
        Operation::new(self.get(&endpoint), Decoding::Json)
    }

    pub fn build_get_services(&self) -> Operation<Vec<ServiceDomain>> {
        Operation::new(self.get("/api/services"), Decoding::Json)
    }

    pub fn build_get_events(&self) -> Operation<Vec<EventType>> {
        Operation::new(self.get("/api/events"), Decoding::Json)
    }

    /// One inner list per entity.
    pub fn build_get_history(&self, query: &HistoryQuery) -> Operation<Vec<Vec<HistoryEntry>>> {
        let endpoint = format!("/api/history/period/{}", encode(query.start.as_deref().unwrap_or("")));
        let req = self
            .get(&endpoint)
            .with_query("end_time", query.end_time.as_deref())
            .with_query("filter_entity_id", query.entity_id.as_deref())
            .with_flag("minimal_response", query.minimal_response)
            .with_flag("significant_changes_only", query.significant_changes_only)
            .with_flag("no_attributes", query.no_attributes);
        Operation::new(req, Decoding::Json)
    }

    pub fn build_get_logbook(&self, query: &LogbookQuery) -> Operation<Vec<LogbookEntry>> {
        let endpoint = format!("/api/logbook/{}", encode(query.start.as_deref().unwrap_or("")));
        let req = self
            .get(&endpoint)
            .with_query("end_time", query.end_time.as_deref())
            .with_query("entity", query.entity_id.as_deref());
        Operation::new(req, Decoding::Json)
    }

    pub fn build_get_error_log(&self) -> Operation<String> {
        Operation::new(self.get("/api/error_log"), Decoding::Text)
    }

    pub fn build_get_calendars(&self) -> Operation<Vec<CalendarEntity>> {
        Operation::new(self.get("/api/calendars"), Decoding::Json)
    }

    pub fn build_get_calendar_events(
        &self,
        calendar_entity_id: &str,
        start: &str,
        end: &str,
    ) -> Operation<Vec<CalendarEvent>> {
        let endpoint = format!("/api/calendars/{}", encode(calendar_entity_id));
        let req = self
            .get(&endpoint)
            .with_query("start", Some(start))
            .with_query("end", Some(end));
        Operation::new(req, Decoding::Json)
    }

    // -----------------------------------------------------------------------
    // Write operations
    // -----------------------------------------------------------------------

    /// Target selectors are merged over `service_data`; unset selectors are
    /// left out.
    pub fn build_call_service(
        &self,
        domain: &str,
        service: &str,
        service_data: Option<&Map<String, Value>>,
        target: Option<&ServiceCallTarget>,
    ) -> Operation<Vec<EntityState>> {
        let endpoint = format!("/api/services/{}/{}", encode(domain), encode(service));
        let mut body = service_data.cloned().unwrap_or_default();
        if let Some(target) = target {
            if let Ok(Value::Object(selectors)) = serde_json::to_value(target) {
                body.extend(selectors);
            }
        }
        let req = self.post(&endpoint, Some(&Value::Object(body)));
        Operation::new(req, Decoding::Lenient(EmptyBody::Array))
    }

    pub fn build_fire_event(
        &self,
        event_type: &str,
        event_data: Option<&Map<String, Value>>,
    ) -> Operation<FireEventResponse> {
        let endpoint = format!("/api/events/{}", encode(event_type));
        let body = event_data.map(|data| Value::Object(data.clone()));
        let req = self.post(&endpoint, body.as_ref());
        Operation::new(req, Decoding::Lenient(EmptyBody::Object))
    }

    pub fn build_set_state(
        &self,
        entity_id: &str,
        state: &str,
        attributes: Option<&Map<String, Value>>,
    ) -> Operation<EntityState> {
        let endpoint = format!("/api/states/{}", encode(entity_id));
        let mut body = json!({ "state": state });
        if let Some(attributes) = attributes {
            body["attributes"] = Value::Object(attributes.clone());
        }
        let req = self.post(&endpoint, Some(&body));
        let echo = json!({
            "entity_id": entity_id,
            "state": state,
            "attributes": attributes.cloned().unwrap_or_default(),
        });
        Operation::new(req, Decoding::Lenient(EmptyBody::Echo(echo)))
    }

    /// The server answers with rendered text, not JSON.
    pub fn build_render_template(
        &self,
        template: &str,
        variables: Option<&Map<String, Value>>,
    ) -> Operation<String> {
        let mut body = json!({ "template": template });
        if let Some(variables) = variables {
            body["variables"] = Value::Object(variables.clone());
        }
        let req = self.post("/api/template", Some(&body));
        Operation::new(req, Decoding::Text)
    }

    pub fn build_check_config(&self) -> Operation<CheckConfigResponse> {
        let req = self.post("/api/config/core/check_config", None);
        Operation::new(req, Decoding::Lenient(EmptyBody::Object))
    }

    pub fn build_handle_intent(
        &self,
        name: &str,
        data: Option<&Map<String, Value>>,
    ) -> Operation<HandleIntentResponse> {
        let mut body = json!({ "name": name });
        if let Some(data) = data {
            body["data"] = Value::Object(data.clone());
        }
        let req = self.post("/api/intent/handle", Some(&body));
        Operation::new(req, Decoding::Lenient(EmptyBody::Object))
    }

    pub fn build_delete_state(&self, entity_id: &str) -> Operation<DeleteStateResponse> {
        let endpoint = format!("/api/states/{}", encode(entity_id));
        let req = HttpRequest::new(HttpMethod::Delete, format!("{}{endpoint}", self.base_url));
        Operation::new(req, Decoding::Lenient(EmptyBody::Acknowledgment(DELETED_ACK)))
    }

    // -----------------------------------------------------------------------
    // Executing operations
    // -----------------------------------------------------------------------

    pub async fn check_api(&self) -> Result<ApiStatus, ApiError> {
        self.send(self.build_check_api()).await
    }

    pub async fn get_config(&self) -> Result<HomeAssistantConfig, ApiError> {
        self.send(self.build_get_config()).await
    }

    pub async fn get_components(&self) -> Result<Vec<String>, ApiError> {
        self.send(self.build_get_components()).await
    }

    pub async fn get_states(&self) -> Result<Vec<EntityState>, ApiError> {
        self.send(self.build_get_states()).await
    }

    pub async fn get_state(&self, entity_id: &str) -> Result<EntityState, ApiError> {
        self.send(self.build_get_state(entity_id)).await
    }

    pub async fn get_services(&self) -> Result<Vec<ServiceDomain>, ApiError> {
        self.send(self.build_get_services()).await
    }

    pub async fn get_events(&self) -> Result<Vec<EventType>, ApiError> {
        self.send(self.build_get_events()).await
    }

    pub async fn get_history(&self, query: &HistoryQuery) -> Result<Vec<Vec<HistoryEntry>>, ApiError> {
        self.send(self.build_get_history(query)).await
    }

    pub async fn get_logbook(&self, query: &LogbookQuery) -> Result<Vec<LogbookEntry>, ApiError> {
        self.send(self.build_get_logbook(query)).await
    }

    pub async fn get_error_log(&self) -> Result<String, ApiError> {
        self.send(self.build_get_error_log()).await
    }

    pub async fn get_calendars(&self) -> Result<Vec<CalendarEntity>, ApiError> {
        self.send(self.build_get_calendars()).await
    }

    pub async fn get_calendar_events(
        &self,
        calendar_entity_id: &str,
        start: &str,
        end: &str,
    ) -> Result<Vec<CalendarEvent>, ApiError> {
        self.send(self.build_get_calendar_events(calendar_entity_id, start, end))
            .await
    }

    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        service_data: Option<&Map<String, Value>>,
        target: Option<&ServiceCallTarget>,
    ) -> Result<ServiceCallResponse, ApiError> {
        let changed_states = self
            .send(self.build_call_service(domain, service, service_data, target))
            .await?;
        Ok(ServiceCallResponse { changed_states })
    }

    pub async fn fire_event(
        &self,
        event_type: &str,
        event_data: Option<&Map<String, Value>>,
    ) -> Result<FireEventResponse, ApiError> {
        self.send(self.build_fire_event(event_type, event_data)).await
    }

    pub async fn set_state(
        &self,
        entity_id: &str,
        state: &str,
        attributes: Option<&Map<String, Value>>,
    ) -> Result<EntityState, ApiError> {
        self.send(self.build_set_state(entity_id, state, attributes)).await
    }

    pub async fn render_template(
        &self,
        template: &str,
        variables: Option<&Map<String, Value>>,
    ) -> Result<String, ApiError> {
        self.send(self.build_render_template(template, variables)).await
    }

    pub async fn check_config(&self) -> Result<CheckConfigResponse, ApiError> {
        self.send(self.build_check_config()).await
    }

    pub async fn handle_intent(
        &self,
        name: &str,
        slots: Option<&BTreeMap<String, IntentSlotValue>>,
    ) -> Result<HandleIntentResponse, ApiError> {
        let data = slots.map(|slots| {
            slots
                .iter()
                .map(|(slot, value)| (slot.clone(), json!({ "value": value.value })))
                .collect::<Map<String, Value>>()
        });
        self.send(self.build_handle_intent(name, data.as_ref())).await
    }

    pub async fn delete_state(&self, entity_id: &str) -> Result<DeleteStateResponse, ApiError> {
        self.send(self.build_delete_state(entity_id)).await
    }
}

/// Percent-encode one path segment.
fn encode(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}
