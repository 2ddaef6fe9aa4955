//! Client core for the Home Assistant REST API.
//!
//! # Overview
//! `HassClient` exposes one typed method per API operation. Every method is
//! also available as a `build_*` variant that returns an `Operation`: the
//! `HttpRequest` to send plus the strategy for decoding its response. Hosts
//! that perform their own I/O send the request and call `Operation::parse`;
//! everyone else awaits the async method and lets the built-in executor do
//! the round-trip under the configured deadline.
//!
//! # Design
//! - `HassClient` holds only immutable configuration; one instance serves
//!   concurrent calls.
//! - Every failure is an `ApiError` classified into a closed `ErrorKind`.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod decode;
pub mod error;
mod executor;
pub mod http;
pub mod operation;
pub mod types;

pub use client::HassClient;
pub use config::ClientConfig;
pub use decode::{Decoding, EmptyBody};
pub use error::{ApiError, ConfigError, ErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use operation::Operation;
pub use types::{
    ApiStatus, CalendarEntity, CalendarEvent, CalendarTime, CheckConfigResponse, DeleteStateResponse,
    EntityState, EventType, FireEventResponse, HandleIntentResponse, HistoryEntry, HistoryQuery,
    HomeAssistantConfig, IntentSlotValue, LogbookEntry, LogbookQuery, OneOrMany, ServiceCallResponse,
    ServiceCallTarget, ServiceDomain,
};
