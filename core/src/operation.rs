//! A single API operation described as data: the request to send and how
//! to decode what comes back.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::decode::Decoding;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Request plus decoding strategy for an operation returning `T`.
///
/// Built by `HassClient::build_*`. Hosts that execute requests themselves
/// send `request` and hand the response to `parse`.
pub struct Operation<T> {
    pub request: HttpRequest,
    pub decoding: Decoding,
    output: PhantomData<fn() -> T>,
}

impl<T> Operation<T> {
    pub(crate) fn new(request: HttpRequest, decoding: Decoding) -> Self {
        Self {
            request,
            decoding,
            output: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> Operation<T> {
    /// Classify the status, then decode the body into `T`.
    pub fn parse(&self, response: &HttpResponse) -> Result<T, ApiError> {
        if !response.is_success() {
            return Err(ApiError::from_status(response.status, "", response.body.clone()));
        }
        let value = self.decoding.decode(response)?;
        serde_json::from_value(value).map_err(|e| ApiError::decode(e.to_string()))
    }
}

impl<T> fmt::Debug for Operation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("request", &self.request)
            .field("decoding", &self.decoding)
            .finish()
    }
}
