//! HTTP transport types for the Home Assistant REST API.
//!
//! # Design
//! Requests and responses are plain data. Operations build an `HttpRequest`
//! without touching the network; the executor (or a host that performs its
//! own I/O) turns it into an `HttpResponse`. All fields are owned so values
//! can cross the C boundary without lifetime concerns.
//!
//! The `Authorization` header is not part of a built request: it is attached
//! by whoever executes it, so request descriptors never carry the credential.

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// An HTTP request described as plain data.
///
/// `path` is absolute (base address + endpoint) with every interpolated
/// segment already percent-encoded. `query` holds unencoded pairs; pairs with
/// empty values are never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub(crate) fn new(method: HttpMethod, path: String) -> Self {
        Self {
            method,
            path,
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Add a query pair unless the value is empty.
    pub(crate) fn with_query(mut self, name: &str, value: Option<&str>) -> Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.query.push((name.to_string(), value.to_string()));
        }
        self
    }

    /// Add a boolean flag as `name=true`, only when set.
    pub(crate) fn with_flag(self, name: &str, set: bool) -> Self {
        self.with_query(name, set.then_some("true"))
    }

    /// Attach a JSON body and the matching content type.
    pub(crate) fn with_json(mut self, body: &serde_json::Value) -> Self {
        self.headers
            .push(("content-type".to_string(), "application/json".to_string()));
        self.body = Some(body.to_string());
        self
    }

    /// Full URL with the percent-encoded query string appended.
    pub fn url(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query: Vec<String> = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        format!("{}?{}", self.path, query.join("&"))
    }
}

/// An HTTP response described as plain data.
///
/// Header names are stored lower-cased.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_without_query_is_path() {
        let req = HttpRequest::new(HttpMethod::Get, "http://ha:8123/api/states".to_string());
        assert_eq!(req.url(), "http://ha:8123/api/states");
    }

    #[test]
    fn empty_and_absent_query_values_are_dropped() {
        let req = HttpRequest::new(HttpMethod::Get, "http://ha/api/logbook/".to_string())
            .with_query("end_time", Some(""))
            .with_query("entity", None)
            .with_flag("minimal_response", false);
        assert!(req.query.is_empty());
    }

    #[test]
    fn query_values_are_encoded() {
        let req = HttpRequest::new(HttpMethod::Get, "http://ha/api/calendars/calendar.home".to_string())
            .with_query("start", Some("2024-01-01T00:00:00+01:00"))
            .with_flag("no_attributes", true);
        assert_eq!(
            req.url(),
            "http://ha/api/calendars/calendar.home?start=2024-01-01T00%3A00%3A00%2B01%3A00&no_attributes=true"
        );
    }

    #[test]
    fn content_type_lookup_ignores_case() {
        let resp = HttpResponse {
            status: 200,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: String::new(),
        };
        assert_eq!(resp.content_type(), Some("application/json"));
        assert!(resp.is_success());
    }
}
