use crate::ResponseData;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::fmt::Display;

pub const UNAUTHORIZED_STATUS: &str = "HTTP/1.1 401 Unauthorized";

pub const CORS_HEADERS: [&str; 3] = [
    "access-control-allow-origin",
    "access-control-allow-methods",
    "access-control-allow-headers",
];

lazy_static! {
    static ref TOKEN_REGEX: Regex = Regex::new(r"^\S+$").unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssertionFailure {
    pub assertion: String,
    pub expected: String,
    pub actual: String,
}

impl AssertionFailure {
    pub fn new<S1: Into<String>, S2: Into<String>, S3: Into<String>>(
        assertion: S1,
        expected: S2,
        actual: S3,
    ) -> Self {
        Self {
            assertion: assertion.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl std::error::Error for AssertionFailure {}

impl Display for AssertionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: expected {}, got {}",
            self.assertion, self.expected, self.actual
        )
    }
}

pub type Check = Result<(), AssertionFailure>;

pub fn has_cors_headers(response: &ResponseData) -> Check {
    let missing = CORS_HEADERS
        .iter()
        .filter(|name| response.header(name).is_none())
        .copied()
        .collect::<Vec<_>>();

    if missing.is_empty() {
        Ok(())
    } else {
        let mut present = response.headers.keys().cloned().collect::<Vec<_>>();
        present.sort();

        Err(AssertionFailure::new(
            "hasCorsHeaders",
            format!("headers {}", CORS_HEADERS.join(", ")),
            format!("missing {} (present: {})", missing.join(", "), present.join(", ")),
        ))
    }
}

pub fn allows_any_origin(response: &ResponseData) -> Check {
    match response.header("access-control-allow-origin") {
        Some("*") => Ok(()),
        Some(other) => Err(AssertionFailure::new(
            "allowsAnyOrigin",
            "access-control-allow-origin \"*\"",
            format!("\"{}\"", other),
        )),
        None => Err(AssertionFailure::new(
            "allowsAnyOrigin",
            "access-control-allow-origin \"*\"",
            "no access-control-allow-origin header",
        )),
    }
}

pub fn status_is(response: &ResponseData, expected: u16) -> Check {
    if response.status_code == expected {
        Ok(())
    } else {
        Err(AssertionFailure::new(
            "statusIs",
            format!("status {}", expected),
            format!("status {}", response.status_code),
        ))
    }
}

pub fn status_is_200(response: &ResponseData) -> Check {
    status_is(response, 200)
}

/// The body must parse as a JSON object or array.
pub fn is_json_body(response: &ResponseData) -> Check {
    match &response.json {
        Some(Value::Object(_)) | Some(Value::Array(_)) => Ok(()),
        Some(other) => Err(AssertionFailure::new(
            "isJsonBody",
            "a JSON object or array",
            format!("JSON scalar {}", other),
        )),
        None => Err(AssertionFailure::new(
            "isJsonBody",
            "a JSON object or array",
            format!("{:?}", truncate(&response.body, 120)),
        )),
    }
}

pub fn has_body_field(response: &ResponseData, path: &str) -> Check {
    is_json_body(response)?;

    match response.field(path) {
        Some(_) => Ok(()),
        None => Err(AssertionFailure::new(
            "hasBodyField",
            format!("body field {}", path),
            format!("body {}", truncate(&response.body, 120)),
        )),
    }
}

/// Strict equality of the value at a dotted path, `1` and `"1"` differ.
pub fn body_field<V: Into<Value>>(response: &ResponseData, path: &str, expected: V) -> Check {
    let expected = expected.into();

    match response.field(path) {
        Some(actual) if *actual == expected => Ok(()),
        Some(actual) => Err(AssertionFailure::new(
            format!("bodyField({})", path),
            expected.to_string(),
            actual.to_string(),
        )),
        None => Err(AssertionFailure::new(
            format!("bodyField({})", path),
            expected.to_string(),
            "no such field",
        )),
    }
}

pub fn is_unauthorized(response: &ResponseData) -> Check {
    is_json_body(response)?;
    body_field(response, "status", UNAUTHORIZED_STATUS)
}

pub fn is_success(response: &ResponseData) -> Check {
    is_json_body(response)?;
    body_field(response, "result", "success")
}

/// `payload` holds a token: a non-empty string with no whitespace.
pub fn has_token_payload(response: &ResponseData) -> Check {
    match response.field("payload") {
        Some(Value::String(token)) if TOKEN_REGEX.is_match(token) => Ok(()),
        Some(other) => Err(AssertionFailure::new(
            "hasTokenPayload",
            "a non-empty token",
            other.to_string(),
        )),
        None => Err(AssertionFailure::new(
            "hasTokenPayload",
            "a non-empty token",
            "no payload field",
        )),
    }
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text.to_string(),
    }
}
