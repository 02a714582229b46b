use crate::util;
use serde_json::Value;
use std::collections::HashMap;

/// A single outgoing request. Header names are stored lower-cased.
#[derive(Debug, Clone)]
pub struct RequestData {
    pub url: String,
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

impl RequestData {
    pub fn new<S1: Into<String>, S2: Into<String>>(method: S1, url: S2) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn set_header<S1: AsRef<str>, S2: Into<String>>(&mut self, name: S1, value: S2) {
        self.headers
            .insert(name.as_ref().to_lowercase(), value.into());
    }

    pub fn header<S: AsRef<str>>(&self, name: S) -> Option<&str> {
        util::find_header(&self.headers, name)
    }
}

/// What came back from the server, whatever the status code.
#[derive(Debug, Clone)]
pub struct ResponseData {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub json: Option<Value>,
}

impl ResponseData {
    pub fn new(status_code: u16, headers: HashMap<String, String>, body: String) -> Self {
        let json = serde_json::from_str(&body).ok();

        Self {
            status_code,
            headers,
            body,
            json,
        }
    }

    pub fn header<S: AsRef<str>>(&self, name: S) -> Option<&str> {
        util::find_header(&self.headers, name)
    }

    /// Looks up a dotted path (`payload.4th.outcome`) in the JSON body.
    pub fn field<S: AsRef<str>>(&self, path: S) -> Option<&Value> {
        self.json
            .as_ref()
            .and_then(|json| util::json_path(json, path.as_ref()))
    }
}
