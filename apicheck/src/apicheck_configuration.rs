use lazy_static::lazy_static;
use serde::Serialize;
use std::{env, time::Duration};

pub const DEFAULT_URL: &str = "http://lcb/api/v1";
pub const DEFAULT_ORIGIN: &str = "http://someplace.com";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const CONTENT_TYPE: &str = "application/json";
pub const ACCEPT: &str = "application/json";

const API_PREFIX: &str = "/api/v1";

lazy_static! {
    static ref CONSTANTS: Constants = Constants::from_env();
}

/// Where the API under test lives and how to talk to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Constants {
    url: String,
    host: String,
    origin: String,
    request_timeout: Duration,
}

impl Constants {
    /// Process-wide values, read from the environment on first use.
    pub fn get() -> &'static Constants {
        &CONSTANTS
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the constants from an arbitrary variable source.
    ///
    /// `URL` is the versioned API base, `HOST` the server root used by the
    /// `/test/v1` endpoints. Without `HOST` it is `URL` minus `/api/v1`.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut constants = Self::new(non_empty("URL").unwrap_or_else(|| DEFAULT_URL.into()));

        if let Some(host) = non_empty("HOST") {
            constants.set_host(host);
        }
        if let Some(origin) = non_empty("ORIGIN") {
            constants.set_origin(origin);
        }
        // zero would expire every request before it is sent
        let timeout = non_empty("TIMEOUT_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0);
        if let Some(timeout) = timeout {
            constants.set_request_timeout(Duration::from_millis(timeout));
        }

        constants
    }

    pub fn new<S: Into<String>>(url: S) -> Self {
        let url = url.into().trim_end_matches('/').to_string();
        let host = url.strip_suffix(API_PREFIX).unwrap_or(&url).to_string();

        Self {
            url,
            host,
            origin: DEFAULT_ORIGIN.into(),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn set_host<S: Into<String>>(&mut self, host: S) {
        self.host = host.into().trim_end_matches('/').to_string();
    }

    pub fn set_origin<S: Into<String>>(&mut self, origin: S) {
        self.origin = origin.into();
    }

    pub fn set_request_timeout(&mut self, timeout: Duration) {
        self.request_timeout = timeout;
    }

    pub fn api<S: AsRef<str>>(&self, path: S) -> String {
        format!("{}{}", self.url, path.as_ref())
    }

    pub fn root<S: AsRef<str>>(&self, path: S) -> String {
        format!("{}{}", self.host, path.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new<S1: Into<String>, S2: Into<String>>(email: S1, password: S2) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginBase {
    /// Relative to the versioned API url.
    Api,
    /// Relative to the server root.
    Root,
}

/// A login endpoint together with the account the bootstrap creates for it
/// and the two deliberately wrong credential sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginFixture {
    pub base: LoginBase,
    pub path: String,
    pub valid: Credentials,
    pub wrong_password: Credentials,
    pub wrong_email: Credentials,
}

impl LoginFixture {
    /// `POST {url}/user/login`.
    pub fn user_login() -> Self {
        Self {
            base: LoginBase::Api,
            path: "/user/login".into(),
            valid: Credentials::new("test@test.net", "test1"),
            wrong_password: Credentials::new("test@test.net", "test1o"),
            wrong_email: Credentials::new("test@test.com", "test1"),
        }
    }

    /// `POST {host}/test/v1/auth`, the older endpoint with its own password.
    pub fn test_auth() -> Self {
        Self {
            base: LoginBase::Root,
            path: "/test/v1/auth".into(),
            valid: Credentials::new("test@test.net", "test"),
            wrong_password: Credentials::new("test@test.net", "testo"),
            wrong_email: Credentials::new("test@test.com", "test"),
        }
    }

    pub fn endpoint(&self, constants: &Constants) -> String {
        match self.base {
            LoginBase::Api => constants.api(&self.path),
            LoginBase::Root => constants.root(&self.path),
        }
    }
}
