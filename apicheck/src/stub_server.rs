use crate::{
    apicheck_configuration::{Constants, Credentials, LoginFixture},
    assertions::UNAUTHORIZED_STATUS,
    error::Error,
    scenario::{DATASTORE_CHECKS, NOT_AUTHENTICATED_CODE},
    util,
};
use hyper::{
    body,
    header::{self, HeaderValue},
    service::{make_service_fn, service_fn},
    Body, HeaderMap, Method, Request, Response, Server, StatusCode,
};
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    convert::Infallible,
    net::SocketAddr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};
use tokio::sync::oneshot;
use tracing::{debug, error};

const API_PREFIX: &str = "/api/v1";

/// An in-process stand-in for the API under test.
///
/// It speaks the same contract: CORS on every reply, an idempotent account
/// bootstrap, a login endpoint taking five credential transports, an
/// unauthenticated `/user` that answers code -29, and the datastore smoke
/// report. The server stops when this handle is dropped.
#[derive(Debug)]
pub struct StubApi {
    addr: SocketAddr,
    state: Arc<StubState>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl StubApi {
    /// Binds an ephemeral loopback port and serves on the current runtime.
    pub async fn start() -> Result<Self, Error> {
        let state = Arc::new(StubState::new());
        let service_state = state.clone();

        let make_service = make_service_fn(move |_| {
            let state = service_state.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |request| {
                    let state = state.clone();
                    async move { Ok::<_, Infallible>(state.handle_request(request).await) }
                }))
            }
        });

        let server = Server::try_bind(&SocketAddr::from(([127, 0, 0, 1], 0)))
            .map_err(Error::ServerError)?
            .serve(make_service);
        let addr = server.local_addr();

        let (shutdown, shutdown_signal) = oneshot::channel::<()>();
        let server = server.with_graceful_shutdown(async {
            let _ = shutdown_signal.await;
        });

        tokio::spawn(async move {
            if let Err(e) = server.await {
                error!("Stub API server error: {}", e);
            }
        });

        debug!(%addr, "stub API listening");

        Ok(Self {
            addr,
            state,
            shutdown: Some(shutdown),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> String {
        format!("http://{}{}", self.addr, API_PREFIX)
    }

    pub fn constants(&self) -> Constants {
        Constants::new(self.url())
    }

    /// Number of accounts the bootstrap endpoint has created.
    pub fn account_count(&self) -> usize {
        lock(&self.state.accounts).len()
    }

    /// Makes `/test/v1/datastore` report a failure for one check.
    pub fn fail_datastore_check<S: Into<String>>(&self, check: S) {
        *lock(&self.state.failing_check) = Some(check.into());
    }

    /// Stops answering with CORS headers, to exercise the negative paths.
    pub fn disable_cors(&self) {
        *lock(&self.state.cors_disabled) = true;
    }
}

impl Drop for StubApi {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Realm {
    UserLogin,
    TestAuth,
}

#[derive(Debug)]
struct StubState {
    accounts: Mutex<HashMap<String, String>>,
    legacy_account: Credentials,
    tokens: Mutex<HashMap<String, String>>,
    failing_check: Mutex<Option<String>>,
    cors_disabled: Mutex<bool>,
    next_token: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StubState {
    fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            legacy_account: LoginFixture::test_auth().valid,
            tokens: Mutex::new(HashMap::new()),
            failing_check: Mutex::new(None),
            cors_disabled: Mutex::new(false),
            next_token: AtomicU64::new(1),
        }
    }

    async fn handle_request(&self, request: Request<Body>) -> Response<Body> {
        let method = request.method().clone();
        let path = request.uri().path().trim_end_matches('/').to_string();
        let headers = request.headers().clone();

        let body = match body::to_bytes(request.into_body()).await {
            Ok(bytes) => serde_json::from_slice::<Value>(&bytes).ok(),
            Err(e) => {
                error!("Stub API could not read a request body: {}", e);
                return self.reply(StatusCode::BAD_REQUEST, json!({ "result": "fail" }));
            }
        };

        debug!(%method, %path, "stub API request");

        let (status, reply) = match (&method, path.as_str()) {
            (&Method::OPTIONS, _) => (StatusCode::OK, json!({ "result": "success" })),
            (&Method::GET, API_PREFIX) => (
                StatusCode::OK,
                json!({ "result": "success", "payload": { "version": "v1" } }),
            ),
            (&Method::PUT, "/test/v1") => self.create_account(body.as_ref()),
            (&Method::POST, "/api/v1/user/login") => {
                self.login(Realm::UserLogin, &headers, body.as_ref())
            }
            (&Method::POST, "/test/v1/auth") => self.login(Realm::TestAuth, &headers, body.as_ref()),
            (&Method::GET, "/api/v1/user") => (
                StatusCode::OK,
                json!({ "result": "fail", "code": NOT_AUTHENTICATED_CODE }),
            ),
            (&Method::GET, "/test/v1/datastore") => self.datastore(),
            _ => (
                StatusCode::NOT_FOUND,
                json!({ "result": "fail", "code": -404 }),
            ),
        };

        self.reply(status, reply)
    }

    fn reply(&self, status: StatusCode, body: Value) -> Response<Body> {
        let mut response = Response::new(Body::from(body.to_string()));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if !*lock(&self.cors_disabled) {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            );
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
            );
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("Content-Type, Accept, Authorization, Cookie"),
            );
        }

        response
    }

    fn create_account(&self, body: Option<&Value>) -> (StatusCode, Value) {
        let credentials = body
            .and_then(|body| {
                Some(Credentials::new(
                    body.get("email")?.as_str()?,
                    body.get("password")?.as_str()?,
                ))
            })
            .unwrap_or_else(|| LoginFixture::user_login().valid);

        let mut accounts = lock(&self.accounts);
        if accounts.contains_key(&credentials.email) {
            return (StatusCode::OK, json!({ "result": "exists" }));
        }
        accounts.insert(credentials.email, credentials.password);

        (StatusCode::OK, json!({ "result": "success" }))
    }

    fn login(&self, realm: Realm, headers: &HeaderMap, body: Option<&Value>) -> (StatusCode, Value) {
        let email = match self.authenticate(realm, headers, body) {
            Some(email) => email,
            None => {
                return (
                    StatusCode::UNAUTHORIZED,
                    json!({ "status": UNAUTHORIZED_STATUS }),
                )
            }
        };

        let token = self.issue_token(&email);
        (
            StatusCode::OK,
            json!({ "result": "success", "payload": token }),
        )
    }

    /// Resolves the email behind whatever credential the request carries.
    /// The authorization header wins over a cookie, a cookie over the body.
    fn authenticate(&self, realm: Realm, headers: &HeaderMap, body: Option<&Value>) -> Option<String> {
        if let Some(authorization) = header_str(headers, header::AUTHORIZATION) {
            if let Some((email, password)) = util::parse_basic_credentials(authorization) {
                return self.check_password(realm, &email, &password);
            }
            return authorization
                .strip_prefix("Bearer ")
                .and_then(|token| self.token_owner(token));
        }

        if let Some(token) =
            header_str(headers, header::COOKIE).and_then(|cookie| util::cookie_value(cookie, "auth"))
        {
            return self.token_owner(token);
        }

        let body = body?;
        if let Some(token) = body.get("auth").and_then(Value::as_str) {
            return self.token_owner(token);
        }

        let email = body.get("email")?.as_str()?;
        let password = body.get("password")?.as_str()?;
        self.check_password(realm, email, password)
    }

    fn check_password(&self, realm: Realm, email: &str, password: &str) -> Option<String> {
        let known = match realm {
            Realm::UserLogin => lock(&self.accounts).get(email).map(|p| p == password),
            Realm::TestAuth => Some(
                self.legacy_account.email == email && self.legacy_account.password == password,
            ),
        };

        match known {
            Some(true) => Some(email.to_string()),
            _ => None,
        }
    }

    fn issue_token(&self, email: &str) -> String {
        let serial = self.next_token.fetch_add(1, Ordering::Relaxed);
        let token = format!("{:016x}{:08x}", serial.wrapping_mul(0x9e37_79b9_7f4a_7c15), serial);

        lock(&self.tokens).insert(token.clone(), email.to_string());
        token
    }

    fn token_owner(&self, token: &str) -> Option<String> {
        lock(&self.tokens).get(token).cloned()
    }

    fn datastore(&self) -> (StatusCode, Value) {
        let failing = lock(&self.failing_check).clone();
        let mut payload = serde_json::Map::new();

        for check in DATASTORE_CHECKS.iter() {
            let outcome = match &failing {
                Some(failing) if failing == check => "failed.",
                _ => "passed.",
            };
            payload.insert(check.to_string(), json!({ "outcome": outcome }));
        }

        let result = if failing.is_some() { "fail" } else { "success" };
        (
            StatusCode::OK,
            json!({ "result": result, "payload": Value::Object(payload) }),
        )
    }
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
