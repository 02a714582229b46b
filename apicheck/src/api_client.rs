use crate::{
    apicheck_configuration::{Constants, ACCEPT, CONTENT_TYPE},
    error::Error,
    http_client::{HttpClient, HyperHttpClient},
    util, RequestData, ResponseData,
};
use hyper::Method;
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tracing::debug;

/// Thin wrapper over an [`HttpClient`] that applies the JSON headers the API
/// expects and bounds every request by a timeout.
///
/// Status codes are never turned into errors: a 401 is as much a response as
/// a 200, and callers decide by looking at `status_code` and the body.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Arc<dyn HttpClient + Send + Sync>,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(constants: &Constants) -> Self {
        Self::with_http_client(constants, Arc::new(HyperHttpClient::new()))
    }

    pub fn with_http_client(
        constants: &Constants,
        http: Arc<dyn HttpClient + Send + Sync>,
    ) -> Self {
        Self {
            http,
            timeout: constants.request_timeout(),
        }
    }

    /// Starts a request with no headers set.
    pub fn request<S: Into<String>>(&self, method: Method, url: S) -> RequestBuilder<'_> {
        RequestBuilder {
            client: self,
            request_data: RequestData::new(method.as_str(), url),
            error: None,
        }
    }

    pub async fn get<S: Into<String>>(&self, url: S) -> Result<ResponseData, Error> {
        self.request(Method::GET, url)
            .header("Accept", ACCEPT)
            .send()
            .await
    }

    pub async fn post<S: Into<String>, T: Serialize + ?Sized>(
        &self,
        url: S,
        data: &T,
    ) -> Result<ResponseData, Error> {
        self.update(url, Method::POST, data).await
    }

    pub async fn put<S: Into<String>, T: Serialize + ?Sized>(
        &self,
        url: S,
        data: Option<&T>,
    ) -> Result<ResponseData, Error> {
        let mut builder = self
            .request(Method::PUT, url)
            .header("Content-Type", CONTENT_TYPE)
            .header("Accept", ACCEPT);

        if let Some(data) = data {
            builder = builder.json(data);
        }

        builder.send().await
    }

    pub async fn delete<S: Into<String>>(&self, url: S) -> Result<ResponseData, Error> {
        self.request(Method::DELETE, url).send().await
    }

    /// Sends `data` as JSON with an arbitrary method.
    pub async fn update<S: Into<String>, T: Serialize + ?Sized>(
        &self,
        url: S,
        method: Method,
        data: &T,
    ) -> Result<ResponseData, Error> {
        self.request(method, url)
            .header("Accept", ACCEPT)
            .json(data)
            .send()
            .await
    }

    pub async fn send(&self, request_data: RequestData) -> Result<ResponseData, Error> {
        debug!(method = %request_data.method, url = %request_data.url, "sending request");

        let response = tokio::time::timeout(self.timeout, self.http.make_request(&request_data))
            .await
            .map_err(|_| Error::Timeout(self.timeout))??;

        debug!(
            method = %request_data.method,
            url = %request_data.url,
            status = response.status_code,
            "received response"
        );

        Ok(response)
    }
}

#[derive(Debug)]
pub struct RequestBuilder<'a> {
    client: &'a ApiClient,
    request_data: RequestData,
    error: Option<Error>,
}

impl<'a> RequestBuilder<'a> {
    pub fn header<S1: AsRef<str>, S2: Into<String>>(mut self, name: S1, value: S2) -> Self {
        self.request_data.set_header(name, value);
        self
    }

    /// Serializes `data` as the body and sets `Content-Type`.
    pub fn json<T: Serialize + ?Sized>(mut self, data: &T) -> Self {
        match serde_json::to_string(data) {
            Ok(body) => {
                self.request_data.body = Some(body);
                self.header("Content-Type", CONTENT_TYPE)
            }
            Err(e) => {
                self.error.get_or_insert(Error::JsonError(e));
                self
            }
        }
    }

    pub fn basic_auth<S1: AsRef<str>, S2: AsRef<str>>(self, user: S1, password: S2) -> Self {
        self.header("Authorization", util::basic_credentials(user, password))
    }

    pub fn bearer_auth<S: AsRef<str>>(self, token: S) -> Self {
        self.header("Authorization", format!("Bearer {}", token.as_ref()))
    }

    pub fn cookie<S1: AsRef<str>, S2: AsRef<str>>(self, name: S1, value: S2) -> Self {
        let pair = format!("{}={}", name.as_ref(), value.as_ref());
        let cookie = match self.request_data.header("cookie") {
            Some(existing) => format!("{}; {}", existing, pair),
            None => pair,
        };

        self.header("Cookie", cookie)
    }

    pub fn origin<S: Into<String>>(self, origin: S) -> Self {
        self.header("Origin", origin)
    }

    pub fn build(self) -> Result<RequestData, Error> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.request_data),
        }
    }

    pub async fn send(self) -> Result<ResponseData, Error> {
        let client = self.client;
        client.send(self.build()?).await
    }
}
