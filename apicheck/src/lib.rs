mod api_client;
mod apicheck_configuration;
pub mod assertions;
mod data;
mod error;
mod http_client;
pub mod logging;
mod runner;
pub mod scenario;
pub mod stub_server;
mod util;

pub use api_client::{ApiClient, RequestBuilder};
pub use apicheck_codegen::api_test;
pub use apicheck_configuration::{
    Constants, Credentials, LoginBase, LoginFixture, ACCEPT, CONTENT_TYPE, DEFAULT_URL,
};
pub use data::{RequestData, ResponseData};
pub use error::Error;
pub use http_client::{HttpClient, HyperHttpClient};
pub use runner::{adapt, run_test, test_runtime, Failure, TestOutcome};
pub use stub_server::StubApi;
