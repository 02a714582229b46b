use crate::assertions::AssertionFailure;
use hyper::http;
use std::{fmt::Display, io, time::Duration};

#[derive(Debug)]
pub enum Error {
    NetworkError(hyper::Error),
    Timeout(Duration),
    AssertionFailure(AssertionFailure),
    SetupFailure(String),
    SuiteFailed(String, Vec<String>),
    MissingToken,
    InvalidHeaderName,
    InvalidHeaderValue,
    HttpError(http::Error),
    JsonError(serde_json::Error),
    ServerError(hyper::Error),
    IoError(io::Error),
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NetworkError(e) => write!(f, "Network error: {}", e),
            Error::Timeout(duration) => {
                write!(f, "No response within {} ms", duration.as_millis())
            }
            Error::AssertionFailure(failure) => write!(f, "{}", failure),
            Error::SetupFailure(reason) => write!(f, "Setup failed: {}", reason),
            Error::SuiteFailed(suite, failures) => {
                write!(f, "Suite \"{}\" failed:", suite)?;
                for failure in failures {
                    write!(f, "\n  - {}", failure)?;
                }
                Ok(())
            }
            Error::MissingToken => write!(f, "The login response carried no token"),
            Error::InvalidHeaderName => write!(f, "Invalid header name"),
            Error::InvalidHeaderValue => write!(f, "Invalid header value"),
            Error::HttpError(e) => write!(f, "Http Error: {}", e),
            Error::JsonError(e) => write!(f, "Json Error: {}", e),
            Error::ServerError(e) => write!(f, "Stub server error: {}", e),
            Error::IoError(e) => write!(f, "IoError: {}", e),
        }
    }
}

impl From<AssertionFailure> for Error {
    fn from(failure: AssertionFailure) -> Self {
        Error::AssertionFailure(failure)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::IoError(e)
    }
}

impl From<hyper::header::InvalidHeaderName> for Error {
    fn from(_: hyper::header::InvalidHeaderName) -> Self {
        Error::InvalidHeaderName
    }
}

impl From<hyper::header::InvalidHeaderValue> for Error {
    fn from(_: hyper::header::InvalidHeaderValue) -> Self {
        Error::InvalidHeaderValue
    }
}

impl From<hyper::Error> for Error {
    fn from(e: hyper::Error) -> Self {
        Error::NetworkError(e)
    }
}

impl From<http::Error> for Error {
    fn from(e: http::Error) -> Self {
        Error::HttpError(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::JsonError(e)
    }
}
