use crate::logging;
use futures::FutureExt;
use std::{any::Any, fmt::Display, future::Future, panic, panic::AssertUnwindSafe};
use tokio::runtime::{Builder, Runtime};

/// How an adapted test ended.
pub enum Failure {
    /// The test returned an error.
    Error(String),
    /// The test panicked, usually a failed `assert!`.
    Panic(Box<dyn Any + Send + 'static>),
}

impl Failure {
    pub fn message(&self) -> String {
        match self {
            Failure::Error(message) => message.clone(),
            Failure::Panic(payload) => panic_message(payload.as_ref()),
        }
    }
}

impl std::fmt::Debug for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Failure::Error(message) => f.debug_tuple("Error").field(message).finish(),
            Failure::Panic(_) => f.debug_tuple("Panic").field(&self.message()).finish(),
        }
    }
}

/// Anything an async test body may evaluate to.
pub trait TestOutcome {
    fn into_result(self) -> Result<(), String>;
}

impl TestOutcome for () {
    fn into_result(self) -> Result<(), String> {
        Ok(())
    }
}

impl<E: Display> TestOutcome for Result<(), E> {
    fn into_result(self) -> Result<(), String> {
        self.map_err(|e| e.to_string())
    }
}

/// Drives `test` to completion on `runtime` and hands the outcome to `done`.
///
/// `done` is `FnOnce` and is called on every path, including a panic inside
/// the test, so the completion signal fires exactly once.
pub fn adapt<F, O, D>(runtime: &Runtime, test: F, done: D)
where
    F: Future<Output = O>,
    O: TestOutcome,
    D: FnOnce(Result<(), Failure>),
{
    let outcome = runtime.block_on(AssertUnwindSafe(test).catch_unwind());

    done(match outcome {
        Ok(result) => result.into_result().map_err(Failure::Error),
        Err(payload) => Err(Failure::Panic(payload)),
    });
}

pub fn test_runtime() -> std::io::Result<Runtime> {
    Builder::new_current_thread().enable_all().build()
}

/// Entry point used by `#[api_test]`.
///
/// Errors become a panic carrying the test name and message; panics from
/// the test body are resumed with their original payload.
pub fn run_test<F, O>(name: &str, test: F)
where
    F: Future<Output = O>,
    O: TestOutcome,
{
    logging::init();

    let runtime = match test_runtime() {
        Ok(runtime) => runtime,
        Err(e) => panic!("{}: could not start the tokio runtime: {}", name, e),
    };

    let mut failure = None;
    adapt(&runtime, test, |result| failure = result.err());

    match failure {
        None => (),
        Some(Failure::Error(message)) => panic!("{}: {}", name, message),
        Some(Failure::Panic(payload)) => panic::resume_unwind(payload),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        String::from(*message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("test panicked")
    }
}
