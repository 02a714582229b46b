mod account;
mod auth;
mod datastore;
mod public_api;

pub use account::{bootstrap_idempotence_suite, create_test_account, setup_suite};
pub use auth::{login_suite, obtain_token, token_replay_suite, AuthTransport};
pub use datastore::{datastore_suite, DATASTORE_CHECKS};
pub use public_api::{
    cross_origin_suite, logged_user_suite, root_api_suite, NOT_AUTHENTICATED_CODE,
};

use crate::{
    apicheck_configuration::{Constants, LoginFixture},
    error::Error,
    ApiClient,
};
use futures::future::join_all;
use std::{fmt::Display, future::Future, pin::Pin};
use tracing::{info, warn};

type SuiteFuture<'a> = Pin<Box<dyn Future<Output = SuiteReport> + 'a>>;

#[derive(Debug)]
pub enum StepOutcome {
    Passed,
    Failed(Error),
    Skipped(String),
}

#[derive(Debug)]
pub struct StepReport {
    pub name: String,
    pub outcome: StepOutcome,
}

impl StepReport {
    pub fn passed(&self) -> bool {
        matches!(self.outcome, StepOutcome::Passed)
    }
}

impl Display for StepReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.outcome {
            StepOutcome::Passed => write!(f, "{}: passed", self.name),
            StepOutcome::Failed(error) => write!(f, "{}: {}", self.name, error),
            StepOutcome::Skipped(reason) => write!(f, "{}: skipped, {}", self.name, reason),
        }
    }
}

#[derive(Debug)]
pub struct SuiteReport {
    pub name: String,
    pub steps: Vec<StepReport>,
}

impl SuiteReport {
    pub fn is_success(&self) -> bool {
        self.steps.iter().all(StepReport::passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|step| !step.passed())
    }

    pub fn step(&self, name: &str) -> Option<&StepReport> {
        self.steps.iter().find(|step| step.name == name)
    }

    pub fn into_result(self) -> Result<(), Error> {
        if self.is_success() {
            return Ok(());
        }

        let failures = self.failures().map(|step| step.to_string()).collect();
        Err(Error::SuiteFailed(self.name, failures))
    }
}

/// An ordered group of dependent steps.
///
/// Steps run one after another. A failing step is recorded and the next one
/// still runs; only steps that need state from a failed `before` hook are
/// skipped.
#[derive(Debug)]
pub struct Suite {
    name: String,
    steps: Vec<StepReport>,
}

impl Suite {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn step<S, F>(&mut self, name: S, step: F)
    where
        S: Into<String>,
        F: Future<Output = Result<(), Error>>,
    {
        let name = name.into();
        let outcome = match step.await {
            Ok(()) => StepOutcome::Passed,
            Err(error) => StepOutcome::Failed(error),
        };
        self.record(name, outcome);
    }

    /// Runs a setup hook. Its failure is recorded as a step of its own and
    /// `None` is returned so the caller can skip what depended on it.
    pub async fn before<S, F, T>(&mut self, name: S, hook: F) -> Option<T>
    where
        S: Into<String>,
        F: Future<Output = Result<T, Error>>,
    {
        let name = name.into();
        match hook.await {
            Ok(value) => Some(value),
            Err(error) => {
                self.record(format!("before: {}", name), StepOutcome::Failed(error));
                None
            }
        }
    }

    pub fn skip<S1: Into<String>, S2: Into<String>>(&mut self, name: S1, reason: S2) {
        self.record(name.into(), StepOutcome::Skipped(reason.into()));
    }

    pub fn finish(self) -> SuiteReport {
        SuiteReport {
            name: self.name,
            steps: self.steps,
        }
    }

    fn record(&mut self, name: String, outcome: StepOutcome) {
        match &outcome {
            StepOutcome::Passed => info!(suite = %self.name, step = %name, "passed"),
            StepOutcome::Failed(error) => {
                warn!(suite = %self.name, step = %name, error = %error, "failed")
            }
            StepOutcome::Skipped(reason) => {
                warn!(suite = %self.name, step = %name, reason = %reason, "skipped")
            }
        }

        self.steps.push(StepReport { name, outcome });
    }
}

/// Folds several reports into one result naming every failed step of every
/// failed suite.
pub fn all_passed<I>(reports: I) -> Result<(), Error>
where
    I: IntoIterator<Item = SuiteReport>,
{
    let mut suites = Vec::new();
    let mut failures = Vec::new();

    for report in reports {
        if report.is_success() {
            continue;
        }
        failures.extend(
            report
                .failures()
                .map(|step| format!("{}: {}", report.name, step)),
        );
        suites.push(report.name);
    }

    if suites.is_empty() {
        return Ok(());
    }
    Err(Error::SuiteFailed(suites.join(", "), failures))
}

/// Runs the account bootstrap, then every other suite concurrently.
///
/// The bootstrap report comes first; a failed bootstrap does not stop the
/// remaining suites.
pub async fn run_all(client: &ApiClient, constants: &Constants) -> Vec<SuiteReport> {
    let user_login = LoginFixture::user_login();
    let test_auth = LoginFixture::test_auth();

    let mut reports = vec![setup_suite(client, constants).await];

    let mut suites: Vec<SuiteFuture<'_>> = Vec::new();
    suites.push(Box::pin(cross_origin_suite(
        client,
        constants,
        constants.origin(),
    )));
    suites.push(Box::pin(root_api_suite(client, constants, constants.origin())));
    suites.push(Box::pin(logged_user_suite(client, constants)));
    suites.push(Box::pin(datastore_suite(client, constants)));
    suites.push(Box::pin(bootstrap_idempotence_suite(client, constants)));
    suites.push(Box::pin(token_replay_suite(client, constants, &user_login)));
    suites.push(Box::pin(login_suite(
        client,
        constants,
        &test_auth,
        AuthTransport::Basic,
    )));
    for transport in AuthTransport::ALL.iter() {
        suites.push(Box::pin(login_suite(
            client,
            constants,
            &user_login,
            *transport,
        )));
    }

    reports.extend(join_all(suites).await);
    reports
}
