//! Acceptance suites for the login, CORS and datastore API.
//!
//! Every suite runs twice: `_stub` against the in-process stub API, and
//! `_live` against the server named by `URL` (default `http://lcb/api/v1`).
//! The live variants are ignored; run them with `cargo test -- --ignored`.

#[cfg(test)]
mod tests {
    use apicheck::{
        api_test,
        scenario::{self, AuthTransport, StepOutcome, SuiteReport},
        ApiClient, Constants, Credentials, Error, LoginFixture, StubApi,
    };
    use serde_json::json;
    use std::future::Future;

    async fn stub() -> Result<(StubApi, Constants, ApiClient), Error> {
        let stub = StubApi::start().await?;
        let constants = stub.constants();
        let client = ApiClient::new(&constants);
        Ok((stub, constants, client))
    }

    fn live() -> (&'static Constants, ApiClient) {
        let constants = Constants::get();
        (constants, ApiClient::new(constants))
    }

    /// Runs the account bootstrap, then `suite` whether the bootstrap passed
    /// or not. Both reports are returned, the bootstrap first.
    async fn after_bootstrap<F>(
        client: &ApiClient,
        constants: &Constants,
        suite: F,
    ) -> Vec<SuiteReport>
    where
        F: Future<Output = SuiteReport>,
    {
        let setup = scenario::setup_suite(client, constants).await;
        vec![setup, suite.await]
    }

    async fn login_against_stub(transport: AuthTransport) -> Result<(), Error> {
        let (_stub, constants, client) = stub().await?;
        let fixture = LoginFixture::user_login();
        let login = scenario::login_suite(&client, &constants, &fixture, transport);
        scenario::all_passed(after_bootstrap(&client, &constants, login).await)
    }

    async fn login_against_live(transport: AuthTransport) -> Result<(), Error> {
        let (constants, client) = live();
        let fixture = LoginFixture::user_login();
        let login = scenario::login_suite(&client, constants, &fixture, transport);
        scenario::all_passed(after_bootstrap(&client, constants, login).await)
    }

    fn failed_steps(report: &SuiteReport) -> Vec<&str> {
        report.failures().map(|step| step.name.as_str()).collect()
    }

    #[api_test]
    async fn create_test_account_stub() -> Result<(), Error> {
        let (_stub, constants, client) = stub().await?;
        scenario::setup_suite(&client, &constants).await.into_result()
    }

    #[api_test(live)]
    async fn create_test_account_live() -> Result<(), Error> {
        let (constants, client) = live();
        scenario::setup_suite(&client, constants).await.into_result()
    }

    #[api_test]
    async fn bootstrap_is_idempotent_stub() -> Result<(), Error> {
        let (stub, constants, client) = stub().await?;
        scenario::bootstrap_idempotence_suite(&client, &constants)
            .await
            .into_result()?;
        assert_eq!(stub.account_count(), 1);
        Ok(())
    }

    #[api_test(live)]
    async fn bootstrap_is_idempotent_live() -> Result<(), Error> {
        let (constants, client) = live();
        scenario::bootstrap_idempotence_suite(&client, constants)
            .await
            .into_result()
    }

    #[api_test]
    async fn cross_origin_requests_stub() -> Result<(), Error> {
        let (_stub, constants, client) = stub().await?;
        scenario::cross_origin_suite(&client, &constants, constants.origin())
            .await
            .into_result()
    }

    #[api_test(live)]
    async fn cross_origin_requests_live() -> Result<(), Error> {
        let (constants, client) = live();
        scenario::cross_origin_suite(&client, constants, constants.origin())
            .await
            .into_result()
    }

    #[api_test]
    async fn any_origin_is_allowed_whatever_origin_is_sent_stub() -> Result<(), Error> {
        let (_stub, constants, client) = stub().await?;
        let mut reports = Vec::new();

        for origin in &["http://someplace.com", "https://elsewhere.example", "null"] {
            reports.push(scenario::cross_origin_suite(&client, &constants, origin).await);
            reports.push(scenario::root_api_suite(&client, &constants, origin).await);
        }

        for report in &reports {
            let step = report.step("should allow any origin").unwrap();
            assert!(step.passed(), "{}: {}", report.name, step);
        }
        scenario::all_passed(reports)
    }

    #[api_test]
    async fn root_api_requests_stub() -> Result<(), Error> {
        let (_stub, constants, client) = stub().await?;
        scenario::root_api_suite(&client, &constants, constants.origin())
            .await
            .into_result()
    }

    #[api_test(live)]
    async fn root_api_requests_live() -> Result<(), Error> {
        let (constants, client) = live();
        scenario::root_api_suite(&client, constants, constants.origin())
            .await
            .into_result()
    }

    #[api_test]
    async fn logged_user_access_stub() -> Result<(), Error> {
        let (_stub, constants, client) = stub().await?;
        scenario::logged_user_suite(&client, &constants)
            .await
            .into_result()
    }

    #[api_test(live)]
    async fn logged_user_access_live() -> Result<(), Error> {
        let (constants, client) = live();
        scenario::logged_user_suite(&client, constants)
            .await
            .into_result()
    }

    #[api_test]
    async fn default_auth_stub() -> Result<(), Error> {
        login_against_stub(AuthTransport::Default).await
    }

    #[api_test(live)]
    async fn default_auth_live() -> Result<(), Error> {
        login_against_live(AuthTransport::Default).await
    }

    #[api_test]
    async fn basic_auth_stub() -> Result<(), Error> {
        login_against_stub(AuthTransport::Basic).await
    }

    #[api_test(live)]
    async fn basic_auth_live() -> Result<(), Error> {
        login_against_live(AuthTransport::Basic).await
    }

    #[api_test]
    async fn cookie_auth_stub() -> Result<(), Error> {
        login_against_stub(AuthTransport::Cookie).await
    }

    #[api_test(live)]
    async fn cookie_auth_live() -> Result<(), Error> {
        login_against_live(AuthTransport::Cookie).await
    }

    #[api_test]
    async fn body_data_auth_stub() -> Result<(), Error> {
        login_against_stub(AuthTransport::BodyToken).await
    }

    #[api_test(live)]
    async fn body_data_auth_live() -> Result<(), Error> {
        login_against_live(AuthTransport::BodyToken).await
    }

    #[api_test]
    async fn bearer_auth_stub() -> Result<(), Error> {
        login_against_stub(AuthTransport::Bearer).await
    }

    #[api_test(live)]
    async fn bearer_auth_live() -> Result<(), Error> {
        login_against_live(AuthTransport::Bearer).await
    }

    #[api_test]
    async fn test_auth_endpoint_basic_stub() -> Result<(), Error> {
        let (_stub, constants, client) = stub().await?;
        scenario::login_suite(
            &client,
            &constants,
            &LoginFixture::test_auth(),
            AuthTransport::Basic,
        )
        .await
        .into_result()
    }

    #[api_test(live)]
    async fn test_auth_endpoint_basic_live() -> Result<(), Error> {
        let (constants, client) = live();
        let fixture = LoginFixture::test_auth();
        let login = scenario::login_suite(&client, constants, &fixture, AuthTransport::Basic);
        scenario::all_passed(after_bootstrap(&client, constants, login).await)
    }

    #[api_test]
    async fn token_replays_over_every_transport_stub() -> Result<(), Error> {
        let (_stub, constants, client) = stub().await?;
        let fixture = LoginFixture::user_login();
        let replay = scenario::token_replay_suite(&client, &constants, &fixture);

        let reports = after_bootstrap(&client, &constants, replay).await;

        assert_eq!(reports[1].steps.len(), 3);
        scenario::all_passed(reports)
    }

    #[api_test(live)]
    async fn token_replays_over_every_transport_live() -> Result<(), Error> {
        let (constants, client) = live();
        let fixture = LoginFixture::user_login();
        let replay = scenario::token_replay_suite(&client, constants, &fixture);
        scenario::all_passed(after_bootstrap(&client, constants, replay).await)
    }

    #[api_test]
    async fn login_still_runs_when_the_bootstrap_fails() -> Result<(), Error> {
        let (_stub, mut constants, client) = stub().await?;
        scenario::create_test_account(&client, &constants).await?;
        constants.set_host("http://127.0.0.1:9");

        let fixture = LoginFixture::user_login();
        let login = scenario::login_suite(&client, &constants, &fixture, AuthTransport::Default);
        let reports = after_bootstrap(&client, &constants, login).await;

        match &reports[0].steps[0].outcome {
            StepOutcome::Failed(Error::SetupFailure(_)) => (),
            other => panic!("expected a setup failure, got {:?}", other),
        }
        assert_eq!(reports[1].steps.len(), 3);
        reports.into_iter().skip(1).try_for_each(SuiteReport::into_result)
    }

    #[api_test]
    async fn datastore_smoke_test_stub() -> Result<(), Error> {
        let (_stub, constants, client) = stub().await?;
        scenario::datastore_suite(&client, &constants)
            .await
            .into_result()
    }

    #[api_test(live)]
    async fn datastore_smoke_test_live() -> Result<(), Error> {
        let (constants, client) = live();
        scenario::datastore_suite(&client, constants)
            .await
            .into_result()
    }

    #[api_test]
    async fn datastore_failure_names_the_check() -> Result<(), Error> {
        let (stub, constants, client) = stub().await?;
        stub.fail_datastore_check("4th");

        let report = scenario::datastore_suite(&client, &constants).await;

        assert_eq!(
            failed_steps(&report),
            vec!["should report success", "4th check should have passed"]
        );
        Ok(())
    }

    #[api_test]
    async fn wrong_password_is_unauthorized_stub() -> Result<(), Error> {
        let (_stub, constants, client) = stub().await?;
        scenario::setup_suite(&client, &constants).await.into_result()?;

        let response = client
            .post(
                constants.api("/user/login"),
                &Credentials::new("test@test.net", "test1o"),
            )
            .await?;

        assert_eq!(response.field("status"), Some(&json!("HTTP/1.1 401 Unauthorized")));
        Ok(())
    }

    #[api_test]
    async fn right_password_issues_a_token_stub() -> Result<(), Error> {
        let (_stub, constants, client) = stub().await?;
        scenario::setup_suite(&client, &constants).await.into_result()?;

        let response = client
            .post(
                constants.api("/user/login"),
                &json!({ "email": "test@test.net", "password": "test1" }),
            )
            .await?;

        assert_eq!(response.field("result"), Some(&json!("success")));
        apicheck::assertions::has_token_payload(&response)?;
        Ok(())
    }

    #[api_test]
    async fn wrong_email_and_wrong_password_fail_independently() -> Result<(), Error> {
        // no bootstrap: the right credentials are unknown too
        let (_stub, constants, client) = stub().await?;

        let report = scenario::login_suite(
            &client,
            &constants,
            &LoginFixture::user_login(),
            AuthTransport::Default,
        )
        .await;

        assert_eq!(report.steps.len(), 3);
        assert!(report.step("should fail login with wrong password").unwrap().passed());
        assert!(report.step("should fail login with wrong email").unwrap().passed());
        assert_eq!(
            failed_steps(&report),
            vec!["should pass login with right credentials"]
        );
        Ok(())
    }

    #[api_test]
    async fn missing_token_skips_the_token_step() -> Result<(), Error> {
        let (_stub, constants, client) = stub().await?;

        let report = scenario::login_suite(
            &client,
            &constants,
            &LoginFixture::user_login(),
            AuthTransport::Bearer,
        )
        .await;

        let token_step = report.step("should pass login with right token").unwrap();
        assert!(matches!(token_step.outcome, StepOutcome::Skipped(_)));
        assert!(report.step("should fail login with wrong token").unwrap().passed());
        assert!(report.step("should fail login without a token").unwrap().passed());
        Ok(())
    }

    #[api_test]
    async fn unreachable_server_fails_the_suite_with_a_network_error() -> Result<(), Error> {
        let constants = Constants::new("http://127.0.0.1:9/api/v1");
        let client = ApiClient::new(&constants);

        let report = scenario::cross_origin_suite(&client, &constants, constants.origin()).await;

        match &report.steps[0].outcome {
            StepOutcome::Failed(Error::NetworkError(_)) => (),
            other => panic!("expected a network error, got {:?}", other),
        }
        assert!(!report.is_success());
        Ok(())
    }

    #[api_test]
    async fn every_suite_passes_against_the_stub() -> Result<(), Error> {
        let (_stub, constants, client) = stub().await?;

        let reports = scenario::run_all(&client, &constants).await;

        assert_eq!(reports[0].name, "Test account");
        assert_eq!(reports.len(), 13);
        scenario::all_passed(reports)
    }

    #[api_test]
    async fn failing_suite_does_not_affect_the_others() -> Result<(), Error> {
        let (stub, constants, client) = stub().await?;
        stub.disable_cors();

        let reports = scenario::run_all(&client, &constants).await;

        let failing = reports
            .iter()
            .filter(|report| !report.is_success())
            .map(|report| report.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            failing,
            vec![
                "Cross Origin Requests (Origin: http://someplace.com)",
                "Root API Requests",
                "Logged User Access Functions",
            ]
        );
        Ok(())
    }

    #[api_test(live)]
    async fn every_suite_passes_live() -> Result<(), Error> {
        let (constants, client) = live();
        scenario::all_passed(scenario::run_all(&client, constants).await)
    }
}
