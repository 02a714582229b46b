use super::{Suite, SuiteReport};
use crate::{apicheck_configuration::Constants, assertions, error::Error, ApiClient, ResponseData};
use serde_json::Value;

pub const TEST_ACCOUNT_PATH: &str = "/test/v1";

/// `PUT {host}/test/v1` with no body; the server decides which account that
/// is. An account that already exists is fine, the reply only has to be JSON
/// with a `result` field.
pub async fn create_test_account(
    client: &ApiClient,
    constants: &Constants,
) -> Result<ResponseData, Error> {
    let response = client
        .put(constants.root(TEST_ACCOUNT_PATH), None::<&Value>)
        .await
        .map_err(|e| Error::SetupFailure(e.to_string()))?;

    assertions::has_body_field(&response, "result")
        .map_err(|failure| Error::SetupFailure(failure.to_string()))?;

    Ok(response)
}

pub async fn setup_suite(client: &ApiClient, constants: &Constants) -> SuiteReport {
    let mut suite = Suite::new("Test account");

    suite
        .step("should create a test account", async {
            create_test_account(client, constants).await.map(|_| ())
        })
        .await;

    suite.finish()
}

pub async fn bootstrap_idempotence_suite(client: &ApiClient, constants: &Constants) -> SuiteReport {
    let mut suite = Suite::new("Test account bootstrap is idempotent");

    suite
        .step("should accept the first bootstrap", async {
            create_test_account(client, constants).await.map(|_| ())
        })
        .await;
    suite
        .step("should accept a repeated bootstrap", async {
            create_test_account(client, constants).await.map(|_| ())
        })
        .await;

    suite.finish()
}
