use super::{Suite, SuiteReport};
use crate::{apicheck_configuration::Constants, assertions, ApiClient};

pub const DATASTORE_PATH: &str = "/test/v1/datastore";
pub const DATASTORE_CHECKS: [&str; 4] = ["1st", "2nd", "3rd", "4th"];
pub const PASSED: &str = "passed.";

/// The server runs four storage adapter checks in sequence and reports each
/// under `payload.<ordinal>.outcome`.
pub async fn datastore_suite(client: &ApiClient, constants: &Constants) -> SuiteReport {
    let mut suite = Suite::new("Datastore smoke test");

    let response = match suite
        .before("GET datastore", client.get(constants.root(DATASTORE_PATH)))
        .await
    {
        Some(response) => response,
        None => {
            suite.skip("datastore checks", "the request failed");
            return suite.finish();
        }
    };

    suite
        .step("should report success", async {
            Ok(assertions::is_success(&response)?)
        })
        .await;

    for check in DATASTORE_CHECKS.iter() {
        let path = format!("payload.{}.outcome", check);
        suite
            .step(format!("{} check should have passed", check), async {
                Ok(assertions::body_field(&response, &path, PASSED)?)
            })
            .await;
    }

    suite.finish()
}
