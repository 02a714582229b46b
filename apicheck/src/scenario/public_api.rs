use super::{Suite, SuiteReport};
use crate::{apicheck_configuration::Constants, assertions, error::Error, ApiClient, ResponseData};
use hyper::Method;

pub const USER_PATH: &str = "/user";
pub const NOT_AUTHENTICATED_CODE: i64 = -29;

async fn preflight(client: &ApiClient, url: &str, origin: &str) -> Result<ResponseData, Error> {
    client.request(Method::OPTIONS, url).origin(origin).send().await
}

/// The four checks every public endpoint shares: CORS headers, any origin,
/// status 200 and a JSON body.
async fn public_checks(suite: &mut Suite, response: &ResponseData) {
    suite
        .step("should have all CORS headers", async {
            Ok(assertions::has_cors_headers(response)?)
        })
        .await;
    suite
        .step("should allow any origin", async {
            Ok(assertions::allows_any_origin(response)?)
        })
        .await;
    suite
        .step("should return 200 status code", async {
            Ok(assertions::status_is_200(response)?)
        })
        .await;
    suite
        .step("should return a json object", async {
            Ok(assertions::is_json_body(response)?)
        })
        .await;
}

pub async fn cross_origin_suite(
    client: &ApiClient,
    constants: &Constants,
    origin: &str,
) -> SuiteReport {
    let mut suite = Suite::new(format!("Cross Origin Requests (Origin: {})", origin));

    match suite
        .before("OPTIONS api", preflight(client, constants.url(), origin))
        .await
    {
        Some(response) => public_checks(&mut suite, &response).await,
        None => suite.skip("CORS checks", "the preflight request failed"),
    }

    suite.finish()
}

/// Preflight on the server root with `origin`, then a plain `GET url`.
pub async fn root_api_suite(
    client: &ApiClient,
    constants: &Constants,
    origin: &str,
) -> SuiteReport {
    let mut suite = Suite::new("Root API Requests");

    match suite
        .before("OPTIONS root", preflight(client, &constants.root("/"), origin))
        .await
    {
        Some(response) => public_checks(&mut suite, &response).await,
        None => suite.skip("CORS checks", "the preflight request failed"),
    }

    suite
        .step("should return 200 HTTP status code", async {
            let response = client.get(constants.url()).await?;
            Ok(assertions::status_is_200(&response)?)
        })
        .await;

    suite.finish()
}

pub async fn logged_user_suite(client: &ApiClient, constants: &Constants) -> SuiteReport {
    let mut suite = Suite::new("Logged User Access Functions");

    let response = match suite
        .before("GET user", client.get(constants.api(USER_PATH)))
        .await
    {
        Some(response) => response,
        None => {
            suite.skip("user access checks", "the request failed");
            return suite.finish();
        }
    };

    suite
        .step("should have all CORS headers", async {
            Ok(assertions::has_cors_headers(&response)?)
        })
        .await;
    suite
        .step("should allow any origin", async {
            Ok(assertions::allows_any_origin(&response)?)
        })
        .await;
    suite
        .step("should return a json object", async {
            Ok(assertions::is_json_body(&response)?)
        })
        .await;
    suite
        .step("should be a failure request", async {
            Ok(assertions::body_field(&response, "result", "fail")?)
        })
        .await;
    suite
        .step("should have error code -29 ( not authenticated )", async {
            Ok(assertions::body_field(
                &response,
                "code",
                NOT_AUTHENTICATED_CODE,
            )?)
        })
        .await;

    suite.finish()
}
