use super::{Suite, SuiteReport};
use crate::{
    api_client::RequestBuilder,
    apicheck_configuration::{Constants, Credentials, LoginFixture},
    assertions,
    error::Error,
    ApiClient, ResponseData,
};
use hyper::Method;
use serde_json::{json, Value};

/// A value the server is known to reject as a token.
pub const MALFORMED_TOKEN: &str = "123";
pub const AUTH_COOKIE: &str = "auth";

/// How credentials travel to the login endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthTransport {
    /// `{email, password}` in the JSON body.
    Default,
    /// `Authorization: Basic ...`.
    Basic,
    /// `Cookie: auth=<token>`.
    Cookie,
    /// `{auth: <token>}` in the JSON body.
    BodyToken,
    /// `Authorization: Bearer <token>`.
    Bearer,
}

impl AuthTransport {
    pub const ALL: [AuthTransport; 5] = [
        AuthTransport::Default,
        AuthTransport::Basic,
        AuthTransport::Cookie,
        AuthTransport::BodyToken,
        AuthTransport::Bearer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AuthTransport::Default => "Default auth",
            AuthTransport::Basic => "Basic auth",
            AuthTransport::Cookie => "Cookie auth",
            AuthTransport::BodyToken => "Body data auth",
            AuthTransport::Bearer => "OAuth",
        }
    }

    /// Token transports need a prior login to have something to present.
    pub fn uses_token(self) -> bool {
        matches!(
            self,
            AuthTransport::Cookie | AuthTransport::BodyToken | AuthTransport::Bearer
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum Presented<'a> {
    Nothing,
    Password(&'a Credentials),
    Token(&'a str),
}

fn present<'a>(
    builder: RequestBuilder<'a>,
    transport: AuthTransport,
    presented: Presented<'_>,
) -> RequestBuilder<'a> {
    match (transport, presented) {
        (_, Presented::Nothing) => builder,
        (AuthTransport::Basic, Presented::Password(credentials)) => {
            builder.basic_auth(&credentials.email, &credentials.password)
        }
        (_, Presented::Password(credentials)) => builder.json(credentials),
        (AuthTransport::Cookie, Presented::Token(token)) => builder.cookie(AUTH_COOKIE, token),
        (AuthTransport::Bearer, Presented::Token(token)) => builder.bearer_auth(token),
        (_, Presented::Token(token)) => builder.json(&json!({ "auth": token })),
    }
}

async fn attempt(
    client: &ApiClient,
    endpoint: &str,
    transport: AuthTransport,
    presented: Presented<'_>,
) -> Result<ResponseData, Error> {
    present(client.request(Method::POST, endpoint), transport, presented)
        .send()
        .await
}

/// The canonical login: basic auth with the fixture's valid credentials.
/// Returns the token from `payload`.
pub async fn obtain_token(
    client: &ApiClient,
    constants: &Constants,
    fixture: &LoginFixture,
) -> Result<String, Error> {
    let response = attempt(
        client,
        &fixture.endpoint(constants),
        AuthTransport::Basic,
        Presented::Password(&fixture.valid),
    )
    .await?;

    assertions::is_success(&response)?;

    match response.field("payload") {
        Some(Value::String(token)) if !token.is_empty() => Ok(token.clone()),
        _ => Err(Error::MissingToken),
    }
}

async fn expect_unauthorized(
    client: &ApiClient,
    endpoint: &str,
    transport: AuthTransport,
    presented: Presented<'_>,
) -> Result<(), Error> {
    let response = attempt(client, endpoint, transport, presented).await?;
    Ok(assertions::is_unauthorized(&response)?)
}

async fn expect_success(
    client: &ApiClient,
    endpoint: &str,
    transport: AuthTransport,
    presented: Presented<'_>,
) -> Result<(), Error> {
    let response = attempt(client, endpoint, transport, presented).await?;
    assertions::is_success(&response)?;

    if let Presented::Password(_) = presented {
        assertions::has_token_payload(&response)?;
    }

    Ok(())
}

/// One login endpoint, one credential transport.
///
/// Password transports check a wrong password and a wrong email as separate
/// steps before the valid credentials. Token transports check a missing and
/// a malformed token, then log in once and present the issued token.
pub async fn login_suite(
    client: &ApiClient,
    constants: &Constants,
    fixture: &LoginFixture,
    transport: AuthTransport,
) -> SuiteReport {
    let endpoint = fixture.endpoint(constants);
    let mut suite = Suite::new(format!("{} {} POST", transport.name(), fixture.path));

    if !transport.uses_token() {
        suite
            .step(
                "should fail login with wrong password",
                expect_unauthorized(
                    client,
                    &endpoint,
                    transport,
                    Presented::Password(&fixture.wrong_password),
                ),
            )
            .await;
        suite
            .step(
                "should fail login with wrong email",
                expect_unauthorized(
                    client,
                    &endpoint,
                    transport,
                    Presented::Password(&fixture.wrong_email),
                ),
            )
            .await;
        suite
            .step(
                "should pass login with right credentials",
                expect_success(
                    client,
                    &endpoint,
                    transport,
                    Presented::Password(&fixture.valid),
                ),
            )
            .await;

        return suite.finish();
    }

    suite
        .step(
            "should fail login without a token",
            expect_unauthorized(client, &endpoint, transport, Presented::Nothing),
        )
        .await;
    suite
        .step(
            "should fail login with wrong token",
            expect_unauthorized(
                client,
                &endpoint,
                transport,
                Presented::Token(MALFORMED_TOKEN),
            ),
        )
        .await;

    match suite
        .before("obtain token", obtain_token(client, constants, fixture))
        .await
    {
        Some(token) => {
            suite
                .step(
                    "should pass login with right token",
                    expect_success(client, &endpoint, transport, Presented::Token(&token)),
                )
                .await
        }
        None => suite.skip("should pass login with right token", "no token was issued"),
    }

    suite.finish()
}

/// A single token, obtained once, must work over every token transport.
pub async fn token_replay_suite(
    client: &ApiClient,
    constants: &Constants,
    fixture: &LoginFixture,
) -> SuiteReport {
    let endpoint = fixture.endpoint(constants);
    let mut suite = Suite::new(format!("Token replay {} POST", fixture.path));

    let token = match suite
        .before("obtain token", obtain_token(client, constants, fixture))
        .await
    {
        Some(token) => token,
        None => {
            suite.skip("token replay", "no token was issued");
            return suite.finish();
        }
    };

    for transport in AuthTransport::ALL.iter().filter(|t| t.uses_token()) {
        suite
            .step(
                format!("should accept the token via {}", transport.name()),
                expect_success(client, &endpoint, *transport, Presented::Token(&token)),
            )
            .await;
    }

    suite.finish()
}
