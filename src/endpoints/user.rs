use super::EndpointError;
use crate::{ApiClient, Record, Session};
use reqwest::{Method, RequestBuilder};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;

/// Ask the server for a new token.
///
/// The session isn't touched, hand the token to [`Session::set_token()`] to
/// actually log in.
pub async fn login(
    api: &ApiClient,
    session: &Session,
    credentials: &Credentials,
) -> Result<String, LoginError> {
    log::trace!("Logging in as {}", credentials.username);
    let body = super::send(login_request(api, session, credentials)?).await?;

    interpret_response(body)
}

/// Create a new account.
pub async fn register(
    api: &ApiClient,
    session: &Session,
    registration: &Registration,
) -> Result<Record, EndpointError> {
    super::send(register_request(api, session, registration)?).await
}

/// Fetch the logged in user's profile.
pub async fn get_profile(
    api: &ApiClient,
    session: &Session,
) -> Result<Record, EndpointError> {
    super::send(profile_request(api, session)?).await
}

fn login_request(
    api: &ApiClient,
    session: &Session,
    credentials: &Credentials,
) -> Result<RequestBuilder, EndpointError> {
    Ok(api.request(session, Method::POST, "/user/login")?.json(credentials))
}

fn register_request(
    api: &ApiClient,
    session: &Session,
    registration: &Registration,
) -> Result<RequestBuilder, EndpointError> {
    Ok(api
        .request(session, Method::POST, "/user/register")?
        .json(registration))
}

fn profile_request(
    api: &ApiClient,
    session: &Session,
) -> Result<RequestBuilder, EndpointError> {
    api.request(session, Method::GET, "/user/profile")
}

/// The status code the backend reports inside the body when all is well.
const SUCCESS_CODE: i64 = 200;

fn interpret_response(body: Value) -> Result<String, LoginError> {
    if let Some(token) = find_token(&body) {
        return Ok(token.to_string());
    }

    let code = match body.get("code").and_then(Value::as_i64) {
        Some(code) if code != SUCCESS_CODE => code,
        _ => return Err(LoginError::MissingToken),
    };

    let message = body
        .get("msg")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| format!("error code {}", code));

    log::error!("Login failed with {}: {}", code, message);
    Err(LoginError::RejectedByServer { code, message })
}

/// The backend has handed the token back as `token`, as a bare `data`
/// string, and as `data.token`.
fn find_token(body: &Value) -> Option<&str> {
    let data = body.get("data");

    body.get("token")
        .and_then(Value::as_str)
        .or_else(|| data.and_then(Value::as_str))
        .or_else(|| data.and_then(|d| d.get("token")).and_then(Value::as_str))
        .filter(|token| !token.is_empty())
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new<U, P>(username: U, password: P) -> Self
    where
        U: Into<String>,
        P: Into<String>,
    {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Possible errors that may be returned by [`login()`].
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Unable to send the login request")]
    Endpoint(#[from] EndpointError),
    /// The server replied, but the reply didn't contain a token.
    #[error("The login response didn't contain a token")]
    MissingToken,
    /// The body carried a failure code instead of a token.
    #[error("Login was rejected by the server ({code}): {message}")]
    RejectedByServer { code: i64, message: String },
}
