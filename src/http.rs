//! Shared plumbing for the JSON HTTP clients.
use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::error::{AutoshipError, Result};

/// Default timeout applied to every HTTP request.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);
/// User agent sent to every HTTP dependency.
pub const USER_AGENT: &str = concat!("autoship/", env!("CARGO_PKG_VERSION"));

/// Build a client that sends `authorization` (and optionally `accept`) on
/// every request and gives up after `timeout`.
pub fn build_client(
    authorization: &str,
    accept: Option<&str>,
    timeout: Duration,
) -> Result<Client> {
    let mut headers = HeaderMap::new();

    let mut auth_value = HeaderValue::from_str(authorization)?;
    auth_value.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth_value);

    if let Some(accept) = accept {
        headers.insert(ACCEPT, HeaderValue::from_str(accept)?);
    }

    let client = Client::builder()
        .default_headers(headers)
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?;

    Ok(client)
}

/// Append path segments to `base`, keeping any path `base` already has
/// (e.g. `/api/v3`) and percent-encoding each segment.
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| {
            AutoshipError::invalid_config(format!(
                "{base} cannot be used as an API base url"
            ))
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Fail with [`AutoshipError::Upstream`] unless `status` is 2xx. The
/// response body is kept in the error.
pub fn check_status(
    service: &str,
    action: &str,
    status: StatusCode,
    body: String,
) -> Result<String> {
    if status.is_success() {
        return Ok(body);
    }

    Err(AutoshipError::upstream(
        service,
        Some(status.as_u16()),
        action,
        body,
    ))
}

/// Deserialize a successful response body.
pub fn parse_body<T: DeserializeOwned>(
    service: &str,
    action: &str,
    status: StatusCode,
    body: String,
) -> Result<T> {
    match serde_json::from_str(&body) {
        Ok(value) => Ok(value),
        Err(err) => Err(AutoshipError::upstream(
            service,
            Some(status.as_u16()),
            format!("{action}: malformed response: {err}"),
            body,
        )),
    }
}

/// Read the full response, then check its status and decode it.
pub async fn read_json<T: DeserializeOwned>(
    service: &str,
    action: &str,
    response: Response,
) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    let body = check_status(service, action, status, body)?;
    parse_body(service, action, status, body)
}
