use actix_web::HttpResponse;
use anyhow::{Context, Result, ensure};
use log::error;
use reqwest::{Client, Response, StatusCode, Url};

/// Create the HTTP client used to talk to a status service
///
/// No request timeout is set: a hung request only delays the tick that
/// issued it.
pub fn status_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to create status HTTP client")
}

/// Resolve `path` against the base url of a status service
///
/// Paths are always taken relative to the host root, so a base url with
/// or without trailing slash behaves the same.
pub fn build_url(base_url: &Url, path: &str) -> Result<Url> {
    let normalized_path = path.trim_start_matches('/');
    base_url
        .join(&format!("/{normalized_path}"))
        .with_context(|| format!("failed to build url for {path}"))
}

/// Handle HTTP response by checking status and extracting body
///
/// Only `200 OK` counts as success; every other status is an error
/// carrying the status and body.
///
/// # Arguments
/// * `res` - The HTTP response to handle
/// * `context_msg` - Context message describing the request (e.g., "GET /api/v1/poll")
pub async fn handle_http_response(res: Response, context_msg: &str) -> Result<String> {
    let status = res.status();
    let body = res.text().await.context("failed to read response body")?;

    ensure!(
        status == StatusCode::OK,
        "{context_msg} failed with status {status} and body: {body}"
    );

    Ok(body)
}

/// Turn a service result into a JSON response, or a 500 carrying the error
pub fn json_or_internal_error<T>(result: Result<T>, operation: &str) -> HttpResponse
where
    T: serde::Serialize,
{
    match result {
        Ok(data) => HttpResponse::Ok().json(data),
        Err(e) => {
            error!("{operation} failed: {e:#}");
            HttpResponse::InternalServerError().body(e.to_string())
        }
    }
}
