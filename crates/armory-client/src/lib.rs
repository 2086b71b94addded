// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use armory_app::{
    FailureKind, FormPayload, Listing, LoginInput, PageTarget, PendingRequest, ResponseOutcome,
    interpret_response, rows_from_json,
};
use log::{debug, info, warn};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const SESSION_COOKIE: &str = "access_token";

/// Failures below the HTTP status line: the request never got an answer, or
/// the answer could not be read.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("cannot reach {base_url} -- check server.base_url and that the backend is running ({source})")]
    Connect {
        base_url: String,
        source: reqwest::Error,
    },
    #[error("read response from {endpoint}: {source}")]
    Body {
        endpoint: String,
        source: reqwest::Error,
    },
    #[error("{endpoint} answered with a body that is not JSON: {source}")]
    Decode {
        endpoint: String,
        source: serde_json::Error,
    },
}

impl TransportError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Connect { .. } | Self::Body { .. } => FailureKind::NetworkFailure,
            Self::Decode { .. } => FailureKind::ParseFailure,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    data_field: String,
    timeout: Duration,
    http: HttpClient,
    jar: Arc<Jar>,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration, data_field: &str) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("server.base_url must not be empty");
        }
        let base_url = Url::parse(trimmed).with_context(|| {
            format!("server.base_url {trimmed:?} is not a valid URL -- fix it and retry")
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "server.base_url must use http or https, got {:?} -- fix it and retry",
                base_url.scheme()
            );
        }
        if data_field.trim().is_empty() {
            bail!("server.data_field must not be empty");
        }

        let jar = Arc::new(Jar::default());
        let http = HttpClient::builder()
            .timeout(timeout)
            .cookie_provider(Arc::clone(&jar))
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            data_field: data_field.trim().to_owned(),
            timeout,
            http,
            jar,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether the cookie store holds a session cookie for the backend.
    pub fn has_session(&self) -> bool {
        self.jar
            .cookies(&self.base_url)
            .and_then(|header| header.to_str().map(str::to_owned).ok())
            .is_some_and(|cookies| {
                cookies
                    .split(';')
                    .any(|cookie| cookie.trim().starts_with(&format!("{SESSION_COOKIE}=")))
            })
    }

    /// Loads the rows of a page. Rows are always decoded fresh; nothing is
    /// cached between loads.
    pub fn fetch_rows(&self, target: &PageTarget) -> Result<Listing> {
        let endpoint = target.endpoint()?;
        debug!("GET {endpoint}");
        let url = self.url(&endpoint);
        let response = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|source| self.connect_error(source))?;

        if let Some(path) = self.redirected_path(&response, &url) {
            info!("GET {endpoint} redirected to {path}");
            return Ok(Listing::Redirect(path));
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!("GET {endpoint} failed with {status}");
            return Err(clean_error_response(status, &body));
        }

        let body = read_json(response, &endpoint)?;
        let rows = rows_from_json(&body, &self.data_field, target.page.spec().identity)
            .with_context(|| format!("decode {endpoint}"))?;
        debug!("GET {endpoint} loaded {} rows", rows.len());
        Ok(Listing::Rows(rows))
    }

    /// Sends one action and interprets the answer. Every failure, including
    /// an unreachable server, comes back as an outcome for the alert region.
    pub fn submit(&self, request: &PendingRequest) -> ResponseOutcome {
        let endpoint = request.action.endpoint();
        info!("POST {endpoint} ({}: {})", request.action.label(), request.summary);
        let url = self.url(endpoint);
        let response = match self
            .http
            .post(&url)
            .header(ACCEPT, "application/json")
            .json(&request.body)
            .send()
        {
            Ok(response) => response,
            Err(source) => return transport_outcome(endpoint, &self.connect_error(source)),
        };

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or("Unknown Status");
        let redirect = self.redirected_path(&response, &url);
        let text = match response.text() {
            Ok(text) => text,
            Err(source) => {
                let error = TransportError::Body {
                    endpoint: endpoint.to_owned(),
                    source,
                };
                return transport_outcome(endpoint, &error);
            }
        };

        let body = match serde_json::from_str::<Value>(&text) {
            Ok(body) => Some(body),
            Err(source) => {
                if let Some(path) = redirect {
                    info!("POST {endpoint} redirected to {path}");
                    return ResponseOutcome::Redirect(path);
                }
                let error = TransportError::Decode {
                    endpoint: endpoint.to_owned(),
                    source,
                };
                warn!("POST {endpoint} answered {status}; {error}");
                None
            }
        };

        let outcome = interpret_response(
            status.as_u16(),
            status_text,
            body.as_ref(),
            request.action.success_message(),
        );
        log_outcome(endpoint, status, &outcome);
        outcome
    }

    /// Posts credentials to `/token`. On success the server sets the
    /// session cookie and answers with the landing page redirect.
    pub fn login(&self, personal_id: i64, password: &str) -> Result<ResponseOutcome> {
        let request = FormPayload::Login(LoginInput {
            personal_id,
            password: password.to_owned(),
        })
        .into_request()?;
        let outcome = self.submit(&request);
        if matches!(outcome, ResponseOutcome::Redirect(_)) && !self.has_session() {
            warn!("login redirected without setting {SESSION_COOKIE}");
        }
        Ok(outcome)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url())
    }

    /// Final path, relative to the base URL, when the client followed a
    /// redirect away from `requested`.
    fn redirected_path(&self, response: &Response, requested: &str) -> Option<String> {
        let requested = Url::parse(requested).ok()?;
        let landed = response.url().path();
        if landed == requested.path() {
            return None;
        }
        let prefix = self.base_url.path().trim_end_matches('/');
        let relative = landed.strip_prefix(prefix).unwrap_or(landed);
        Some(if relative.is_empty() { "/".to_owned() } else { relative.to_owned() })
    }

    fn connect_error(&self, source: reqwest::Error) -> TransportError {
        TransportError::Connect {
            base_url: self.base_url().to_owned(),
            source,
        }
    }
}

fn read_json(response: Response, endpoint: &str) -> Result<Value, TransportError> {
    let text = response.text().map_err(|source| TransportError::Body {
        endpoint: endpoint.to_owned(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| TransportError::Decode {
        endpoint: endpoint.to_owned(),
        source,
    })
}

fn transport_outcome(endpoint: &str, error: &TransportError) -> ResponseOutcome {
    warn!("POST {endpoint} failed: {error}");
    ResponseOutcome::transport_failure(error.failure_kind(), error.to_string())
}

fn log_outcome(endpoint: &str, status: StatusCode, outcome: &ResponseOutcome) {
    match outcome {
        ResponseOutcome::Redirect(url) => info!("POST {endpoint} -> {status}, redirect to {url}"),
        ResponseOutcome::Success(message) => info!("POST {endpoint} -> {status}: {message}"),
        ResponseOutcome::FieldError(detail) => warn!("POST {endpoint} -> {status}: {detail}"),
        ResponseOutcome::ValidationError(message) => {
            warn!("POST {endpoint} -> {status}: validation failed: {message}")
        }
        ResponseOutcome::UnexpectedError(status_text) => {
            let kind = FailureKind::for_status(status.as_u16())
                .map_or("unexpected answer", FailureKind::label);
            warn!("POST {endpoint} -> {status} ({kind}): {status_text}")
        }
    }
}

#[derive(Debug, Deserialize)]
struct DetailEnvelope {
    detail: Option<Value>,
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<DetailEnvelope>(body)
        && let Some(detail) = parsed.detail
    {
        let message = match &detail {
            Value::String(message) => Some(message.as_str()),
            Value::Array(errors) => errors
                .first()
                .and_then(|error| error.get("msg"))
                .and_then(Value::as_str),
            _ => None,
        };
        if let Some(message) = message
            && !message.is_empty()
        {
            return anyhow!("server error ({}): {}", status.as_u16(), message);
        }
    }

    if body.len() < 100 && !body.contains('{') && !body.contains('<') {
        return anyhow!("server error ({}): {}", status.as_u16(), body);
    }

    anyhow!("server returned {}", status.as_u16())
}

#[cfg(test)]
mod tests {
    use super::{Client, TransportError, clean_error_response};
    use armory_app::FailureKind;
    use reqwest::StatusCode;
    use std::time::Duration;

    #[test]
    fn client_rejects_empty_base_url() {
        let error = Client::new("  ", Duration::from_secs(1), "data")
            .expect_err("empty base url should fail");
        assert!(error.to_string().contains("server.base_url"));
    }

    #[test]
    fn client_rejects_non_http_base_url() {
        let error = Client::new("ftp://armory", Duration::from_secs(1), "data")
            .expect_err("ftp should fail");
        assert!(error.to_string().contains("http or https"));
    }

    #[test]
    fn client_rejects_empty_data_field() {
        assert!(Client::new("http://localhost:8000", Duration::from_secs(1), "").is_err());
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = Client::new("http://localhost:8000/", Duration::from_secs(2), "data")
            .expect("client should build");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.timeout(), Duration::from_secs(2));
        assert!(!client.has_session());
    }

    #[test]
    fn clean_error_response_uses_string_detail() {
        let error = clean_error_response(
            StatusCode::UNAUTHORIZED,
            r#"{"detail":"Not authenticated"}"#,
        );
        assert_eq!(error.to_string(), "server error (401): Not authenticated");
    }

    #[test]
    fn clean_error_response_uses_first_validation_message() {
        let error = clean_error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail":[{"msg":"field required"},{"msg":"other"}]}"#,
        );
        assert_eq!(error.to_string(), "server error (422): field required");
    }

    #[test]
    fn clean_error_response_falls_back_to_status() {
        let html = "<html><body>Internal Server Error</body></html>";
        let error = clean_error_response(StatusCode::INTERNAL_SERVER_ERROR, html);
        assert_eq!(error.to_string(), "server returned 500");

        let error = clean_error_response(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(error.to_string(), "server error (502): upstream down");
    }

    #[test]
    fn decode_errors_are_parse_failures() {
        let source = serde_json::from_str::<serde_json::Value>("<html>")
            .expect_err("html is not json");
        let error = TransportError::Decode {
            endpoint: "/collections-data/inventory".to_owned(),
            source,
        };
        assert_eq!(error.failure_kind(), FailureKind::ParseFailure);
        assert!(error.to_string().contains("not JSON"));
    }
}
