// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::Value;
use time::OffsetDateTime;

pub const GENERIC_SUCCESS: &str = "request completed";
pub const GENERIC_FAILURE: &str = "An unexpected error occurred.";

/// What the UI does with one backend response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    Redirect(String),
    Success(String),
    FieldError(String),
    ValidationError(String),
    UnexpectedError(String),
}

/// Failure taxonomy at the UI boundary. None of these are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NetworkFailure,
    ParseFailure,
    ClientError,
    ValidationError,
    ServerError,
}

impl FailureKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NetworkFailure => "network failure",
            Self::ParseFailure => "parse failure",
            Self::ClientError => "client error",
            Self::ValidationError => "validation error",
            Self::ServerError => "server error",
        }
    }

    pub fn for_status(status: u16) -> Option<Self> {
        match status {
            200..=299 => None,
            400 | 401 => Some(Self::ClientError),
            422 => Some(Self::ValidationError),
            _ => Some(Self::ServerError),
        }
    }
}

impl ResponseOutcome {
    /// Outcome for a request that never produced a usable response.
    pub fn transport_failure(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self::UnexpectedError(format!("{}: {}", kind.label(), detail.into()))
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::Redirect(_) | Self::Success(_))
    }

    /// Banner text and tone, or `None` for a redirect.
    pub fn alert(&self) -> Option<(AlertTone, String)> {
        match self {
            Self::Redirect(_) => None,
            Self::Success(message) => Some((AlertTone::Success, message.clone())),
            Self::FieldError(message) | Self::ValidationError(message) => {
                Some((AlertTone::Failure, message.clone()))
            }
            Self::UnexpectedError(_) => Some((AlertTone::Failure, GENERIC_FAILURE.to_owned())),
        }
    }
}

/// Maps a status code and its decoded body to an outcome. `body` is `None`
/// when the body was not valid JSON.
///
/// 2xx redirects when `redirect_url` is present, else succeeds with
/// `message` (or `success_fallback`, or a generic text). 400 and 401 surface
/// `detail` as a string. 422 surfaces only `detail[0].msg`. Anything else,
/// including a body that does not match its status's shape, is unexpected.
pub fn interpret_response(
    status: u16,
    status_text: &str,
    body: Option<&Value>,
    success_fallback: Option<&str>,
) -> ResponseOutcome {
    let unexpected = || ResponseOutcome::UnexpectedError(status_text.to_owned());
    let Some(body) = body else {
        return unexpected();
    };

    match status {
        200..=299 => {
            if let Some(url) = body.get("redirect_url").and_then(Value::as_str) {
                return ResponseOutcome::Redirect(url.to_owned());
            }
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .or(success_fallback)
                .unwrap_or(GENERIC_SUCCESS);
            ResponseOutcome::Success(message.to_owned())
        }
        400 | 401 => match body.get("detail").and_then(Value::as_str) {
            Some(detail) => ResponseOutcome::FieldError(detail.to_owned()),
            None => unexpected(),
        },
        422 => match body
            .get("detail")
            .and_then(Value::as_array)
            .and_then(|errors| errors.first())
            .and_then(|first| first.get("msg"))
            .and_then(Value::as_str)
        {
            Some(message) => ResponseOutcome::ValidationError(message.to_owned()),
            None => unexpected(),
        },
        _ => unexpected(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertTone {
    Success,
    Failure,
}

/// The page's single banner. A new message replaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRegion {
    pub visible: bool,
    pub text: String,
    pub tone: AlertTone,
    pub shown_at: Option<OffsetDateTime>,
}

impl Default for AlertRegion {
    fn default() -> Self {
        Self {
            visible: false,
            text: String::new(),
            tone: AlertTone::Success,
            shown_at: None,
        }
    }
}

impl AlertRegion {
    pub fn show(&mut self, tone: AlertTone, text: impl Into<String>, now: OffsetDateTime) {
        self.visible = true;
        self.text = text.into();
        self.tone = tone;
        self.shown_at = Some(now);
    }

    /// Shows the banner for `outcome`. Returns false for redirects, which
    /// leave the banner alone.
    pub fn present(&mut self, outcome: &ResponseOutcome, now: OffsetDateTime) -> bool {
        match outcome.alert() {
            Some((tone, text)) => {
                self.show(tone, text, now);
                true
            }
            None => false,
        }
    }

    pub fn dismiss(&mut self) {
        self.visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AlertRegion, AlertTone, FailureKind, GENERIC_FAILURE, GENERIC_SUCCESS, ResponseOutcome,
        interpret_response,
    };
    use serde_json::json;
    use time::OffsetDateTime;

    #[test]
    fn ok_with_redirect_url_redirects() {
        let body = json!({"redirect_url": "/master/inventory"});
        assert_eq!(
            interpret_response(200, "OK", Some(&body), None),
            ResponseOutcome::Redirect("/master/inventory".to_owned())
        );
    }

    #[test]
    fn ok_without_redirect_uses_message_then_fallback_then_generic() {
        let with_message = json!({"message": "kit created"});
        assert_eq!(
            interpret_response(201, "Created", Some(&with_message), Some("ignored")),
            ResponseOutcome::Success("kit created".to_owned())
        );

        let empty = json!({});
        assert_eq!(
            interpret_response(200, "OK", Some(&empty), Some("created client user successfully")),
            ResponseOutcome::Success("created client user successfully".to_owned())
        );
        assert_eq!(
            interpret_response(200, "OK", Some(&empty), None),
            ResponseOutcome::Success(GENERIC_SUCCESS.to_owned())
        );
    }

    #[test]
    fn bad_request_and_unauthorized_surface_detail_string() {
        let body = json!({"detail": "palga already exists"});
        assert_eq!(
            interpret_response(400, "Bad Request", Some(&body), None),
            ResponseOutcome::FieldError("palga already exists".to_owned())
        );
        let body = json!({"detail": "Incorrect username or password"});
        assert_eq!(
            interpret_response(401, "Unauthorized", Some(&body), None),
            ResponseOutcome::FieldError("Incorrect username or password".to_owned())
        );
    }

    #[test]
    fn unprocessable_entity_surfaces_only_first_message() {
        let body = json!({"detail": [{"msg": "field required", "loc": ["body"]}, {"msg": "ignored"}]});
        assert_eq!(
            interpret_response(422, "Unprocessable Entity", Some(&body), None),
            ResponseOutcome::ValidationError("field required".to_owned())
        );
    }

    #[test]
    fn other_statuses_are_unexpected() {
        let body = json!({"detail": "boom"});
        assert_eq!(
            interpret_response(500, "Internal Server Error", Some(&body), None),
            ResponseOutcome::UnexpectedError("Internal Server Error".to_owned())
        );
        assert_eq!(
            interpret_response(403, "Forbidden", Some(&body), None),
            ResponseOutcome::UnexpectedError("Forbidden".to_owned())
        );
    }

    #[test]
    fn unparseable_body_is_unexpected_even_on_success() {
        assert_eq!(
            interpret_response(200, "OK", None, None),
            ResponseOutcome::UnexpectedError("OK".to_owned())
        );
    }

    #[test]
    fn mismatched_error_shapes_are_unexpected() {
        let array_detail = json!({"detail": [{"msg": "x"}]});
        assert_eq!(
            interpret_response(400, "Bad Request", Some(&array_detail), None),
            ResponseOutcome::UnexpectedError("Bad Request".to_owned())
        );
        let string_detail = json!({"detail": "x"});
        assert_eq!(
            interpret_response(422, "Unprocessable Entity", Some(&string_detail), None),
            ResponseOutcome::UnexpectedError("Unprocessable Entity".to_owned())
        );
        let empty_list = json!({"detail": []});
        assert!(matches!(
            interpret_response(422, "Unprocessable Entity", Some(&empty_list), None),
            ResponseOutcome::UnexpectedError(_)
        ));
    }

    #[test]
    fn failure_kind_follows_status() {
        assert_eq!(FailureKind::for_status(204), None);
        assert_eq!(FailureKind::for_status(401), Some(FailureKind::ClientError));
        assert_eq!(FailureKind::for_status(422), Some(FailureKind::ValidationError));
        assert_eq!(FailureKind::for_status(502), Some(FailureKind::ServerError));
    }

    #[test]
    fn alert_shows_generic_text_for_unexpected_errors() {
        let mut alert = AlertRegion::default();
        let shown = alert.present(
            &ResponseOutcome::transport_failure(FailureKind::NetworkFailure, "connection refused"),
            OffsetDateTime::UNIX_EPOCH,
        );
        assert!(shown);
        assert!(alert.visible);
        assert_eq!(alert.tone, AlertTone::Failure);
        assert_eq!(alert.text, GENERIC_FAILURE);
    }

    #[test]
    fn new_outcome_overwrites_and_dismiss_hides() {
        let mut alert = AlertRegion::default();
        alert.present(
            &ResponseOutcome::FieldError("nope".to_owned()),
            OffsetDateTime::UNIX_EPOCH,
        );
        alert.present(
            &ResponseOutcome::Success("saved".to_owned()),
            OffsetDateTime::UNIX_EPOCH,
        );
        assert_eq!(alert.text, "saved");
        assert_eq!(alert.tone, AlertTone::Success);

        alert.dismiss();
        assert!(!alert.visible);
    }

    #[test]
    fn redirect_leaves_alert_untouched() {
        let mut alert = AlertRegion::default();
        alert.present(
            &ResponseOutcome::FieldError("keep me".to_owned()),
            OffsetDateTime::UNIX_EPOCH,
        );
        let shown = alert.present(
            &ResponseOutcome::Redirect("/master/signings".to_owned()),
            OffsetDateTime::UNIX_EPOCH,
        );
        assert!(!shown);
        assert_eq!(alert.text, "keep me");
    }
}
