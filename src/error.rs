use console::Emoji;
use reqwest::{Response, StatusCode};
use serde::Deserialize;

static NO_ENTRY: Emoji = Emoji("⛔ ", "");
static WARNING: Emoji = Emoji("⚠️  ", "");

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{}{operation} failed ({status}): {body}", NO_ENTRY)]
    Http {
        operation: String,
        status: StatusCode,
        body: String,
    },

    #[error("{}{} not found", WARNING, .0)]
    NotFound(String),

    #[error("missing field `{field}` in {resource}")]
    MissingField { resource: String, field: String },

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("websocket error: {0}")]
    Socket(String),

    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    pub fn missing(resource: impl Into<String>, field: impl Into<String>) -> Self {
        ApiError::MissingField {
            resource: resource.into(),
            field: field.into(),
        }
    }
}

/// Error body returned by the API on failed requests.
#[derive(Deserialize)]
struct ErrorResponse {
    code: Option<String>,
    message: Option<String>,
}

/// Pass successful responses through and turn everything else into an
/// [`ApiError`], preferring the API's own error message when present.
pub async fn check_response(response: Response, operation: &str) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(response.url().path().to_string()));
    }

    let error_body = response.text().await.unwrap_or_default();
    let body = match serde_json::from_str::<ErrorResponse>(&error_body) {
        Ok(ErrorResponse {
            message: Some(message),
            code,
        }) => match code {
            Some(code) => format!("{code}: {message}"),
            None => message,
        },
        _ => error_body,
    };

    Err(ApiError::Http {
        operation: operation.to_string(),
        status,
        body,
    })
}
