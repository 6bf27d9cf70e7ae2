//! Response status handling shared by the Google API clients

use reqwest::blocking::Response;
use serde::Deserialize;

use crate::error::RemoteError;

/// Error body of the Sheets and Drive APIs
#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ApiErrorDetail {
    /// `{"error": {"code": 404, "message": "...", "status": "NOT_FOUND"}}`
    Structured { message: String },
    /// OAuth token endpoint: `{"error": "invalid_grant", "error_description": "..."}`
    Code(String),
}

#[derive(Deserialize)]
struct OAuthErrorBody {
    error_description: Option<String>,
}

/// Pass successful responses through, turn the rest into [`RemoteError::Api`]
pub(crate) fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(RemoteError::Api {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Human-readable message out of an error body, falling back to the raw text
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody {
            error: ApiErrorDetail::Structured { message },
        }) => message,
        Ok(ApiErrorBody {
            error: ApiErrorDetail::Code(code),
        }) => match serde_json::from_str::<OAuthErrorBody>(body) {
            Ok(OAuthErrorBody {
                error_description: Some(description),
            }) => format!("{}: {}", code, description),
            _ => code,
        },
        Err(_) => {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "empty response body".to_string()
            } else {
                trimmed.to_string()
            }
        }
    }
}
