//! API error taxonomy and response status mapping

use std::collections::BTreeMap;
use std::fmt;

use super::transport::ApiResponse;

/// Per-field validation messages from a 400 response
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Parse a `{"field": ["msg", ...]}` or `{"field": "msg"}` body.
    pub fn from_body(body: &serde_json::Value) -> Option<Self> {
        let obj = body.as_object()?;
        if obj.contains_key("detail") {
            return None;
        }

        let mut fields = BTreeMap::new();
        for (field, value) in obj {
            let messages: Vec<String> = match value {
                serde_json::Value::String(s) => vec![s.clone()],
                serde_json::Value::Array(items) => items
                    .iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect(),
                _ => continue,
            };
            if !messages.is_empty() {
                fields.insert(field.clone(), messages);
            }
        }

        (!fields.is_empty()).then_some(Self(fields))
    }

    /// One "field: message" line per message.
    pub fn messages(&self) -> Vec<String> {
        self.0
            .iter()
            .flat_map(|(field, msgs)| msgs.iter().map(move |m| format!("{}: {}", field, m)))
            .collect()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join("; "))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("401 Unauthorized for {path}")]
    Unauthorized { path: String, detail: Option<String> },

    #[error("validation failed for {path}: {errors}")]
    Validation { path: String, errors: FieldErrors },

    #[error("HTTP {status} for {path}: {body}")]
    Http {
        status: u16,
        path: String,
        /// `detail` from a JSON error body
        detail: Option<String>,
        /// Raw body text, for logs only
        body: String,
    },

    #[error("failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("not logged in")]
    NoSession,

    #[error("failed to persist session tokens: {0}")]
    Storage(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Text to show the user: server detail, field errors, or `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Http {
                detail: Some(detail),
                ..
            }
            | ApiError::Unauthorized {
                detail: Some(detail),
                ..
            } => detail.clone(),
            ApiError::Validation { errors, .. } => errors.to_string(),
            _ => fallback.to_string(),
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Storage(format!("{:#}", e))
    }
}

fn detail_of(body: &serde_json::Value) -> Option<String> {
    body.get("detail")
        .and_then(|d| d.as_str())
        .map(String::from)
}

/// Check HTTP response status code and return a clear error on failure.
pub fn check_response(resp: ApiResponse, path: &str) -> Result<ApiResponse, ApiError> {
    if resp.is_success() {
        return Ok(resp);
    }

    let body: Option<serde_json::Value> = serde_json::from_str(&resp.body).ok();

    if resp.status == 401 {
        return Err(ApiError::Unauthorized {
            path: path.to_string(),
            detail: body.as_ref().and_then(detail_of),
        });
    }

    if resp.status == 400 {
        if let Some(errors) = body.as_ref().and_then(FieldErrors::from_body) {
            return Err(ApiError::Validation {
                path: path.to_string(),
                errors,
            });
        }
    }

    Err(ApiError::Http {
        status: resp.status,
        path: path.to_string(),
        detail: body.as_ref().and_then(detail_of),
        body: resp.body.trim().to_string(),
    })
}
