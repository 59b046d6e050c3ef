//! API types — errors, auth results and list pages.

use serde::{Deserialize, Serialize};

use crate::photo::PhotoMetadata;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by RPC calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request could not be sent or its body read.
    #[error("transport failed: {0}")]
    Transport(String),

    /// Non-success HTTP status without an RPC error envelope.
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The backend answered with `code` and/or `error_message`.
    #[error("backend error (code {code:?}): {message}")]
    Backend { code: Option<i64>, message: String },
}

impl crate::error::ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "E_API_TRANSPORT",
            Self::ApiResponse { .. } => "E_API_RESPONSE",
            Self::ApiParse(_) => "E_API_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Backend { .. } => "E_API_BACKEND",
        }
    }

    fn retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Backend { .. } | Self::ApiResponse { status: 429 | 500..=599, .. }
        )
    }
}

// =============================================================================
// AUTH
// =============================================================================

/// Result delivered by the sign-in provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthResult {
    #[must_use]
    pub fn token(token: impl Into<String>) -> Self {
        Self { access_token: Some(token.into()), error: None }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self { access_token: None, error: Some(error.into()) }
    }
}

// =============================================================================
// PHOTO LIST
// =============================================================================

/// Query fields accepted by `photo.list`. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_googleplus_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// One page of `photo.list` results.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoPage {
    #[serde(default)]
    pub items: Vec<PhotoMetadata>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Response of `acl.addUsers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AclResponse {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub acl: Vec<String>,
}
