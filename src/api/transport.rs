//! RPC transport — trait seam plus the reqwest implementation.
//!
//! DESIGN
//! ======
//! `RpcTransport::execute` returns the raw response object: the envelope's
//! `result` on success, or the envelope's `error` normalized to
//! `{code, error_message}`. Detecting a failed call is left to
//! `PicturesqueApi::check_response`, which treats in-band error fields the
//! same way whichever transport produced them.
//!
//! Envelope parsing is a pure function for testability.

use std::time::Duration;

use rand::Rng;
use serde_json::{Map, Value, json};

use crate::config::AppConfig;

use super::auth::TokenStore;
use super::types::ApiError;

/// Issues one RPC call and returns the unwrapped response object.
#[async_trait::async_trait]
pub trait RpcTransport: Send + Sync {
    async fn execute(&self, method: &str, api_version: &str, params: Value) -> Result<Value, ApiError>;
}

// =============================================================================
// HTTP TRANSPORT
// =============================================================================

pub struct HttpRpcTransport {
    http: reqwest::Client,
    endpoint: String,
    tokens: TokenStore,
}

impl HttpRpcTransport {
    /// Build a transport posting to `{api_root}/rpc`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the reqwest client cannot be
    /// constructed.
    pub fn new(config: &AppConfig, tokens: TokenStore) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, endpoint: rpc_endpoint(&config.api_root), tokens })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl RpcTransport for HttpRpcTransport {
    async fn execute(&self, method: &str, api_version: &str, params: Value) -> Result<Value, ApiError> {
        let body = request_body(&request_id(), method, api_version, params);

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(token) = self.tokens.get() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| ApiError::Transport(e.to_string()))?;

        tracing::debug!(%method, status, "rpc response");
        if (200..300).contains(&status) {
            return parse_envelope(&text);
        }

        // Error envelopes ride on 4xx/5xx too; surface them in-band.
        match parse_envelope(&text) {
            Ok(value) if is_error_object(&value) => Ok(value),
            _ => Err(ApiError::ApiResponse { status, body: text }),
        }
    }
}

// =============================================================================
// WIRE FORMAT
// =============================================================================

#[must_use]
pub fn rpc_endpoint(api_root: &str) -> String {
    format!("{}/rpc", api_root.trim_end_matches('/'))
}

fn request_id() -> String {
    let bytes: [u8; 8] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// JSON-RPC request body for a single call.
#[must_use]
pub fn request_body(id: &str, method: &str, api_version: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "apiVersion": api_version,
        "params": params,
    })
}

/// Unwrap a response envelope.
///
/// `result` is returned as-is; an `error` object becomes
/// `{code, error_message, data?}`. A body with neither is returned whole.
///
/// # Errors
///
/// Returns [`ApiError::ApiParse`] if the body is not a JSON object.
pub fn parse_envelope(text: &str) -> Result<Value, ApiError> {
    let value: Value = serde_json::from_str(text).map_err(|e| ApiError::ApiParse(e.to_string()))?;
    let Value::Object(mut envelope) = value else {
        return Err(ApiError::ApiParse("response is not a JSON object".into()));
    };

    if let Some(error) = envelope.remove("error") {
        return Ok(normalize_error(error));
    }
    if let Some(result) = envelope.remove("result") {
        return Ok(result);
    }
    Ok(Value::Object(envelope))
}

fn normalize_error(error: Value) -> Value {
    let mut normalized = Map::new();
    match error {
        Value::Object(mut fields) => {
            normalized.insert("code".into(), fields.remove("code").unwrap_or(Value::Null));
            let message = fields.remove("message").unwrap_or_else(|| Value::String("unknown error".into()));
            normalized.insert("error_message".into(), message);
            if let Some(data) = fields.remove("data") {
                normalized.insert("data".into(), data);
            }
        }
        other => {
            normalized.insert("error_message".into(), Value::String(other.to_string()));
        }
    }
    Value::Object(normalized)
}

fn is_error_object(value: &Value) -> bool {
    value.get("code").is_some_and(|c| !c.is_null()) || value.get("error_message").is_some()
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
