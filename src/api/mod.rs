//! API — RPC calls to the Picturesque backend.
//!
//! DESIGN
//! ======
//! Every server method is addressed as `picturesque.{resource}.{method}` and
//! sent through an injected `RpcTransport`. The backend sometimes reports
//! failure in-band (`code`, or `error_message` from the dev server), so every
//! response passes through `check_response` before callers see it.
//!
//! ERROR HANDLING
//! ==============
//! In-band failures become `ApiError::Backend`, are logged to the api event
//! log, and are returned so the surrounding task can retry the whole call.

pub mod auth;
pub mod transport;
pub mod types;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::config::{API_NAME, KEY_PROPERTY_NAME};
use crate::event_log::EventLog;
use crate::photo::PhotoMetadata;

pub use auth::{Joiner, SigninHandler, SigninOutcome, TokenStore};
pub use transport::{HttpRpcTransport, RpcTransport};
pub use types::{AclResponse, ApiError, AuthResult, ListQuery, PhotoPage};

#[derive(Clone)]
pub struct PicturesqueApi {
    transport: Arc<dyn RpcTransport>,
    api_version: String,
    log: EventLog,
}

impl PicturesqueApi {
    #[must_use]
    pub fn new(transport: Arc<dyn RpcTransport>, api_version: impl Into<String>, log: EventLog) -> Self {
        Self { transport, api_version: api_version.into(), log }
    }

    #[must_use]
    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Call `picturesque.{resource}.{method}` with `payload`.
    ///
    /// # Errors
    ///
    /// Transport failures, or [`ApiError::Backend`] when the response carries
    /// `code` or `error_message`.
    pub async fn call(&self, resource: &str, method: &str, payload: Value) -> Result<Value, ApiError> {
        let name = method_name(resource, method);
        tracing::debug!(method = %name, "rpc call");

        let response = self.transport.execute(&name, &self.api_version, payload).await?;
        check_response(response).inspect_err(|e| {
            self.log.error(format!("{name} request failed: {e}"));
        })
    }

    // =========================================================================
    // USERS
    // =========================================================================

    /// `users.join`: create or verify the caller's account.
    ///
    /// # Errors
    ///
    /// See [`PicturesqueApi::call`].
    pub async fn join(&self) -> Result<Value, ApiError> {
        self.call("users", "join", json!({})).await
    }

    // =========================================================================
    // PHOTOS
    // =========================================================================

    /// `photo.create`: upload a captured photo; the response carries the
    /// server key and `updated` timestamp.
    ///
    /// # Errors
    ///
    /// See [`PicturesqueApi::call`]; [`ApiError::ApiParse`] if the response is
    /// not a photo record.
    pub async fn create_photo(&self, photo: &PhotoMetadata) -> Result<PhotoMetadata, ApiError> {
        let response = self.call("photo", "create", photo.create_payload()).await?;
        decode(response)
    }

    /// `photo.read`: fetch one photo by key.
    ///
    /// # Errors
    ///
    /// See [`PicturesqueApi::create_photo`].
    pub async fn read_photo(&self, key: &str) -> Result<PhotoMetadata, ApiError> {
        let response = self.call("photo", "read", json!({ KEY_PROPERTY_NAME: key })).await?;
        decode(response)
    }

    /// `photo.delete`: remove an owned photo.
    ///
    /// # Errors
    ///
    /// See [`PicturesqueApi::call`].
    pub async fn delete_photo(&self, key: &str) -> Result<(), ApiError> {
        self.call("photo", "delete", json!({ KEY_PROPERTY_NAME: key })).await?;
        Ok(())
    }

    /// `photo.patch`: update title and/or description of an owned photo.
    ///
    /// # Errors
    ///
    /// See [`PicturesqueApi::create_photo`].
    pub async fn patch_photo(
        &self,
        key: &str,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<PhotoMetadata, ApiError> {
        let mut payload = json!({ KEY_PROPERTY_NAME: key });
        if let Some(title) = title {
            payload["title"] = json!(title);
        }
        if let Some(description) = description {
            payload["description"] = json!(description);
        }
        let response = self.call("photo", "patch", payload).await?;
        decode(response)
    }

    /// `photo.list`: one page of photos matching `query`.
    ///
    /// # Errors
    ///
    /// See [`PicturesqueApi::call`]; [`ApiError::ApiParse`] if the query
    /// cannot be encoded or the response is not a photo page.
    pub async fn list_photos(&self, query: &ListQuery) -> Result<PhotoPage, ApiError> {
        let payload = serde_json::to_value(query).map_err(|e| ApiError::ApiParse(e.to_string()))?;
        let response = self.call("photo", "list", payload).await?;
        decode(response)
    }

    // =========================================================================
    // ACL
    // =========================================================================

    /// `acl.addUsers`: share a photo with other users.
    ///
    /// # Errors
    ///
    /// See [`PicturesqueApi::call`]; [`ApiError::ApiParse`] if the response
    /// is not an ACL record.
    pub async fn add_acl_users(&self, key: &str, user_ids: &[String]) -> Result<AclResponse, ApiError> {
        let response = self
            .call("acl", "addUsers", json!({ KEY_PROPERTY_NAME: key, "aclUserIds": user_ids }))
            .await?;
        decode(response)
    }
}

// =============================================================================
// RESPONSE HANDLING
// =============================================================================

#[must_use]
pub fn method_name(resource: &str, method: &str) -> String {
    format!("{API_NAME}.{resource}.{method}")
}

/// Pass through a successful response; reject one carrying a non-empty
/// `code` or `error_message`. Null, `false`, `0` and `""` do not count.
///
/// # Errors
///
/// Returns [`ApiError::Backend`] for in-band failures.
pub fn check_response(response: Value) -> Result<Value, ApiError> {
    let code = response.get("code").filter(|c| is_set(c));
    let error_message = response.get("error_message").filter(|m| is_set(m));
    if code.is_none() && error_message.is_none() {
        return Ok(response);
    }

    let code = code.and_then(|c| c.as_i64().or_else(|| c.as_str().and_then(|s| s.parse().ok())));
    let message = error_message
        .or_else(|| response.get("message"))
        .and_then(Value::as_str)
        .map_or_else(|| response.to_string(), str::to_owned);
    Err(ApiError::Backend { code, message })
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n.abs() > 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn decode<T: DeserializeOwned>(response: Value) -> Result<T, ApiError> {
    serde_json::from_value(response).map_err(|e| ApiError::ApiParse(e.to_string()))
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
