//! Photo metadata — the record that moves through save, create and rename.
//!
//! DESIGN
//! ======
//! The record is loosely typed on the wire: the server adds fields the client
//! does not model (`isMine`, `acl`, ...). Known fields are typed; everything
//! else round-trips through `extra` so a save never drops server data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoMetadata {
    /// Temporary `hash-<n>` key until the server assigns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "base64Photo", skip_serializing_if = "Option::is_none")]
    pub base64_photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_uri: Option<String>,
    /// Server `updated` timestamp, ISO-8601 without a trailing `Z`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// `true` until the server has confirmed the create.
    #[serde(default)]
    pub local_only: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PhotoMetadata {
    /// A freshly captured photo, not yet saved anywhere.
    #[must_use]
    pub fn captured(title: &str, base64_photo: &str, mime_type: &str, description: Option<&str>) -> Self {
        Self {
            title: Some(title.to_owned()),
            base64_photo: Some(base64_photo.to_owned()),
            mime_type: Some(mime_type.to_owned()),
            description: description.filter(|d| !d.is_empty()).map(str::to_owned),
            ..Self::default()
        }
    }

    /// Payload for `photo.create`: only the fields the server accepts.
    #[must_use]
    pub fn create_payload(&self) -> Value {
        let mut payload = Map::new();
        insert_opt(&mut payload, config::TITLE_PROPERTY_NAME, self.title.as_ref());
        insert_opt(&mut payload, config::BASE64_PROPERTY_NAME, self.base64_photo.as_ref());
        insert_opt(&mut payload, config::MIMETYPE_PROPERTY_NAME, self.mime_type.as_ref());
        insert_opt(&mut payload, config::DESCRIPTION_PROPERTY_NAME, self.description.as_ref());
        Value::Object(payload)
    }

    /// Serialize for the key-value store.
    ///
    /// # Errors
    ///
    /// Returns an error if an `extra` value cannot be serialized.
    pub fn to_record(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Parse a stored or remote record.
    ///
    /// # Errors
    ///
    /// Returns an error if a typed field has the wrong JSON type.
    pub fn from_record(record: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(record)
    }
}

fn insert_opt(payload: &mut Map<String, Value>, name: &str, value: Option<&String>) {
    if let Some(value) = value {
        payload.insert(name.to_owned(), Value::String(value.clone()));
    }
}

#[cfg(test)]
#[path = "photo_test.rs"]
mod tests;
