//! Shared storage helper functions.
//!
//! Continuation-token encoding used by the key-based backends. A token is the
//! last evaluated key (attribute name to string value), serialized as JSON and
//! base64-encoded so callers treat it as opaque.

use std::collections::BTreeMap;

use base64::prelude::*;

use super::{Result, StorageError};
use crate::pagination::PageToken;

/// Encode a last-evaluated key as an opaque page token.
pub fn encode_key_token(key: &BTreeMap<String, String>) -> Result<PageToken> {
    let json = serde_json::to_vec(key)
        .map_err(|e| StorageError::InvalidPageToken(format!("Failed to encode key: {}", e)))?;
    Ok(PageToken::new(BASE64_URL_SAFE_NO_PAD.encode(json)))
}

/// Decode a page token produced by [`encode_key_token`].
pub fn decode_key_token(token: &PageToken) -> Result<BTreeMap<String, String>> {
    let bytes = BASE64_URL_SAFE_NO_PAD
        .decode(token.as_str())
        .map_err(|e| StorageError::InvalidPageToken(format!("Not base64: {}", e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| StorageError::InvalidPageToken(format!("Not a key map: {}", e)))
}

/// Fetch a required attribute from a decoded key.
pub fn key_attr<'a>(key: &'a BTreeMap<String, String>, name: &str) -> Result<&'a str> {
    key.get(name)
        .map(String::as_str)
        .ok_or_else(|| StorageError::InvalidPageToken(format!("Missing key attribute '{}'", name)))
}
