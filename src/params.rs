//! Path parameter decoding.
//!
//! Alarm names, regions, resource ARNs and states arrive percent-encoded
//! (ARNs contain `:` and `/`) and are decoded before they reach the registry.

/// Invalid percent-encoding in a path parameter.
#[derive(Debug, thiserror::Error)]
#[error("Invalid path parameter '{raw}': {reason}")]
pub struct ParamError {
    pub raw: String,
    pub reason: String,
}

/// Percent-decode one path parameter.
pub fn decode(raw: &str) -> Result<String, ParamError> {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| ParamError {
            raw: raw.to_string(),
            reason: e.to_string(),
        })
}

/// Percent-decode a list of parameters, failing on the first bad one.
pub fn decode_all<S: AsRef<str>>(raw: &[S]) -> Result<Vec<String>, ParamError> {
    raw.iter().map(|s| decode(s.as_ref())).collect()
}
