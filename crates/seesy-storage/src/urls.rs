//! Download URL helpers.
//!
//! Issued URLs carry the object key percent-encoded after an `/o/` path
//! segment and are always followed by a query string, e.g.
//! `https://firebasestorage.googleapis.com/v0/b/seesy-shop/o/items%2F17_pain.jpg?alt=media&token=...`.

use url::Url;

use crate::traits::{StorageError, StorageResult};

const OBJECT_SEGMENT: &str = "/o/";

/// Percent-encode a key for use as a single URL path segment (`/` becomes `%2F`).
pub fn encode_key(key: &str) -> String {
    urlencoding::encode(key).into_owned()
}

/// Extract the object key from a download URL issued by a storage backend.
///
/// The key is the percent-decoded text between the first `/o/` segment and
/// the query string. URLs without that shape return `InvalidUrl`.
pub fn object_key_from_url(download_url: &str) -> StorageResult<String> {
    let parsed = Url::parse(download_url)
        .map_err(|e| StorageError::InvalidUrl(format!("{}: {}", download_url, e)))?;

    if parsed.query().is_none() {
        return Err(StorageError::InvalidUrl(format!(
            "{}: missing query string",
            download_url
        )));
    }

    let path = parsed.path();
    let encoded = path
        .find(OBJECT_SEGMENT)
        .map(|idx| &path[idx + OBJECT_SEGMENT.len()..])
        .filter(|rest| !rest.is_empty())
        .ok_or_else(|| {
            StorageError::InvalidUrl(format!("{}: no object path segment", download_url))
        })?;

    let key = urlencoding::decode(encoded)
        .map_err(|e| StorageError::InvalidUrl(format!("{}: {}", download_url, e)))?;

    Ok(key.into_owned())
}

/// Last segment of the object key behind a download URL, or `"unknown"`.
pub fn file_name_from_url(download_url: &str) -> String {
    object_key_from_url(download_url)
        .ok()
        .and_then(|key| key.rsplit('/').next().map(str::to_string))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Whether `candidate` has the same scheme, host and port as `base`.
pub fn same_origin(candidate: &str, base: &str) -> bool {
    match (Url::parse(candidate), Url::parse(base)) {
        (Ok(candidate), Ok(base)) => {
            candidate.scheme() == base.scheme()
                && candidate.host_str().is_some()
                && candidate.host_str() == base.host_str()
                && candidate.port_or_known_default() == base.port_or_known_default()
        }
        _ => false,
    }
}
