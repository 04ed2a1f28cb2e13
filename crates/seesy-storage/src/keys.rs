//! Shared object key generation for storage backends.
//!
//! Key format: `{upload_path}/{timestamp_ms}_{sanitized_file_name}`.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::traits::{StorageError, StorageResult};

static LAST_TIMESTAMP_MS: AtomicI64 = AtomicI64::new(0);

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
pub fn sanitize_file_name(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Unix time in milliseconds, strictly increasing across the process.
///
/// Two calls within the same millisecond get consecutive values, so keys built
/// from it never collide even when uploads run concurrently.
pub fn next_timestamp_ms() -> i64 {
    let now = chrono::Utc::now().timestamp_millis();
    let mut last = LAST_TIMESTAMP_MS.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_TIMESTAMP_MS.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(current) => last = current,
        }
    }
}

/// Generate the object key for a new upload.
///
/// Leading and trailing slashes of `upload_path` are ignored; an empty path
/// puts the object at the bucket root.
pub fn generate_object_key(upload_path: &str, file_name: &str) -> String {
    object_key_at(upload_path, next_timestamp_ms(), file_name)
}

pub(crate) fn object_key_at(upload_path: &str, timestamp_ms: i64, file_name: &str) -> String {
    let prefix = upload_path.trim_matches('/');
    let name = format!("{}_{}", timestamp_ms, sanitize_file_name(file_name));
    if prefix.is_empty() {
        name
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Reject keys that are empty, absolute, or contain `.`/`..`/empty segments.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StorageError::InvalidKey(format!(
            "Storage key has an invalid segment: {}",
            key
        )));
    }
    Ok(())
}
