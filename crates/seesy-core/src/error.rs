//! Error metadata shared across crates
//!
//! Domain error enums live next to the code that raises them (storage,
//! processing). This module only defines how an error describes itself to a
//! caller: a stable code, a client-facing message in the storefront's
//! language, whether retrying can help, and the level it is logged at.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error reporting - defines how an error should be presented
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "UPLOAD_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether the caller can retry the same operation (possibly with another file)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}
