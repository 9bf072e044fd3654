//! Store configuration.

use serde::Deserialize;
use std::time::Duration;

use crate::key::DEFAULT_PREFIX;
use crate::store::Error;

/// Largest accepted TTL, in seconds (about 68 years).
///
/// Keeps every backend's expiry arithmetic in range.
pub const MAX_TTL_SECS: u64 = i32::MAX as u64;

/// Verbosity at or above which failures are logged.
pub(crate) const LOG_ERRORS: u32 = 1;
/// Verbosity at or above which every operation outcome is logged.
pub(crate) const LOG_OPERATIONS: u32 = 100;
/// Verbosity at or above which keys and payload sizes are logged.
pub(crate) const LOG_PAYLOADS: u32 = 200;

/// Raw, user-facing store settings.
///
/// Every field has a default, so a partial document deserializes cleanly:
///
/// ```rust
/// use ruts_docstore::StoreOptions;
///
/// let options: StoreOptions = serde_json::from_str(r#"{ "prefix": "app:", "ttl": 3600 }"#).unwrap();
/// assert_eq!(options.prefix, "app:");
/// assert_eq!(options.verbosity, 100);
/// ```
///
/// Unknown fields are ignored.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreOptions {
    /// Namespace prepended to every session id. Defaults to `"session_of_users:"`.
    pub prefix: String,
    /// Page size for bulk scans. Defaults to `100`.
    pub scan_batch_size: u32,
    /// Expiry in seconds forwarded to the backend on writes.
    pub ttl: Option<u64>,
    /// Stops forwarding `ttl` without discarding it.
    pub disable_ttl: bool,
    /// Logging granularity. `0` is silent; defaults to `100`.
    pub verbosity: u32,
    /// Upper bound for a single backend call, in milliseconds.
    pub operation_timeout_ms: Option<u64>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            scan_batch_size: 100,
            ttl: None,
            disable_ttl: false,
            verbosity: 100,
            operation_timeout_ms: None,
        }
    }
}

/// Validated, immutable configuration of a [`DocumentStore`](crate::DocumentStore).
#[derive(Clone, Debug)]
pub struct StoreConfig {
    prefix: String,
    scan_batch_size: u32,
    ttl: Option<Duration>,
    ttl_disabled: bool,
    verbosity: u32,
    operation_timeout: Option<Duration>,
}

impl StoreConfig {
    pub(crate) fn from_options(options: StoreOptions) -> Result<Self, Error> {
        if options.prefix.is_empty() {
            return Err(Error::Config("prefix must not be empty".to_string()));
        }

        if options.scan_batch_size == 0 {
            return Err(Error::Config(
                "scan_batch_size must be greater than zero".to_string(),
            ));
        }

        match options.ttl {
            Some(0) => {
                return Err(Error::Config("ttl must be greater than zero".to_string()));
            }
            Some(ttl) if ttl > MAX_TTL_SECS => {
                return Err(Error::Config(format!(
                    "ttl must not exceed {MAX_TTL_SECS} seconds"
                )));
            }
            _ => {}
        }

        if options.operation_timeout_ms == Some(0) {
            return Err(Error::Config(
                "operation_timeout_ms must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            prefix: options.prefix,
            scan_batch_size: options.scan_batch_size,
            ttl: options.ttl.map(Duration::from_secs),
            ttl_disabled: options.disable_ttl,
            verbosity: options.verbosity,
            operation_timeout: options.operation_timeout_ms.map(Duration::from_millis),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Reserved for bulk scans; no current operation reads it.
    pub fn scan_batch_size(&self) -> u32 {
        self.scan_batch_size
    }

    /// The configured TTL, whether or not it is forwarded.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn ttl_disabled(&self) -> bool {
        self.ttl_disabled
    }

    /// The TTL handed to the backend on writes.
    pub fn effective_ttl(&self) -> Option<Duration> {
        if self.ttl_disabled { None } else { self.ttl }
    }

    pub fn verbosity(&self) -> u32 {
        self.verbosity
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout
    }

    pub(crate) fn logs(&self, threshold: u32) -> bool {
        self.verbosity >= threshold
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            scan_batch_size: 100,
            ttl: None,
            ttl_disabled: false,
            verbosity: 100,
            operation_timeout: None,
        }
    }
}
