//! Store key derivation.

use crate::store::Error;

/// The namespace prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "session_of_users:";

/// Builds the store key for `session_id` under the `prefix` namespace.
///
/// The key is `prefix` immediately followed by `session_id`, so the same pair
/// always maps to the same key and distinct ids under one prefix never collide.
///
/// Returns [`Error::InvalidId`] for an empty `session_id`.
pub fn build_key(prefix: &str, session_id: &str) -> Result<String, Error> {
    if session_id.is_empty() {
        return Err(Error::InvalidId);
    }

    let mut key = String::with_capacity(prefix.len() + session_id.len());
    key.push_str(prefix);
    key.push_str(session_id);
    Ok(key)
}
