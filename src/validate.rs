//! Request validation
//!
//! Session ids must be canonical hyphenated UUIDs and models must be present
//! in the live model catalog. Both checks run before a chat turn performs
//! any side effect.

use crate::error::{BardError, Result};
use crate::providers::Provider;
use uuid::Uuid;

/// Return the canonical lowercase form of a session id, or `None` when the
/// input is not an 8-4-4-4-12 hyphenated hex UUID.
///
/// The input is parsed and re-serialized; only inputs whose lowercase form
/// matches the re-serialized string are accepted. This rejects the simple
/// (unhyphenated), braced and URN encodings that `Uuid::parse_str` would
/// otherwise allow.
///
/// # Examples
///
/// ```
/// use bard::validate::canonical_session_id;
///
/// assert_eq!(
///     canonical_session_id("123E4567-E89B-12D3-A456-426614174000").as_deref(),
///     Some("123e4567-e89b-12d3-a456-426614174000")
/// );
/// assert!(canonical_session_id("not-a-uuid").is_none());
/// ```
pub fn canonical_session_id(id: &str) -> Option<String> {
    let parsed = Uuid::parse_str(id).ok()?;
    let canonical = parsed.hyphenated().to_string();
    if canonical == id.to_ascii_lowercase() {
        Some(canonical)
    } else {
        None
    }
}

/// Whether `id` is an acceptable session id
pub fn validate_session_id(id: &str) -> bool {
    canonical_session_id(id).is_some()
}

/// Check that `name` is currently served by the inference runtime.
///
/// The catalog is fetched on every call. `Ok(false)` means the catalog was
/// read and the model is absent; a failed fetch is returned as
/// [`BardError::CatalogUnavailable`] so callers never confuse an outage with
/// an unknown model.
pub async fn validate_model(provider: &dyn Provider, name: &str) -> Result<bool> {
    let models = provider.list_models().await.map_err(|e| {
        tracing::warn!("Model catalog fetch failed while validating {}: {}", name, e);
        BardError::CatalogUnavailable(e.to_string())
    })?;

    Ok(models.iter().any(|m| m.name == name))
}
