//! Content-upload transport collaborator.

use crate::error::TransportError;

/// Content type tag for gzip-compressed JSON payloads.
pub const GZIP_JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8; encoding=gzip";

/// An opaque retrieval key returned by an upload transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UploadKey(String);

impl UploadKey {
    /// Wraps a transport-issued key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UploadKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accepts a byte payload for out-of-band retrieval.
///
/// Retry policy belongs to implementations or their callers; the
/// resolution core never retries an upload.
pub trait ContentUploader: Send + Sync {
    /// Uploads `payload`, returning its retrieval key.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Rejected`] when the service refused the
    /// payload, [`TransportError::Unavailable`] when the request never
    /// completed.
    fn upload(&self, payload: &[u8], content_type: &str) -> Result<UploadKey, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_key() {
        let key = UploadKey::new("aBc123");
        assert_eq!(key.as_str(), "aBc123");
        assert_eq!(format!("{key}"), "aBc123");
    }

    // Compile-time test: the trait must stay object-safe.
    fn _assert_uploader_object_safe(_: &dyn ContentUploader) {}
}
