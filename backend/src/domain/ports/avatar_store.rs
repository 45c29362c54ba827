//! Port for the external image host that stores avatars.

use async_trait::async_trait;

use crate::domain::ContactId;

use super::define_port_error;

/// Raw image uploaded for a contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarUpload {
    pub contact_id: ContactId,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

define_port_error! {
    /// Errors raised by image host adapters.
    pub enum AvatarStoreError {
        /// No image host credentials are configured.
        Unconfigured => "image hosting is not configured",
        /// The host answered but refused the upload.
        Rejected { message: String } => "image host rejected upload: {message}",
        /// The host could not be reached or answered unintelligibly.
        Transport { message: String } => "image host unreachable: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvatarStore: Send + Sync {
    /// Store the image and return its public URL.
    async fn upload(&self, upload: AvatarUpload) -> Result<String, AvatarStoreError>;
}
