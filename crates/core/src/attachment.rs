//! User-supplied attachments for the current turn.

use serde::{Deserialize, Serialize};

/// A file the user attached to their message.
///
/// Images are referenced by storage key and loaded at assembly time;
/// other files arrive with their text already extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub filename: String,

    /// MIME classification (e.g. "image/png", "application/pdf")
    pub mime_type: String,

    #[serde(default)]
    pub is_image: bool,

    /// Blob storage key of the raw bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,

    /// Text extracted from a non-image file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
}

impl Attachment {
    /// An image stored under `storage_key`.
    pub fn image(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        storage_key: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            is_image: true,
            storage_key: Some(storage_key.into()),
            extracted_text: None,
        }
    }

    /// A text-bearing file whose contents were extracted upstream.
    pub fn text(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        extracted_text: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            is_image: false,
            storage_key: None,
            extracted_text: Some(extracted_text.into()),
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == "application/pdf"
    }
}
