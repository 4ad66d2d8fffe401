//! Google Drive v3 integration
//!
//! This module provides:
//! - Drive client for listing, transferring and organizing files
//! - Search query construction
//! - Content type detection for uploads

mod client;
mod mime;
mod query;

pub use client::{DownloadProgress, DriveClient, RESUMABLE_THRESHOLD};
pub use mime::{guess_mime_type, mime_type_for};
pub use query::FileSearch;

/// Drive API response types
pub mod api {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    /// MIME type Drive uses for folders
    pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

    /// File metadata; which fields are filled depends on the `fields` mask
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DriveFile {
        #[serde(default)]
        pub id: String,
        pub name: Option<String>,
        pub mime_type: Option<String>,
        pub modified_time: Option<DateTime<Utc>>,
        /// Size in bytes, encoded by the API as a decimal string
        pub size: Option<String>,
        #[serde(default)]
        pub parents: Vec<String>,
        pub web_view_link: Option<String>,
        pub trashed: Option<bool>,
    }

    impl DriveFile {
        pub fn size_bytes(&self) -> Option<u64> {
            self.size.as_deref()?.parse().ok()
        }

        pub fn is_folder(&self) -> bool {
            self.mime_type.as_deref() == Some(FOLDER_MIME_TYPE)
        }
    }

    /// Response from listing files
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FileList {
        #[serde(default)]
        pub files: Vec<DriveFile>,
        pub next_page_token: Option<String>,
    }

    /// Access level granted when sharing
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum PermissionRole {
        Reader,
        Commenter,
        Writer,
    }

    /// Created permission
    #[derive(Debug, Clone, PartialEq, Deserialize)]
    pub struct Permission {
        pub id: String,
    }
}
