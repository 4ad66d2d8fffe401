//! Google Drive API client
//!
//! Lists, searches, transfers and organizes files. Each operation is a
//! single REST call except `move_file` (reads the current parents first)
//! and resumable uploads (session start + upload).

use log::{debug, info};
use serde::Serialize;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use super::api::{DriveFile, FOLDER_MIME_TYPE, FileList, Permission, PermissionRole};
use super::mime::mime_type_for;
use super::query::FileSearch;
use crate::auth::AuthManager;
use crate::error::{Error, Result};
use crate::session::{ApiSurface, BodyMethod, Session, SessionSlot};

const DEFAULT_LIST_FIELDS: &str =
    "nextPageToken, files(id, name, mimeType, modifiedTime, size, parents)";
const DEFAULT_FILE_FIELDS: &str = "id, name, mimeType, modifiedTime, size, parents, webViewLink";
const UPLOAD_FIELDS: &str = "id, name, mimeType, webViewLink";
const DEFAULT_PAGE_SIZE: u32 = 100;

/// Payloads at or above this size go through a resumable upload session
pub const RESUMABLE_THRESHOLD: usize = 5 * 1024 * 1024;

const DOWNLOAD_CHUNK_SIZE: usize = 256 * 1024;

/// Upper bound on the buffer reserved from a Content-Length header
const MAX_DOWNLOAD_PREALLOCATION: u64 = 64 * DOWNLOAD_CHUNK_SIZE as u64;

/// Progress of a media download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub bytes_read: u64,
    /// From Content-Length, when the server sent one
    pub total_bytes: Option<u64>,
}

impl DownloadProgress {
    /// Completed fraction in `0.0..=1.0`, if the total is known
    pub fn fraction(&self) -> Option<f64> {
        match self.total_bytes {
            Some(0) => Some(1.0),
            Some(total) => Some(self.bytes_read as f64 / total as f64),
            None => None,
        }
    }
}

/// Metadata sent when creating a file or folder
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewFile<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    parents: Vec<&'a str>,
}

/// Google Drive client
pub struct DriveClient {
    auth: Arc<AuthManager>,
    session: SessionSlot,
}

impl DriveClient {
    pub fn new(auth: Arc<AuthManager>) -> Self {
        Self {
            auth,
            session: SessionSlot::new(ApiSurface::Drive),
        }
    }

    /// Whether the Drive session has been established
    pub fn is_ready(&self) -> bool {
        self.session.is_authenticated()
    }

    fn session(&self) -> Result<Session> {
        self.session.session(&self.auth)
    }

    /// List files matching an optional Drive query (first page only)
    ///
    /// # Arguments
    /// * `query` - Drive search expression, e.g. `name contains 'report'`
    /// * `page_size` - Number of files to return
    /// * `fields` - Field mask; defaults to id, name, mimeType, modifiedTime, size, parents
    pub fn list_files(
        &self,
        query: Option<&str>,
        page_size: u32,
        fields: Option<&str>,
    ) -> Result<Vec<DriveFile>> {
        let session = self.session()?;

        let mut params = vec![
            ("pageSize", page_size.to_string()),
            ("fields", fields.unwrap_or(DEFAULT_LIST_FIELDS).to_string()),
        ];
        if let Some(q) = query {
            params.push(("q", q.to_string()));
        }

        let list: FileList = session.get_json("files", &params, "Error listing files")?;
        debug!("Listed {} files", list.files.len());
        Ok(list.files)
    }

    /// Search files by name, type, folder and trash state
    pub fn search_files(&self, search: &FileSearch) -> Result<Vec<DriveFile>> {
        let query = search.to_query();
        self.list_files(query.as_deref(), DEFAULT_PAGE_SIZE, None)
    }

    /// Get metadata for a single file
    pub fn get_file_metadata(&self, file_id: &str, fields: Option<&str>) -> Result<DriveFile> {
        let session = self.session()?;
        session.get_json(
            &file_path(file_id),
            &[("fields", fields.unwrap_or(DEFAULT_FILE_FIELDS).to_string())],
            "Error getting file metadata",
        )
    }

    /// Download a file's content, optionally saving it to `destination`
    pub fn download_file(&self, file_id: &str, destination: Option<&Path>) -> Result<Vec<u8>> {
        self.download_file_with_progress(file_id, destination, |progress| {
            if let Some(fraction) = progress.fraction() {
                debug!("Download {}%", (fraction * 100.0) as u32);
            }
        })
    }

    /// Download a file's content, reporting progress after every chunk
    pub fn download_file_with_progress<F>(
        &self,
        file_id: &str,
        destination: Option<&Path>,
        mut on_progress: F,
    ) -> Result<Vec<u8>>
    where
        F: FnMut(DownloadProgress),
    {
        let session = self.session()?;
        let mut response = session.get_raw(
            &session.url(&file_path(file_id)),
            &[("alt", "media".to_string())],
            "Error downloading file",
        )?;

        let total_bytes = response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let mut reader = response.body_mut().as_reader();
        let mut content = Vec::with_capacity(initial_capacity(total_bytes));
        let mut chunk = vec![0u8; DOWNLOAD_CHUNK_SIZE];
        loop {
            let read = reader.read(&mut chunk)?;
            if read == 0 {
                break;
            }
            content.extend_from_slice(&chunk[..read]);
            on_progress(DownloadProgress {
                bytes_read: content.len() as u64,
                total_bytes,
            });
        }

        if let Some(path) = destination {
            fs::write(path, &content)?;
            info!("File saved to {}", path.display());
        }

        Ok(content)
    }

    /// Upload a local file
    ///
    /// # Arguments
    /// * `path` - Local file to upload
    /// * `name` - Name in Drive (defaults to the file name)
    /// * `folder_id` - Parent folder (optional)
    /// * `mime_type` - Content type (guessed from the name if absent)
    pub fn upload_file(
        &self,
        path: &Path,
        name: Option<&str>,
        folder_id: Option<&str>,
        mime_type: Option<&str>,
    ) -> Result<DriveFile> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("Not a file path: {}", path.display()),
                ))
            })?;
        let content = fs::read(path)?;
        let mime_type = mime_type_for(file_name, mime_type);
        self.upload(&content, name.unwrap_or(file_name), folder_id, &mime_type)
    }

    /// Upload in-memory content as a new file
    ///
    /// Not idempotent: retrying after a transient failure may create duplicates.
    pub fn upload_content(
        &self,
        content: &[u8],
        name: &str,
        folder_id: Option<&str>,
        mime_type: Option<&str>,
    ) -> Result<DriveFile> {
        let mime_type = mime_type_for(name, mime_type);
        self.upload(content, name, folder_id, &mime_type)
    }

    fn upload(
        &self,
        content: &[u8],
        name: &str,
        folder_id: Option<&str>,
        mime_type: &str,
    ) -> Result<DriveFile> {
        let session = self.session()?;
        let metadata = NewFile {
            name,
            mime_type: None,
            parents: folder_id.into_iter().collect(),
        };

        let file = if content.len() >= RESUMABLE_THRESHOLD {
            upload_resumable(&session, &metadata, content, mime_type)?
        } else {
            upload_multipart(&session, &metadata, content, mime_type)?
        };

        info!(
            "File uploaded: {} (ID: {})",
            file.name.as_deref().unwrap_or(name),
            file.id
        );
        Ok(file)
    }

    /// Create a folder, optionally inside `parent_id`
    pub fn create_folder(&self, name: &str, parent_id: Option<&str>) -> Result<DriveFile> {
        let session = self.session()?;
        let metadata = NewFile {
            name,
            mime_type: Some(FOLDER_MIME_TYPE),
            parents: parent_id.into_iter().collect(),
        };

        let folder: DriveFile = session.send_json(
            BodyMethod::Post,
            "files",
            &[("fields", "id, name, webViewLink".to_string())],
            &metadata,
            "Error creating folder",
        )?;
        info!("Folder created: {} (ID: {})", name, folder.id);
        Ok(folder)
    }

    /// Permanently delete a file
    ///
    /// Deleting an already deleted file fails with a not-found error.
    pub fn delete_file(&self, file_id: &str) -> Result<()> {
        let session = self.session()?;
        session.delete(&file_path(file_id), &[], "Error deleting file")?;
        info!("File deleted: {}", file_id);
        Ok(())
    }

    /// Move a file into `new_folder_id`, detaching it from its current parents
    pub fn move_file(&self, file_id: &str, new_folder_id: &str) -> Result<DriveFile> {
        let session = self.session()?;
        let path = file_path(file_id);

        let current: DriveFile = session.get_json(
            &path,
            &[("fields", "parents".to_string())],
            "Error moving file",
        )?;

        let mut params = vec![
            ("addParents", new_folder_id.to_string()),
            ("fields", "id, parents".to_string()),
        ];
        if !current.parents.is_empty() {
            params.push(("removeParents", current.parents.join(",")));
        }

        let file: DriveFile = session.send_json(
            BodyMethod::Patch,
            &path,
            &params,
            &serde_json::json!({}),
            "Error moving file",
        )?;
        info!("File moved to folder: {}", new_folder_id);
        Ok(file)
    }

    /// Share a file with a user
    pub fn share_file(&self, file_id: &str, email: &str, role: PermissionRole) -> Result<Permission> {
        let session = self.session()?;
        let permission = serde_json::json!({
            "type": "user",
            "role": role,
            "emailAddress": email,
        });

        let created: Permission = session.send_json(
            BodyMethod::Post,
            &format!("{}/permissions", file_path(file_id)),
            &[("fields", "id".to_string())],
            &permission,
            "Error sharing file",
        )?;
        info!("File shared with {} as {:?}", email, role);
        Ok(created)
    }
}

fn file_path(file_id: &str) -> String {
    format!("files/{}", urlencoding::encode(file_id))
}

/// Metadata and media in one multipart/related request
fn upload_multipart(
    session: &Session,
    metadata: &NewFile<'_>,
    content: &[u8],
    mime_type: &str,
) -> Result<DriveFile> {
    let boundary = multipart_boundary();
    let metadata_json = serde_json::to_vec(metadata)?;

    let mut body = Vec::with_capacity(content.len() + metadata_json.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(&metadata_json);
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {mime_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let response = session.send_bytes(
        BodyMethod::Post,
        &session.upload_url("files"),
        &[
            ("uploadType", "multipart".to_string()),
            ("fields", UPLOAD_FIELDS.to_string()),
        ],
        &[(
            "Content-Type",
            format!("multipart/related; boundary={boundary}"),
        )],
        &body,
        "Error uploading file",
    )?;
    session.read_json(response, "Error uploading file")
}

/// Start a resumable session, then send the media in one request
fn upload_resumable(
    session: &Session,
    metadata: &NewFile<'_>,
    content: &[u8],
    mime_type: &str,
) -> Result<DriveFile> {
    let start = session.send_json_raw(
        BodyMethod::Post,
        &session.upload_url("files"),
        &[
            ("uploadType", "resumable".to_string()),
            ("fields", UPLOAD_FIELDS.to_string()),
        ],
        &[
            ("X-Upload-Content-Type", mime_type.to_string()),
            ("X-Upload-Content-Length", content.len().to_string()),
        ],
        metadata,
        "Error starting resumable upload",
    )?;

    let location = start
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "Resumable upload session returned no Location header",
            ))
        })?;
    debug!("Resumable upload session: {}", location);

    let response = session.send_bytes(
        BodyMethod::Put,
        &location,
        &[],
        &[("Content-Type", mime_type.to_string())],
        content,
        "Error uploading file",
    )?;
    session.read_json(response, "Error uploading file")
}

/// Buffer to reserve for a download; the header is only a hint
fn initial_capacity(total_bytes: Option<u64>) -> usize {
    total_bytes.unwrap_or(0).min(MAX_DOWNLOAD_PREALLOCATION) as usize
}

/// Random multipart boundary
fn multipart_boundary() -> String {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let hasher = RandomState::new().build_hasher();
    format!("satchel_boundary_{:016x}", hasher.finish())
}
