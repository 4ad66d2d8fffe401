//! Google Docs API client
//!
//! Edits go through `documents.batchUpdate` with a single request each.
//! Placing a new document in a folder needs Drive, so this client keeps a
//! session for both surfaces.

use log::{debug, info};
use serde_json::{Map, Value, json};
use std::sync::Arc;

use super::api::{BatchUpdateResponse, Document, TextStyle};
use super::text::{TextMatch, extract_text, find_matches};
use crate::auth::AuthManager;
use crate::error::Result;
use crate::session::{ApiSurface, BodyMethod, Session, SessionSlot};

/// Google Docs client
pub struct DocsClient {
    auth: Arc<AuthManager>,
    docs: SessionSlot,
    drive: SessionSlot,
}

impl DocsClient {
    pub fn new(auth: Arc<AuthManager>) -> Self {
        Self {
            auth,
            docs: SessionSlot::new(ApiSurface::Docs),
            drive: SessionSlot::new(ApiSurface::Drive),
        }
    }

    /// Whether the Docs session has been established
    pub fn is_ready(&self) -> bool {
        self.docs.is_authenticated()
    }

    fn session(&self) -> Result<Session> {
        self.docs.session(&self.auth)
    }

    /// Create a new document, optionally placing it in a Drive folder
    pub fn create_document(&self, title: &str, folder_id: Option<&str>) -> Result<Document> {
        let session = self.session()?;
        let document: Document = session.send_json(
            BodyMethod::Post,
            "documents",
            &[],
            &json!({ "title": title }),
            "Error creating document",
        )?;

        if let Some(folder_id) = folder_id {
            let drive = self.drive.session(&self.auth)?;
            let _: Value = drive.send_json(
                BodyMethod::Patch,
                &format!("files/{}", urlencoding::encode(&document.document_id)),
                &[
                    ("addParents", folder_id.to_string()),
                    ("fields", "id, parents".to_string()),
                ],
                &json!({}),
                "Error moving document to folder",
            )?;
        }

        info!("Document created: {} (ID: {})", title, document.document_id);
        Ok(document)
    }

    /// Get a document's content and metadata
    pub fn get_document(&self, document_id: &str) -> Result<Document> {
        let session = self.session()?;
        session.get_json(&document_path(document_id), &[], "Error getting document")
    }

    /// Plain text of every paragraph; tables and other elements are skipped
    pub fn read_document_text(&self, document_id: &str) -> Result<String> {
        let document = self.get_document(document_id)?;
        Ok(extract_text(&document))
    }

    /// Append text at the end of the document body
    pub fn append_text(&self, document_id: &str, text: &str) -> Result<BatchUpdateResponse> {
        let request = json!({
            "insertText": {
                "endOfSegmentLocation": {},
                "text": text,
            }
        });
        let result = self.batch_update(document_id, request, "Error appending text")?;
        info!("Text appended to document {}", document_id);
        Ok(result)
    }

    /// Insert text at a character index (1 = start of the body)
    pub fn insert_text(
        &self,
        document_id: &str,
        text: &str,
        index: u64,
    ) -> Result<BatchUpdateResponse> {
        let request = json!({
            "insertText": {
                "location": { "index": index },
                "text": text,
            }
        });
        let result = self.batch_update(document_id, request, "Error inserting text")?;
        info!("Text inserted at index {}", index);
        Ok(result)
    }

    /// Replace every occurrence of `find` with `replacement`
    pub fn replace_text(
        &self,
        document_id: &str,
        find: &str,
        replacement: &str,
        match_case: bool,
    ) -> Result<BatchUpdateResponse> {
        let request = json!({
            "replaceAllText": {
                "containsText": {
                    "text": find,
                    "matchCase": match_case,
                },
                "replaceText": replacement,
            }
        });
        let result = self.batch_update(document_id, request, "Error replacing text")?;
        info!(
            "Replaced {} occurrence(s) of '{}'",
            result.occurrences_changed(),
            find
        );
        Ok(result)
    }

    /// Apply character formatting to `[start_index, end_index)`
    ///
    /// Only the style fields that are set are sent; an empty style is a no-op.
    pub fn format_text(
        &self,
        document_id: &str,
        start_index: u64,
        end_index: u64,
        style: &TextStyle,
    ) -> Result<BatchUpdateResponse> {
        let (text_style, fields) = style_update(style);
        if fields.is_empty() {
            debug!("No text style fields set; skipping format request");
            return Ok(BatchUpdateResponse::default());
        }

        let request = json!({
            "updateTextStyle": {
                "range": {
                    "startIndex": start_index,
                    "endIndex": end_index,
                },
                "textStyle": text_style,
                "fields": fields.join(","),
            }
        });
        let result = self.batch_update(document_id, request, "Error formatting text")?;
        info!("Formatted text from {} to {}", start_index, end_index);
        Ok(result)
    }

    /// Find every occurrence of `term` in the document's plain text
    pub fn search_in_document(&self, document_id: &str, term: &str) -> Result<Vec<TextMatch>> {
        let text = self.read_document_text(document_id)?;
        Ok(find_matches(&text, term))
    }

    /// Delete the content in `[start_index, end_index)`
    pub fn delete_content_range(
        &self,
        document_id: &str,
        start_index: u64,
        end_index: u64,
    ) -> Result<BatchUpdateResponse> {
        let request = json!({
            "deleteContentRange": {
                "range": {
                    "startIndex": start_index,
                    "endIndex": end_index,
                }
            }
        });
        let result = self.batch_update(document_id, request, "Error deleting content")?;
        info!("Deleted content from {} to {}", start_index, end_index);
        Ok(result)
    }

    fn batch_update(
        &self,
        document_id: &str,
        request: Value,
        context: &str,
    ) -> Result<BatchUpdateResponse> {
        let session = self.session()?;
        session.send_json(
            BodyMethod::Post,
            &format!("{}:batchUpdate", document_path(document_id)),
            &[],
            &json!({ "requests": [request] }),
            context,
        )
    }
}

fn document_path(document_id: &str) -> String {
    format!("documents/{}", urlencoding::encode(document_id))
}

/// Docs `textStyle` object plus the matching field mask
fn style_update(style: &TextStyle) -> (Map<String, Value>, Vec<&'static str>) {
    let mut text_style = Map::new();
    let mut fields = Vec::new();

    if let Some(bold) = style.bold {
        text_style.insert("bold".to_string(), json!(bold));
        fields.push("bold");
    }
    if let Some(italic) = style.italic {
        text_style.insert("italic".to_string(), json!(italic));
        fields.push("italic");
    }
    if let Some(underline) = style.underline {
        text_style.insert("underline".to_string(), json!(underline));
        fields.push("underline");
    }
    if let Some(size) = style.font_size {
        text_style.insert(
            "fontSize".to_string(),
            json!({ "magnitude": size, "unit": "PT" }),
        );
        fields.push("fontSize");
    }

    (text_style, fields)
}
