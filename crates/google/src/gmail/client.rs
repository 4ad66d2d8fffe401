//! Gmail API client
//!
//! Every call targets the authenticated user (`users/me`). Listing returns
//! the first page only.

use log::{debug, info};
use serde_json::json;
use std::sync::Arc;

use super::api::{
    GmailLabel, GmailMessage, ListLabelsResponse, ListMessagesResponse, MessageFormat, MessageRef,
    NewLabel,
};
use super::body::extract_plain_text_body;
use super::compose::OutgoingMessage;
use super::query::MessageSearch;
use crate::auth::AuthManager;
use crate::error::Result;
use crate::session::{ApiSurface, BodyMethod, Session, SessionSlot};

const DEFAULT_MAX_RESULTS: u32 = 100;
const MAX_RESULTS_LIMIT: u32 = 500;
const UNREAD_LABEL: &str = "UNREAD";

/// Gmail client for the authenticated mailbox
pub struct GmailClient {
    auth: Arc<AuthManager>,
    session: SessionSlot,
}

impl GmailClient {
    pub fn new(auth: Arc<AuthManager>) -> Self {
        Self {
            auth,
            session: SessionSlot::new(ApiSurface::Gmail),
        }
    }

    /// Whether the Gmail session has been established
    pub fn is_ready(&self) -> bool {
        self.session.is_authenticated()
    }

    fn session(&self) -> Result<Session> {
        self.session.session(&self.auth)
    }

    /// List message references matching a Gmail query
    ///
    /// # Arguments
    /// * `query` - Gmail search expression; empty means no filter
    /// * `max_results` - Maximum number of messages (1-500)
    /// * `label_ids` - Only messages carrying all of these labels
    pub fn list_messages(
        &self,
        query: &str,
        max_results: u32,
        label_ids: &[&str],
    ) -> Result<Vec<MessageRef>> {
        let session = self.session()?;

        let mut params = vec![("maxResults", max_results.clamp(1, MAX_RESULTS_LIMIT).to_string())];
        if !query.is_empty() {
            params.push(("q", query.to_string()));
        }
        params.extend(label_ids.iter().map(|label| ("labelIds", label.to_string())));

        let list: ListMessagesResponse =
            session.get_json("users/me/messages", &params, "Error listing messages")?;
        let messages = list.messages.unwrap_or_default();
        debug!("Listed {} messages", messages.len());
        Ok(messages)
    }

    /// Get a single message in the requested representation
    pub fn get_message(&self, message_id: &str, format: MessageFormat) -> Result<GmailMessage> {
        let session = self.session()?;
        session.get_json(
            &message_path(message_id),
            &[("format", format.as_str().to_string())],
            "Error getting message",
        )
    }

    /// Plain-text body of a message (text/plain parts joined with newlines)
    pub fn get_message_body(&self, message_id: &str) -> Result<String> {
        let message = self.get_message(message_id, MessageFormat::Full)?;
        Ok(message
            .payload
            .as_ref()
            .map(extract_plain_text_body)
            .unwrap_or_default())
    }

    /// Search messages by sender, recipient, subject, date range and state
    pub fn search_messages(&self, search: &MessageSearch) -> Result<Vec<MessageRef>> {
        self.list_messages(&search.to_query(), DEFAULT_MAX_RESULTS, &[])
    }

    /// Send a message from the authenticated account
    pub fn send_message(&self, message: &OutgoingMessage) -> Result<GmailMessage> {
        let session = self.session()?;
        let sent: GmailMessage = session.send_json(
            BodyMethod::Post,
            "users/me/messages/send",
            &[],
            &json!({ "raw": message.to_raw() }),
            "Error sending message",
        )?;

        if message.attachments.is_empty() {
            info!("Message sent to {}", message.to);
        } else {
            info!(
                "Message with {} attachment(s) sent to {}",
                message.attachments.len(),
                message.to
            );
        }
        Ok(sent)
    }

    /// Remove the UNREAD label
    pub fn mark_as_read(&self, message_id: &str) -> Result<GmailMessage> {
        let message = self.modify_labels(
            message_id,
            json!({ "removeLabelIds": [UNREAD_LABEL] }),
            "Error marking message as read",
        )?;
        info!("Message {} marked as read", message_id);
        Ok(message)
    }

    /// Add the UNREAD label
    pub fn mark_as_unread(&self, message_id: &str) -> Result<GmailMessage> {
        let message = self.modify_labels(
            message_id,
            json!({ "addLabelIds": [UNREAD_LABEL] }),
            "Error marking message as unread",
        )?;
        info!("Message {} marked as unread", message_id);
        Ok(message)
    }

    /// Move a message to the trash
    pub fn trash_message(&self, message_id: &str) -> Result<GmailMessage> {
        let session = self.session()?;
        let message: GmailMessage = session.post_empty(
            &format!("{}/trash", message_path(message_id)),
            &[],
            "Error trashing message",
        )?;
        info!("Message {} moved to trash", message_id);
        Ok(message)
    }

    /// All labels in the mailbox, system labels included
    pub fn list_labels(&self) -> Result<Vec<GmailLabel>> {
        let session = self.session()?;
        let list: ListLabelsResponse =
            session.get_json("users/me/labels", &[], "Error getting labels")?;
        Ok(list.labels)
    }

    pub fn create_label(&self, label: &NewLabel) -> Result<GmailLabel> {
        let session = self.session()?;
        let created: GmailLabel = session.send_json(
            BodyMethod::Post,
            "users/me/labels",
            &[],
            label,
            "Error creating label",
        )?;
        info!("Label created: {} (ID: {})", created.name, created.id);
        Ok(created)
    }

    fn modify_labels(
        &self,
        message_id: &str,
        body: serde_json::Value,
        context: &str,
    ) -> Result<GmailMessage> {
        let session = self.session()?;
        session.send_json(
            BodyMethod::Post,
            &format!("{}/modify", message_path(message_id)),
            &[],
            &body,
            context,
        )
    }
}

fn message_path(message_id: &str) -> String {
    format!("users/me/messages/{}", urlencoding::encode(message_id))
}
