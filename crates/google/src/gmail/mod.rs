//! Gmail v1 integration
//!
//! This module provides:
//! - Gmail client for listing, reading, sending and labelling messages
//! - Search query builder
//! - Plain-text body extraction from MIME part trees
//! - RFC 2822 message composition

mod body;
mod client;
mod compose;
mod query;

pub use body::{decode_base64_body, extract_plain_text_body};
pub use client::GmailClient;
pub use compose::{Attachment, OutgoingMessage};
pub use query::MessageSearch;

/// Gmail API request and response types
pub mod api {
    use serde::{Deserialize, Serialize};

    /// Response from listing messages
    #[derive(Debug, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ListMessagesResponse {
        pub messages: Option<Vec<MessageRef>>,
        pub next_page_token: Option<String>,
        pub result_size_estimate: Option<u32>,
    }

    /// Reference to a message (just ID and thread ID)
    #[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessageRef {
        pub id: String,
        pub thread_id: String,
    }

    /// Message as returned by get, send, modify and trash
    ///
    /// Only `id` is guaranteed; the rest depends on the requested format.
    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GmailMessage {
        pub id: String,
        pub thread_id: Option<String>,
        #[serde(default)]
        pub label_ids: Vec<String>,
        pub snippet: Option<String>,
        pub internal_date: Option<String>,
        pub payload: Option<MessagePart>,
        /// Whole message, URL-safe base64 (format=raw only)
        pub raw: Option<String>,
    }

    impl GmailMessage {
        /// First header with this name, case-insensitively
        pub fn header(&self, name: &str) -> Option<&str> {
            self.payload
                .as_ref()?
                .headers
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case(name))
                .map(|h| h.value.as_str())
        }

        pub fn is_unread(&self) -> bool {
            self.label_ids.iter().any(|label| label == "UNREAD")
        }
    }

    /// Node of a message's MIME tree; the payload is the root part
    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessagePart {
        pub part_id: Option<String>,
        pub mime_type: Option<String>,
        pub filename: Option<String>,
        #[serde(default)]
        pub headers: Vec<Header>,
        pub body: Option<MessageBody>,
        #[serde(default)]
        pub parts: Vec<MessagePart>,
    }

    impl MessagePart {
        pub fn is_mime_type(&self, expected: &str) -> bool {
            self.mime_type
                .as_deref()
                .is_some_and(|m| m.eq_ignore_ascii_case(expected))
        }

        /// Encoded body data, if the part carries it inline
        pub fn data(&self) -> Option<&str> {
            self.body.as_ref()?.data.as_deref().filter(|d| !d.is_empty())
        }
    }

    /// Email header (name-value pair)
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct Header {
        pub name: String,
        pub value: String,
    }

    /// Message body (base64url encoded when inline)
    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessageBody {
        pub size: Option<u32>,
        pub data: Option<String>,
        pub attachment_id: Option<String>,
    }

    /// Representation requested from `messages.get`
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub enum MessageFormat {
        #[default]
        Full,
        Metadata,
        Minimal,
        Raw,
    }

    impl MessageFormat {
        pub fn as_str(&self) -> &'static str {
            match self {
                MessageFormat::Full => "full",
                MessageFormat::Metadata => "metadata",
                MessageFormat::Minimal => "minimal",
                MessageFormat::Raw => "raw",
            }
        }
    }

    #[derive(Debug, Default, Deserialize)]
    pub struct ListLabelsResponse {
        #[serde(default)]
        pub labels: Vec<GmailLabel>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GmailLabel {
        pub id: String,
        pub name: String,
        /// "system" or "user"
        #[serde(rename = "type")]
        pub label_type: Option<String>,
        pub label_list_visibility: Option<LabelListVisibility>,
        pub message_list_visibility: Option<MessageListVisibility>,
    }

    /// Whether a label shows in the label list
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub enum LabelListVisibility {
        #[default]
        LabelShow,
        LabelShowIfUnread,
        LabelHide,
    }

    /// Whether a label shows on messages in the message list
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum MessageListVisibility {
        #[default]
        Show,
        Hide,
    }

    /// Label to create
    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct NewLabel {
        pub name: String,
        pub label_list_visibility: LabelListVisibility,
        pub message_list_visibility: MessageListVisibility,
    }

    impl NewLabel {
        /// A visible label
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                label_list_visibility: LabelListVisibility::default(),
                message_list_visibility: MessageListVisibility::default(),
            }
        }
    }
}
