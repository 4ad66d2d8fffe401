//! Google Docs v1 integration
//!
//! This module provides:
//! - Docs client for creating, reading and editing documents
//! - Plain-text projection of the structured document body

mod client;
mod text;

pub use client::DocsClient;
pub use text::{TextMatch, extract_text, find_matches};

/// Docs API response types
pub mod api {
    use serde::Deserialize;
    use serde_json::Value;

    /// A document as returned by `documents.get` / `documents.create`
    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Document {
        pub document_id: String,
        pub title: Option<String>,
        pub revision_id: Option<String>,
        pub body: Option<Body>,
    }

    /// Document body: a sequence of structural elements
    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct Body {
        #[serde(default)]
        pub content: Vec<StructuralElement>,
    }

    /// One top-level element; exactly one of the content fields is set
    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct StructuralElement {
        pub start_index: Option<i64>,
        pub end_index: Option<i64>,
        pub paragraph: Option<Paragraph>,
        pub table: Option<Value>,
        pub section_break: Option<Value>,
        pub table_of_contents: Option<Value>,
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct Paragraph {
        #[serde(default)]
        pub elements: Vec<ParagraphElement>,
    }

    /// Inline element of a paragraph (text run, inline image, ...)
    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ParagraphElement {
        pub start_index: Option<i64>,
        pub end_index: Option<i64>,
        pub text_run: Option<TextRun>,
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct TextRun {
        #[serde(default)]
        pub content: String,
    }

    /// Reply from `documents.batchUpdate`
    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BatchUpdateResponse {
        pub document_id: Option<String>,
        #[serde(default)]
        pub replies: Vec<Value>,
    }

    impl BatchUpdateResponse {
        /// Occurrences changed by a replaceAllText request in the first reply
        pub fn occurrences_changed(&self) -> u64 {
            self.replies
                .first()
                .and_then(|reply| reply.pointer("/replaceAllText/occurrencesChanged"))
                .and_then(Value::as_u64)
                .unwrap_or(0)
        }
    }

    /// Character formatting applied by `format_text`; unset fields are untouched
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct TextStyle {
        pub bold: Option<bool>,
        pub italic: Option<bool>,
        pub underline: Option<bool>,
        /// Font size in points
        pub font_size: Option<f64>,
    }
}
