//! Outgoing message composition
//!
//! Builds an RFC 2822 message and the URL-safe base64 `raw` form the Gmail
//! send endpoint expects. Messages with attachments become multipart/mixed.

use base64::prelude::*;
use std::fs;
use std::path::Path;

use crate::drive::mime_type_for;
use crate::error::{Error, Result};

const LINE_WIDTH: usize = 76;

/// File attached to an outgoing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            content,
        }
    }

    /// Read a local file, guessing its type from the extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("Not a file path: {}", path.display()),
                ))
            })?
            .to_string();
        let content = fs::read(path)?;
        let mime_type = mime_type_for(&filename, None);
        Ok(Self {
            filename,
            mime_type,
            content,
        })
    }
}

/// Plain-text email to send
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl OutgoingMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn cc(mut self, cc: impl Into<String>) -> Self {
        self.cc = Some(cc.into());
        self
    }

    pub fn bcc(mut self, bcc: impl Into<String>) -> Self {
        self.bcc = Some(bcc.into());
        self
    }

    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// RFC 2822 text with CRLF line endings
    pub fn to_rfc2822(&self, boundary: &str) -> String {
        let mut out = String::new();
        push_header(&mut out, "To", &self.to);
        if let Some(cc) = self.cc.as_deref().filter(|v| !v.is_empty()) {
            push_header(&mut out, "Cc", cc);
        }
        if let Some(bcc) = self.bcc.as_deref().filter(|v| !v.is_empty()) {
            push_header(&mut out, "Bcc", bcc);
        }
        push_header(&mut out, "Subject", &encode_header_value(&self.subject));
        push_header(&mut out, "MIME-Version", "1.0");

        if self.attachments.is_empty() {
            push_text_part(&mut out, &self.body);
            return out;
        }

        push_header(
            &mut out,
            "Content-Type",
            &format!("multipart/mixed; boundary=\"{boundary}\""),
        );
        out.push_str("\r\n");

        out.push_str(&format!("--{boundary}\r\n"));
        push_text_part(&mut out, &self.body);

        for attachment in &self.attachments {
            out.push_str(&format!("\r\n--{boundary}\r\n"));
            push_header(&mut out, "Content-Type", &attachment.mime_type);
            push_header(&mut out, "Content-Transfer-Encoding", "base64");
            push_header(
                &mut out,
                "Content-Disposition",
                &format!(
                    "attachment; filename=\"{}\"",
                    attachment.filename.replace('"', "")
                ),
            );
            out.push_str("\r\n");
            push_wrapped_base64(&mut out, &attachment.content);
        }

        out.push_str(&format!("\r\n--{boundary}--\r\n"));
        out
    }

    /// URL-safe base64 of the RFC 2822 text, for the `raw` field
    pub fn to_raw(&self) -> String {
        BASE64_URL_SAFE.encode(self.to_rfc2822(&mime_boundary()))
    }
}

/// CR and LF are dropped so a value cannot start a new header
fn push_header(out: &mut String, name: &str, value: &str) {
    let value: String = value
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect();
    out.push_str(name);
    out.push_str(": ");
    out.push_str(&value);
    out.push_str("\r\n");
}

/// Text part headers plus body; non-ASCII bodies are base64 encoded
fn push_text_part(out: &mut String, body: &str) {
    if body.is_ascii() {
        push_header(out, "Content-Type", "text/plain; charset=\"us-ascii\"");
        push_header(out, "Content-Transfer-Encoding", "7bit");
        out.push_str("\r\n");
        out.push_str(&normalize_newlines(body));
    } else {
        push_header(out, "Content-Type", "text/plain; charset=\"utf-8\"");
        push_header(out, "Content-Transfer-Encoding", "base64");
        out.push_str("\r\n");
        push_wrapped_base64(out, body.as_bytes());
    }
}

fn push_wrapped_base64(out: &mut String, bytes: &[u8]) {
    let encoded = BASE64_STANDARD.encode(bytes);
    // base64 output is ASCII, so byte chunks are valid str slices
    for line in encoded.as_bytes().chunks(LINE_WIDTH) {
        out.push_str(&String::from_utf8_lossy(line));
        out.push_str("\r\n");
    }
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}

/// RFC 2047 encoded-word for non-ASCII header values
fn encode_header_value(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", BASE64_STANDARD.encode(value))
    }
}

fn mime_boundary() -> String {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let hasher = RandomState::new().build_hasher();
    format!("=_satchel_{:016x}", hasher.finish())
}
