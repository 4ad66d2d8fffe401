//! Plain-text body extraction
//!
//! Walks the MIME part tree with an explicit stack so a hostile message
//! cannot overflow the call stack.

use base64::prelude::*;
use log::warn;

use super::api::MessagePart;

/// Parts nested deeper than this are ignored
const MAX_PART_DEPTH: usize = 32;

/// Text of every text/plain part in document order, joined with `\n`
///
/// A payload without parts is decoded directly, whatever its type.
/// Returns an empty string when there is no decodable text.
pub fn extract_plain_text_body(payload: &MessagePart) -> String {
    if payload.parts.is_empty() {
        return payload
            .data()
            .and_then(decode_base64_body)
            .unwrap_or_default();
    }

    let mut texts = Vec::new();
    // Children are pushed in reverse so they pop in order
    let mut stack: Vec<(&MessagePart, usize)> =
        payload.parts.iter().rev().map(|part| (part, 1)).collect();

    while let Some((part, depth)) = stack.pop() {
        if part.is_mime_type("text/plain") {
            if let Some(data) = part.data() {
                match decode_base64_body(data) {
                    Some(text) => texts.push(text),
                    None => warn!(
                        "Skipping undecodable text/plain part {}",
                        part.part_id.as_deref().unwrap_or("?")
                    ),
                }
            }
        } else if !part.parts.is_empty() {
            if depth >= MAX_PART_DEPTH {
                warn!("MIME tree deeper than {} levels; truncating", MAX_PART_DEPTH);
                continue;
            }
            stack.extend(part.parts.iter().rev().map(|child| (child, depth + 1)));
        }
    }

    texts.join("\n")
}

/// Decode base64-encoded body data to UTF-8
///
/// Gmail uses URL-safe base64 but padding can vary, so several decoders are tried.
pub fn decode_base64_body(data: &str) -> Option<String> {
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE};

    let decoders: [&base64::engine::GeneralPurpose; 4] =
        [&BASE64_URL_SAFE_NO_PAD, &URL_SAFE, &STANDARD, &STANDARD_NO_PAD];

    decoders
        .iter()
        .find_map(|decoder| decoder.decode(data).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok())
}
