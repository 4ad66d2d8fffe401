//! Plain-text projection of a Docs document
//!
//! Lossy by construction: only text runs inside top-level paragraphs are
//! kept. Tables, section breaks, tables of contents and inline objects are
//! skipped.

use super::api::Document;

/// Concatenate the literal text runs of every top-level paragraph
pub fn extract_text(document: &Document) -> String {
    let Some(body) = &document.body else {
        return String::new();
    };

    body.content
        .iter()
        .filter_map(|element| element.paragraph.as_ref())
        .flat_map(|paragraph| paragraph.elements.iter())
        .filter_map(|element| element.text_run.as_ref())
        .map(|run| run.content.as_str())
        .collect()
}

/// A search hit inside extracted document text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatch {
    pub text: String,
    /// Character offset of the first matched character
    pub start_index: usize,
    /// Character offset one past the last matched character
    pub end_index: usize,
}

/// Every (possibly overlapping) occurrence of `term` in `text`
///
/// Offsets count characters, not bytes. An empty term matches nothing.
pub fn find_matches(text: &str, term: &str) -> Vec<TextMatch> {
    if term.is_empty() {
        return Vec::new();
    }

    let term_chars = term.chars().count();
    let mut matches = Vec::new();
    let mut char_offset = 0;
    let mut byte_offset = 0;

    while let Some(found) = text[byte_offset..].find(term) {
        let match_byte = byte_offset + found;
        char_offset += text[byte_offset..match_byte].chars().count();
        matches.push(TextMatch {
            text: term.to_string(),
            start_index: char_offset,
            end_index: char_offset + term_chars,
        });

        // Step one character forward so overlapping matches are found
        let step = text[match_byte..].chars().next().map_or(1, char::len_utf8);
        byte_offset = match_byte + step;
        char_offset += 1;
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(json: serde_json::Value) -> Document {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_extract_skips_tables() {
        let doc = document(serde_json::json!({
            "documentId": "doc1",
            "body": {"content": [
                {"sectionBreak": {}},
                {"paragraph": {"elements": [{"textRun": {"content": "Hello"}}]}},
                {"table": {"rows": 1, "columns": 1, "tableRows": [
                    {"tableCells": [{"content": [
                        {"paragraph": {"elements": [{"textRun": {"content": "cell"}}]}}
                    ]}]}
                ]}}
            ]}
        }));

        assert_eq!(extract_text(&doc), "Hello");
        // Unchanged document, same projection
        assert_eq!(extract_text(&doc), extract_text(&doc));
    }

    #[test]
    fn test_extract_joins_runs_and_skips_inline_objects() {
        let doc = document(serde_json::json!({
            "documentId": "doc1",
            "body": {"content": [
                {"paragraph": {"elements": [
                    {"textRun": {"content": "Dear "}},
                    {"inlineObjectElement": {"inlineObjectId": "img"}},
                    {"textRun": {"content": "team,\n"}}
                ]}},
                {"paragraph": {"elements": [{"textRun": {"content": "Thanks\n"}}]}}
            ]}
        }));

        assert_eq!(extract_text(&doc), "Dear team,\nThanks\n");
    }

    #[test]
    fn test_extract_without_body() {
        let doc = document(serde_json::json!({"documentId": "empty"}));
        assert_eq!(extract_text(&doc), "");
    }

    #[test]
    fn test_find_matches_overlapping() {
        let matches = find_matches("aaaa", "aa");
        let starts: Vec<usize> = matches.iter().map(|m| m.start_index).collect();
        assert_eq!(starts, vec![0, 1, 2]);
        assert_eq!(matches[0].end_index, 2);
    }

    #[test]
    fn test_find_matches_counts_characters() {
        let matches = find_matches("héllo wörld wörld", "wörld");
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].start_index, 6);
        assert_eq!(matches[0].end_index, 11);
        assert_eq!(matches[1].start_index, 12);
    }

    #[test]
    fn test_find_matches_empty_term() {
        assert!(find_matches("anything", "").is_empty());
    }
}
