//! Content type detection from file name extensions

use std::path::Path;

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Guess a MIME type from a file name's extension
pub fn guess_mime_type(name: &str) -> Option<&'static str> {
    let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "txt" | "text" | "log" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "tsv" => "text/tab-separated-values",
        "js" | "mjs" => "text/javascript",
        "ics" => "text/calendar",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "rtf" => "application/rtf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "odt" => "application/vnd.oasis.opendocument.text",
        "ods" => "application/vnd.oasis.opendocument.spreadsheet",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "ico" => "image/vnd.microsoft.icon",
        "mp3" => "audio/mpeg",
        "wav" => "audio/x-wav",
        "ogg" => "audio/ogg",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        _ => return None,
    };
    Some(mime)
}

/// Explicit MIME type if given, else a guess from the name, else octet-stream
pub fn mime_type_for(name: &str, explicit: Option<&str>) -> String {
    explicit
        .or_else(|| guess_mime_type(name))
        .unwrap_or(FALLBACK_MIME_TYPE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_common_types() {
        assert_eq!(guess_mime_type("f.txt"), Some("text/plain"));
        assert_eq!(guess_mime_type("Report.PDF"), Some("application/pdf"));
        assert_eq!(guess_mime_type("photo.jpeg"), Some("image/jpeg"));
        assert_eq!(guess_mime_type("/tmp/archive.tar.gz"), Some("application/gzip"));
    }

    #[test]
    fn test_guess_unknown() {
        assert_eq!(guess_mime_type("Makefile"), None);
        assert_eq!(guess_mime_type("data.unknownext"), None);
    }

    #[test]
    fn test_mime_type_for_prefers_explicit() {
        assert_eq!(mime_type_for("f.txt", Some("text/csv")), "text/csv");
        assert_eq!(mime_type_for("f.txt", None), "text/plain");
        assert_eq!(mime_type_for("blob", None), "application/octet-stream");
    }
}
