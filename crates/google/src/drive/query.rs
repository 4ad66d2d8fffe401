//! Drive search query construction

/// Criteria for [`super::DriveClient::search_files`]
///
/// Present criteria are joined with ` and `; absent ones are left out.
/// Trashed files are excluded unless `include_trashed` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSearch {
    pub name_contains: Option<String>,
    pub mime_type: Option<String>,
    pub folder_id: Option<String>,
    pub include_trashed: bool,
}

impl FileSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name_contains(mut self, name: impl Into<String>) -> Self {
        self.name_contains = Some(name.into());
        self
    }

    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn in_folder(mut self, folder_id: impl Into<String>) -> Self {
        self.folder_id = Some(folder_id.into());
        self
    }

    pub fn include_trashed(mut self, include: bool) -> Self {
        self.include_trashed = include;
        self
    }

    /// Drive `q` expression, `None` when there is nothing to filter on
    pub fn to_query(&self) -> Option<String> {
        let mut clauses = Vec::new();

        if let Some(name) = &self.name_contains {
            clauses.push(format!("name contains {}", quote(name)));
        }
        if let Some(mime_type) = &self.mime_type {
            clauses.push(format!("mimeType = {}", quote(mime_type)));
        }
        if let Some(folder_id) = &self.folder_id {
            clauses.push(format!("{} in parents", quote(folder_id)));
        }
        if !self.include_trashed {
            clauses.push("trashed = false".to_string());
        }

        (!clauses.is_empty()).then(|| clauses.join(" and "))
    }
}

/// Single-quote a literal, escaping backslashes and quotes
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}
