//! Gmail search query builder
//!
//! Gmail treats space-separated terms as AND. Unset criteria add nothing.

use chrono::NaiveDate;

/// Structured message search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageSearch {
    pub from: Option<String>,
    pub to: Option<String>,
    pub subject: Option<String>,
    /// Messages received on or after this date
    pub after: Option<NaiveDate>,
    /// Messages received before this date
    pub before: Option<NaiveDate>,
    /// `Some(true)` requires an attachment, `Some(false)` excludes them
    pub has_attachment: Option<bool>,
    /// `Some(true)` for unread only, `Some(false)` for read only
    pub unread: Option<bool>,
}

impl MessageSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(mut self, sender: impl Into<String>) -> Self {
        self.from = Some(sender.into());
        self
    }

    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.to = Some(recipient.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn after(mut self, date: NaiveDate) -> Self {
        self.after = Some(date);
        self
    }

    pub fn before(mut self, date: NaiveDate) -> Self {
        self.before = Some(date);
        self
    }

    pub fn has_attachment(mut self, has_attachment: bool) -> Self {
        self.has_attachment = Some(has_attachment);
        self
    }

    pub fn unread(mut self, unread: bool) -> Self {
        self.unread = Some(unread);
        self
    }

    /// Render as a Gmail `q` expression
    pub fn to_query(&self) -> String {
        let mut terms = Vec::new();

        if let Some(from) = non_empty(&self.from) {
            terms.push(format!("from:{from}"));
        }
        if let Some(to) = non_empty(&self.to) {
            terms.push(format!("to:{to}"));
        }
        if let Some(subject) = non_empty(&self.subject) {
            if subject.contains(char::is_whitespace) {
                terms.push(format!("subject:({subject})"));
            } else {
                terms.push(format!("subject:{subject}"));
            }
        }
        if let Some(after) = self.after {
            terms.push(format!("after:{}", after.format("%Y/%m/%d")));
        }
        if let Some(before) = self.before {
            terms.push(format!("before:{}", before.format("%Y/%m/%d")));
        }
        match self.has_attachment {
            Some(true) => terms.push("has:attachment".to_string()),
            Some(false) => terms.push("-has:attachment".to_string()),
            None => {}
        }
        match self.unread {
            Some(true) => terms.push("is:unread".to_string()),
            Some(false) => terms.push("is:read".to_string()),
            None => {}
        }

        terms.join(" ")
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_and_unread() {
        let search = MessageSearch::new().from("a@x.com").unread(true);
        assert_eq!(search.to_query(), "from:a@x.com is:unread");
    }

    #[test]
    fn test_empty_search() {
        assert_eq!(MessageSearch::new().to_query(), "");
        assert_eq!(MessageSearch::new().from("  ").to_query(), "");
    }

    #[test]
    fn test_all_clauses_in_order() {
        let search = MessageSearch::new()
            .from("boss@example.com")
            .to("me@example.com")
            .subject("quarterly report")
            .after(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
            .before(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
            .has_attachment(true)
            .unread(false);

        assert_eq!(
            search.to_query(),
            "from:boss@example.com to:me@example.com subject:(quarterly report) \
             after:2024/01/05 before:2024/02/01 has:attachment is:read"
        );
    }

    #[test]
    fn test_exclude_attachments() {
        let search = MessageSearch::new().subject("invoice").has_attachment(false);
        assert_eq!(search.to_query(), "subject:invoice -has:attachment");
    }
}
