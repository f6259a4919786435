use crate::extract::ExtractionResult;
use crate::model::EmailAddress;
use crate::{Error, Result};
use serde::Serialize;

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Outcome message of a contact-list action, rendered by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.level == NoticeLevel::Success
    }
}

/// One row of the contact list: an address and the page it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailAddress>,
    pub source: String,
}

/// Accumulates extraction results across several pages
///
/// A source URL is recorded at most once; a second attempt is reported as an
/// error notice and leaves the list untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ContactList {
    entries: Vec<ContactEntry>,
}

impl ContactList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the addresses extracted from `source`
    pub fn record(&mut self, source: &str, emails: &ExtractionResult) -> Notice {
        let source = source.trim();

        if self.has_source(source) {
            return Notice::error("This URL has already been processed.");
        }

        if emails.is_empty() {
            return Notice::error("No emails found!");
        }

        for email in emails.iter() {
            let entry = ContactEntry {
                email: Some(email.clone()),
                source: source.to_string(),
            };
            if !self.entries.contains(&entry) {
                self.entries.push(entry);
            }
        }

        tracing::debug!(
            "Recorded {} address(es) from {} ({} rows total)",
            emails.len(),
            source,
            self.entries.len()
        );

        Notice::success("Email details extracted successfully!")
    }

    pub fn has_source(&self, source: &str) -> bool {
        let source = source.trim();
        self.entries.iter().any(|entry| entry.source == source)
    }

    pub fn entries(&self) -> &[ContactEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every address in row order, duplicates across sources included
    pub fn emails(&self) -> impl Iterator<Item = &EmailAddress> {
        self.entries.iter().filter_map(|entry| entry.email.as_ref())
    }

    /// Comma-separated list for pasting into a mail client
    /// Clipboard text for a single row
    pub fn copy(&self, email: &EmailAddress) -> (String, Notice) {
        (email.to_string(), Notice::success(format!("{} copied!", email)))
    }

    pub fn copy_all(&self) -> (String, Notice) {
        let joined = self
            .emails()
            .map(EmailAddress::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        (joined, Notice::success("All emails copied!"))
    }

    /// `mailto:` link that BCCs every address with a prefilled subject and body
    pub fn bulk_mailto(&self, subject: &str, body: &str) -> Result<String> {
        let recipients = self
            .emails()
            .map(EmailAddress::as_str)
            .collect::<Vec<_>>()
            .join(",");

        if recipients.is_empty() {
            return Err(Error::NoEmails);
        }

        Ok(format!(
            "mailto:?bcc={}&subject={}&body={}",
            urlencoding::encode(&recipients),
            urlencoding::encode(subject),
            urlencoding::encode(body)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;

    const NO_TARGETS: [&str; 0] = [];

    fn emails(text: &str) -> ExtractionResult {
        extract(text, &NO_TARGETS)
    }

    #[test]
    fn test_record_adds_one_row_per_email() {
        let mut list = ContactList::new();
        let notice = list.record("https://acme.com", &emails("a@acme.com b@acme.com"));

        assert!(notice.is_success());
        assert_eq!(notice.message, "Email details extracted successfully!");
        assert_eq!(list.len(), 2);
        assert!(list.entries().iter().all(|e| e.source == "https://acme.com"));
    }

    #[test]
    fn test_record_rejects_repeated_source() {
        let mut list = ContactList::new();
        list.record("https://acme.com", &emails("a@acme.com"));

        let notice = list.record("https://acme.com", &emails("new@acme.com"));

        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "This URL has already been processed.");
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_record_reports_empty_result() {
        let mut list = ContactList::new();
        let notice = list.record("https://empty.example", &ExtractionResult::new());

        assert_eq!(notice, Notice::error("No emails found!"));
        assert!(list.is_empty());
        assert!(!list.has_source("https://empty.example"));
    }

    #[test]
    fn test_same_email_from_two_sources_keeps_both_rows() {
        let mut list = ContactList::new();
        list.record("https://one.example", &emails("team@shared.io"));
        list.record("https://two.example", &emails("team@shared.io"));

        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_copy_all_joins_with_comma_space() {
        let mut list = ContactList::new();
        list.record("https://one.example", &emails("x@one.io"));
        list.record("https://two.example", &emails("y@two.io"));

        let (text, notice) = list.copy_all();
        assert_eq!(text, "x@one.io, y@two.io");
        assert_eq!(notice.message, "All emails copied!");
    }

    #[test]
    fn test_copy_single_row() {
        let mut list = ContactList::new();
        list.record("https://one.example", &emails("x@one.io"));

        let email = list.entries()[0].email.clone().unwrap();
        let (text, notice) = list.copy(&email);
        assert_eq!(text, "x@one.io");
        assert_eq!(notice.message, "x@one.io copied!");
        assert_eq!(notice.level, NoticeLevel::Success);
    }

    #[test]
    fn test_bulk_mailto_encodes_fields() {
        let mut list = ContactList::new();
        list.record("https://one.example", &emails("a@x.com b@y.com"));

        let link = list.bulk_mailto("Hello there", "Line one").unwrap();
        assert_eq!(
            link,
            "mailto:?bcc=a%40x.com%2Cb%40y.com&subject=Hello%20there&body=Line%20one"
        );
    }

    #[test]
    fn test_bulk_mailto_requires_addresses() {
        let list = ContactList::new();
        let err = list.bulk_mailto("s", "b").unwrap_err();
        assert_eq!(err.to_string(), "No email addresses available.");
    }

    #[test]
    fn test_notice_serializes_level_lowercase() {
        let json = serde_json::to_value(Notice::error("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"level": "error", "message": "boom"}));
    }
}
