//! Email extraction pipeline
//!
//! Two regex stages run over the harvested material. The first is permissive
//! and finds address-shaped substrings anywhere in page markup. The second is
//! strict and drops whatever the first one (or a mailto anchor) let through
//! that is not a plausible address.

use crate::model::EmailAddress;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

lazy_static! {
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap();
    static ref STRICT_EMAIL: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

const MAILTO_PREFIX: &str = "mailto:";

/// Deduplicated set of normalized addresses found on one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExtractionResult {
    emails: BTreeSet<EmailAddress>,
}

impl ExtractionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    /// Case-insensitive membership test
    pub fn contains(&self, email: &str) -> bool {
        let needle = email.to_lowercase();
        self.emails.iter().any(|candidate| candidate.as_str() == needle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmailAddress> {
        self.emails.iter()
    }

    /// Plain strings, in the set's iteration order
    pub fn to_strings(&self) -> Vec<String> {
        self.emails.iter().map(ToString::to_string).collect()
    }
}

impl FromIterator<EmailAddress> for ExtractionResult {
    fn from_iter<I: IntoIterator<Item = EmailAddress>>(iter: I) -> Self {
        Self {
            emails: iter.into_iter().collect(),
        }
    }
}

/// Extract every address from page text and mailto targets
///
/// Pattern matches come first, stripped mailto targets second; both are
/// lower-cased, deduplicated and passed through [`is_valid_email`]. Empty
/// input yields an empty result.
pub fn extract<S: AsRef<str>>(page_text: &str, mailto_targets: &[S]) -> ExtractionResult {
    let matched = EMAIL_PATTERN.find_iter(page_text).map(|m| m.as_str());
    let harvested = mailto_targets
        .iter()
        .map(|target| strip_mailto(target.as_ref()));

    let unique: BTreeSet<String> = matched.chain(harvested).map(str::to_lowercase).collect();

    let result: ExtractionResult = unique
        .into_iter()
        .filter(|candidate| is_valid_email(candidate))
        .map(EmailAddress::from_normalized)
        .collect();

    tracing::debug!(
        "Extracted {} address(es) from {} bytes of text and {} mailto target(s)",
        result.len(),
        page_text.len(),
        mailto_targets.len()
    );

    result
}

/// Strict shape check: `local@domain.tld`, a single `@`, no whitespace
pub fn is_valid_email(candidate: &str) -> bool {
    STRICT_EMAIL.is_match(candidate)
}

/// Remove a leading `mailto:` in any letter case
pub fn strip_mailto(target: &str) -> &str {
    match target.get(..MAILTO_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(MAILTO_PREFIX) => {
            &target[MAILTO_PREFIX.len()..]
        }
        _ => target,
    }
}
