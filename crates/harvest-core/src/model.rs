use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw material handed from the page fetcher to the extractor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPage {
    /// Serialized document (HTML or plain text)
    pub text: String,
    /// `href` values of mailto anchors, prefix still attached
    pub mailto_targets: Vec<String>,
}

impl RawPage {
    pub fn new(text: impl Into<String>, mailto_targets: Vec<String>) -> Self {
        Self {
            text: text.into(),
            mailto_targets,
        }
    }
}

/// A lower-cased address that passed the strict validator
///
/// Outside this crate the only way to build one is [`EmailAddress::parse`],
/// so every value held by this type is normalized and valid.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Normalize `raw` to lower case and validate it
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.to_lowercase();
        if crate::extract::is_valid_email(&normalized) {
            Some(Self(normalized))
        } else {
            None
        }
    }

    /// Wrap a candidate the extractor already lower-cased and validated
    pub(crate) fn from_normalized(normalized: String) -> Self {
        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Search terms for the business-listing scraper
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ListingQuery {
    pub query: String,
    #[serde(default)]
    pub location: String,
}

impl ListingQuery {
    /// Build a query, rejecting a blank search term
    pub fn new(query: impl Into<String>, location: impl Into<String>) -> Result<Self> {
        let query = Self {
            query: query.into(),
            location: location.into(),
        };
        query.validate()?;
        Ok(query)
    }

    /// Check the invariants a deserialized query may not satisfy
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(Error::Validation("query is required".to_string()));
        }
        Ok(())
    }

    /// The free-text search string sent to the listing site
    pub fn search_terms(&self) -> String {
        let location = self.location.trim();
        if location.is_empty() {
            self.query.trim().to_string()
        } else {
            format!("{} {}", self.query.trim(), location)
        }
    }
}

/// One business card from a listing search
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Listing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl Listing {
    /// Collapse blank fields to `None` and trim the rest
    pub fn normalized(self) -> Self {
        fn clean(field: Option<String>) -> Option<String> {
            field
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        }

        Self {
            title: clean(self.title),
            link: clean(self.link),
            address: clean(self.address),
            website: clean(self.website),
        }
    }
}
