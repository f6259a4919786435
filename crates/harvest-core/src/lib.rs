pub mod contacts;
pub mod error;
pub mod extract;
pub mod model;

pub use contacts::{ContactEntry, ContactList, Notice, NoticeLevel};
pub use error::{Error, Result};
pub use extract::{ExtractionResult, extract, is_valid_email, strip_mailto};
pub use model::{EmailAddress, Listing, ListingQuery, RawPage};
