use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("No email addresses available.")]
    NoEmails,
}

pub type Result<T> = std::result::Result<T, Error>;
