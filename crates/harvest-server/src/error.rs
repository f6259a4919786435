use http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] harvest_browser::Error),

    #[error("Server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<harvest_core::Error> for Error {
    fn from(err: harvest_core::Error) -> Self {
        match err {
            harvest_core::Error::Validation(message) => Error::Validation(message),
            other => Error::Server(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
