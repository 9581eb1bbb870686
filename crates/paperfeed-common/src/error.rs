use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaperError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Paper record is not a JSON object")]
    NotAnObject,
}

pub type Result<T> = std::result::Result<T, PaperError>;
