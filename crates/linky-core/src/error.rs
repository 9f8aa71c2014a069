use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Record errors
    #[error("Malformed dataset: {0}")]
    MalformedDataset(String),

    #[error("Invalid value for {label}: {value:?}")]
    InvalidValue { label: String, value: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
