use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset file not found, expected at: {}", .0.display())]
    MissingDataset(PathBuf),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Request(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
