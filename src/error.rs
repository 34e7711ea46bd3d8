use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;
pub type TransportResult<T> = std::result::Result<T, TransportError>;
pub type TokenReaderResult<T> = std::result::Result<T, TokenReaderError>;

/// Errors raised to the caller.
///
/// Only structural mistakes are raised. Provider and network failures are
/// reported as `None` / `false` by the client instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration : {0}")]
    Configuration(String),
    #[error("missing required parameter : {0}")]
    MissingParameter(String),
    #[error("malformed callback url : {key} not found in {url}")]
    MalformedCallback { key: &'static str, url: String },
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request failed : {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("authorization header could not be built : {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),
}

#[derive(Error, Debug, Clone)]
pub enum TokenReaderError {
    #[error("response has malformed format: not found {0} in {1}")]
    TokenKeyNotFound(&'static str, String),
}
