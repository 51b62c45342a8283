use thiserror::Error;

/// Failure inside a single source adapter.
///
/// These never escape the fan-out: [`crate::source::query_source`] turns every
/// variant into an empty, `failed` [`crate::source::SourceResult`].
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("source responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("source requires an authenticated viewer")]
    Unauthenticated,

    #[error("invalid source configuration: {0}")]
    Config(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be > 0")]
    Zero { field: &'static str },

    #[error("{field} is out of range: {detail}")]
    OutOfRange { field: &'static str, detail: String },

    #[error("directory sigil must not be whitespace")]
    WhitespaceSigil,
}
