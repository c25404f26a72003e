use std::io;
use thiserror::Error;

/// Errors surfaced by pipeline setup and by the collector-side decoders.
///
/// The logging hot path never returns one of these: a rejected message is
/// reported as `false` and a failed delivery is not reported at all.
#[derive(Debug, Error)]
pub enum Error {
    #[error("No token configured, telemetry pipeline not initialized")]
    MissingToken,

    #[error("Write interval must be greater than zero (got {0} ms)")]
    InvalidInterval(u64),

    #[error("Maximum message length must be greater than zero")]
    InvalidMaxLength,

    #[error("Failed to parse configuration ({0})")]
    Config(#[from] serde_yaml::Error),

    #[error(
        "Encountered an IO error while reading the configuration ({})",
        .0.kind()
    )]
    Io(#[from] io::Error),

    #[error("Could not schedule a flush ({})", .0.kind())]
    Timer(#[source] io::Error),

    #[error("Invalid compressed code stream: {0}")]
    InvalidCodeStream(String),

    #[error("Malformed request target: {0}")]
    MalformedRequest(String),

    #[error("Failed to build the HTTP dispatcher ({0})")]
    HttpClient(String),
}

impl Error {
    pub(crate) fn code_stream<S: AsRef<str>>(reason: S) -> Self {
        Error::InvalidCodeStream(reason.as_ref().to_owned())
    }

    pub(crate) fn malformed<S: AsRef<str>>(reason: S) -> Self {
        Error::MalformedRequest(reason.as_ref().to_owned())
    }
}
