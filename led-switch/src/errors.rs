use log::error;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Runtime error: Are you sure your code runs inside a tokio runtime?
    Runtime,
    /// Transport error: {source}.
    Transport { source: TransportError },
    /// Configuration error: {source}.
    Config { source: ConfigError },
    /// Invalid status: '{body}' is not an integer.
    InvalidStatus { body: String },
    /// Element '{id}' has no '{attribute}' attribute.
    MissingAttribute { id: String, attribute: String },
}

impl From<TransportError> for Error {
    fn from(value: TransportError) -> Self {
        Self::Transport { source: value }
    }
}

impl From<ConfigError> for Error {
    fn from(value: ConfigError) -> Self {
        Self::Config { source: value }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        error!("std::io error {:?}", error);
        Self::Transport {
            source: TransportError::Io {
                info: error.to_string(),
            },
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TransportError {
    /// {method} {url} failed - {info}
    RequestFailed {
        method: &'static str,
        url: String,
        info: String,
    },
    /// {method} {url} answered {status} - '{body}'
    BadStatus {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },
    /// Invalid url '{url}' - {info}
    InvalidUrl { url: String, info: String },
    /// HTTP client could not be built - {info}
    ClientBuild { info: String },
    /// I/O error - {info}
    Io { info: String },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// Invalid value '{value}' for {key} - {info}
    InvalidValue {
        key: &'static str,
        value: String,
        info: String,
    },
}
