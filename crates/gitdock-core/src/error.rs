use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("branch name must not be empty")]
    InvalidBranchName,

    #[error("no remote configured for this operation")]
    NoRemoteConfigured,

    #[error("unknown event tag: {0}")]
    UnknownEvent(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("authorization error: {0}")]
    Auth(String),

    #[error("{0}")]
    Unsupported(&'static str),

    #[error("io error: {0:?}")]
    Io(std::io::ErrorKind),
}

impl Error {
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.kind())
    }
}
