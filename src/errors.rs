use thiserror::Error;

/// Failure taxonomy shared by the auth and content paths.
///
/// Every library operation returns one of these instead of panicking or
/// leaking transport internals. `Transport` keeps the underlying cause so it
/// can be logged; the other variants are outcomes the caller renders or acts
/// upon. No variant triggers an automatic retry.
#[derive(Debug, Error)]
pub enum AppError {
    /// Every realm rejected the credential, or the server refused a signup.
    /// Carries the message to show the user.
    #[error("{0}")]
    InvalidCredentials(String),

    /// The confirmation secret did not match; nothing was sent to the server.
    #[error("passwords do not match")]
    Mismatch,

    /// A missing session, or a previously valid one rejected mid-use.
    #[error("not signed in or session expired")]
    Unauthorized,

    /// Network unreachable, malformed response, or a 5xx-class failure.
    #[error("transport error: {0}")]
    Transport(#[source] anyhow::Error),
}

impl AppError {
    pub(crate) fn transport(err: impl Into<anyhow::Error>) -> Self {
        Self::Transport(err.into())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err)
    }
}
