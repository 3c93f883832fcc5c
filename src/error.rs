//! Error taxonomy shared by the client adapter, the views and the router.
//!
//! Errors travel inside result messages, so they are `Clone` and carry the
//! rendered text rather than the underlying source.

use crate::concourse::outcome;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// `fly` could not be started, timed out, or printed something that is not
    /// the structured data we asked for.
    #[error("{0}")]
    CommandExecution(String),

    /// `fly` ran and refused a mutating operation. Carries its own diagnostic.
    #[error("{0}")]
    OperationRejected(String),

    /// The target needs a (re)login before anything else will work.
    #[error("{0}")]
    AuthenticationRequired(String),

    /// Local form input problem; nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// The selected build's name is not the plain integer `rerun-build` wants.
    #[error("Invalid build number {0}")]
    MalformedBuildNumber(String),
}

impl Error {
    /// True when this error should send the user through the login flow
    /// instead of being displayed inline.
    pub fn requires_auth(&self) -> bool {
        matches!(self, Error::AuthenticationRequired(_)) || outcome::is_auth_error(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
