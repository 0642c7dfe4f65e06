use crate::StrError;
use thiserror::Error;

/// Defines the result type of the rod core
pub type RodResult<T> = Result<T, Error>;

/// Holds the errors raised by the rod core
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid argument given to an algebraic or query operation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Invalid or missing configuration property
    #[error("configuration error in {context}: {message}")]
    Config { context: String, message: String },

    /// The return mapping did not converge
    #[error(
        "return mapping did not converge at element {element}, ip {ip} after {max_iter} iterations (f = {yield_value:e})"
    )]
    NoConvergence {
        element: usize,
        ip: usize,
        max_iter: usize,
        yield_value: f64,
    },

    /// Failure reported by the linear algebra or mesh libraries
    #[error("numerical error: {0}")]
    Numerical(StrError),
}

impl Error {
    /// Creates an invalid input error
    pub fn invalid_input(details: impl Into<String>) -> Self {
        Error::InvalidInput(details.into())
    }

    /// Creates a configuration error
    pub fn config(context: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            context: context.into(),
            message: message.into(),
        }
    }
}

impl From<StrError> for Error {
    fn from(err: StrError) -> Self {
        Error::Numerical(err)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
