//! Error types for the keyscan core library
//!
//! Progress operations themselves never fail. Errors only surface when
//! options are validated or parsed from user input.

use thiserror::Error;

pub mod validation;

pub use self::validation::ValidationError;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the keyscan core library
#[derive(Error, Debug)]
pub enum Error {
    /// Validation related errors
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl Error {
    /// Whether this error was caused by invalid user-supplied configuration
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
