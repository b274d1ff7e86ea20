//! Configuration errors.

use thiserror::Error;

/// Errors raised while configuring a filter.
///
/// All validation happens at construction; `put2` itself never fails.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A parameter is missing or out of range.
    #[error("{filter}: {parameter}: {message}")]
    InvalidArgument {
        /// The filter being configured.
        filter: &'static str,
        /// The offending parameter.
        parameter: &'static str,
        /// What was wrong with it.
        message: String,
    },
}
