//! Error types for the automatic differentiation crate.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
/// Error variants for stack and argument validation.
pub enum AdError {
    #[error("{function}: {argument} is {value}, but must be {requirement}")]
    /// An argument failed a domain check.
    Domain {
        /// Function that performed the check.
        function: &'static str,
        /// Name of the offending argument.
        argument: &'static str,
        /// Offending value.
        value: f64,
        /// Human readable requirement, e.g. "positive".
        requirement: &'static str,
    },
    #[error("handle was created on a different stack")]
    /// A handle was passed to a stack that did not record it.
    ForeignHandle,
    #[error("invalid configuration: {0}")]
    /// A configuration value could not be parsed.
    Config(String),
}

/// Convenience alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, AdError>;
