//! Error taxonomy shared by every model operation.
//!
//! All errors are local and synchronous. None of them is retryable as-is:
//! the caller corrects the argument (or reloads the model) and reissues.

use thiserror::Error;

/// Errors raised by `MarkovModel` and its helpers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NoiseError {
	/// An argument is out of range (depth, probability, weight, stride, policy).
	///
	/// Always detected before any work is done.
	#[error("invalid configuration: {0}")]
	InvalidConfiguration(String),

	/// A counter would exceed `u32::MAX`.
	///
	/// The model is saturated afterwards and refuses to index until a successful `load`.
	#[error("capacity exceeded: {0}")]
	CapacityExceeded(String),

	/// A `load` mapping has the wrong shape.
	///
	/// The model is left untouched.
	#[error("format error: {0}")]
	FormatError(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, NoiseError>;
