//! Character-level Markov noise for training-data augmentation.
//!
//! This crate provides:
//! - A forward/reverse character n-gram model stored as a pair of tries
//! - Conversion of the model to and from a plain nested mapping
//! - Stochastic, reproducible character substitution driven by the model
//! - A parallel corpus builder and a lock-guarded shared handle
//!
//! The trie itself is kept internal; callers only see the model API and the
//! dump mapping.

/// Error taxonomy shared by every operation.
pub mod error;

/// Markov model, its serialization and the replacement algorithm.
pub mod model;

/// Multi-threaded model construction from a corpus of lines.
pub mod corpus;

pub use error::{NoiseError, Result};
pub use model::markov_model::{DEFAULT_DEPTH, MarkovModel};
pub use model::replace_options::{ReplaceOptions, WhitespacePolicy};
pub use model::serializer::{TrieDump, TrieEntry, TrieMap};
pub use model::shared::SharedModel;
