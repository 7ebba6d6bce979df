//! Top-level module for the Markov noise model.
//!
//! It contains:
//! - The trie store (`node`) and character classes (`charset`)
//! - The forward/reverse model and its indexer (`MarkovModel`)
//! - Dump/load of the tries (`TrieDump`)
//! - Count lookup, normalization and sampling (`probability`)
//! - The replacement algorithm and its parameters (`ReplaceOptions`)
//! - A thread-safe handle (`SharedModel`)

/// Printable Latin-1 and whitespace classification.
pub mod charset;

/// Trie node owning its children and successor counters.
///
/// Internal: only the model allocates and walks nodes.
mod node;

/// Forward/reverse n-gram model (`depth >= 2`).
///
/// Handles indexing, saturation and model merging.
pub mod markov_model;

/// `dump` / `load` between the tries and the nested `TrieDump` mapping.
pub mod serializer;

/// Context lookup, normalization and deterministic sampling.
pub mod probability;

/// Parameters of `replace` and the whitespace policy.
pub mod replace_options;

/// Per-character substitution over a whole string.
mod replace;

/// `RwLock`-guarded model shared between threads.
pub mod shared;
