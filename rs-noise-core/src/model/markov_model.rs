use log::{debug, trace, warn};

use super::charset::window_keys;
use super::node::TrieNode;
use super::probability::Direction;
use crate::error::{NoiseError, Result};

/// Default n-gram length: two context characters plus the predicted one.
pub const DEFAULT_DEPTH: usize = 3;

/// Character-level n-gram model in both reading directions.
///
/// The `MarkovModel` keeps two tries:
/// - `forward`: the `depth - 1` characters before a position predict it
/// - `reverse`: the `depth - 1` characters after a position, read from the
///   far end back towards it, predict it
///
/// # Responsibilities
/// - Build both tries from text (`index`)
/// - Render and rebuild them through the `TrieDump` mapping (`dump` / `load`)
/// - Provide the statistics used by `replace`
///
/// # Invariants
/// - `depth` is always >= 2 and never changes
/// - Only printable Latin-1 characters are ever used as keys
/// - No counter wraps: the first would-be overflow saturates the model, and a
///   saturated model refuses to index until the next successful `load`
/// - `replace` never mutates the tries
#[derive(Clone, Debug)]
pub struct MarkovModel {
	/// The order of the model (number of characters in the n-gram)
	depth: usize, // must be >= 2

	pub(crate) forward: TrieNode,
	pub(crate) reverse: TrieNode,

	/// Set once a counter could not be incremented (or was loaded at its maximum)
	capacity_full: bool,
}

impl Default for MarkovModel {
	/// Returns an empty model of depth `DEFAULT_DEPTH`.
	fn default() -> Self {
		Self {
			depth: DEFAULT_DEPTH,
			forward: TrieNode::new(),
			reverse: TrieNode::new(),
			capacity_full: false,
		}
	}
}

impl MarkovModel {
	/// Creates an empty model of n-gram length `depth`.
	///
	/// # Errors
	/// Returns `InvalidConfiguration` if `depth < 2`.
	pub fn new(depth: usize) -> Result<Self> {
		if depth < 2 {
			return Err(NoiseError::InvalidConfiguration(format!(
				"depth must be >= 2, got {}",
				depth
			)));
		}
		Ok(Self { depth, ..Self::default() })
	}

	/// Returns the n-gram length fixed at construction.
	pub fn depth(&self) -> usize {
		self.depth
	}

	/// Returns `true` once the model refuses further indexing.
	pub fn is_saturated(&self) -> bool {
		self.capacity_full
	}

	/// Returns `true` if nothing was indexed or loaded yet.
	pub fn is_empty(&self) -> bool {
		self.forward.is_empty() && self.reverse.is_empty()
	}

	pub(crate) fn root(&self, direction: Direction) -> &TrieNode {
		match direction {
			Direction::Forward => &self.forward,
			Direction::Reverse => &self.reverse,
		}
	}

	/// Replaces both tries at once and recomputes the saturation flag.
	pub(crate) fn install(&mut self, forward: TrieNode, reverse: TrieNode) {
		self.capacity_full = forward.has_saturated_count() || reverse.has_saturated_count();
		self.forward = forward;
		self.reverse = reverse;
		if self.capacity_full {
			warn!("loaded model holds a counter at its maximum; indexing is disabled");
		}
	}

	pub(crate) fn saturate(&mut self) {
		if !self.capacity_full {
			warn!("markov model saturated; indexing is disabled until the next load");
		}
		self.capacity_full = true;
	}

	/// Indexes every `depth`-character window of `text`.
	///
	/// For a window `w`:
	/// - forward: the path `w[0] .. w[depth - 2]` gets one more `w[depth - 1]`
	/// - reverse: the path `w[depth - 1] .. w[1]` gets one more `w[0]`
	///
	/// A window containing any character that is not printable Latin-1 is
	/// skipped as a whole, in both directions.
	///
	/// # Returns
	/// The number of windows indexed.
	///
	/// # Errors
	/// Returns `CapacityExceeded` if the model is already saturated, or if a
	/// counter would overflow. In the latter case the failing window is not
	/// counted at all (both counters are checked before either moves), the
	/// windows before it stay counted and the model becomes saturated.
	pub fn index(&mut self, text: &str, debug: bool) -> Result<usize> {
		if self.capacity_full {
			return Err(NoiseError::CapacityExceeded(
				"model capacity is full, cannot index more text".to_owned(),
			));
		}

		let chars: Vec<char> = text.chars().collect();
		if chars.len() < self.depth {
			if debug {
				debug!("text too short to index: {} chars, depth {}", chars.len(), self.depth);
			}
			return Ok(0);
		}

		let mut indexed = 0;
		for window in chars.windows(self.depth) {
			let Some(keys) = window_keys(window) else {
				if debug {
					debug!("skipping window {:?}: not printable latin-1", window.iter().collect::<String>());
				}
				continue;
			};

			let (forward_path, forward_next) = forward_split(&keys);
			let (reverse_path, reverse_next) = reverse_split(&keys);

			if self.forward.count_at(forward_path, forward_next) == u32::MAX
				|| self.reverse.count_at(&reverse_path, reverse_next) == u32::MAX
			{
				self.saturate();
				return Err(NoiseError::CapacityExceeded(format!(
					"character count overflow while indexing {:?}",
					window.iter().collect::<String>()
				)));
			}

			// Both counters are below the maximum, the increments cannot fail.
			self.forward.descend_or_insert(forward_path).increment(forward_next);
			self.reverse.descend_or_insert(&reverse_path).increment(reverse_next);

			if debug {
				debug!("indexed window {:?}", window.iter().collect::<String>());
			}
			indexed += 1;
		}

		trace!("indexed {} n-grams of depth {}", indexed, self.depth);
		Ok(indexed)
	}

	/// Merges another model into this one.
	///
	/// # Notes
	/// - Both models must have the same `depth`.
	/// - Counts of matching paths are summed.
	/// - All-or-nothing: the tries are only touched if every sum fits.
	///
	/// # Errors
	/// - `InvalidConfiguration` if the depths differ.
	/// - `CapacityExceeded` if a sum would overflow. This model keeps its
	///   counts but becomes saturated.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.depth != other.depth {
			return Err(NoiseError::InvalidConfiguration(format!(
				"depth mismatch: self={}, other={}",
				self.depth, other.depth
			)));
		}

		if !self.forward.can_merge(&other.forward) || !self.reverse.can_merge(&other.reverse) {
			self.saturate();
			return Err(NoiseError::CapacityExceeded(
				"character count overflow while merging models".to_owned(),
			));
		}

		self.forward.merge(&other.forward);
		self.reverse.merge(&other.reverse);
		self.capacity_full |= other.capacity_full;
		Ok(())
	}
}

/// Splits window keys into the forward context and the predicted byte.
fn forward_split(keys: &[u8]) -> (&[u8], u8) {
	let (context, next) = keys.split_at(keys.len() - 1);
	(context, next[0])
}

/// Builds the reverse context (window end first) and the predicted byte.
fn reverse_split(keys: &[u8]) -> (Vec<u8>, u8) {
	(keys[1..].iter().rev().copied().collect(), keys[0])
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn depth_below_two_is_rejected() {
		assert!(matches!(MarkovModel::new(1), Err(NoiseError::InvalidConfiguration(_))));
		assert!(matches!(MarkovModel::new(0), Err(NoiseError::InvalidConfiguration(_))));
		assert_eq!(MarkovModel::new(2).map(|m| m.depth()), Ok(2));
		assert_eq!(MarkovModel::default().depth(), DEFAULT_DEPTH);
	}

	#[test]
	fn index_counts_windows() {
		let mut model = MarkovModel::default();
		assert_eq!(model.index("abcd", false), Ok(2));
		assert_eq!(model.index("", false), Ok(0));
		assert_eq!(model.index("ab", false), Ok(0));
		assert_eq!(model.index("абв", false), Ok(0));
	}

	#[test]
	fn index_updates_both_directions() {
		let mut model = MarkovModel::default();
		model.index("abc", true).unwrap();
		assert_eq!(model.forward.count_at(b"ab", b'c'), 1);
		assert_eq!(model.reverse.count_at(b"cb", b'a'), 1);
		assert_eq!(model.forward.count_at(b"cb", b'a'), 0);
	}

	#[test]
	fn invalid_window_is_skipped_entirely() {
		let mut model = MarkovModel::default();
		// Only "def" survives: every other window touches the tab or the euro sign.
		assert_eq!(model.index("a\tb€def", false), Ok(1));
		assert!(model.forward.descend(b"a").is_none());
		assert!(model.reverse.descend(b"b").is_none());
		assert_eq!(model.forward.count_at(b"de", b'f'), 1);
	}

	#[test]
	fn depth_two_uses_single_character_context() {
		let mut model = MarkovModel::new(2).unwrap();
		assert_eq!(model.index("aab", false), Ok(2));
		assert_eq!(model.forward.count_at(b"a", b'a'), 1);
		assert_eq!(model.forward.count_at(b"a", b'b'), 1);
		assert_eq!(model.reverse.count_at(b"b", b'a'), 1);
	}

	#[test]
	fn overflow_saturates_and_blocks_indexing() {
		let mut model = MarkovModel::default();
		model.forward.descend_or_insert(b"ab").set_count(b'c', u32::MAX - 1);

		assert_eq!(model.index("abc", false), Ok(1));
		assert!(!model.is_saturated());

		let err = model.index("xabc", false).unwrap_err();
		assert!(matches!(err, NoiseError::CapacityExceeded(_)));
		assert!(model.is_saturated());
		// "xab" went in before the failing window, "abc" did not move at all.
		assert_eq!(model.forward.count_at(b"xa", b'b'), 1);
		assert_eq!(model.reverse.count_at(b"cb", b'a'), 1);

		assert!(matches!(model.index("zzz", false), Err(NoiseError::CapacityExceeded(_))));
	}

	#[test]
	fn merge_requires_same_depth() {
		let mut left = MarkovModel::new(3).unwrap();
		let right = MarkovModel::new(4).unwrap();
		assert!(matches!(left.merge(&right), Err(NoiseError::InvalidConfiguration(_))));
	}

	#[test]
	fn merge_sums_both_directions() {
		let mut left = MarkovModel::default();
		left.index("abc", false).unwrap();
		let mut right = MarkovModel::default();
		right.index("abcabd", false).unwrap();

		left.merge(&right).unwrap();
		assert_eq!(left.forward.count_at(b"ab", b'c'), 2);
		assert_eq!(left.forward.count_at(b"ab", b'd'), 1);
		assert_eq!(left.reverse.count_at(b"cb", b'a'), 2);
		assert_eq!(left.reverse.count_at(b"db", b'a'), 1);
	}

	#[test]
	fn merge_overflow_keeps_counts_and_saturates() {
		let mut left = MarkovModel::default();
		left.forward.descend_or_insert(b"ab").set_count(b'c', u32::MAX);
		let mut right = MarkovModel::default();
		right.index("abc", false).unwrap();

		assert!(matches!(left.merge(&right), Err(NoiseError::CapacityExceeded(_))));
		assert!(left.is_saturated());
		assert_eq!(left.reverse.count_at(b"cb", b'a'), 0);
	}
}
