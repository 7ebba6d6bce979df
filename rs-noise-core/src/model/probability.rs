use std::collections::BTreeMap;

use rand::Rng;

use super::charset::{char_of, window_keys};
use super::markov_model::MarkovModel;
use super::node::TrieNode;

/// Raw successor counts, ordered by character (that is, by byte value).
pub type Counts = BTreeMap<char, u32>;

/// Probability-like weights, ordered by character.
pub type Probabilities = BTreeMap<char, f64>;

/// Reading direction of a context window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
	/// Context precedes the predicted character.
	Forward,
	/// Context follows the predicted character.
	Reverse,
}

/// Reads the successor counts for a full `depth`-character window.
///
/// - `Forward`: descends through `window[0] .. window[depth - 2]`
/// - `Reverse`: descends through `window[depth - 1]` back to `window[1]`
///
/// Returns an empty map when the window is not exactly `depth` characters
/// long (near a string boundary), holds a character that is not a trie key,
/// or when the context was never observed.
pub(crate) fn calculate_counts(root: &TrieNode, window: &[char], depth: usize, direction: Direction) -> Counts {
	if depth < 2 || window.len() != depth {
		return Counts::new();
	}
	let Some(keys) = window_keys(window) else {
		return Counts::new();
	};

	let terminal = match direction {
		Direction::Forward => root.descend(&keys[..depth - 1]),
		Direction::Reverse => {
			let path: Vec<u8> = keys[1..].iter().rev().copied().collect();
			root.descend(&path)
		}
	};

	terminal
		.map(|node| node.counts().map(|(key, count)| (char_of(key), count)).collect())
		.unwrap_or_default()
}

impl MarkovModel {
	/// Successor counts for a `depth`-character window read in `direction`.
	///
	/// Forward windows end with the predicted character, reverse windows
	/// start with it; that character itself does not influence the lookup.
	pub fn counts(&self, window: &str, direction: Direction) -> Counts {
		let window: Vec<char> = window.chars().collect();
		calculate_counts(self.root(direction), &window, self.depth(), direction)
	}

	/// Same as `counts`, normalized to probabilities.
	pub fn probabilities(&self, window: &str, direction: Direction) -> Probabilities {
		normalize_to_probabilities(&self.counts(window, direction))
	}
}

/// Sums counts without risking an overflow.
pub fn total_count(counts: &Counts) -> u64 {
	counts.values().map(|count| u64::from(*count)).sum()
}

/// Divides every count by the total.
///
/// Returns an empty map if the total is zero.
pub fn normalize_to_probabilities(counts: &Counts) -> Probabilities {
	let total = total_count(counts);
	if total == 0 {
		return Probabilities::new();
	}
	counts
		.iter()
		.map(|(c, count)| (*c, f64::from(*count) / total as f64))
		.collect()
}

/// Rescales already weighted values so they sum to 1.
///
/// Returns an empty map if the total is not strictly positive.
pub fn normalize_probabilities(weights: &Probabilities) -> Probabilities {
	let total: f64 = weights.values().sum();
	if total <= 0.0 || !total.is_finite() {
		return Probabilities::new();
	}
	weights.iter().map(|(c, weight)| (*c, weight / total)).collect()
}

/// Adds `reverse_weight * reverse[c]` to `forward[c]` for every character
/// present in either distribution. The result is not normalized.
pub fn merge_probabilities(forward: &Probabilities, reverse: &Probabilities, reverse_weight: f64) -> Probabilities {
	let mut merged = forward.clone();
	for (c, probability) in reverse {
		*merged.entry(*c).or_insert(0.0) += reverse_weight * probability;
	}
	merged
}

/// Picks a character from a normalized distribution.
///
/// Draws one value in `[0, 1)` and walks the cumulative distribution in
/// ascending character order, so a given generator state always yields the
/// same character. Floating point drift is absorbed by the last entry with a
/// positive probability.
///
/// Returns `None` when no entry has a positive probability.
pub fn sample_character<R: Rng>(probabilities: &Probabilities, rng: &mut R) -> Option<char> {
	let last = probabilities
		.iter()
		.rev()
		.find(|(_, probability)| **probability > 0.0)
		.map(|(c, _)| *c)?;
	let r: f64 = rng.random();

	let mut cumulative = 0.0;
	for (c, probability) in probabilities {
		cumulative += probability;
		if r < cumulative {
			return Some(*c);
		}
	}
	Some(last)
}
