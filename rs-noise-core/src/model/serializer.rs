use std::collections::BTreeMap;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::charset::{char_of, key_of};
use super::markov_model::MarkovModel;
use super::node::TrieNode;
use crate::error::{NoiseError, Result};

/// One level of a dumped trie: single-character keys to entries.
pub type TrieMap = BTreeMap<String, TrieEntry>;

/// Value stored under a key of a `TrieMap`.
///
/// Serialized untagged, so JSON reads naturally as
/// `{"a": {"b": {"c": 1}}}`: a number is a count, an object is a subtree.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum TrieEntry {
	/// Number of times the key followed the context spelled by the enclosing keys.
	Count(u64),
	/// Deeper context.
	Subtree(TrieMap),
}

/// Plain mapping form of a model, as produced by `dump` and consumed by `load`.
///
/// Encoding it on disk (JSON, ...) is left to the caller.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct TrieDump {
	pub forward: TrieMap,
	pub reverse: TrieMap,
}

impl MarkovModel {
	/// Renders both tries into a `TrieDump`.
	///
	/// Subtrees nest `depth - 1` levels deep and the innermost level holds
	/// the counts. Zero counts are omitted, so an empty model dumps to two
	/// empty maps.
	pub fn dump(&self, debug: bool) -> TrieDump {
		let dump = TrieDump {
			forward: render(&self.forward, debug),
			reverse: render(&self.reverse, debug),
		};
		trace!("dumped model of depth {}", self.depth());
		dump
	}

	/// Replaces both tries with the content of `dump`.
	///
	/// The whole mapping is checked and converted before the model is touched:
	/// - every key must be exactly one printable Latin-1 character
	/// - the first `depth - 1` levels may only hold subtrees, the innermost
	///   level may only hold counts
	///
	/// A count equal to `u32::MAX` is accepted but leaves the model saturated.
	///
	/// # Errors
	/// - `FormatError` if the shape is wrong. The model is unchanged.
	/// - `CapacityExceeded` if a count is above `u32::MAX`. The tries are
	///   unchanged, the model is saturated.
	pub fn load(&mut self, dump: &TrieDump) -> Result<()> {
		let depth = self.depth();
		validate(&dump.forward, depth, 0, "forward")?;
		validate(&dump.reverse, depth, 0, "reverse")?;

		let built = build(&dump.forward).and_then(|forward| Ok((forward, build(&dump.reverse)?)));
		match built {
			Ok((forward, reverse)) => {
				self.install(forward, reverse);
				trace!("loaded model of depth {}", depth);
				Ok(())
			}
			Err(e) => {
				self.saturate();
				Err(e)
			}
		}
	}
}

fn render(node: &TrieNode, debug: bool) -> TrieMap {
	let mut map = TrieMap::new();
	for (key, child) in node.children() {
		if debug {
			debug!("dump: subtree for {:?}", char_of(key));
		}
		map.insert(char_of(key).to_string(), TrieEntry::Subtree(render(child, debug)));
	}
	for (key, count) in node.counts() {
		if debug {
			debug!("dump: count {} for {:?}", count, char_of(key));
		}
		map.insert(char_of(key).to_string(), TrieEntry::Count(u64::from(count)));
	}
	map
}

/// Checks the shape of one level of a dump.
///
/// `prefix` is the path walked so far and only feeds error messages.
fn validate(map: &TrieMap, depth: usize, level: usize, prefix: &str) -> Result<()> {
	for (key, entry) in map {
		let mut chars = key.chars();
		let single = match (chars.next(), chars.next()) {
			(Some(c), None) => key_of(c),
			_ => None,
		};
		if single.is_none() {
			return Err(NoiseError::FormatError(format!(
				"{}: key {:?} is not a single printable latin-1 character",
				prefix, key
			)));
		}

		let path = format!("{}/{}", prefix, key);
		let key_level = level + 1;
		match entry {
			TrieEntry::Count(_) if key_level != depth => {
				return Err(NoiseError::FormatError(format!(
					"{}: count found at level {}, counts belong to level {}",
					path, key_level, depth
				)));
			}
			TrieEntry::Count(_) => {}
			TrieEntry::Subtree(_) if key_level >= depth => {
				return Err(NoiseError::FormatError(format!(
					"{}: subtree found at level {}, counts belong to level {}",
					path, key_level, depth
				)));
			}
			TrieEntry::Subtree(inner) => validate(inner, depth, key_level, &path)?,
		}
	}
	Ok(())
}

/// Converts a validated map into a trie.
fn build(map: &TrieMap) -> Result<TrieNode> {
	let mut node = TrieNode::new();
	for (key, entry) in map {
		// Keys were validated by the caller.
		let Some(byte) = key.chars().next().and_then(key_of) else {
			return Err(NoiseError::FormatError(format!("invalid key {:?}", key)));
		};
		match entry {
			TrieEntry::Count(count) => {
				let count = u32::try_from(*count).map_err(|_| {
					NoiseError::CapacityExceeded(format!(
						"count {} for {:?} exceeds the maximum of {}",
						count,
						key,
						u32::MAX
					))
				})?;
				node.set_count(byte, count);
			}
			TrieEntry::Subtree(inner) => {
				*node.child_or_insert(byte) = build(inner)?;
			}
		}
	}
	Ok(node)
}
