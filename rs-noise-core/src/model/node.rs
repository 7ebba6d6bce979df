use std::collections::BTreeMap;

/// A node of a character trie.
///
/// Each node stands for the context spelled by the path from the root. It
/// owns its children exclusively and keeps, for every successor byte, how many
/// times that byte was observed right after the context.
///
/// Conceptually this is the same thing as a Markov chain state, except that
/// the context is not stored as a string: it is the path used to reach the node.
///
/// ## Invariants
/// - Keys are printable Latin-1 bytes (checked by the callers, see `charset`)
/// - A stored count is never zero
/// - Children form a tree: no sharing, no cycles
///
/// Both maps are ordered by byte value, which gives every traversal (dump,
/// sampling, merge) a deterministic order for free.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct TrieNode {
	/// Child nodes indexed by the next context byte.
	children: BTreeMap<u8, TrieNode>,
	/// Observed successors of this context.
	/// Example: { b'e' => 42, b'a' => 3 }
	counts: BTreeMap<u8, u32>,
}

impl TrieNode {
	/// Creates an empty node: no children, every counter at zero.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns `true` if the node has neither children nor counts.
	pub fn is_empty(&self) -> bool {
		self.children.is_empty() && self.counts.is_empty()
	}

	/// Returns the child for `key`, if it was ever created.
	pub fn child(&self, key: u8) -> Option<&TrieNode> {
		self.children.get(&key)
	}

	/// Returns the child for `key`, allocating it on first use.
	pub fn child_or_insert(&mut self, key: u8) -> &mut TrieNode {
		self.children.entry(key).or_default()
	}

	/// Follows `path` from this node without creating anything.
	///
	/// Returns `None` as soon as a step is missing.
	pub fn descend(&self, path: &[u8]) -> Option<&TrieNode> {
		path.iter().try_fold(self, |node, key| node.child(*key))
	}

	/// Follows `path` from this node, creating the missing nodes.
	pub fn descend_or_insert(&mut self, path: &[u8]) -> &mut TrieNode {
		path.iter().fold(self, |node, key| node.child_or_insert(*key))
	}

	/// Returns the number of observations of `key` after this context.
	pub fn count(&self, key: u8) -> u32 {
		self.counts.get(&key).copied().unwrap_or(0)
	}

	/// Same as `count`, at the end of `path`. Missing paths count as zero.
	pub fn count_at(&self, path: &[u8], key: u8) -> u32 {
		self.descend(path).map_or(0, |node| node.count(key))
	}

	/// Overwrites the counter for `key`. A zero count removes the entry.
	pub fn set_count(&mut self, key: u8, count: u32) {
		if count == 0 {
			self.counts.remove(&key);
		} else {
			self.counts.insert(key, count);
		}
	}

	/// Records one more observation of `key`.
	///
	/// Returns `false`, leaving the counter unchanged, if it is already at
	/// `u32::MAX`.
	pub fn increment(&mut self, key: u8) -> bool {
		let count = self.counts.entry(key).or_insert(0);
		match count.checked_add(1) {
			Some(next) => {
				*count = next;
				true
			}
			None => false,
		}
	}

	/// Iterates over `(successor, count)` pairs in ascending byte order.
	pub fn counts(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
		self.counts.iter().map(|(key, count)| (*key, *count))
	}

	/// Iterates over `(key, child)` pairs in ascending byte order.
	pub fn children(&self) -> impl Iterator<Item = (u8, &TrieNode)> {
		self.children.iter().map(|(key, child)| (*key, child))
	}

	/// Returns `true` if any counter in this subtree sits at `u32::MAX`.
	pub fn has_saturated_count(&self) -> bool {
		self.counts.values().any(|count| *count == u32::MAX)
			|| self.children.values().any(TrieNode::has_saturated_count)
	}

	/// Returns `true` if adding `other` into this subtree keeps every counter
	/// within `u32::MAX`.
	pub fn can_merge(&self, other: &Self) -> bool {
		let counts_fit = other
			.counts
			.iter()
			.all(|(key, count)| self.count(*key).checked_add(*count).is_some());

		counts_fit
			&& other.children.iter().all(|(key, theirs)| match self.children.get(key) {
				Some(ours) => ours.can_merge(theirs),
				None => true,
			})
	}

	/// Adds every count of `other` into this subtree.
	///
	/// Counters saturate instead of wrapping. Call `can_merge` first when
	/// exact sums matter.
	pub fn merge(&mut self, other: &Self) {
		for (key, count) in &other.counts {
			let ours = self.counts.entry(*key).or_insert(0);
			*ours = ours.saturating_add(*count);
		}

		for (key, theirs) in &other.children {
			if let Some(ours) = self.children.get_mut(key) {
				ours.merge(theirs);
			} else {
				self.children.insert(*key, theirs.clone());
			}
		}
	}
}

impl Drop for TrieNode {
	/// Releases the subtree with an explicit stack instead of recursion.
	fn drop(&mut self) {
		let mut pending: Vec<TrieNode> = std::mem::take(&mut self.children).into_values().collect();
		while let Some(mut node) = pending.pop() {
			pending.extend(std::mem::take(&mut node.children).into_values());
		}
	}
}
