/// Returns `true` if `c` can be stored as a trie key.
///
/// Only printable Latin-1 code points are accepted: `32..=126` and `160..=255`.
/// Anything above U+00FF (what a byte-oriented Latin-1 reader would see as a
/// multi-byte sequence) and every control character is rejected.
pub fn is_trie_key(c: char) -> bool {
	matches!(c as u32, 32..=126 | 160..=255)
}

/// Converts a character into the byte used to address the trie.
///
/// Returns `None` if the character is not a printable Latin-1 code point.
pub fn key_of(c: char) -> Option<u8> {
	if is_trie_key(c) { Some(c as u8) } else { None }
}

/// Converts a trie byte back into its Latin-1 character.
pub fn char_of(key: u8) -> char {
	char::from(key)
}

/// Whitespace as far as replacement is concerned.
///
/// Space, tab, line feed, carriage return and form feed.
pub fn is_whitespace(c: char) -> bool {
	c.is_ascii_whitespace()
}

/// Returns `true` if `c` lies outside Latin-1 and must never be replaced.
pub fn is_multi_byte(c: char) -> bool {
	c as u32 > 0xFF
}

/// Converts a whole window into trie keys.
///
/// Returns `None` as soon as one character is not a valid key, so a window is
/// either usable in full or not at all.
pub(crate) fn window_keys(window: &[char]) -> Option<Vec<u8>> {
	window.iter().map(|c| key_of(*c)).collect()
}
