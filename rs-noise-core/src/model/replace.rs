use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::charset::{is_multi_byte, is_whitespace};
use super::markov_model::MarkovModel;
use super::probability::{
	Counts, Direction, calculate_counts, merge_probabilities, normalize_probabilities,
	normalize_to_probabilities, sample_character, total_count,
};
use super::replace_options::ReplaceOptions;
use crate::error::Result;

impl MarkovModel {
	/// Substitutes characters of `text` using the model statistics.
	///
	/// The generator is owned by the call: seeded with `options.seed`, or
	/// from the clock when no seed is given. Two calls with the same seed,
	/// text, options and model give the same output.
	///
	/// # Errors
	/// Returns `InvalidConfiguration` if the options are out of range. Nothing
	/// else can fail: missing statistics keep the original character.
	pub fn replace(&self, text: &str, options: &ReplaceOptions) -> Result<String> {
		options.validate()?;
		let seed = options.seed.unwrap_or_else(clock_seed);
		if options.debug {
			debug!(
				"replace: seed {}, probability {}, reverse weight {}, stride {}, policy {:?}",
				seed,
				options.probability(),
				options.reverse_weight(),
				options.stride(),
				options.whitespace_policy
			);
		}
		let mut rng = StdRng::seed_from_u64(seed);
		self.replace_with_rng(text, options, &mut rng)
	}

	/// Same as `replace`, drawing from a caller-provided generator.
	///
	/// `options.seed` is ignored.
	///
	/// # Behavior
	/// Left to right, for each character:
	/// 1. While the stride counter is positive, copy the character.
	/// 2. Draw `r` in `[0, 1)`; copy the character if `r >= probability`.
	/// 3. Otherwise this is an attempt: the next `stride - 1` characters are
	///    copied whatever happens here.
	/// 4. Whitespace and characters above U+00FF are copied.
	/// 5. Forward statistics come from the output produced so far, reverse
	///    statistics from the untouched input.
	/// 6. The whitespace policy may drop whitespace from both distributions.
	/// 7. With no statistics left, copy the character; otherwise merge the two
	///    normalized distributions (reverse scaled by `reverse_weight`),
	///    normalize again and sample.
	///
	/// The output always has as many characters as the input.
	pub fn replace_with_rng<R: Rng>(&self, text: &str, options: &ReplaceOptions, rng: &mut R) -> Result<String> {
		options.validate()?;

		let input: Vec<char> = text.chars().collect();
		let mut output: Vec<char> = Vec::with_capacity(input.len());
		let mut skip = 0usize;
		let mut replaced = 0usize;

		for (i, &current) in input.iter().enumerate() {
			if skip > 0 {
				output.push(current);
				skip -= 1;
				continue;
			}

			let r: f64 = rng.random();
			if r >= options.probability() {
				output.push(current);
				continue;
			}

			if options.stride() > 1 {
				skip = options.stride() - 1;
			}

			if is_whitespace(current) || is_multi_byte(current) {
				output.push(current);
				continue;
			}

			let next = self.substitute(&input, &output, i, options, rng).unwrap_or(current);
			if options.debug {
				debug!("replace: position {} {:?} -> {:?}", i, current, next);
			}
			if next != current {
				replaced += 1;
			}
			output.push(next);
		}

		trace!("replaced {} of {} characters", replaced, input.len());
		Ok(output.into_iter().collect())
	}

	/// Samples a replacement for `input[i]`, or `None` when the model has
	/// nothing to offer at this position.
	fn substitute<R: Rng>(
		&self,
		input: &[char],
		output: &[char],
		i: usize,
		options: &ReplaceOptions,
		rng: &mut R,
	) -> Option<char> {
		let depth = self.depth();

		// Earlier substitutions feed the forward context.
		let forward_window: Vec<char> = if i + 1 >= depth {
			output[i + 1 - depth..i].iter().copied().chain([input[i]]).collect()
		} else {
			Vec::new()
		};
		// Reverse context never sees substitutions.
		let reverse_window: &[char] = if input.len() - i >= depth { &input[i..i + depth] } else { &[] };

		let mut forward = calculate_counts(self.root(Direction::Forward), &forward_window, depth, Direction::Forward);
		let mut reverse = calculate_counts(self.root(Direction::Reverse), reverse_window, depth, Direction::Reverse);

		if options.whitespace_policy.zeroes_whitespace(at_word_boundary(input, i)) {
			drop_whitespace(&mut forward);
			drop_whitespace(&mut reverse);
		}

		if options.debug {
			debug!("replace: position {} forward {:?} reverse {:?}", i, forward, reverse);
		}

		if total_count(&forward) + total_count(&reverse) == 0 {
			return None;
		}

		let merged = merge_probabilities(
			&normalize_to_probabilities(&forward),
			&normalize_to_probabilities(&reverse),
			options.reverse_weight(),
		);
		sample_character(&normalize_probabilities(&merged), rng)
	}
}

/// Start or end of the text, or next to whitespace in the input.
fn at_word_boundary(input: &[char], i: usize) -> bool {
	i == 0
		|| i + 1 >= input.len()
		|| is_whitespace(input[i - 1])
		|| is_whitespace(input[i + 1])
}

fn drop_whitespace(counts: &mut Counts) {
	counts.retain(|c, _| !is_whitespace(*c));
}

fn clock_seed() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|elapsed| elapsed.as_nanos() as u64)
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::NoiseError;
	use crate::model::replace_options::WhitespacePolicy;
	use crate::model::serializer::TrieDump;

	fn options(probability: f64, policy: WhitespacePolicy) -> ReplaceOptions {
		let mut options = ReplaceOptions::new();
		options.set_probability(probability).unwrap();
		options.whitespace_policy = policy;
		options.seed = Some(42);
		options
	}

	fn trained(text: &str) -> MarkovModel {
		let mut model = MarkovModel::default();
		model.index(text, false).unwrap();
		model
	}

	fn loaded(json: serde_json::Value) -> MarkovModel {
		let dump: TrieDump = serde_json::from_value(json).unwrap();
		let mut model = MarkovModel::default();
		model.load(&dump).unwrap();
		model
	}

	#[test]
	fn forward_context_fixes_last_character() {
		let model = trained("abc");
		let always = options(1.0, WhitespacePolicy::None);
		assert_eq!(model.replace("abg", &always).unwrap(), "abc");
		assert_eq!(model.replace(&"abg".repeat(100), &always).unwrap(), "abc".repeat(100));
	}

	#[test]
	fn reverse_context_fixes_first_character() {
		let model = trained("abc");
		assert_eq!(model.replace("gbc", &options(1.0, WhitespacePolicy::None)).unwrap(), "abc");
	}

	#[test]
	fn zero_probability_is_identity() {
		let model = trained("abc");
		assert_eq!(model.replace("abg", &options(0.0, WhitespacePolicy::None)).unwrap(), "abg");
	}

	#[test]
	fn empty_and_untouchable_input() {
		let model = trained("abc");
		let always = options(1.0, WhitespacePolicy::None);
		assert_eq!(model.replace("", &always).unwrap(), "");
		assert_eq!(model.replace("äöü", &always).unwrap(), "äöü");
		assert_eq!(model.replace("äöüabg", &always).unwrap(), "äöüabc");
		assert_eq!(model.replace("a b c", &always).unwrap(), "a b c");
		assert_eq!(model.replace("€€€", &always).unwrap(), "€€€");
	}

	#[test]
	fn more_statistics_do_not_change_known_contexts() {
		let mut model = trained("abc");
		model.index("def", false).unwrap();
		let always = options(1.0, WhitespacePolicy::None);
		let first = model.replace("def", &always).unwrap();
		model.index("ghi", false).unwrap();
		assert_eq!(model.replace("def", &always).unwrap(), first);
	}

	#[test]
	fn invalid_options_are_rejected_before_work() {
		let model = trained("abc");
		let mut bad = ReplaceOptions::new();
		bad.probability = -1.0;
		assert!(matches!(model.replace("abc", &bad), Err(NoiseError::InvalidConfiguration(_))));

		let mut bad = ReplaceOptions::new();
		bad.stride = 0;
		assert!(matches!(model.replace("abc", &bad), Err(NoiseError::InvalidConfiguration(_))));

		let mut bad = ReplaceOptions::new();
		bad.reverse_weight = f64::NAN;
		assert!(matches!(model.replace("abc", &bad), Err(NoiseError::InvalidConfiguration(_))));
	}

	#[test]
	fn zero_weight_never_samples_whitespace() {
		let model = loaded(serde_json::json!({"forward": {"a": {"b": {" ": 1}}}, "reverse": {}}));
		let result = model.replace("abXc", &options(1.0, WhitespacePolicy::ZeroWeight)).unwrap();
		assert_eq!(result, "abXc");
	}

	#[test]
	fn no_policy_allows_whitespace_anywhere() {
		let model = loaded(serde_json::json!({"forward": {"a": {"b": {" ": 1}}}, "reverse": {}}));
		let result = model.replace("abXc", &options(1.0, WhitespacePolicy::None)).unwrap();
		assert_eq!(result, "ab c");
	}

	#[test]
	fn boundary_policy_allows_whitespace_on_word_edges() {
		let boundary = options(1.0, WhitespacePolicy::BoundaryOnly);

		let model = loaded(serde_json::json!({"forward": {"a": {"b": {" ": 1}}}, "reverse": {}}));
		assert_eq!(model.replace("abc", &boundary).unwrap(), "ab ");

		let model = loaded(serde_json::json!({"reverse": {"e": {"d": {" ": 1}}}, "forward": {}}));
		assert_eq!(model.replace("cde", &boundary).unwrap(), " de");

		let model = loaded(serde_json::json!({
			"reverse": {"e": {"d": {" ": 1}}},
			"forward": {"a": {"b": {" ": 1}}}
		}));
		assert_eq!(model.replace("abc cde", &boundary).unwrap(), "ab   de");
	}

	#[test]
	fn boundary_policy_keeps_inner_characters() {
		let model = loaded(serde_json::json!({
			"reverse": {"b": {"a": {" ": 1}}, " ": {"c": {" ": 1}}},
			"forward": {}
		}));
		let result = model.replace("aabc ", &options(1.0, WhitespacePolicy::BoundaryOnly)).unwrap();
		assert_eq!(result, " abc ");
	}

	#[test]
	fn stride_skips_following_characters() {
		// Every context predicts 'x', so each attempted position becomes 'x'.
		let model = loaded(serde_json::json!({
			"forward": {},
			"reverse": {"a": {"a": {"x": 1}}}
		}));
		let mut stride = options(1.0, WhitespacePolicy::None);
		stride.set_stride(3).unwrap();
		assert_eq!(model.replace("aaaaaaaaa", &stride).unwrap(), "xaaxaaxaa");
	}

	#[test]
	fn reverse_weight_zero_ignores_reverse_statistics() {
		let model = loaded(serde_json::json!({
			"forward": {"a": {"b": {"c": 1}}},
			"reverse": {"c": {"b": {"z": 1}}}
		}));
		let mut forward_only = options(1.0, WhitespacePolicy::None);
		forward_only.set_reverse_weight(0.0).unwrap();
		// Position 0 only has reverse statistics, which weigh nothing.
		assert_eq!(model.replace("xbc", &forward_only).unwrap(), "xbc");
		assert_eq!(model.replace("abq", &forward_only).unwrap(), "abc");
	}

	#[test]
	fn same_seed_same_output() {
		let model = trained("the quick brown fox jumps over the lazy dog and the cat");
		let half = options(0.5, WhitespacePolicy::BoundaryOnly);
		let text = "the lazy cat jumps over the quick dog";
		assert_eq!(model.replace(text, &half).unwrap(), model.replace(text, &half).unwrap());
	}

	#[test]
	fn forward_context_sees_earlier_substitutions() {
		let model = loaded(serde_json::json!({
			"forward": {"a": {"b": {"X": 1}}, "b": {"X": {"Y": 1}}},
			"reverse": {}
		}));
		// 'c' becomes 'X', then "bX" predicts 'Y' for the last position.
		assert_eq!(model.replace("abcd", &options(1.0, WhitespacePolicy::None)).unwrap(), "abXY");
	}

	#[test]
	fn reverse_context_reads_the_input() {
		let model = loaded(serde_json::json!({
			"forward": {"Y": {"X": {"Q": 1}}},
			"reverse": {"c": {"b": {"Y": 1}}, "d": {"c": {"X": 1}}}
		}));
		// Reverse lookups read "bc" and "cd" from the input, the forward
		// lookup at position 2 reads the replaced "YX".
		assert_eq!(model.replace("abcd", &options(1.0, WhitespacePolicy::None)).unwrap(), "YXQd");
	}

	#[test]
	fn huge_depth_keeps_every_character() {
		let model = MarkovModel::new(usize::MAX).unwrap();
		assert_eq!(model.replace("abc", &options(1.0, WhitespacePolicy::None)).unwrap(), "abc");
	}

	#[test]
	fn deeper_model_uses_longer_context() {
		let mut model = MarkovModel::new(4).unwrap();
		model.index("abcd", false).unwrap();
		let always = options(1.0, WhitespacePolicy::None);
		assert_eq!(model.replace("abcz", &always).unwrap(), "abcd");
		assert_eq!(model.replace("zbcd", &always).unwrap(), "abcd");
		assert_eq!(model.replace("abz", &always).unwrap(), "abz");
	}
}
