use std::str::FromStr;

use crate::error::{NoiseError, Result};

/// Whether whitespace may be sampled as a replacement character.
///
/// # Variants
/// - `None`: distributions are used as they are.
/// - `ZeroWeight`: whitespace never replaces anything.
/// - `BoundaryOnly`: whitespace may only replace a character that sits on a
///   word edge (start or end of the text, or next to whitespace in the input).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WhitespacePolicy {
	#[default]
	None,
	ZeroWeight,
	BoundaryOnly,
}

impl WhitespacePolicy {
	/// Returns `true` if whitespace entries must be removed from the
	/// distributions for a character with the given boundary status.
	pub fn zeroes_whitespace(self, at_boundary: bool) -> bool {
		match self {
			WhitespacePolicy::None => false,
			WhitespacePolicy::ZeroWeight => true,
			WhitespacePolicy::BoundaryOnly => !at_boundary,
		}
	}
}

impl TryFrom<u8> for WhitespacePolicy {
	type Error = NoiseError;

	/// Numeric codes: 0 = none, 1 = zero weight, 2 = boundary only.
	fn try_from(code: u8) -> Result<Self> {
		match code {
			0 => Ok(WhitespacePolicy::None),
			1 => Ok(WhitespacePolicy::ZeroWeight),
			2 => Ok(WhitespacePolicy::BoundaryOnly),
			other => Err(NoiseError::InvalidConfiguration(format!(
				"unknown whitespace policy code {}",
				other
			))),
		}
	}
}

impl FromStr for WhitespacePolicy {
	type Err = NoiseError;

	fn from_str(s: &str) -> Result<Self> {
		match s.trim().to_lowercase().as_str() {
			"none" => Ok(WhitespacePolicy::None),
			"zero" | "zero_weight" => Ok(WhitespacePolicy::ZeroWeight),
			"boundary" | "boundary_only" => Ok(WhitespacePolicy::BoundaryOnly),
			other => Err(NoiseError::InvalidConfiguration(format!(
				"unknown whitespace policy '{}', expected none, zero or boundary",
				other
			))),
		}
	}
}

/// Parameters of a `replace` call.
///
/// # Responsibilities
/// - Carry the replacement probability, reverse weight, stride, whitespace
///   policy, seed and debug flag
/// - Reject out-of-range values as soon as they are set
///
/// # Invariants
/// - `probability` is in `[0.0, 1.0]`
/// - `reverse_weight` is finite and `>= 0.0`
/// - `stride` is `>= 1`
#[derive(Clone, Debug, PartialEq)]
pub struct ReplaceOptions {
	/// Chance for each character to be considered for substitution.
	pub(crate) probability: f64,

	/// Scale of the reverse distribution relative to the forward one.
	pub(crate) reverse_weight: f64,

	/// An attempted substitution lets the next `stride - 1` characters through.
	pub(crate) stride: usize,

	/// Whether whitespace may be sampled as a replacement.
	pub whitespace_policy: WhitespacePolicy,

	/// Generator seed. `None` derives one from the clock.
	pub seed: Option<u64>,

	/// Log every per-character decision at debug level.
	pub debug: bool,
}

impl Default for ReplaceOptions {
	fn default() -> Self {
		Self {
			probability: 0.5,
			reverse_weight: 1.0,
			stride: 1,
			whitespace_policy: WhitespacePolicy::None,
			seed: None,
			debug: false,
		}
	}
}

impl ReplaceOptions {
	/// Creates options with the default values:
	/// probability 0.5, reverse weight 1.0, stride 1, no whitespace policy,
	/// clock seed, no debug output.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the replacement probability.
	pub fn probability(&self) -> f64 {
		self.probability
	}

	/// Returns the reverse weight.
	pub fn reverse_weight(&self) -> f64 {
		self.reverse_weight
	}

	/// Returns the stride.
	pub fn stride(&self) -> usize {
		self.stride
	}

	/// Sets the replacement probability (0.0..=1.0).
	///
	/// # Errors
	/// Returns an error if the value is outside the valid range.
	pub fn set_probability(&mut self, probability: f64) -> Result<()> {
		check_probability(probability)?;
		self.probability = probability;
		Ok(())
	}

	/// Sets the reverse weight (>= 0.0).
	///
	/// # Errors
	/// Returns an error if the value is negative or not finite.
	pub fn set_reverse_weight(&mut self, reverse_weight: f64) -> Result<()> {
		check_reverse_weight(reverse_weight)?;
		self.reverse_weight = reverse_weight;
		Ok(())
	}

	/// Sets the stride (>= 1).
	///
	/// # Errors
	/// Returns an error if the stride is zero.
	pub fn set_stride(&mut self, stride: usize) -> Result<()> {
		check_stride(stride)?;
		self.stride = stride;
		Ok(())
	}

	/// Checks every field again.
	pub fn validate(&self) -> Result<()> {
		check_probability(self.probability)?;
		check_reverse_weight(self.reverse_weight)?;
		check_stride(self.stride)
	}
}

fn check_probability(probability: f64) -> Result<()> {
	if !(0.0..=1.0).contains(&probability) {
		return Err(NoiseError::InvalidConfiguration(format!(
			"probability must be between 0.0 and 1.0, got {}",
			probability
		)));
	}
	Ok(())
}

fn check_reverse_weight(reverse_weight: f64) -> Result<()> {
	if !reverse_weight.is_finite() || reverse_weight < 0.0 {
		return Err(NoiseError::InvalidConfiguration(format!(
			"reverse weight must be a finite value >= 0.0, got {}",
			reverse_weight
		)));
	}
	Ok(())
}

fn check_stride(stride: usize) -> Result<()> {
	if stride < 1 {
		return Err(NoiseError::InvalidConfiguration("stride must be >= 1, got 0".to_owned()));
	}
	Ok(())
}
