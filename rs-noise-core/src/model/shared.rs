use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::markov_model::MarkovModel;
use super::replace_options::ReplaceOptions;
use super::serializer::TrieDump;
use crate::error::Result;

/// Cloneable handle to one model shared between threads.
///
/// Mutations (`index`, `load`, `merge`) take the write lock and therefore run
/// alone. Reads (`replace`, `dump`) take the read lock and run side by side;
/// each `replace` owns its generator, so concurrent calls stay reproducible.
#[derive(Clone, Debug, Default)]
pub struct SharedModel {
	inner: Arc<RwLock<MarkovModel>>,
}

impl SharedModel {
	/// Wraps an existing model.
	pub fn new(model: MarkovModel) -> Self {
		Self { inner: Arc::new(RwLock::new(model)) }
	}

	// A panic while holding the lock cannot leave a half-written counter:
	// every mutation checks before it writes. The data is still usable.
	fn read(&self) -> RwLockReadGuard<'_, MarkovModel> {
		self.inner.read().unwrap_or_else(PoisonError::into_inner)
	}

	fn write(&self) -> RwLockWriteGuard<'_, MarkovModel> {
		self.inner.write().unwrap_or_else(PoisonError::into_inner)
	}

	/// Returns the n-gram length of the model.
	pub fn depth(&self) -> usize {
		self.read().depth()
	}

	/// Returns `true` once the model refuses further indexing.
	pub fn is_saturated(&self) -> bool {
		self.read().is_saturated()
	}

	/// See `MarkovModel::index`.
	pub fn index(&self, text: &str, debug: bool) -> Result<usize> {
		self.write().index(text, debug)
	}

	/// See `MarkovModel::load`.
	pub fn load(&self, dump: &TrieDump) -> Result<()> {
		self.write().load(dump)
	}

	/// See `MarkovModel::merge`.
	pub fn merge(&self, other: &MarkovModel) -> Result<()> {
		self.write().merge(other)
	}

	/// See `MarkovModel::dump`.
	pub fn dump(&self, debug: bool) -> TrieDump {
		self.read().dump(debug)
	}

	/// See `MarkovModel::replace`.
	pub fn replace(&self, text: &str, options: &ReplaceOptions) -> Result<String> {
		self.read().replace(text, options)
	}

	/// Returns a copy of the current model.
	pub fn snapshot(&self) -> MarkovModel {
		self.read().clone()
	}
}
