use std::sync::mpsc;
use std::thread;

use log::{debug, trace};

use crate::error::Result;
use crate::model::markov_model::MarkovModel;

/// Builds a model from many lines of text using every CPU.
///
/// # Parameters
/// - `lines`: Corpus, one sample per entry.
/// - `depth`: n-gram length of the model.
///
/// # Returns
/// - `Ok((model, count))`: The merged model and the number of n-grams indexed.
/// - `Err(...)`: If `depth` is invalid or a counter would overflow.
///
/// # Behavior
/// - Splits the lines into chunks (based on CPU cores * factor).
/// - Spawns threads that each index one chunk into their own partial model.
/// - Merges the partial models one after the other on the calling thread.
///
/// # Notes
/// - Uses an MPSC channel to collect partial models from the threads.
/// - No model instance is ever touched by two threads.
pub fn build_model(lines: &[String], depth: usize) -> Result<(MarkovModel, usize)> {
	let mut final_model = MarkovModel::new(depth)?;
	if lines.is_empty() {
		return Ok((final_model, 0));
	}

	let cpus = num_cpus::get();
	let factor = 8;
	let chunks = cpus * factor;
	let chunk_size = lines.len().div_ceil(chunks);

	let (tx, rx) = mpsc::channel();
	for chunk in lines.chunks(chunk_size) {
		let tx = tx.clone();
		let chunk: Vec<String> = chunk.to_vec();

		thread::spawn(move || {
			let partial = index_chunk(&chunk, depth);
			// Fails only once the receiver stopped early on an error; nothing to report then.
			let _ = tx.send(partial);
		});
	}
	drop(tx);

	let mut total = 0;
	for partial in rx.iter() {
		let (partial_model, count) = partial?;
		final_model.merge(&partial_model)?;
		total += count;
	}

	debug!("built model of depth {} from {} lines, {} n-grams", depth, lines.len(), total);
	Ok((final_model, total))
}

fn index_chunk(chunk: &[String], depth: usize) -> Result<(MarkovModel, usize)> {
	let mut partial_model = MarkovModel::new(depth)?;
	let mut count = 0;
	for line in chunk {
		count += partial_model.index(line, false)?;
	}
	trace!("indexed chunk of {} lines", chunk.len());
	Ok((partial_model, count))
}
