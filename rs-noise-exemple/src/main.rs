mod io;

use std::env;
use std::path::Path;

use log::info;
use rs_noise_core::{DEFAULT_DEPTH, MarkovModel, ReplaceOptions, TrieDump, WhitespacePolicy, corpus};

/// Loads the model cached next to the corpus, or builds it from `lines` and writes the cache.
///
/// The cache is the `dump` mapping encoded as JSON, stored as `<corpus>.d<depth>.json`.
fn load_or_build<P: AsRef<Path>>(
	corpus_path: P,
	lines: &[String],
	depth: usize,
) -> Result<MarkovModel, Box<dyn std::error::Error>> {
	let cache_path = io::build_output_path(&corpus_path, &format!("d{}.json", depth))?;

	if cache_path.exists() {
		let dump: TrieDump = serde_json::from_str(&std::fs::read_to_string(&cache_path)?)?;
		let mut model = MarkovModel::new(depth)?;
		model.load(&dump)?;
		info!("loaded cached model from {}", cache_path.display());
		return Ok(model);
	}

	let (model, count) = corpus::build_model(lines, depth)?;
	info!("indexed {} n-grams from {} lines", count, lines.len());

	std::fs::write(&cache_path, serde_json::to_string(&model.dump(false))?)?;
	Ok(model)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::init();

	// Usage: rs-noise-exemple [corpus] [depth] [probability]
	// Run from the workspace root to pick up ./data/corpus.txt
	let args: Vec<String> = env::args().skip(1).collect();
	let corpus_path = args.first().map(String::as_str).unwrap_or("./data/corpus.txt");
	let depth = match args.get(1) {
		Some(s) => s.parse()?,
		None => DEFAULT_DEPTH,
	};
	let probability = match args.get(2) {
		Some(s) => s.parse()?,
		None => 0.1,
	};

	let lines = io::read_file(corpus_path)?;
	let model = load_or_build(corpus_path, &lines, depth)?;

	let mut options = ReplaceOptions::new();
	options.set_probability(probability)?;

	// Keep words apart: whitespace only replaces characters on a word edge
	options.whitespace_policy = WhitespacePolicy::BoundaryOnly;

	// Every other character at most
	options.set_stride(2)?;

	// Invalid values are refused before anything runs
	match options.set_probability(2.0) {
		Ok(_) => println!("Should not happen"),
		Err(e) => println!("Probability 2.0 is invalid: {}", e),
	}

	// Noise the first lines of the corpus, each with its own seed so runs can be replayed
	for (i, line) in lines.iter().take(10).enumerate() {
		options.seed = Some(i as u64);
		println!("{}", line);
		println!("{}", model.replace(line, &options)?);
	}

	Ok(())
}
