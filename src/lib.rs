//! `ext-wordfreq` finds the most and the least frequent words of a token stream too large to be counted in memory.
//!
//! Counting is done with an external sort. The token stream is cut into batches of bounded size, every batch
//! is sorted and spilled to disk as a run, runs are merged pairwise until a single one remains. For more
//! information see [External Sorting](https://en.wikipedia.org/wiki/External_sorting).
//!
//! # Overview
//!
//! The computation is split into three phases:
//!
//! * **Sort by word:**
//!   tokens are sorted by word, so equal words become adjacent and are coalesced into `(word, count)` pairs.
//! * **Sort by count:**
//!   pairs are sorted by count with the same sort-merge pipeline.
//! * **Extraction:**
//!   a single pass over the count sorted pairs keeps the first K pairs and a sliding window of the last K ones.
//!
//! Memory consumption is bounded by the batch sizes, not by the number of distinct words. Runs are stored as
//! `key<TAB>count` text lines by default, MessagePack encoding is available through [`RmpCodec`].
//!
//! # Example
//!
//! ```no_run
//! use std::fs;
//! use std::io;
//! use std::path;
//!
//! use ext_wordfreq::{ExternalSortStrategy, ExternalSortStrategyBuilder, TokenFilter, TokenStream, Tokenizer};
//! use ext_wordfreq::WordCountStrategy;
//!
//! fn main() {
//!     let input_reader = io::BufReader::new(fs::File::open("input.txt").unwrap());
//!     let tokens = TokenStream::new(input_reader, Tokenizer::English).with_filter(TokenFilter::Lowercase);
//!
//!     let strategy: ExternalSortStrategy = ExternalSortStrategyBuilder::new()
//!         .with_tmp_dir(path::Path::new("./"))
//!         .with_k(5)
//!         .build()
//!         .unwrap();
//!
//!     let result = strategy.compute(tokens).unwrap();
//!
//!     for record in result.top_ranked() {
//!         println!("{}", record);
//!     }
//! }
//! ```

pub mod aggregate;
pub mod buffer;
pub mod codec;
pub mod extract;
pub mod merger;
pub mod record;
pub mod run;
pub mod sort;
pub mod strategy;
pub mod tokenize;
pub mod workdir;

pub use aggregate::Aggregator;
pub use buffer::RunBuffer;
pub use codec::{RmpCodec, RunCodec, TsvCodec};
pub use extract::TopBottom;
pub use merger::PairMerger;
pub use record::{Comparator, Record};
pub use run::{RunError, RunReader, RunSet, RunWriter};
pub use sort::{SortMerge, SortedRun, WordCountError};
pub use strategy::{ExternalSortStrategy, ExternalSortStrategyBuilder, InMemoryStrategy, WordCountStrategy};
pub use tokenize::{StopWords, TokenFilter, TokenStream, Tokenizer};
pub use workdir::WorkDir;
