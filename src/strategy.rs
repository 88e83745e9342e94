//! Word count strategies.

use std::collections::HashMap;
use std::error::Error;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::aggregate::aggregate_run;
use crate::codec::{RunCodec, TsvCodec};
use crate::extract::{extract, extract_run, TopBottom};
use crate::record::{Comparator, Record};
use crate::sort::{SortMerge, WordCountError};
use crate::workdir::WorkDir;

/// Default number of top and bottom records.
pub const DEFAULT_K: usize = 5;
/// Default number of tokens kept in memory while sorting by word.
pub const DEFAULT_TOKEN_BATCH_SIZE: usize = 10_000;
/// Default number of aggregated pairs kept in memory while sorting by count.
pub const DEFAULT_PAIR_BATCH_SIZE: usize = 100;

/// Computes the least and the most frequent tokens of a token stream.
pub trait WordCountStrategy {
    /// Consumes the token stream and returns its top and bottom records.
    fn compute<I, E>(&self, tokens: I) -> Result<TopBottom, WordCountError>
    where
        I: IntoIterator<Item = Result<String, E>>,
        E: Error + Send + Sync + 'static;
}

/// Counts tokens in a hash map. Memory grows with the number of distinct tokens.
pub struct InMemoryStrategy {
    k: usize,
}

impl InMemoryStrategy {
    pub fn new(k: usize) -> Self {
        InMemoryStrategy { k }
    }
}

impl Default for InMemoryStrategy {
    fn default() -> Self {
        InMemoryStrategy::new(DEFAULT_K)
    }
}

impl WordCountStrategy for InMemoryStrategy {
    fn compute<I, E>(&self, tokens: I) -> Result<TopBottom, WordCountError>
    where
        I: IntoIterator<Item = Result<String, E>>,
        E: Error + Send + Sync + 'static,
    {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for token in tokens.into_iter() {
            let token = token.map_err(|err| WordCountError::Input(Box::new(err)))?;
            *counts.entry(token).or_insert(0) += 1;
        }

        let mut entries = Vec::from_iter(counts.into_iter().map(|(key, count)| Record::new(key, count)));
        entries.sort_by(|a, b| Comparator::ByCount.compare(a, b));

        return extract(entries.into_iter().map(Ok), self.k);
    }
}

/// External sort strategy builder. Provides methods for [`ExternalSortStrategy`] initialization.
#[derive(Clone)]
pub struct ExternalSortStrategyBuilder<C: RunCodec = TsvCodec> {
    /// Number of top and bottom records.
    k: usize,
    /// Number of tokens kept in memory while sorting by word.
    token_batch_size: usize,
    /// Number of aggregated pairs kept in memory while sorting by count.
    pair_batch_size: usize,
    /// Number of threads to be used to sort and merge runs in parallel.
    threads_number: Option<usize>,
    /// Directory a temporary working directory is created in.
    tmp_dir: Option<Box<Path>>,
    /// Persistent working directory.
    work_dir: Option<Box<Path>>,
    /// Run file read/write buffer size.
    rw_buf_size: Option<usize>,

    /// Run codec type.
    codec_type: PhantomData<C>,
}

impl<C: RunCodec> ExternalSortStrategyBuilder<C> {
    /// Creates an instance of a builder with default parameters.
    pub fn new() -> Self {
        ExternalSortStrategyBuilder::default()
    }

    /// Builds an [`ExternalSortStrategy`] instance using provided configuration.
    pub fn build(self) -> Result<ExternalSortStrategy<C>, WordCountError> {
        if self.k == 0 {
            return Err(WordCountError::Config("k must be positive".to_string()));
        }
        if self.token_batch_size == 0 || self.pair_batch_size == 0 {
            return Err(WordCountError::Config("batch size must be positive".to_string()));
        }

        let work_dir = match self.work_dir {
            Some(path) => WorkDir::fixed(&path, self.rw_buf_size),
            None => WorkDir::temp(self.tmp_dir.as_deref(), self.rw_buf_size),
        }
        .map_err(WordCountError::TempDir)?;

        return Ok(ExternalSortStrategy {
            k: self.k,
            token_batch_size: self.token_batch_size,
            pair_batch_size: self.pair_batch_size,
            thread_pool: init_thread_pool(self.threads_number)?,
            work_dir,
        });
    }

    /// Sets number of top and bottom records.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        return self;
    }

    /// Sets number of tokens kept in memory while sorting by word.
    pub fn with_token_batch_size(mut self, batch_size: usize) -> Self {
        self.token_batch_size = batch_size;
        return self;
    }

    /// Sets number of aggregated pairs kept in memory while sorting by count.
    pub fn with_pair_batch_size(mut self, batch_size: usize) -> Self {
        self.pair_batch_size = batch_size;
        return self;
    }

    /// Sets number of threads to be used to sort and merge runs in parallel.
    pub fn with_threads_number(mut self, threads_number: usize) -> Self {
        self.threads_number = Some(threads_number);
        return self;
    }

    /// Sets directory the temporary working directory is created in.
    pub fn with_tmp_dir(mut self, path: &Path) -> Self {
        self.tmp_dir = Some(path.into());
        return self;
    }

    /// Sets persistent working directory. Phase outputs are kept there after the computation.
    /// Takes precedence over [`with_tmp_dir`](Self::with_tmp_dir).
    pub fn with_work_dir(mut self, path: &Path) -> Self {
        self.work_dir = Some(path.into());
        return self;
    }

    /// Sets run file read/write buffer size.
    pub fn with_rw_buf_size(mut self, buf_size: usize) -> Self {
        self.rw_buf_size = Some(buf_size);
        return self;
    }
}

impl<C: RunCodec> Default for ExternalSortStrategyBuilder<C> {
    fn default() -> Self {
        ExternalSortStrategyBuilder {
            k: DEFAULT_K,
            token_batch_size: DEFAULT_TOKEN_BATCH_SIZE,
            pair_batch_size: DEFAULT_PAIR_BATCH_SIZE,
            threads_number: None,
            tmp_dir: None,
            work_dir: None,
            rw_buf_size: None,
            codec_type: PhantomData,
        }
    }
}

fn init_thread_pool(threads_number: Option<usize>) -> Result<rayon::ThreadPool, WordCountError> {
    let mut thread_pool_builder = rayon::ThreadPoolBuilder::new();

    if let Some(threads_number) = threads_number {
        log::info!("initializing thread-pool (threads: {})", threads_number);
        thread_pool_builder = thread_pool_builder.num_threads(threads_number);
    } else {
        log::info!("initializing thread-pool (threads: default)");
    }
    let thread_pool = thread_pool_builder
        .build()
        .map_err(|err| WordCountError::ThreadPoolBuildError(err))?;

    return Ok(thread_pool);
}

/// Counts tokens with a two-phase external sort, keeping at most a batch of records in memory.
///
/// 1. tokens are sorted by word into a single run which is aggregated into `(word, count)` pairs,
/// 2. pairs are sorted by count,
/// 3. top and bottom records are read from the count sorted run.
pub struct ExternalSortStrategy<C: RunCodec = TsvCodec> {
    k: usize,
    token_batch_size: usize,
    pair_batch_size: usize,
    thread_pool: rayon::ThreadPool,
    work_dir: WorkDir<C>,
}

impl<C: RunCodec> ExternalSortStrategy<C> {
    pub fn work_dir(&self) -> &WorkDir<C> {
        &self.work_dir
    }

    /// Aggregated `(word, count)` pairs left by the last computation.
    pub fn aggregated_path(&self) -> PathBuf {
        self.work_dir.aggregated_path()
    }

    /// Pairs sorted by count left by the last computation.
    pub fn sorted_by_count_path(&self) -> PathBuf {
        self.work_dir.sorted_by_count_path()
    }
}

impl<C: RunCodec> WordCountStrategy for ExternalSortStrategy<C> {
    fn compute<I, E>(&self, tokens: I) -> Result<TopBottom, WordCountError>
    where
        I: IntoIterator<Item = Result<String, E>>,
        E: Error + Send + Sync + 'static,
    {
        let driver = SortMerge::new(&self.work_dir, &self.thread_pool);
        let aggregated_path = self.aggregated_path();
        let sorted_by_count_path = self.sorted_by_count_path();

        log::info!("phase 1: sorting tokens by word");
        let occurrences = tokens.into_iter().map(|token| {
            token
                .map(Record::occurrence)
                .map_err(|err| WordCountError::Input(Box::new(err)))
        });
        let by_word = driver.run(occurrences, Comparator::ByKey, self.token_batch_size)?;
        log::info!("token count: {}", by_word.records);

        let distinct = aggregate_run(&self.work_dir, &by_word.path, &aggregated_path)?;
        self.work_dir.remove(&by_word.path)?;
        log::info!("distinct words: {}", distinct);

        log::info!("phase 2: sorting words by count");
        let pairs = self
            .work_dir
            .open_run(&aggregated_path)?
            .map(|pair| pair.map_err(WordCountError::Run));
        let by_count = driver.run(pairs, Comparator::ByCount, self.pair_batch_size)?;
        self.work_dir.rename(&by_count.path, &sorted_by_count_path)?;

        log::info!("phase 3: extracting top and bottom {} words", self.k);
        let result = extract_run(&self.work_dir, &sorted_by_count_path, self.k)?;

        return Ok(result);
    }
}
