//! Sort-merge driver.

use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::io;
use std::path::PathBuf;

use crate::buffer::RunBuffer;
use crate::codec::RunCodec;
use crate::merger;
use crate::record::{Comparator, Record};
use crate::run::{RunError, RunSet};
use crate::workdir::WorkDir;

/// Word count error.
#[derive(Debug)]
pub enum WordCountError {
    /// Invalid configuration parameter.
    Config(String),
    /// Working directory creation error.
    TempDir(io::Error),
    /// Workers thread pool initialization error.
    ThreadPoolBuildError(rayon::ThreadPoolBuildError),
    /// Run file error.
    Run(RunError),
    /// Input token stream error.
    Input(Box<dyn Error + Send + Sync>),
}

impl Error for WordCountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self {
            WordCountError::Config(_) => None,
            WordCountError::TempDir(err) => Some(err),
            WordCountError::ThreadPoolBuildError(err) => Some(err),
            WordCountError::Run(err) => Some(err),
            WordCountError::Input(err) => Some(err.as_ref()),
        }
    }
}

impl Display for WordCountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            WordCountError::Config(reason) => write!(f, "invalid configuration: {}", reason),
            WordCountError::TempDir(err) => write!(f, "working directory not created: {}", err),
            WordCountError::ThreadPoolBuildError(err) => write!(f, "thread pool initialization failed: {}", err),
            WordCountError::Run(err) => write!(f, "run processing failed: {}", err),
            WordCountError::Input(err) => write!(f, "input token stream error: {}", err),
        }
    }
}

impl From<RunError> for WordCountError {
    fn from(err: RunError) -> Self {
        WordCountError::Run(err)
    }
}

/// Single run left by a sort-merge pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedRun {
    /// Run file path.
    pub path: PathBuf,
    /// Number of records consumed from the source, equal to the number of records in the run.
    pub records: usize,
}

/// Sort-merge driver. Spills a record source as sorted runs of bounded size and reduces them to
/// a single sorted run.
pub struct SortMerge<'a, C: RunCodec> {
    dir: &'a WorkDir<C>,
    thread_pool: &'a rayon::ThreadPool,
}

impl<'a, C: RunCodec> SortMerge<'a, C> {
    pub fn new(dir: &'a WorkDir<C>, thread_pool: &'a rayon::ThreadPool) -> Self {
        SortMerge { dir, thread_pool }
    }

    /// Sorts records from the source.
    /// Returns the run the records are sorted into. An empty source results in an empty run.
    ///
    /// # Arguments
    /// * `source` - Records to be sorted
    /// * `comparator` - Sort order
    /// * `batch_size` - Maximum number of records kept in memory
    pub fn run<I>(&self, source: I, comparator: Comparator, batch_size: usize) -> Result<SortedRun, WordCountError>
    where
        I: IntoIterator<Item = Result<Record, WordCountError>>,
    {
        let mut runs = RunSet::new(self.dir);
        let mut buffer = RunBuffer::new(batch_size);
        let mut records = 0;

        for record in source.into_iter() {
            buffer.push(record?);
            records += 1;

            if buffer.is_full() {
                runs.spill(&mut buffer, comparator, self.thread_pool)?;
            }
        }

        if !buffer.is_empty() || runs.is_empty() {
            runs.spill(&mut buffer, comparator, self.thread_pool)?;
        }

        log::debug!("{} records spilled into {} runs", records, runs.len());

        merger::reduce(&mut runs, comparator, self.thread_pool)?;

        log::debug!("sort-merge by {:?} done", comparator);

        return Ok(SortedRun {
            path: self.dir.part_path(1),
            records,
        });
    }
}
