//! Top and bottom K extraction.

use std::collections::VecDeque;
use std::path::Path;

use crate::codec::RunCodec;
use crate::record::Record;
use crate::run::RunError;
use crate::workdir::WorkDir;

/// The K least and K most frequent records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopBottom {
    /// Most frequent records in ascending count order, the most frequent one last.
    pub top: Vec<Record>,
    /// Least frequent records in ascending count order.
    pub bottom: Vec<Record>,
    /// Number of distinct keys.
    pub distinct: usize,
    /// Sum of all counts, i.e. the number of tokens the counts were built from.
    pub token_count: u64,
}

impl TopBottom {
    /// Most frequent records, the most frequent one first.
    pub fn top_ranked(&self) -> impl Iterator<Item = &Record> {
        self.top.iter().rev()
    }
}

/// Extracts the first and the last `k` records of a stream sorted by ascending count in a single pass.
///
/// Bottom records are the first `k` ones. Top records are kept in a sliding window of size `k`,
/// so they come out in the stream order as well. Fewer than `k` records yield shorter lists.
///
/// Memory grows with the records actually kept, never with `k` itself.
pub fn extract<I, E>(records: I, k: usize) -> Result<TopBottom, E>
where
    I: IntoIterator<Item = Result<Record, E>>,
{
    let mut bottom = Vec::new();
    let mut window = VecDeque::new();
    let mut distinct = 0;
    let mut token_count = 0;

    for record in records.into_iter() {
        let record = record?;
        distinct += 1;
        token_count += record.count;

        if bottom.len() < k {
            bottom.push(record.clone());
        }

        window.push_back(record);
        if window.len() > k {
            window.pop_front();
        }
    }

    return Ok(TopBottom {
        top: Vec::from(window),
        bottom,
        distinct,
        token_count,
    });
}

/// Extracts top and bottom `k` records from the count sorted run at `path`.
pub fn extract_run<C: RunCodec>(dir: &WorkDir<C>, path: &Path, k: usize) -> Result<TopBottom, RunError> {
    extract(dir.open_run(path)?, k)
}
