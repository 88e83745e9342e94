//! Pairwise run merger.

use std::cmp::Ordering;

use rayon::prelude::*;

use crate::codec::RunCodec;
use crate::record::{Comparator, Record};
use crate::run::{RunError, RunSet};
use crate::workdir::WorkDir;

/// Two-way merger.
/// Merges two inputs sorted by the same comparator into a single sorted output keeping every record,
/// duplicates included.
///
/// When the two current records compare equal the record of the second input is emitted first, so the
/// merge is not stable. Equal keys only need to stay contiguous, their relative order is unspecified.
///
/// The first input error ends the merge: it is returned once and every later call yields [`None`].
pub struct PairMerger<I> {
    first: I,
    second: I,
    first_head: Option<Record>,
    second_head: Option<Record>,
    comparator: Comparator,
    initiated: bool,
    exhausted: bool,
}

impl<I> PairMerger<I> {
    /// Creates an instance of a pair merger.
    /// Input records should be sorted by `comparator` otherwise the result is undefined.
    pub fn new(first: I, second: I, comparator: Comparator) -> Self {
        PairMerger {
            first,
            second,
            first_head: None,
            second_head: None,
            comparator,
            initiated: false,
            exhausted: false,
        }
    }
}

impl<I, E> Iterator for PairMerger<I>
where
    I: Iterator<Item = Result<Record, E>>,
{
    type Item = Result<Record, E>;

    /// Returns the next record from the inputs.
    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        let result = self.advance();
        if !matches!(result, Some(Ok(_))) {
            self.exhausted = true;
        }

        return result;
    }
}

impl<I, E> PairMerger<I>
where
    I: Iterator<Item = Result<Record, E>>,
{
    fn advance(&mut self) -> Option<Result<Record, E>> {
        if !self.initiated {
            self.initiated = true;
            self.first_head = match self.first.next().transpose() {
                Ok(head) => head,
                Err(err) => return Some(Err(err)),
            };
            self.second_head = match self.second.next().transpose() {
                Ok(head) => head,
                Err(err) => return Some(Err(err)),
            };
        }

        let take_first = match (&self.first_head, &self.second_head) {
            (Some(first), Some(second)) => self.comparator.compare(first, second) == Ordering::Less,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => return None,
        };

        let (head, input) = if take_first {
            (&mut self.first_head, &mut self.first)
        } else {
            (&mut self.second_head, &mut self.second)
        };

        let record = head.take()?;
        match input.next().transpose() {
            Ok(next) => *head = next,
            Err(err) => return Some(Err(err)),
        }

        return Some(Ok(record));
    }
}

/// Merges runs `first` and `second` of `dir` into the merge file numbered `target` and deletes both sources.
/// Returns the number of records written.
///
/// The caller renames the merge file into the run id space.
pub fn merge_pair<C: RunCodec>(
    dir: &WorkDir<C>,
    first: usize,
    second: usize,
    target: usize,
    comparator: Comparator,
) -> Result<usize, RunError> {
    log::debug!("merging runs {} and {}", first, second);

    let first_path = dir.part_path(first);
    let second_path = dir.part_path(second);

    let written = {
        let merger = PairMerger::new(dir.open_run(&first_path)?, dir.open_run(&second_path)?, comparator);
        let mut writer = dir.create_run(&dir.merge_path(target))?;
        for record in merger {
            writer.write(&record?)?;
        }
        writer.finish()?
    };

    dir.remove(&first_path)?;
    dir.remove(&second_path)?;

    return Ok(written);
}

/// Reduces a run set to a single run.
///
/// Every round merges runs `(1, 2), (3, 4), ...` into fresh runs numbered `1, 2, ...`. If the number of runs
/// is odd the last one is renumbered into the next round as is. Pair merges of a round run in parallel on
/// `thread_pool` and all of them complete before the round's runs are renumbered.
pub fn reduce<C: RunCodec>(
    runs: &mut RunSet<'_, C>,
    comparator: Comparator,
    thread_pool: &rayon::ThreadPool,
) -> Result<(), RunError> {
    let dir = runs.dir();

    while runs.len() > 1 {
        let parts = runs.len();
        let pairs = parts / 2;
        log::debug!("runs to merge: {}, pairs: {}", parts, pairs);

        thread_pool.install(|| {
            (1..pairs + 1)
                .into_par_iter()
                .try_for_each(|i| merge_pair(dir, 2 * i - 1, 2 * i, i, comparator).map(|_| ()))
        })?;

        for i in 1..=pairs {
            dir.rename(&dir.merge_path(i), &dir.part_path(i))?;
        }

        if parts % 2 == 1 {
            log::debug!("odd one out: run {} becomes run {}", parts, pairs + 1);
            dir.rename(&dir.part_path(parts), &dir.part_path(pairs + 1))?;
            runs.set_len(pairs + 1);
        } else {
            runs.set_len(pairs);
        }
    }

    return Ok(());
}
