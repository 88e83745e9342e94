//! Run-length aggregation of key sorted records.

use std::path::Path;

use crate::codec::RunCodec;
use crate::record::Record;
use crate::run::RunError;
use crate::workdir::WorkDir;

/// Coalesces consecutive records with equal keys into a single record holding the sum of their counts.
///
/// Input records must be sorted (or at least grouped) by key, otherwise the same key is emitted
/// several times.
pub struct Aggregator<I> {
    inner: I,
    current: Option<Record>,
    done: bool,
}

impl<I> Aggregator<I> {
    pub fn new(inner: I) -> Self {
        Aggregator {
            inner,
            current: None,
            done: false,
        }
    }
}

impl<I, E> Iterator for Aggregator<I>
where
    I: Iterator<Item = Result<Record, E>>,
{
    type Item = Result<Record, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            match self.inner.next() {
                Some(Ok(record)) => {
                    match self.current.as_mut() {
                        Some(current) if current.key == record.key => {
                            current.count += record.count;
                            continue;
                        }
                        _ => {}
                    }

                    if let Some(group) = self.current.replace(record) {
                        return Some(Ok(group));
                    }
                }
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err));
                }
                None => {
                    // flush the last group
                    self.done = true;
                    return self.current.take().map(Ok);
                }
            }
        }
    }
}

/// Aggregates the key sorted run at `source` into `target`. Returns the number of distinct keys.
pub fn aggregate_run<C: RunCodec>(dir: &WorkDir<C>, source: &Path, target: &Path) -> Result<usize, RunError> {
    let reader = dir.open_run(source)?;
    let mut writer = dir.create_run(target)?;

    for record in Aggregator::new(reader) {
        writer.write(&record?)?;
    }

    return writer.finish();
}
