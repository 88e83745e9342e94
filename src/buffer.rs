//! Count limited record buffer.

use rayon::slice::ParallelSliceMut;

use crate::record::{Comparator, Record};

/// In-memory batch of records waiting to be spilled as a run.
///
/// The buffer is limited by elements count: once `limit` records are pushed it reports itself full
/// and the caller is expected to sort and spill it. Storage grows with the records pushed, not with `limit`.
pub struct RunBuffer {
    limit: usize,
    inner: Vec<Record>,
}

impl RunBuffer {
    pub fn new(limit: usize) -> Self {
        RunBuffer {
            limit,
            inner: Vec::new(),
        }
    }

    /// Adds a new record to the buffer.
    pub fn push(&mut self, record: Record) {
        self.inner.push(record);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Checks if the buffer reached the limit.
    pub fn is_full(&self) -> bool {
        self.inner.len() >= self.limit
    }

    /// Sorts buffered records in place. Runs on the current rayon pool.
    pub fn sort_by(&mut self, comparator: Comparator) {
        self.inner.par_sort_by(|a, b| comparator.compare(a, b));
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.inner.iter()
    }

    /// Drops buffered records keeping the allocation.
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

impl IntoIterator for RunBuffer {
    type Item = Record;
    type IntoIter = <Vec<Record> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

#[cfg(test)]
mod test {
    use super::RunBuffer;
    use crate::record::{Comparator, Record};

    #[test]
    fn test_run_buffer() {
        let mut buffer = RunBuffer::new(2);

        buffer.push(Record::occurrence("the"));
        assert_eq!(buffer.is_full(), false);
        buffer.push(Record::occurrence("cat"));
        assert_eq!(buffer.is_full(), true);

        buffer.sort_by(Comparator::ByKey);
        let data = Vec::from_iter(buffer.iter().map(|r| r.key.as_str()));
        assert_eq!(data, vec!["cat", "the"]);

        buffer.clear();
        assert_eq!(buffer.is_empty(), true);
        assert_eq!(buffer.is_full(), false);
    }

    #[test]
    fn test_run_buffer_sort_by_count() {
        let mut buffer = RunBuffer::new(10);
        buffer.push(Record::new("a", 3));
        buffer.push(Record::new("b", 1));
        buffer.push(Record::new("c", 2));

        buffer.sort_by(Comparator::ByCount);

        let data = Vec::from_iter(buffer);
        assert_eq!(data, vec![Record::new("b", 1), Record::new("c", 2), Record::new("a", 3)]);
    }
}
