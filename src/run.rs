//! Sorted run files.

use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::fs;
use std::io;
use std::io::prelude::*;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::buffer::RunBuffer;
use crate::codec::RunCodec;
use crate::record::{Comparator, Record};
use crate::workdir::WorkDir;

/// Run file error.
#[derive(Debug)]
pub enum RunError {
    /// Run file expected by a merge or an aggregation does not exist.
    Missing(PathBuf),
    /// Common I/O error.
    IO(io::Error),
    /// Run line does not match the `key<TAB>count` layout.
    Format { line: String, reason: String },
    /// Record serialization error.
    Serialization(rmp_serde::encode::Error),
    /// Record deserialization error.
    Deserialization(rmp_serde::decode::Error),
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self {
            RunError::Missing(_) => None,
            RunError::IO(err) => Some(err),
            RunError::Format { .. } => None,
            RunError::Serialization(err) => Some(err),
            RunError::Deserialization(err) => Some(err),
        }
    }
}

impl Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            RunError::Missing(path) => write!(f, "run file {} not found", path.display()),
            RunError::IO(err) => write!(f, "I/O operation failed: {}", err),
            RunError::Format { line, reason } => write!(f, "malformed run line {:?}: {}", line, reason),
            RunError::Serialization(err) => write!(f, "record serialization error: {}", err),
            RunError::Deserialization(err) => write!(f, "record deserialization error: {}", err),
        }
    }
}

impl From<io::Error> for RunError {
    fn from(err: io::Error) -> Self {
        RunError::IO(err)
    }
}

/// Run file writer. The file is closed when the writer is dropped.
pub struct RunWriter<C: RunCodec> {
    writer: io::BufWriter<fs::File>,
    written: usize,

    codec_type: PhantomData<C>,
}

impl<C: RunCodec> RunWriter<C> {
    /// Creates (or truncates) a run file.
    ///
    /// # Arguments
    /// * `path` - Run file path
    /// * `buf_size` - Write buffer size. If the parameter is [`None`] the default buffer size is used.
    pub fn create(path: &Path, buf_size: Option<usize>) -> Result<Self, RunError> {
        let file = fs::File::create(path)?;
        let writer = match buf_size {
            Some(buf_size) => io::BufWriter::with_capacity(buf_size, file),
            None => io::BufWriter::new(file),
        };

        return Ok(RunWriter {
            writer,
            written: 0,
            codec_type: PhantomData,
        });
    }

    pub fn write(&mut self, record: &Record) -> Result<(), RunError> {
        C::write(&mut self.writer, record)?;
        self.written += 1;

        return Ok(());
    }

    /// Writes every record of `records` in order.
    pub fn write_all<'a>(&mut self, records: impl IntoIterator<Item = &'a Record>) -> Result<(), RunError> {
        for record in records {
            self.write(record)?;
        }

        return Ok(());
    }

    /// Flushes buffered data and closes the file. Returns the number of records written.
    pub fn finish(mut self) -> Result<usize, RunError> {
        self.writer.flush()?;
        return Ok(self.written);
    }
}

/// Run file reader. Yields records in the order they were written.
pub struct RunReader<C: RunCodec> {
    reader: io::BufReader<fs::File>,
    exhausted: bool,

    codec_type: PhantomData<C>,
}

impl<C: RunCodec> RunReader<C> {
    /// Opens a run file.
    ///
    /// # Arguments
    /// * `path` - Run file path
    /// * `buf_size` - Read buffer size. If the parameter is [`None`] the default buffer size is used.
    pub fn open(path: &Path, buf_size: Option<usize>) -> Result<Self, RunError> {
        let file = fs::File::open(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => RunError::Missing(path.to_path_buf()),
            _ => RunError::IO(err),
        })?;
        let reader = match buf_size {
            Some(buf_size) => io::BufReader::with_capacity(buf_size, file),
            None => io::BufReader::new(file),
        };

        return Ok(RunReader {
            reader,
            exhausted: false,
            codec_type: PhantomData,
        });
    }
}

impl<C: RunCodec> Iterator for RunReader<C> {
    type Item = Result<Record, RunError>;

    /// Returns the next record. Stops after the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        let item = C::read(&mut self.reader);
        if !matches!(item, Some(Ok(_))) {
            self.exhausted = true;
        }

        return item;
    }
}

/// Live runs of a phase, numbered densely from `1` to `len`.
pub struct RunSet<'a, C: RunCodec> {
    dir: &'a WorkDir<C>,
    len: usize,
}

impl<'a, C: RunCodec> RunSet<'a, C> {
    /// Creates an empty run set in `dir`.
    pub fn new(dir: &'a WorkDir<C>) -> Self {
        RunSet { dir, len: 0 }
    }

    pub fn dir(&self) -> &'a WorkDir<C> {
        self.dir
    }

    /// Number of live runs.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Paths of the live runs in run id order.
    pub fn paths(&self) -> Vec<PathBuf> {
        Vec::from_iter((1..=self.len).map(|id| self.dir.part_path(id)))
    }

    /// Sorts `buffer` and spills it as the next numbered run, leaving the buffer empty.
    /// Returns the id of the new run.
    ///
    /// # Arguments
    /// * `buffer` - Records to be spilled
    /// * `comparator` - Run order
    /// * `thread_pool` - Pool the buffer is sorted on
    pub fn spill(
        &mut self,
        buffer: &mut RunBuffer,
        comparator: Comparator,
        thread_pool: &rayon::ThreadPool,
    ) -> Result<usize, RunError> {
        log::debug!("sorting run data ...");
        thread_pool.install(|| {
            buffer.sort_by(comparator);
        });

        let id = self.len + 1;
        log::debug!("saving run {} ({} records)", id, buffer.len());
        let mut writer = self.dir.create_run(&self.dir.part_path(id))?;
        writer.write_all(buffer.iter())?;
        writer.finish()?;

        buffer.clear();
        self.len = id;

        return Ok(id);
    }

    /// Sets the number of live runs after a reduction round renumbered them.
    pub(crate) fn set_len(&mut self, len: usize) {
        self.len = len;
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use rstest::*;

    use super::{RunError, RunReader, RunSet, RunWriter};
    use crate::buffer::RunBuffer;
    use crate::codec::{RmpCodec, RunCodec, TsvCodec};
    use crate::record::{Comparator, Record};
    use crate::workdir::WorkDir;

    #[fixture]
    fn tmp_dir() -> tempfile::TempDir {
        tempfile::tempdir_in("./").unwrap()
    }

    fn write_then_read<C: RunCodec>(tmp_dir: &tempfile::TempDir, saved: &Vec<Record>) -> Vec<Record> {
        let path = tmp_dir.path().join("00001.part");

        let mut writer: RunWriter<C> = RunWriter::create(&path, Some(64)).unwrap();
        writer.write_all(saved).unwrap();
        assert_eq!(writer.finish().unwrap(), saved.len());

        let reader: RunReader<C> = RunReader::open(&path, Some(64)).unwrap();
        let restored: Result<Vec<Record>, RunError> = reader.collect();
        return restored.unwrap();
    }

    #[rstest]
    fn test_tsv_run(tmp_dir: tempfile::TempDir) {
        let saved = Vec::from_iter((0..100).map(|i| Record::new(format!("word{:03}", i), i + 1)));

        assert_eq!(write_then_read::<TsvCodec>(&tmp_dir, &saved), saved);

        let content = fs::read_to_string(tmp_dir.path().join("00001.part")).unwrap();
        assert_eq!(content.lines().next(), Some("word000\t1"));
        assert_eq!(content.lines().count(), 100);
    }

    #[rstest]
    fn test_rmp_run(tmp_dir: tempfile::TempDir) {
        let saved = Vec::from_iter((0..100).map(|i| Record::new(format!("word{:03}", i), i + 1)));

        assert_eq!(write_then_read::<RmpCodec>(&tmp_dir, &saved), saved);
    }

    #[rstest]
    fn test_empty_run(tmp_dir: tempfile::TempDir) {
        assert_eq!(write_then_read::<TsvCodec>(&tmp_dir, &Vec::new()), Vec::new());
    }

    #[rstest]
    fn test_missing_run(tmp_dir: tempfile::TempDir) {
        let path = tmp_dir.path().join("00042.part");
        match RunReader::<TsvCodec>::open(&path, None) {
            Err(RunError::Missing(missing)) => assert_eq!(missing, path),
            _ => panic!("missing run must be reported"),
        }
    }

    #[rstest]
    fn test_malformed_run_stops_at_error(tmp_dir: tempfile::TempDir) {
        let path = tmp_dir.path().join("00001.part");
        fs::write(&path, "cat\t2\ndog two\nthe\t3\n").unwrap();

        let mut reader: RunReader<TsvCodec> = RunReader::open(&path, None).unwrap();
        assert_eq!(reader.next().unwrap().unwrap(), Record::new("cat", 2));
        assert!(matches!(reader.next(), Some(Err(RunError::Format { .. }))));
        assert!(reader.next().is_none());
    }

    #[rstest]
    fn test_spill_numbers_runs(tmp_dir: tempfile::TempDir) {
        let work_dir: WorkDir<TsvCodec> = WorkDir::fixed(tmp_dir.path(), None).unwrap();
        let thread_pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let mut runs = RunSet::new(&work_dir);
        let mut buffer = RunBuffer::new(3);

        for word in ["the", "cat", "the"] {
            buffer.push(Record::occurrence(word));
        }
        assert_eq!(runs.spill(&mut buffer, Comparator::ByKey, &thread_pool).unwrap(), 1);
        assert_eq!(buffer.is_empty(), true);

        buffer.push(Record::occurrence("dog"));
        assert_eq!(runs.spill(&mut buffer, Comparator::ByKey, &thread_pool).unwrap(), 2);

        assert_eq!(runs.len(), 2);
        assert_eq!(runs.paths(), vec![work_dir.part_path(1), work_dir.part_path(2)]);
        assert_eq!(
            fs::read_to_string(work_dir.part_path(1)).unwrap(),
            "cat\t1\nthe\t1\nthe\t1\n"
        );
        assert_eq!(fs::read_to_string(work_dir.part_path(2)).unwrap(), "dog\t1\n");
    }

    #[rstest]
    fn test_spill_into_unwritable_dir(tmp_dir: tempfile::TempDir) {
        let work_dir: WorkDir<TsvCodec> = WorkDir::fixed(&tmp_dir.path().join("gone"), None).unwrap();
        fs::remove_dir(work_dir.path()).unwrap();

        let thread_pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let mut runs = RunSet::new(&work_dir);
        let mut buffer = RunBuffer::new(1);
        buffer.push(Record::occurrence("the"));

        assert!(matches!(
            runs.spill(&mut buffer, Comparator::ByKey, &thread_pool),
            Err(RunError::IO(_))
        ));
        assert_eq!(runs.len(), 0);
    }
}
