//! Working directory shared by the phases of a computation.

use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::codec::{RunCodec, TsvCodec};
use crate::run::{RunError, RunReader, RunWriter};

/// Aggregated `(word, count)` pairs, output of the first phase.
pub const AGGREGATED_FILE: &str = "wordcount.final";
/// Aggregated pairs sorted by count, output of the second phase.
pub const SORTED_BY_COUNT_FILE: &str = "sortByCount.final";

enum Location {
    Temp(tempfile::TempDir),
    Fixed(PathBuf),
}

/// Directory holding run files and phase outputs, together with the way they are encoded.
///
/// Every pipeline instance owns its own working directory, so several instances never
/// address each other's runs.
pub struct WorkDir<C: RunCodec = TsvCodec> {
    location: Location,
    /// Run file read/write buffer size.
    rw_buf_size: Option<usize>,

    codec_type: PhantomData<C>,
}

impl<C: RunCodec> WorkDir<C> {
    /// Creates a fresh temporary directory removed on drop.
    ///
    /// # Arguments
    /// * `parent` - Directory the temporary one is created in. If the parameter is [`None`] default OS temporary
    ///   directory is used.
    /// * `rw_buf_size` - Run files read/write buffer size.
    pub fn temp(parent: Option<&Path>, rw_buf_size: Option<usize>) -> io::Result<Self> {
        let tmp_dir = if let Some(parent) = parent {
            tempfile::tempdir_in(parent)
        } else {
            tempfile::tempdir()
        }?;

        log::info!("using {} as a temporary directory", tmp_dir.path().display());

        return Ok(WorkDir {
            location: Location::Temp(tmp_dir),
            rw_buf_size,
            codec_type: PhantomData,
        });
    }

    /// Uses `path` as is, creating it if missing. Phase outputs are kept after the computation
    /// and overwritten by the next one.
    pub fn fixed(path: &Path, rw_buf_size: Option<usize>) -> io::Result<Self> {
        fs::create_dir_all(path)?;

        log::info!("using {} as a working directory", path.display());

        return Ok(WorkDir {
            location: Location::Fixed(path.to_path_buf()),
            rw_buf_size,
            codec_type: PhantomData,
        });
    }

    pub fn path(&self) -> &Path {
        match &self.location {
            Location::Temp(tmp_dir) => tmp_dir.path(),
            Location::Fixed(path) => path.as_path(),
        }
    }

    /// Path of the run numbered `id`.
    pub fn part_path(&self, id: usize) -> PathBuf {
        self.path().join(format!("{:05}.part", id))
    }

    /// Path of the intermediate merge output numbered `id`.
    pub fn merge_path(&self, id: usize) -> PathBuf {
        self.path().join(format!("{:05}.merge", id))
    }

    pub fn aggregated_path(&self) -> PathBuf {
        self.path().join(AGGREGATED_FILE)
    }

    pub fn sorted_by_count_path(&self) -> PathBuf {
        self.path().join(SORTED_BY_COUNT_FILE)
    }

    pub fn create_run(&self, path: &Path) -> Result<RunWriter<C>, RunError> {
        RunWriter::create(path, self.rw_buf_size)
    }

    pub fn open_run(&self, path: &Path) -> Result<RunReader<C>, RunError> {
        RunReader::open(path, self.rw_buf_size)
    }

    /// Moves a run replacing the target if it exists.
    pub fn rename(&self, from: &Path, to: &Path) -> Result<(), RunError> {
        fs::rename(from, to).map_err(|err| missing_or_io(from, err))
    }

    pub fn remove(&self, path: &Path) -> Result<(), RunError> {
        fs::remove_file(path).map_err(|err| missing_or_io(path, err))
    }
}

fn missing_or_io(path: &Path, err: io::Error) -> RunError {
    match err.kind() {
        io::ErrorKind::NotFound => RunError::Missing(path.to_path_buf()),
        _ => RunError::IO(err),
    }
}

#[cfg(test)]
mod test {
    use rstest::*;

    use super::WorkDir;
    use crate::codec::TsvCodec;
    use crate::run::RunError;

    #[fixture]
    fn tmp_dir() -> tempfile::TempDir {
        tempfile::tempdir_in("./").unwrap()
    }

    #[rstest]
    fn test_file_naming(tmp_dir: tempfile::TempDir) {
        let work_dir: WorkDir<TsvCodec> = WorkDir::fixed(tmp_dir.path(), None).unwrap();

        assert_eq!(work_dir.part_path(1), tmp_dir.path().join("00001.part"));
        assert_eq!(work_dir.merge_path(12), tmp_dir.path().join("00012.merge"));
        assert_eq!(work_dir.aggregated_path(), tmp_dir.path().join("wordcount.final"));
        assert_eq!(work_dir.sorted_by_count_path(), tmp_dir.path().join("sortByCount.final"));
    }

    #[rstest]
    fn test_temp_dir_is_removed(tmp_dir: tempfile::TempDir) {
        let work_dir: WorkDir<TsvCodec> = WorkDir::temp(Some(tmp_dir.path()), None).unwrap();
        let path = work_dir.path().to_path_buf();
        assert!(path.starts_with(tmp_dir.path()));
        assert!(path.is_dir());

        drop(work_dir);
        assert!(!path.exists());
    }

    #[rstest]
    fn test_fixed_dir_is_created(tmp_dir: tempfile::TempDir) {
        let path = tmp_dir.path().join("nested").join("work");
        let work_dir: WorkDir<TsvCodec> = WorkDir::fixed(&path, None).unwrap();
        assert!(work_dir.path().is_dir());
    }

    #[rstest]
    fn test_rename_missing_run(tmp_dir: tempfile::TempDir) {
        let work_dir: WorkDir<TsvCodec> = WorkDir::fixed(tmp_dir.path(), None).unwrap();

        let result = work_dir.rename(&work_dir.part_path(3), &work_dir.part_path(2));
        assert!(matches!(result, Err(RunError::Missing(path)) if path == work_dir.part_path(3)));
    }
}
