//! Run file encodings.

use std::fs;
use std::io;
use std::io::prelude::*;

use crate::record::Record;
use crate::run::RunError;

/// Run codec interface. Provides methods for writing a single record to a run file and reading it back.
///
/// A codec must decode exactly the records it encoded and in the same order, otherwise merges
/// silently corrupt the sort order of a run.
pub trait RunCodec: Send + Sync + 'static {
    /// Appends a record to a run file.
    fn write(writer: &mut io::BufWriter<fs::File>, record: &Record) -> Result<(), RunError>;

    /// Reads the next record from a run file. Returns [`None`] at the end of the file.
    fn read(reader: &mut io::BufReader<fs::File>) -> Option<Result<Record, RunError>>;
}

/// Tab separated text codec: one `key<TAB>count` record per line.
///
/// Keys must not contain a tab or a newline.
pub struct TsvCodec;

impl TsvCodec {
    fn parse(line: &str) -> Result<Record, RunError> {
        let (key, count) = line.split_once('\t').ok_or_else(|| RunError::Format {
            line: line.to_string(),
            reason: "missing tab separator".to_string(),
        })?;

        let count = count.parse::<u64>().map_err(|err| RunError::Format {
            line: line.to_string(),
            reason: format!("invalid count: {}", err),
        })?;

        return Ok(Record::new(key, count));
    }
}

impl RunCodec for TsvCodec {
    fn write(writer: &mut io::BufWriter<fs::File>, record: &Record) -> Result<(), RunError> {
        writeln!(writer, "{}\t{}", record.key, record.count).map_err(RunError::IO)
    }

    fn read(reader: &mut io::BufReader<fs::File>) -> Option<Result<Record, RunError>> {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => {
                let line = line.strip_suffix('\n').unwrap_or(&line);
                Some(Self::parse(line))
            }
            Err(err) => Some(Err(RunError::IO(err))),
        }
    }
}

/// RMP (Rust MessagePack) codec.
/// It stores every record as a MessagePack `[key, count]` array.
/// For more information see https://msgpack.org/.
pub struct RmpCodec;

impl RunCodec for RmpCodec {
    fn write(writer: &mut io::BufWriter<fs::File>, record: &Record) -> Result<(), RunError> {
        rmp_serde::encode::write(writer, record).map_err(RunError::Serialization)
    }

    fn read(reader: &mut io::BufReader<fs::File>) -> Option<Result<Record, RunError>> {
        match reader.fill_buf() {
            Ok(buf) if buf.is_empty() => None,
            Ok(_) => Some(rmp_serde::decode::from_read(&mut *reader).map_err(RunError::Deserialization)),
            Err(err) => Some(Err(RunError::IO(err))),
        }
    }
}

#[cfg(test)]
mod test {
    use rstest::*;

    use super::TsvCodec;
    use crate::record::Record;
    use crate::run::RunError;

    #[rstest]
    #[case("the\t3", Record::new("the", 3))]
    #[case("\t1", Record::new("", 1))]
    #[case("caf\u{e9}\t42", Record::new("caf\u{e9}", 42))]
    fn test_tsv_parse(#[case] line: &str, #[case] expected: Record) {
        assert_eq!(TsvCodec::parse(line).unwrap(), expected);
    }

    #[rstest]
    #[case("the")]
    #[case("the\t")]
    #[case("the\tthree")]
    #[case("the\t-1")]
    #[case("the\t1\t2")]
    fn test_tsv_parse_error(#[case] line: &str) {
        match TsvCodec::parse(line) {
            Err(RunError::Format { line: actual, .. }) => assert_eq!(actual, line),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
