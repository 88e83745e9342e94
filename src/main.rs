use std::fs;
use std::io;
use std::path;
use std::process;

use bytesize::ByteSize;
use clap::ArgEnum;
use env_logger;
use log;

use ext_wordfreq::{
    ExternalSortStrategy, ExternalSortStrategyBuilder, InMemoryStrategy, StopWords, TokenFilter, TokenStream,
    Tokenizer, TopBottom, WordCountStrategy,
};

fn main() {
    let arg_parser = build_arg_parser();

    let log_level: log::LevelFilter = arg_parser.value_of_t_or_exit("log_level");
    init_logger(log_level);

    let strategy: Strategy = arg_parser.value_of_t_or_exit("strategy");
    let k: usize = arg_parser.value_of_t_or_exit("k");
    let tmp_dir: Option<&str> = arg_parser.value_of("tmp_dir");
    let work_dir: Option<&str> = arg_parser.value_of("work_dir");
    let rw_buf_size: Option<usize> = arg_parser
        .value_of("rw_buf_size")
        .map(|value| parse_buf_size(value).expect("value is pre-validated"));
    let threads: Option<usize> = arg_parser
        .is_present("threads")
        .then(|| arg_parser.value_of_t_or_exit("threads"));

    let stop_words_path = arg_parser.value_of("stop_words").expect("value has default");
    let stop_words = match StopWords::load(path::Path::new(stop_words_path)) {
        Ok(stop_words) => stop_words,
        Err(err) => {
            log::error!("stop words loading error: {}", err);
            process::exit(1);
        }
    };

    let input = arg_parser.value_of("input").expect("value is required");
    let input_stream = match fs::File::open(input) {
        Ok(file) => io::BufReader::new(file),
        Err(err) => {
            log::error!("input file opening error: {}", err);
            process::exit(1);
        }
    };

    let tokens = TokenStream::new(input_stream, Tokenizer::English)
        .with_filter(TokenFilter::Lowercase)
        .with_filter(TokenFilter::StopWords(stop_words));

    let result = match strategy {
        Strategy::Inmemory => InMemoryStrategy::new(k).compute(tokens),
        Strategy::Externalsort => {
            let mut strategy_builder = ExternalSortStrategyBuilder::new().with_k(k);
            if let Some(threads) = threads {
                strategy_builder = strategy_builder.with_threads_number(threads);
            }

            if let Some(tmp_dir) = tmp_dir {
                strategy_builder = strategy_builder.with_tmp_dir(path::Path::new(tmp_dir));
            }

            if let Some(work_dir) = work_dir {
                strategy_builder = strategy_builder.with_work_dir(path::Path::new(work_dir));
            }

            if let Some(rw_buf_size) = rw_buf_size {
                strategy_builder = strategy_builder.with_rw_buf_size(rw_buf_size);
            }

            let strategy: ExternalSortStrategy = match strategy_builder.build() {
                Ok(strategy) => strategy,
                Err(err) => {
                    log::error!("strategy initialization error: {}", err);
                    process::exit(1);
                }
            };

            strategy.compute(tokens)
        }
    };

    match result {
        Ok(result) => print_result(&result, k),
        Err(err) => {
            log::error!("word counting error: {}", err);
            process::exit(1);
        }
    }
}

fn print_result(result: &TopBottom, k: usize) {
    println!("Most frequent {} words", k);
    for record in result.top_ranked() {
        println!("{}", record);
    }

    println!();

    println!("Least frequent {} words", k);
    for record in &result.bottom {
        println!("{}", record);
    }
}

/// Accepted `--loglevel` values, parsed with [`log::LevelFilter`]'s own `FromStr`.
const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

#[derive(Copy, Clone, clap::ArgEnum)]
enum Strategy {
    Externalsort,
    Inmemory,
}

impl Strategy {
    pub fn possible_values() -> impl Iterator<Item = clap::PossibleValue<'static>> {
        Strategy::value_variants().iter().filter_map(|v| v.to_possible_value())
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Strategy as clap::ArgEnum>::from_str(s, true)
    }
}

fn build_arg_parser() -> clap::ArgMatches {
    clap::App::new("ext-wordfreq")
        .about("most and least frequent words of a text file")
        .arg(
            clap::Arg::new("input")
                .short('i')
                .long("input")
                .help("text file to be analyzed")
                .required(true)
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("stop_words")
                .short('w')
                .long("stop-words")
                .help("file of whitespace separated words to be ignored")
                .takes_value(true)
                .default_value("stop_words.txt"),
        )
        .arg(
            clap::Arg::new("strategy")
                .short('s')
                .long("strategy")
                .help("word counting strategy")
                .takes_value(true)
                .default_value("externalsort")
                .possible_values(Strategy::possible_values()),
        )
        .arg(
            clap::Arg::new("k")
                .short('k')
                .long("top")
                .help("number of most and least frequent words to report")
                .takes_value(true)
                .default_value("5"),
        )
        .arg(
            clap::Arg::new("log_level")
                .short('l')
                .long("loglevel")
                .help("logging level")
                .takes_value(true)
                .default_value("info")
                .possible_values(LOG_LEVELS),
        )
        .arg(
            clap::Arg::new("threads")
                .short('t')
                .long("threads")
                .help("number of threads to use for parallel sorting and merging")
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("tmp_dir")
                .short('d')
                .long("tmp-dir")
                .help("directory to be used to store temporary data")
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("work_dir")
                .long("work-dir")
                .help("directory to keep the phase output files in")
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("rw_buf_size")
                .long("rw-buf-size")
                .help("run files read/write buffer size")
                .takes_value(true)
                .validator(|v| parse_buf_size(v).map(|_| ())),
        )
        .get_matches()
}

/// Parses a human readable size (`64KiB`, `1MB`) into a buffer size addressable on this platform.
fn parse_buf_size(value: &str) -> Result<usize, String> {
    let size = value
        .parse::<ByteSize>()
        .map_err(|err| format!("Buffer size format incorrect: {}", err))?;

    return usize::try_from(size.as_u64()).map_err(|_| format!("Buffer size {} is too large", size));
}

fn init_logger(level: log::LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).format_timestamp_millis();
    builder.init();
}
