//! Token stream over text input.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::Path;

/// Characters stripped from tokens by the [`Tokenizer::English`] tokenizer.
pub const PUNCTUATION: &[char] = &['+', '*', ',', '-', '.', ':', ';', '!', '?', '(', ')', '{', '}', '\'', '"', '/', '\\'];

/// Splits text into tokens.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Tokenizer {
    /// Whitespace separated words as is.
    Whitespace,
    /// Whitespace separated words with punctuation removed.
    English,
}

impl Tokenizer {
    fn tokenize(self, word: &str) -> String {
        match self {
            Tokenizer::Whitespace => word.to_string(),
            Tokenizer::English => word.chars().filter(|c| !PUNCTUATION.contains(c)).collect(),
        }
    }
}

/// Set of words to be dropped from a token stream.
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// Loads whitespace separated stop words from a file. A missing file yields an empty set.
    pub fn load(path: &Path) -> io::Result<Self> {
        if !path.exists() {
            log::warn!("stop words file {} not found, no stop words used", path.display());
            return Ok(StopWords::default());
        }

        let content = fs::read_to_string(path)?;
        let stop_words = StopWords::from_iter(content.split_whitespace());
        log::info!("{} stop words loaded from {}", stop_words.len(), path.display());

        return Ok(stop_words);
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for StopWords {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        StopWords {
            words: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Token filter. Returns [`None`] for tokens to be dropped.
#[derive(Debug, Clone)]
pub enum TokenFilter {
    Lowercase,
    StopWords(StopWords),
}

impl TokenFilter {
    pub fn apply(&self, token: String) -> Option<String> {
        match self {
            TokenFilter::Lowercase => Some(token.to_lowercase()),
            TokenFilter::StopWords(stop_words) if stop_words.contains(&token) => None,
            TokenFilter::StopWords(_) => Some(token),
        }
    }
}

/// Lazy, non-restartable stream of normalized tokens read line by line from `reader`.
///
/// Filters are applied in order. Tokens left empty once punctuation is stripped (`"--"`, `"!"`) are dropped
/// instead of being counted as an empty word.
pub struct TokenStream<R: BufRead> {
    lines: io::Lines<R>,
    pending: VecDeque<String>,
    tokenizer: Tokenizer,
    filters: Vec<TokenFilter>,
}

impl<R: BufRead> TokenStream<R> {
    pub fn new(reader: R, tokenizer: Tokenizer) -> Self {
        TokenStream {
            lines: reader.lines(),
            pending: VecDeque::new(),
            tokenizer,
            filters: Vec::new(),
        }
    }

    /// Appends a filter to the filter chain.
    pub fn with_filter(mut self, filter: TokenFilter) -> Self {
        self.filters.push(filter);
        return self;
    }

    fn apply_filters(&self, token: String) -> Option<String> {
        let mut token = token;
        for filter in &self.filters {
            token = filter.apply(token)?;
        }

        return if token.is_empty() { None } else { Some(token) };
    }
}

impl<R: BufRead> Iterator for TokenStream<R> {
    type Item = Result<String, io::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while let Some(token) = self.pending.pop_front() {
                if let Some(token) = self.apply_filters(token) {
                    return Some(Ok(token));
                }
            }

            match self.lines.next()? {
                Ok(line) => {
                    let tokenizer = self.tokenizer;
                    self.pending.extend(line.split_whitespace().map(|word| tokenizer.tokenize(word)));
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::io;

    use rstest::*;

    use super::{StopWords, TokenFilter, TokenStream, Tokenizer};

    fn collect<R: io::BufRead>(stream: TokenStream<R>) -> Vec<String> {
        let tokens: Result<Vec<String>, io::Error> = stream.collect();
        tokens.unwrap()
    }

    #[test]
    fn test_whitespace_tokenizer() {
        let text = "This is an amazing world!";
        let stream = TokenStream::new(text.as_bytes(), Tokenizer::Whitespace);

        assert_eq!(collect(stream), Vec::from_iter(text.split(' ')));
    }

    #[rstest]
    #[case("Hello, world!", vec!["Hello", "world"])]
    #[case("(don't) \"stop\" -- me/you\\them", vec!["dont", "stop", "meyouthem"])]
    #[case("  multiple\n\nlines\t here ", vec!["multiple", "lines", "here"])]
    #[case("", vec![])]
    fn test_english_tokenizer(#[case] text: &str, #[case] expected: Vec<&str>) {
        let stream = TokenStream::new(text.as_bytes(), Tokenizer::English);

        assert_eq!(collect(stream), expected);
    }

    #[test]
    fn test_filters() {
        let stop_words = StopWords::from_iter(["is", "an", "this"]);
        let stream = TokenStream::new("This is an amazing World!".as_bytes(), Tokenizer::English)
            .with_filter(TokenFilter::Lowercase)
            .with_filter(TokenFilter::StopWords(stop_words));

        assert_eq!(collect(stream), vec!["amazing", "world"]);
    }

    #[rstest]
    #[case("-- !! ... ?", vec![])]
    #[case("The -- END!", vec!["end"])]
    fn test_filters_drop_empty_tokens(#[case] text: &str, #[case] expected: Vec<&str>) {
        let stop_words = StopWords::from_iter(["the"]);
        let stream = TokenStream::new(text.as_bytes(), Tokenizer::English)
            .with_filter(TokenFilter::Lowercase)
            .with_filter(TokenFilter::StopWords(stop_words));

        assert_eq!(collect(stream), expected);
    }

    #[test]
    fn test_stop_words_load() {
        let tmp_dir = tempfile::tempdir_in("./").unwrap();
        let path = tmp_dir.path().join("stop_words.txt");
        fs::write(&path, "is\nan  the\n").unwrap();

        let stop_words = StopWords::load(&path).unwrap();
        assert_eq!(stop_words.len(), 3);
        assert!(stop_words.contains("is"));
        assert!(stop_words.contains("an"));
        assert!(!stop_words.contains("amazing"));

        let missing = StopWords::load(&tmp_dir.path().join("missing.txt")).unwrap();
        assert!(missing.is_empty());
    }
}
