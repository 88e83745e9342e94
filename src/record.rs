//! Word count record and its orderings.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A `(key, count)` pair.
///
/// Before aggregation every token occurrence is a record with `count == 1`;
/// after aggregation there is one record per distinct key holding the total.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub key: String,
    pub count: u64,
}

impl Record {
    pub fn new(key: impl Into<String>, count: u64) -> Self {
        Record {
            key: key.into(),
            count,
        }
    }

    /// Creates a record for a single token occurrence.
    pub fn occurrence(key: impl Into<String>) -> Self {
        Record::new(key, 1)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.key, self.count)
    }
}

/// Record ordering used by a sort-merge phase.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Comparator {
    /// Lexicographic by key. Groups duplicates together.
    ByKey,
    /// Numeric by count. Ties are left in whatever order the sort produces.
    ByCount,
}

impl Comparator {
    pub fn compare(self, a: &Record, b: &Record) -> Ordering {
        match self {
            Comparator::ByKey => a.key.cmp(&b.key),
            Comparator::ByCount => a.count.cmp(&b.count),
        }
    }

    /// Checks that `records` is non-decreasing under this comparator.
    pub fn is_sorted<'a>(self, records: impl IntoIterator<Item = &'a Record>) -> bool {
        let mut prev: Option<&Record> = None;
        for record in records {
            if let Some(prev) = prev {
                if self.compare(prev, record) == Ordering::Greater {
                    return false;
                }
            }
            prev = Some(record);
        }

        return true;
    }
}

#[cfg(test)]
mod test {
    use std::cmp::Ordering;

    use rstest::*;

    use super::{Comparator, Record};

    #[rstest]
    #[case(Comparator::ByKey, ("cat", 9), ("dog", 1), Ordering::Less)]
    #[case(Comparator::ByKey, ("the", 1), ("the", 7), Ordering::Equal)]
    #[case(Comparator::ByCount, ("cat", 9), ("dog", 1), Ordering::Greater)]
    #[case(Comparator::ByCount, ("cat", 2), ("dog", 2), Ordering::Equal)]
    fn test_compare(
        #[case] comparator: Comparator,
        #[case] a: (&str, u64),
        #[case] b: (&str, u64),
        #[case] expected: Ordering,
    ) {
        let a = Record::new(a.0, a.1);
        let b = Record::new(b.0, b.1);
        assert_eq!(comparator.compare(&a, &b), expected);
    }

    #[test]
    fn test_is_sorted() {
        let records = vec![Record::new("b", 1), Record::new("a", 2), Record::new("c", 2)];

        assert_eq!(Comparator::ByCount.is_sorted(&records), true);
        assert_eq!(Comparator::ByKey.is_sorted(&records), false);
        assert_eq!(Comparator::ByKey.is_sorted(&Vec::<Record>::new()), true);
    }
}
