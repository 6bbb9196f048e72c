use crate::catalog::types::IndexKey;
use serde::{Deserialize, Serialize};
use std::ops::Bound;

/// A contiguous interval of index keys with inclusive or exclusive endpoints.
/// Union semantics across several ranges belong to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRange {
    lower: Bound<IndexKey>,
    upper: Bound<IndexKey>,
}

impl KeyRange {
    pub fn all() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    pub fn only(key: IndexKey) -> Self {
        Self {
            lower: Bound::Included(key.clone()),
            upper: Bound::Included(key),
        }
    }

    pub fn at_least(key: IndexKey) -> Self {
        Self {
            lower: Bound::Included(key),
            upper: Bound::Unbounded,
        }
    }

    pub fn at_most(key: IndexKey) -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Included(key),
        }
    }

    pub fn greater_than(key: IndexKey) -> Self {
        Self {
            lower: Bound::Excluded(key),
            upper: Bound::Unbounded,
        }
    }

    pub fn less_than(key: IndexKey) -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Excluded(key),
        }
    }

    pub fn between(lower: Bound<IndexKey>, upper: Bound<IndexKey>) -> Self {
        Self { lower, upper }
    }

    pub fn bounds(&self) -> (Bound<IndexKey>, Bound<IndexKey>) {
        (self.lower.clone(), self.upper.clone())
    }

    pub fn contains(&self, key: &IndexKey) -> bool {
        let above_lower = match &self.lower {
            Bound::Unbounded => true,
            Bound::Included(lower) => key >= lower,
            Bound::Excluded(lower) => key > lower,
        };
        let below_upper = match &self.upper {
            Bound::Unbounded => true,
            Bound::Included(upper) => key <= upper,
            Bound::Excluded(upper) => key < upper,
        };
        above_lower && below_upper
    }
}
