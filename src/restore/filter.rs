// bulkrestore/src/restore/filter.rs
use std::collections::HashSet;

use crate::config::FilterSpec;

/// Applies the include filter, then the exclude filter, to `keys`.
///
/// Matching is a case-sensitive literal substring test. A key survives the
/// include stage if it contains any include entry (or if there are none), and
/// survives the exclude stage only if it contains no exclude entry. Duplicates
/// are dropped, keeping the first occurrence; no particular order is promised,
/// so callers that need one must sort.
pub fn apply<I>(keys: I, filters: &FilterSpec) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    keys.into_iter()
        .filter(|key| {
            filters.include.is_empty()
                || filters.include.iter().any(|needle| key.contains(needle.as_str()))
        })
        .filter(|key| !filters.exclude.iter().any(|needle| key.contains(needle.as_str())))
        .filter(|key| seen.insert(key.clone()))
        .collect()
}
