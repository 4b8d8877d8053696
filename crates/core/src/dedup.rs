use std::collections::HashSet;

use crate::domain::Identified;

/// Collapse items sharing an `ID` down to one.
/// The first occurrence in input order survives and survivors keep their input order.
pub fn dedup_by_id<T: Identified>(items: Vec<T>) -> Vec<T> {
    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.record_id().to_string()))
        .collect()
}

/// Number of distinct IDs in `items`.
pub fn count_unique<T: Identified>(items: &[T]) -> usize {
    items
        .iter()
        .map(|item| item.record_id())
        .collect::<HashSet<&str>>()
        .len()
}
