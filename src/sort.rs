//! Z-order sorter: deterministic paint order over the whole mirrored set.
//!
//! Ranking, lowest paints first:
//!
//! 1. Notes paint above everything else.
//! 2. Interface drawings paint above every other non-note document.
//! 3. Higher elevation paints later.
//! 4. At equal elevation: tokens above tiles above drawings.
//! 5. Higher `sort` paints later.
//!
//! Ties keep insertion order. The order is always recomputed over the whole
//! set because a sibling's change can reorder documents whose own fields
//! did not change.

#[cfg(test)]
#[path = "sort_test.rs"]
mod sort_test;

use std::cmp::Ordering;

use crate::doc::DocumentKind;

/// Paint-order inputs of one mirrored document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SortKey {
    pub kind: DocumentKind,
    pub elevation: f64,
    pub sort: i64,
    /// Only meaningful for drawings.
    pub interface: bool,
}

impl SortKey {
    fn tier(&self) -> u8 {
        match self.kind {
            DocumentKind::Note => 2,
            DocumentKind::Drawing if self.interface => 1,
            _ => 0,
        }
    }

    fn type_priority(&self) -> u8 {
        match self.kind {
            DocumentKind::Drawing => 0,
            DocumentKind::Tile => 1,
            DocumentKind::Token => 2,
            DocumentKind::Note => 3,
        }
    }
}

/// Compare two keys. `Less` means `a` paints beneath `b`.
#[must_use]
pub fn compare(a: &SortKey, b: &SortKey) -> Ordering {
    a.tier()
        .cmp(&b.tier())
        .then_with(|| a.elevation.total_cmp(&b.elevation))
        .then_with(|| a.type_priority().cmp(&b.type_priority()))
        .then_with(|| a.sort.cmp(&b.sort))
}

/// Order `items` bottom to top. Each item carries its insertion sequence,
/// which breaks ties so the result is stable under repeated calls.
#[must_use]
pub fn paint_order<T: Copy>(items: &[(T, u64, SortKey)]) -> Vec<T> {
    let mut sorted: Vec<&(T, u64, SortKey)> = items.iter().collect();
    sorted.sort_by(|a, b| compare(&a.2, &b.2).then_with(|| a.1.cmp(&b.1)));
    sorted.into_iter().map(|(item, _, _)| *item).collect()
}
