//! Emote span resolution.
//!
//! The wire delivers emote ranges in no particular order and may repeat
//! a begin index. The span table is the one source of truth keyed by
//! begin: insertion follows input order and a later range with the same
//! begin overwrites the earlier one. Overlapping spans with different
//! begins are an accepted upstream data condition and pass through
//! untouched.

use std::collections::BTreeMap;

use chat_wire::RawEmoteRange;
use serde::{Deserialize, Serialize};

/// One resolved emote placement, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmoteSpan {
    pub id: Option<u64>,
    pub begin: usize,
    pub end: usize,
}

/// Begin-keyed span table for one event, iterated in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanTable {
    by_begin: BTreeMap<usize, EmoteSpan>,
}

impl SpanTable {
    /// Resolve raw wire ranges into the canonical table.
    pub fn resolve(ranges: &[RawEmoteRange]) -> Self {
        let mut by_begin = BTreeMap::new();
        for range in ranges {
            by_begin.insert(
                range.begin,
                EmoteSpan {
                    id: range.id,
                    begin: range.begin,
                    end: range.end,
                },
            );
        }
        Self { by_begin }
    }

    /// Span starting exactly at the given code-point index.
    pub fn starting_at(&self, begin: usize) -> Option<&EmoteSpan> {
        self.by_begin.get(&begin)
    }

    /// Spans in ascending begin order.
    pub fn iter(&self) -> impl Iterator<Item = &EmoteSpan> {
        self.by_begin.values()
    }

    pub fn len(&self) -> usize {
        self.by_begin.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_begin.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn range(id: u64, begin: usize, end: usize) -> RawEmoteRange {
        RawEmoteRange {
            id: Some(id),
            begin,
            end,
        }
    }

    #[test]
    fn sorts_by_begin() {
        let table = SpanTable::resolve(&[range(2, 6, 11), range(1, 0, 5)]);
        let begins: Vec<usize> = table.iter().map(|s| s.begin).collect();
        assert_eq!(begins, vec![0, 6]);
    }

    #[test]
    fn duplicate_begin_is_last_write_wins() {
        let table = SpanTable::resolve(&[range(1, 0, 5), range(2, 0, 7)]);
        assert_eq!(table.len(), 1);
        let span = table.starting_at(0).unwrap();
        assert_eq!(span.id, Some(2));
        assert_eq!(span.end, 7);
    }

    #[test]
    fn overlapping_distinct_begins_are_kept() {
        let table = SpanTable::resolve(&[range(1, 0, 6), range(2, 3, 9)]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn resolution_is_idempotent() {
        let ranges = [range(1, 4, 9), range(2, 0, 3), range(2, 0, 3)];
        let once = SpanTable::resolve(&ranges);
        let ranges_again: Vec<RawEmoteRange> = once
            .iter()
            .map(|s| RawEmoteRange {
                id: s.id,
                begin: s.begin,
                end: s.end,
            })
            .collect();
        assert_eq!(SpanTable::resolve(&ranges_again), once);
    }

    proptest! {
        // For ranges with distinct begins, input order is irrelevant.
        #[test]
        fn order_independent_on_distinct_begins(
            perm in Just(vec![
                range(25, 0, 5),
                range(25, 6, 11),
                range(88, 14, 22),
                range(1902, 30, 33),
            ])
            .prop_shuffle()
        ) {
            let sorted = SpanTable::resolve(&[
                range(25, 0, 5),
                range(25, 6, 11),
                range(88, 14, 22),
                range(1902, 30, 33),
            ]);
            prop_assert_eq!(SpanTable::resolve(&perm), sorted);
        }
    }
}
