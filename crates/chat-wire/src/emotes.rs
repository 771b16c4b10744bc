//! Emote tag grammar.
//!
//! The wire format encodes emote placements as
//! `id1:b1-e1,b2-e2/id2:b3-e3` where `id` may be the literal `null` and
//! begin/end are code-point indices with an inclusive end. Ends are
//! converted to exclusive here so downstream span handling can use
//! ordinary half-open ranges.

use crate::WireError;

/// One emote placement straight off the wire, end already exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RawEmoteRange {
    pub id: Option<u64>,
    pub begin: usize,
    pub end: usize,
}

/// Parse the `emotes` tag value.
///
/// An empty value yields no ranges. Any malformed group fails the whole
/// tag; the normalizer logs and skips the field, the event survives.
pub fn parse_emote_ranges(value: &str) -> Result<Vec<RawEmoteRange>, WireError> {
    let mut ranges = Vec::new();
    if value.is_empty() {
        return Ok(ranges);
    }

    for group in value.split('/') {
        let (id_part, range_part) = group
            .split_once(':')
            .ok_or_else(|| grammar_error(group, "missing ':'"))?;

        let id = match id_part {
            "null" => None,
            _ => Some(
                id_part
                    .parse::<u64>()
                    .map_err(|_| grammar_error(group, "bad emote id"))?,
            ),
        };

        for range in range_part.split(',') {
            let (begin, end) = range
                .split_once('-')
                .ok_or_else(|| grammar_error(group, "missing '-'"))?;
            let begin = begin
                .parse::<usize>()
                .map_err(|_| grammar_error(group, "bad begin index"))?;
            let end = end
                .parse::<usize>()
                .map_err(|_| grammar_error(group, "bad end index"))?;
            if end < begin {
                return Err(grammar_error(group, "end before begin"));
            }
            ranges.push(RawEmoteRange {
                id,
                begin,
                end: end + 1,
            });
        }
    }

    Ok(ranges)
}

fn grammar_error(group: &str, what: &str) -> WireError {
    WireError::EmoteGrammar(format!("{what} in {group:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_emote_two_placements() {
        // "Kappa Kappa" with emote id 25 at both words.
        let ranges = parse_emote_ranges("25:0-4,6-10").unwrap();
        assert_eq!(
            ranges,
            vec![
                RawEmoteRange {
                    id: Some(25),
                    begin: 0,
                    end: 5
                },
                RawEmoteRange {
                    id: Some(25),
                    begin: 6,
                    end: 11
                },
            ]
        );
    }

    #[test]
    fn multiple_emote_ids() {
        let ranges = parse_emote_ranges("25:0-4/1902:6-10").unwrap();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].id, Some(25));
        assert_eq!(ranges[1].id, Some(1902));
        assert_eq!(ranges[1].begin, 6);
        assert_eq!(ranges[1].end, 11);
    }

    #[test]
    fn null_id_is_accepted() {
        let ranges = parse_emote_ranges("null:3-7").unwrap();
        assert_eq!(ranges[0].id, None);
        assert_eq!((ranges[0].begin, ranges[0].end), (3, 8));
    }

    #[test]
    fn empty_value_yields_no_ranges() {
        assert!(parse_emote_ranges("").unwrap().is_empty());
    }

    #[test]
    fn malformed_groups_fail_the_whole_tag() {
        assert!(parse_emote_ranges("25").is_err());
        assert!(parse_emote_ranges("25:4").is_err());
        assert!(parse_emote_ranges("abc:0-4").is_err());
        assert!(parse_emote_ranges("25:x-4").is_err());
        assert!(parse_emote_ranges("25:7-3").is_err());
        assert!(parse_emote_ranges("25:0-4/bad").is_err());
    }
}
