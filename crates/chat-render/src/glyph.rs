//! Glyph sequencing.
//!
//! Builds the ordered glyph sequence for one render pass: the displayed
//! text walked one code point at a time, with emote spans spliced in as
//! single units and badge units prepended. The sequence is rebuilt per
//! pass and does not outlive it.
//!
//! Invariant: the source code points consumed across all units equal
//! the code-point length of the displayed text exactly. Badges consume
//! none.

use chat_wire::{ChatEvent, UserType};
use serde::{Deserialize, Serialize};
use sprite_catalog::{Catalog, SpriteKind, SpriteRef};

use crate::config::RenderConfig;
use crate::spans::SpanTable;

/// Atomic renderable element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Glyph {
    Char(char),
    Emote {
        id: Option<u64>,
        /// Source text the emote replaces, kept for literal fallback.
        word: String,
        sprite: Option<SpriteRef>,
    },
    Badge {
        key: String,
        sprite: Option<SpriteRef>,
    },
}

/// One sequenced unit with its position in the displayed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphUnit {
    pub glyph: Glyph,
    /// Code-point index the unit starts at; gates reveal.
    pub src_pos: usize,
    /// Code points consumed from the source text.
    pub src_len: usize,
}

/// Build the glyph sequence for one displayed text.
///
/// `body_offset` is the code-point index where the message body starts
/// (after any timestamp/name prefix); emote spans are body-relative.
pub fn sequence(
    text: &str,
    body_offset: usize,
    spans: &SpanTable,
    event: &ChatEvent,
    catalog: &Catalog,
    cfg: &RenderConfig,
) -> Vec<GlyphUnit> {
    let chars: Vec<char> = text.chars().collect();
    let mut units = Vec::with_capacity(chars.len() + 4);

    if cfg.show_badges {
        units.extend(badge_units(event, catalog, cfg));
    }

    let mut i = 0;
    while i < chars.len() {
        if i >= body_offset {
            let body_idx = i - body_offset;

            if let Some(span) = spans.starting_at(body_idx) {
                let end = (body_offset + span.end).min(chars.len());
                let word: String = chars[i..end].iter().collect();
                let sprite = span.id.and_then(|id| catalog.by_id(id)).cloned();
                if sprite.is_none() {
                    tracing::debug!(id = ?span.id, word = %word, "emote sprite not cataloged");
                }
                units.push(GlyphUnit {
                    glyph: Glyph::Emote {
                        id: span.id,
                        word,
                        sprite,
                    },
                    src_pos: i,
                    src_len: end - i,
                });
                i = end;
                continue;
            }

            // Word-form emotes: a whole word not covered by any
            // positional span may still name a cataloged emote.
            if at_word_start(&chars, i) {
                let end = word_end(&chars, i, body_offset, spans);
                let word: String = chars[i..end].iter().collect();
                if let Some(sprite) = word_sprite(catalog, &word) {
                    units.push(GlyphUnit {
                        glyph: Glyph::Emote {
                            id: Some(sprite.id),
                            word,
                            sprite: Some(sprite.clone()),
                        },
                        src_pos: i,
                        src_len: end - i,
                    });
                    i = end;
                    continue;
                }
            }
        }

        units.push(GlyphUnit {
            glyph: Glyph::Char(chars[i]),
            src_pos: i,
            src_len: 1,
        });
        i += 1;
    }

    debug_assert_eq!(
        units.iter().map(|u| u.src_len).sum::<usize>(),
        chars.len(),
        "glyph sequence must consume every source code point exactly once",
    );

    units
}

fn is_break_char(ch: char) -> bool {
    ch == ' ' || ch == '\t' || ch == '\n'
}

fn at_word_start(chars: &[char], i: usize) -> bool {
    !is_break_char(chars[i]) && (i == 0 || is_break_char(chars[i - 1]))
}

/// End of the word starting at `i`, stopping early if a positional span
/// begins inside it.
fn word_end(chars: &[char], i: usize, body_offset: usize, spans: &SpanTable) -> usize {
    let mut end = i;
    while end < chars.len() && !is_break_char(chars[end]) {
        if end > i && spans.starting_at(end - body_offset).is_some() {
            break;
        }
        end += 1;
    }
    end
}

/// Channel emotes shadow global ones for the same word.
fn word_sprite<'a>(catalog: &'a Catalog, word: &str) -> Option<&'a SpriteRef> {
    catalog
        .by_word(word, SpriteKind::ChannelEmote)
        .or_else(|| catalog.by_word(word, SpriteKind::GlobalEmote))
}

/// Badge units for each active, enabled flag, in fixed priority order:
/// broadcaster, special user class, subscriber, turbo, prime.
fn badge_units(event: &ChatEvent, catalog: &Catalog, cfg: &RenderConfig) -> Vec<GlyphUnit> {
    let mut keys: Vec<String> = Vec::new();

    if cfg.badges.broadcaster {
        if let Some(key) = badge_key(event, "broadcaster") {
            keys.push(key);
        }
    }
    if cfg.badges.moderator && event.user_type != UserType::None {
        if let Some(set) = event.user_type.badge_set() {
            keys.push(badge_key(event, set).unwrap_or_else(|| format!("{set}/1")));
        }
    }
    if cfg.badges.subscriber && event.subscriber {
        keys.push(badge_key(event, "subscriber").unwrap_or_else(|| "subscriber/1".to_string()));
    }
    if cfg.badges.turbo && event.turbo {
        keys.push(badge_key(event, "turbo").unwrap_or_else(|| "turbo/1".to_string()));
    }
    if cfg.badges.prime && event.prime {
        keys.push(badge_key(event, "premium").unwrap_or_else(|| "premium/1".to_string()));
    }

    keys.into_iter()
        .map(|key| {
            let sprite = badge_sprite(catalog, &key).cloned();
            GlyphUnit {
                glyph: Glyph::Badge { key, sprite },
                src_pos: 0,
                src_len: 0,
            }
        })
        .collect()
}

/// The event's own `set/version` key for a badge set, if it carries one.
fn badge_key(event: &ChatEvent, set: &str) -> Option<String> {
    event
        .badge_keys
        .iter()
        .find(|key| key.as_str() == set || key.starts_with(&format!("{set}/")))
        .cloned()
}

/// Exact key first, bare set name as fallback.
fn badge_sprite<'a>(catalog: &'a Catalog, key: &str) -> Option<&'a SpriteRef> {
    catalog.by_word(key, SpriteKind::Badge).or_else(|| {
        let set = key.split('/').next().unwrap_or(key);
        catalog.by_word(set, SpriteKind::Badge)
    })
}
