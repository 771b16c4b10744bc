//! Emote and badge catalog.
//!
//! Sprites are indexed two ways: by numeric id (positional emote
//! placements already carry the id) and by word. Word lookup is
//! two-tier: an exact map is consulted first, then a list of compiled
//! patterns. Pattern order is not guaranteed, so word-form entries
//! always take priority where both could match, and common words never
//! depend on an O(n) pattern scan.
//!
//! The catalog holds metadata only; fetching and decoding the actual
//! sprite images is the renderer's side of the boundary.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// What a sprite represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpriteKind {
    GlobalEmote,
    ChannelEmote,
    Badge,
}

/// Reference to one renderable sprite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteRef {
    pub id: u64,
    pub name: String,
    /// Pixel width at display scale.
    pub width: u32,
    pub height: u32,
    pub kind: SpriteKind,
}

/// Catalog error type.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid sprite pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

/// In-memory sprite catalog for one session.
#[derive(Debug, Default)]
pub struct Catalog {
    /// Sprite id -> sprite.
    by_id: HashMap<u64, SpriteRef>,
    /// Exact word tier, keyed by (word, kind).
    words: HashMap<(String, SpriteKind), u64>,
    /// Pattern tier, scanned only after the exact tier misses.
    patterns: Vec<(Regex, SpriteKind, u64)>,
}

impl Catalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a sprite, registering its name in the exact word tier.
    /// An existing sprite with the same id is replaced.
    pub fn insert(&mut self, sprite: SpriteRef) {
        self.words
            .insert((sprite.name.clone(), sprite.kind), sprite.id);
        self.by_id.insert(sprite.id, sprite);
    }

    /// Insert a sprite matched by pattern rather than exact word
    /// (regex-form emote codes).
    pub fn insert_pattern(&mut self, pattern: &str, sprite: SpriteRef) -> Result<(), CatalogError> {
        let anchored = format!("^(?:{pattern})$");
        let regex = Regex::new(&anchored).map_err(|source| CatalogError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        self.patterns.push((regex, sprite.kind, sprite.id));
        self.by_id.insert(sprite.id, sprite);
        Ok(())
    }

    /// Look up a sprite by id.
    pub fn by_id(&self, id: u64) -> Option<&SpriteRef> {
        self.by_id.get(&id)
    }

    /// Look up a sprite by word. The exact tier always wins; the
    /// pattern tier is unordered and only reached on an exact miss.
    pub fn by_word(&self, word: &str, kind: SpriteKind) -> Option<&SpriteRef> {
        if let Some(id) = self.words.get(&(word.to_string(), kind)) {
            return self.by_id.get(id);
        }
        self.patterns
            .iter()
            .find(|(regex, pattern_kind, _)| *pattern_kind == kind && regex.is_match(word))
            .and_then(|(_, _, id)| self.by_id.get(id))
    }

    /// Replace the whole catalog with a fresh set of sprites.
    /// Existing entries, including patterns, are dropped.
    pub fn replace_all(&mut self, sprites: impl IntoIterator<Item = SpriteRef>) {
        self.by_id.clear();
        self.words.clear();
        self.patterns.clear();
        for sprite in sprites {
            self.insert(sprite);
        }
        tracing::debug!(count = self.by_id.len(), "sprite catalog replaced");
    }

    /// Number of cataloged sprites.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
