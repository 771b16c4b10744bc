//! Greedy word-wrap layout.
//!
//! One left-to-right pass over the glyph sequence, pixel-positioned
//! against the wrap width. Break decisions look ahead over the current
//! word; a word that cannot fit the remaining line but fits an empty
//! one forces a break, and a word wider than the wrap width breaks
//! exactly where the next unit would overflow. The reveal cursor gates
//! placement without disturbing the break structure, so a finished
//! message never reflows as the cursor moves.
//!
//! Identical inputs produce identical output; nothing here iterates in
//! unordered fashion.

use serde::Serialize;

use crate::config::{RenderConfig, SpriteFallback};
use crate::glyph::{Glyph, GlyphUnit};
use crate::metrics::GlyphMetrics;

/// One laid-out line: `y` offset and x-positioned units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePlacement {
    pub y: u32,
    pub units: Vec<(u32, GlyphUnit)>,
}

/// Placement list plus the bounding box in pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutResult {
    pub lines: Vec<LinePlacement>,
    pub bounding_width: u32,
    pub bounding_height: u32,
}

/// Lay out the sequence with placements, gated by the reveal cursor.
pub fn layout(
    units: &[GlyphUnit],
    metrics: &dyn GlyphMetrics,
    cfg: &RenderConfig,
    cursor: f32,
) -> LayoutResult {
    run(units, metrics, cfg, cursor, true)
}

/// Measure-only pass: bounding width and height of the full sequence,
/// with no placement sink.
pub fn measure(units: &[GlyphUnit], metrics: &dyn GlyphMetrics, cfg: &RenderConfig) -> (u32, u32) {
    let result = run(units, metrics, cfg, f32::INFINITY, false);
    (result.bounding_width, result.bounding_height)
}

/// Advance width of one unit in pixels.
fn unit_width(unit: &GlyphUnit, metrics: &dyn GlyphMetrics, cfg: &RenderConfig) -> u32 {
    match &unit.glyph {
        Glyph::Char(ch) => {
            if *ch == ' ' && metrics.proportional() {
                cfg.font.cell_width * cfg.font.space_width_pct / 100
            } else {
                metrics.char_width(*ch)
            }
        }
        Glyph::Emote { sprite, word, .. } => match sprite {
            Some(sprite) => sprite.width,
            None => match cfg.sprite_fallback {
                SpriteFallback::Literal => word.chars().map(|c| metrics.char_width(c)).sum(),
                SpriteFallback::Blank | SpriteFallback::Placeholder => cfg.default_sprite_width,
            },
        },
        Glyph::Badge { sprite, .. } => sprite
            .as_ref()
            .map(|sprite| sprite.width)
            .unwrap_or(cfg.default_sprite_width),
    }
}

fn break_class(unit: &GlyphUnit) -> bool {
    matches!(unit.glyph, Glyph::Char(' ') | Glyph::Char('\t'))
}

fn is_newline(unit: &GlyphUnit) -> bool {
    matches!(unit.glyph, Glyph::Char('\n'))
}

fn run(
    units: &[GlyphUnit],
    metrics: &dyn GlyphMetrics,
    cfg: &RenderConfig,
    cursor: f32,
    collect: bool,
) -> LayoutResult {
    let wrap = cfg.wrap_width;
    let line_height = cfg.font.line_height;
    let widths: Vec<u32> = units
        .iter()
        .map(|unit| unit_width(unit, metrics, cfg))
        .collect();
    let revealed = |idx: usize| (units[idx].src_pos as f32) < cursor;

    let mut lines: Vec<LinePlacement> = Vec::new();
    let mut current: Vec<(u32, GlyphUnit)> = Vec::new();
    let mut x: u32 = 0;
    let mut y: u32 = 0;
    // Whether a revealed unit has been placed on the current line.
    // Hidden units only count toward the bounding box on started lines.
    let mut line_started = false;
    let mut bounding_width: u32 = 0;
    let mut bounding_height: u32 = 0;

    macro_rules! break_line {
        () => {
            if collect && !current.is_empty() {
                lines.push(LinePlacement {
                    y,
                    units: std::mem::take(&mut current),
                });
            }
            current.clear();
            x = 0;
            y += line_height;
            line_started = false;
        };
    }

    let mut i = 0;
    while i < units.len() {
        if is_newline(&units[i]) {
            break_line!();
            i += 1;
            continue;
        }

        if break_class(&units[i]) {
            let w = widths[i];
            // A break-class unit never triggers a wrap decision: it is
            // placed when it fits and otherwise only advances the pen.
            if x + w <= wrap {
                if revealed(i) {
                    if collect {
                        current.push((x, units[i].clone()));
                    }
                    line_started = true;
                }
                if revealed(i) || line_started {
                    bounding_width = bounding_width.max(x + w);
                    bounding_height = bounding_height.max(y + line_height);
                }
            }
            x += w;
            i += 1;
            continue;
        }

        // Look ahead over the current word.
        let mut word_end = i;
        while word_end < units.len()
            && !break_class(&units[word_end])
            && !is_newline(&units[word_end])
        {
            word_end += 1;
        }
        let word_width: u32 = widths[i..word_end].iter().sum();

        // The word misses the remaining width but fits an empty line.
        if x > 0 && x + word_width > wrap && word_width <= wrap {
            break_line!();
        }

        for j in i..word_end {
            let w = widths[j];
            // Mid-word overflow: break exactly where the next unit
            // would exceed the wrap width.
            if x > 0 && x + w > wrap {
                break_line!();
            }
            if revealed(j) {
                if collect {
                    current.push((x, units[j].clone()));
                }
                line_started = true;
            }
            if revealed(j) || line_started {
                bounding_width = bounding_width.max(x + w);
                bounding_height = bounding_height.max(y + line_height);
            }
            x += w;
        }
        i = word_end;
    }

    if collect && !current.is_empty() {
        lines.push(LinePlacement { y, units: current });
    }

    LayoutResult {
        lines,
        bounding_width,
        bounding_height,
    }
}
