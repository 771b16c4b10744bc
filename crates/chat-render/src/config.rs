//! Render configuration snapshot.
//!
//! An immutable value object captured once per tick; the layout pass
//! never observes a mutation mid-pass. The live settings surface owns
//! the mutable copy and hands out clones.

use chat_wire::Rgb;
use serde::{Deserialize, Serialize};

use crate::namecase::CasePolicy;

/// Reveal animation speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RevealSpeed {
    /// Maximum setting: messages appear fully drawn.
    Instant,
    CharsPerSec(f32),
}

/// What to draw for a sprite the catalog cannot supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpriteFallback {
    /// Render the source word as plain text.
    #[default]
    Literal,
    /// Leave a blank gap of the default sprite width.
    Blank,
    /// Draw a placeholder glyph of the default sprite width.
    Placeholder,
}

/// Font geometry the layout engine works from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontConfig {
    /// Cell width used for fixed fonts and for space scaling.
    pub cell_width: u32,
    /// Space width as a percentage of the cell width, applied to
    /// proportional fonts only.
    pub space_width_pct: u32,
    pub line_height: u32,
}

/// Per-badge visibility toggles, each independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeToggles {
    pub broadcaster: bool,
    pub moderator: bool,
    pub subscriber: bool,
    pub turbo: bool,
    pub prime: bool,
}

impl Default for BadgeToggles {
    fn default() -> Self {
        Self {
            broadcaster: true,
            moderator: true,
            subscriber: true,
            turbo: true,
            prime: true,
        }
    }
}

/// Immutable configuration snapshot for one render pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Wrap width in pixels.
    pub wrap_width: u32,
    pub font: FontConfig,
    pub reveal_speed: RevealSpeed,
    pub case_policy: CasePolicy,
    /// Adopt the casing a user types for their own name in a message.
    pub adopt_typed_case: bool,
    pub show_timestamps: bool,
    pub show_usernames: bool,
    pub show_badges: bool,
    pub show_joins: bool,
    pub badges: BadgeToggles,
    pub queue_capacity: usize,
    /// Fallback text color for events without a wire color.
    pub default_color: Rgb,
    pub sprite_fallback: SpriteFallback,
    /// Width assumed for blank/placeholder sprite fallbacks.
    pub default_sprite_width: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            wrap_width: 384,
            font: FontConfig {
                cell_width: 16,
                space_width_pct: 50,
                line_height: 32,
            },
            reveal_speed: RevealSpeed::CharsPerSec(15.0),
            case_policy: CasePolicy::None,
            adopt_typed_case: true,
            show_timestamps: false,
            show_usernames: true,
            show_badges: true,
            show_joins: false,
            badges: BadgeToggles::default(),
            queue_capacity: 100,
            default_color: Rgb { r: 0, g: 0, b: 0 },
            sprite_fallback: SpriteFallback::Literal,
            default_sprite_width: 28,
        }
    }
}
