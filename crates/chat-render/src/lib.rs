//! Chat render core.
//!
//! Turns normalized chat events into positioned glyph placements:
//! emote span resolution, glyph sequencing, greedy word-wrap layout,
//! the typing-reveal animator and username casing, all driven by a
//! per-tick configuration snapshot. Pixel blitting stays on the other
//! side of the [`layout::LayoutResult`] boundary.

pub mod config;
pub mod glyph;
pub mod layout;
pub mod metrics;
pub mod namecase;
pub mod reveal;
pub mod session;
pub mod spans;

pub use config::{RenderConfig, RevealSpeed};
pub use glyph::{Glyph, GlyphUnit};
pub use layout::{LayoutResult, LinePlacement};
pub use metrics::{FixedCellMetrics, GlyphMetrics};
pub use namecase::{CasePolicy, NameCaseResolver, NameLookup};
pub use reveal::{RevealPhase, RevealState};
pub use session::{NameResolution, RenderedMessage, Session};
pub use spans::{EmoteSpan, SpanTable};
