//! Chat wire protocol layer.
//!
//! Parses IRC-derived chat lines (tag block, prefix, command, trailing
//! text, CTCP ACTION framing) and normalizes them into chat events.
//! Callers sit behind a log-and-drop boundary: a line that fails to
//! parse yields an error here and is discarded by the ingestion layer,
//! never surfaced further.

pub mod emotes;
pub mod event;
pub mod tags;

pub use emotes::RawEmoteRange;
pub use event::{ChatEvent, Classification, MessageKind, Rgb, UserType};
pub use tags::RawLine;

/// Unified error type for the chat-wire crate.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("line does not contain two \" :\" delimiters")]
    MissingDelimiter,

    #[error("empty prefix/command block")]
    MissingCommand,

    #[error("malformed CTCP framing")]
    MalformedCtcp,

    #[error("unsupported CTCP command: {0}")]
    UnsupportedCtcp(String),

    #[error("malformed emotes tag: {0}")]
    EmoteGrammar(String),
}
