//! Session state: the bounded event queue and the render tick.
//!
//! Ingestion appends from whatever task delivers wire lines; the tick
//! runs on its own schedule and never waits on ingestion or on the
//! lookup collaborators. This is the log-and-drop boundary for
//! malformed lines: nothing from the wire propagates as an error past
//! here.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chat_wire::{tags, ChatEvent, Classification, MessageKind, Rgb};
use chrono::Utc;
use serde::Serialize;
use sprite_catalog::Catalog;
use tokio::sync::mpsc;

use crate::config::RenderConfig;
use crate::glyph;
use crate::layout::{self, LayoutResult};
use crate::metrics::GlyphMetrics;
use crate::namecase::{NameCaseResolver, NameLookup};
use crate::reveal::RevealState;
use crate::spans::SpanTable;

/// A username resolution delivered by the external naming service.
#[derive(Debug, Clone)]
pub struct NameResolution {
    pub login: String,
    pub display: String,
}

/// One event queued for display with its derived render state.
#[derive(Debug, Clone)]
struct QueuedEvent {
    event: ChatEvent,
    spans: SpanTable,
    reveal: RevealState,
}

/// Per-event output of one render tick, handed to the renderer.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedMessage {
    pub sender: String,
    pub kind: MessageKind,
    /// Wire color, or the configured default.
    pub color: Rgb,
    /// The displayed text the layout was built from.
    pub text: String,
    pub complete: bool,
    pub layout: LayoutResult,
}

/// Session-scoped chat state. One per connection; `reset` on reconnect.
pub struct Session {
    queue: VecDeque<QueuedEvent>,
    names: NameCaseResolver,
    message_counts: HashMap<String, u64>,
    lookup: Option<Arc<dyn NameLookup>>,
    lookup_rx: Option<mpsc::Receiver<NameResolution>>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            names: NameCaseResolver::new(),
            message_counts: HashMap::new(),
            lookup: None,
            lookup_rx: None,
        }
    }

    /// Session with a username lookup collaborator attached. Requests
    /// go out through `lookup`; resolutions come back on `results` and
    /// are merged at the start of a later tick.
    pub fn with_lookup(lookup: Arc<dyn NameLookup>, results: mpsc::Receiver<NameResolution>) -> Self {
        Self {
            lookup: Some(lookup),
            lookup_rx: Some(results),
            ..Self::new()
        }
    }

    /// Ingest one raw wire line. Unparseable lines are logged and
    /// dropped here, never surfaced.
    pub fn ingest_line(&mut self, raw: &str, cfg: &RenderConfig) {
        match tags::parse_line(raw) {
            Ok(line) => {
                let event = ChatEvent::from_raw(line, Utc::now());
                self.push(event, cfg);
            }
            Err(err) => {
                tracing::warn!(error = %err, line = %raw, "dropping unparseable wire line");
            }
        }
    }

    /// Queue a normalized event, resolving its display casing and
    /// evicting the oldest event on overflow.
    pub fn push(&mut self, mut event: ChatEvent, cfg: &RenderConfig) {
        if !event.sender.is_empty() {
            event.display_name = self.names.resolve(
                &event.sender,
                &event.display_name,
                &event.text,
                cfg.case_policy,
                cfg.adopt_typed_case,
                self.lookup.as_deref(),
            );
            *self.message_counts.entry(event.sender.clone()).or_default() += 1;
        }

        let spans = SpanTable::resolve(&event.emote_ranges);
        while self.queue.len() >= cfg.queue_capacity.max(1) {
            let evicted = self.queue.pop_front();
            tracing::debug!(
                sender = evicted.as_ref().map(|q| q.event.sender.as_str()).unwrap_or(""),
                "queue full, evicting oldest event"
            );
        }
        self.queue.push_back(QueuedEvent {
            event,
            spans,
            reveal: RevealState::new(),
        });
    }

    /// One render tick: merge lookup results, then for every visible
    /// event advance its reveal cursor and lay it out. Cursor
    /// advancement happens before layout for each event, so the layout
    /// reads this tick's cursor, never the previous tick's.
    pub fn tick(
        &mut self,
        cfg: &RenderConfig,
        catalog: &Catalog,
        metrics: &dyn GlyphMetrics,
        tick: Duration,
    ) -> Vec<RenderedMessage> {
        self.merge_lookup_results();

        let mut rendered = Vec::new();
        for queued in self.queue.iter_mut() {
            if !is_visible(&queued.event, cfg) {
                continue;
            }

            let (text, body_offset) = display_text(&queued.event, cfg);
            let text_len = text.chars().count();
            queued.reveal.advance(cfg.reveal_speed, tick, text_len);

            let units = glyph::sequence(&text, body_offset, &queued.spans, &queued.event, catalog, cfg);
            let laid_out = layout::layout(&units, metrics, cfg, queued.reveal.cursor());

            rendered.push(RenderedMessage {
                sender: queued.event.sender.clone(),
                kind: queued.event.kind,
                color: queued.event.color.unwrap_or(cfg.default_color),
                text,
                complete: queued.reveal.is_complete(),
                layout: laid_out,
            });
        }
        rendered
    }

    /// Drain pending name resolutions into the cache and rewrite the
    /// display names of already-queued events from that sender.
    fn merge_lookup_results(&mut self) {
        let Some(rx) = self.lookup_rx.as_mut() else {
            return;
        };
        let mut results = Vec::new();
        while let Ok(resolution) = rx.try_recv() {
            results.push(resolution);
        }
        for resolution in results {
            self.names.apply_result(&resolution.login, &resolution.display);
            let login = resolution.login.to_lowercase();
            for queued in self.queue.iter_mut() {
                if queued.event.sender == login {
                    queued.event.display_name = resolution.display.clone();
                }
            }
        }
    }

    /// Clear everything scoped to the connection: queue, casing cache,
    /// per-user counters and any undelivered lookup results. Nothing
    /// from the prior session is observable afterwards.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.names.reset();
        self.message_counts.clear();
        if let Some(rx) = self.lookup_rx.as_mut() {
            while rx.try_recv().is_ok() {}
        }
        tracing::info!("session reset");
    }

    /// Clear only the casing cache, after a policy change.
    pub fn clear_name_cache(&mut self) {
        self.names.reset();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Messages received from one user this session.
    pub fn message_count(&self, login: &str) -> u64 {
        self.message_counts
            .get(&login.to_lowercase())
            .copied()
            .unwrap_or(0)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether an event is on the display path at all.
fn is_visible(event: &ChatEvent, cfg: &RenderConfig) -> bool {
    match event.kind {
        MessageKind::Join => cfg.show_joins,
        MessageKind::Manual => true,
        MessageKind::Normal | MessageKind::Action => {
            event.classification == Classification::Privmsg
        }
    }
}

/// Build the displayed text for one event under the current snapshot.
/// Returns the text and the code-point offset where the body starts.
fn display_text(event: &ChatEvent, cfg: &RenderConfig) -> (String, usize) {
    let mut text = String::new();
    if cfg.show_timestamps {
        text.push_str(&event.timestamp.format("[%H:%M] ").to_string());
    }
    if cfg.show_usernames && !event.display_name.is_empty() {
        text.push_str(&event.display_name);
        text.push_str(event.kind.separator());
    }
    let body_offset = text.chars().count();
    text.push_str(&event.text);
    (text, body_offset)
}
