//! Headless chat feed.
//!
//! Reads wire lines from stdin, runs the full ingestion pipeline and a
//! fixed-interval render tick, and writes per-message layout results to
//! stdout as JSON lines. Useful for driving the pipeline without any
//! window system attached.

use std::time::Duration;

use anyhow::Result;
use chat_render::{FixedCellMetrics, RenderConfig, Session};
use sprite_catalog::{Catalog, SpriteKind, SpriteRef};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Fixed render tick interval.
const TICK_INTERVAL: Duration = Duration::from_millis(67);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cfg = RenderConfig::default();
    let metrics = FixedCellMetrics {
        cell_width: cfg.font.cell_width,
    };
    let catalog = seed_catalog();
    let mut session = Session::new();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    let mut eof = false;

    tracing::info!("chat feed started, reading wire lines from stdin");

    loop {
        tokio::select! {
            line = lines.next_line(), if !eof => {
                match line? {
                    Some(line) => session.ingest_line(&line, &cfg),
                    None => {
                        eof = true;
                        tracing::info!("stdin closed, draining reveal animations");
                    }
                }
            }
            _ = ticker.tick() => {
                let rendered = session.tick(&cfg, &catalog, &metrics, TICK_INTERVAL);
                let complete = rendered.iter().filter(|m| m.complete).count();
                for message in &rendered {
                    println!("{}", serde_json::to_string(message)?);
                }
                if eof && complete == rendered.len() {
                    break;
                }
            }
        }
    }

    tracing::info!("chat feed finished");
    Ok(())
}

/// A few well-known global emotes so piped demos resolve sprites
/// without any catalog service attached.
fn seed_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    for (id, name) in [(25u64, "Kappa"), (88, "PogChamp"), (1902, "Keepo")] {
        catalog.insert(SpriteRef {
            id,
            name: name.to_string(),
            width: 28,
            height: 28,
            kind: SpriteKind::GlobalEmote,
        });
    }
    catalog
}
