//! CSV tick loader.
//!
//! Columns: `code,date,time,millis,price`, then `bid_px_N`, `bid_qty_N`,
//! `ask_px_N`, `ask_qty_N` for N in 1..=5. Level 1 is required; deeper levels
//! may be missing or blank, and a ladder stops at its first missing level.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use ticklab_core::domain::{BookLevel, Tick};

#[derive(Debug, Deserialize)]
struct TickRow {
    code: String,
    date: u32,
    time: u32,
    millis: u32,
    price: f64,
    bid_px_1: f64,
    bid_qty_1: f64,
    ask_px_1: f64,
    ask_qty_1: f64,
    #[serde(default)]
    bid_px_2: Option<f64>,
    #[serde(default)]
    bid_qty_2: Option<f64>,
    #[serde(default)]
    ask_px_2: Option<f64>,
    #[serde(default)]
    ask_qty_2: Option<f64>,
    #[serde(default)]
    bid_px_3: Option<f64>,
    #[serde(default)]
    bid_qty_3: Option<f64>,
    #[serde(default)]
    ask_px_3: Option<f64>,
    #[serde(default)]
    ask_qty_3: Option<f64>,
    #[serde(default)]
    bid_px_4: Option<f64>,
    #[serde(default)]
    bid_qty_4: Option<f64>,
    #[serde(default)]
    ask_px_4: Option<f64>,
    #[serde(default)]
    ask_qty_4: Option<f64>,
    #[serde(default)]
    bid_px_5: Option<f64>,
    #[serde(default)]
    bid_qty_5: Option<f64>,
    #[serde(default)]
    ask_px_5: Option<f64>,
    #[serde(default)]
    ask_qty_5: Option<f64>,
}

/// Best-first ladder from level 1 plus optional deeper levels.
fn ladder(top: (f64, f64), deeper: [(Option<f64>, Option<f64>); 4]) -> Vec<BookLevel> {
    let mut levels = vec![BookLevel::new(top.0, top.1)];
    for level in deeper {
        match level {
            (Some(px), Some(qty)) => levels.push(BookLevel::new(px, qty)),
            _ => break,
        }
    }
    levels
}

impl TickRow {
    fn into_tick(self) -> Result<Tick> {
        let bids = ladder(
            (self.bid_px_1, self.bid_qty_1),
            [
                (self.bid_px_2, self.bid_qty_2),
                (self.bid_px_3, self.bid_qty_3),
                (self.bid_px_4, self.bid_qty_4),
                (self.bid_px_5, self.bid_qty_5),
            ],
        );
        let asks = ladder(
            (self.ask_px_1, self.ask_qty_1),
            [
                (self.ask_px_2, self.ask_qty_2),
                (self.ask_px_3, self.ask_qty_3),
                (self.ask_px_4, self.ask_qty_4),
                (self.ask_px_5, self.ask_qty_5),
            ],
        );
        Ok(Tick::new(
            self.code, self.price, bids, asks, self.date, self.time, self.millis,
        )?)
    }
}

/// Load every tick in a CSV file, in file order.
pub fn load_ticks(path: &Path) -> Result<Vec<Tick>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("open tick file {}", path.display()))?;
    let mut ticks = Vec::new();
    for (i, row) in reader.deserialize::<TickRow>().enumerate() {
        // Header is line 1.
        let line = i + 2;
        let row = row.with_context(|| format!("{}:{line}: bad row", path.display()))?;
        let tick = row
            .into_tick()
            .with_context(|| format!("{}:{line}: invalid tick", path.display()))?;
        ticks.push(tick);
    }
    tracing::debug!(path = %path.display(), count = ticks.len(), "ticks loaded");
    Ok(ticks)
}
