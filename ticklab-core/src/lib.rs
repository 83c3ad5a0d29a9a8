//! TickLab Core — tick-driven order management and timed execution.
//!
//! This crate contains the kernel a strategy host embeds:
//! - Session clock composed from runtime date/time fields
//! - Per-instrument order registries and the cancel counter
//! - Time-sliced execution algorithm with horizon, slot budget and cooldown
//! - Decision layer: imbalance signal, pair hedging, repricing ladder
//! - Channel/session lifecycle with reconciliation
//! - A simulated venue and replay driver implementing the runtime API

pub mod algo;
pub mod clock;
pub mod config;
pub mod domain;
pub mod registry;
pub mod runtime;
pub mod sim;
pub mod strategy;
