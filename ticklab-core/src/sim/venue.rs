//! In-process venue implementing [`ExecutionRuntime`].
//!
//! Limit orders rest until the book crosses them. A buy fills at the best ask
//! when its price is at or above it; a sell fills at the best bid when at or
//! below. Each tick's touch quantity is shared FIFO across resting orders
//! (lowest local id first), so large orders fill partially over several
//! ticks.
//!
//! Nothing is delivered re-entrantly: acks, updates and trades are queued and
//! drained by the replay driver after the current callback returns.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::config::VenueOptions;
use crate::domain::{InstrumentInfo, LocalId, OrderAck, OrderUpdate, Side, Tick, TradeReport};
use crate::runtime::ExecutionRuntime;

/// An event queued for delivery to the strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum VenueEvent {
    Ack(OrderAck),
    Update(OrderUpdate),
    Trade(TradeReport),
}

#[derive(Debug, Clone)]
struct RestingOrder {
    instrument: String,
    side: Side,
    total_qty: f64,
    remaining_qty: f64,
    price: f64,
    tag: String,
}

impl RestingOrder {
    fn update(&self, id: LocalId, canceled: bool) -> OrderUpdate {
        OrderUpdate {
            local_id: id,
            instrument: self.instrument.clone(),
            side: self.side,
            total_qty: self.total_qty,
            remaining_qty: self.remaining_qty,
            price: self.price,
            canceled,
            tag: self.tag.clone(),
        }
    }
}

/// Touch quantity still available on the current tick.
#[derive(Debug, Clone, Copy, Default)]
struct Liquidity {
    bid: f64,
    ask: f64,
}

/// Running venue counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VenueStats {
    pub submitted: u64,
    pub rejected: u64,
    pub fills: u64,
    pub filled_qty: f64,
    pub cancels: u64,
}

pub struct SimVenue {
    instruments: BTreeMap<String, InstrumentInfo>,
    subscriptions: BTreeSet<String>,
    positions: BTreeMap<String, f64>,
    orders: BTreeMap<LocalId, RestingOrder>,
    books: BTreeMap<String, Tick>,
    liquidity: BTreeMap<String, Liquidity>,
    clock: (u32, u32, u32),
    next_id: u32,
    events: VecDeque<VenueEvent>,
    rng: StdRng,
    reject_rate: f64,
    stats: VenueStats,
}

impl SimVenue {
    pub fn new(instruments: Vec<InstrumentInfo>, options: &VenueOptions) -> Self {
        Self {
            instruments: instruments
                .into_iter()
                .map(|i| (i.code.clone(), i))
                .collect(),
            subscriptions: BTreeSet::new(),
            positions: options.initial_positions.clone(),
            orders: BTreeMap::new(),
            books: BTreeMap::new(),
            liquidity: BTreeMap::new(),
            clock: (0, 0, 0),
            next_id: 1,
            events: VecDeque::new(),
            rng: StdRng::seed_from_u64(options.seed),
            reject_rate: options.reject_rate,
            stats: VenueStats::default(),
        }
    }

    pub fn is_subscribed(&self, instrument: &str) -> bool {
        self.subscriptions.contains(instrument)
    }

    pub fn knows(&self, instrument: &str) -> bool {
        self.instruments.contains_key(instrument)
    }

    pub fn stats(&self) -> &VenueStats {
        &self.stats
    }

    pub fn positions(&self) -> &BTreeMap<String, f64> {
        &self.positions
    }

    pub fn open_order_count(&self) -> usize {
        self.orders.len()
    }

    /// Next queued event, in the order it was produced.
    pub fn next_event(&mut self) -> Option<VenueEvent> {
        self.events.pop_front()
    }

    /// Seed an order resting before the strategy started (no ack is sent).
    pub fn add_resting_order(&mut self, instrument: &str, side: Side, price: f64, qty: f64) -> LocalId {
        let id = self.allocate_id();
        self.orders.insert(
            id,
            RestingOrder {
                instrument: instrument.to_string(),
                side,
                total_qty: qty,
                remaining_qty: qty,
                price,
                tag: "external".into(),
            },
        );
        id
    }

    /// Apply a market update: advance the clock, replace the book and match
    /// resting orders against the new touch.
    pub fn on_market(&mut self, tick: &Tick) {
        self.clock = (tick.date, tick.time, tick.millis);
        self.liquidity.insert(
            tick.instrument.clone(),
            Liquidity {
                bid: tick.best_bid().qty,
                ask: tick.best_ask().qty,
            },
        );
        self.books.insert(tick.instrument.clone(), tick.clone());
        let ids: Vec<LocalId> = self
            .orders
            .iter()
            .filter(|(_, o)| o.instrument == tick.instrument)
            .map(|(id, _)| *id)
            .collect();
        for id in ids {
            self.try_fill(id);
        }
    }

    fn allocate_id(&mut self) -> LocalId {
        let id = LocalId(self.next_id);
        self.next_id += 1;
        id
    }

    fn reject(&mut self, id: LocalId, instrument: &str, tag: &str, message: impl Into<String>) {
        let message = message.into();
        self.stats.rejected += 1;
        tracing::debug!(local_id = %id, instrument, tag, message = %message, "venue reject");
        self.events.push_back(VenueEvent::Ack(OrderAck {
            local_id: id,
            instrument: instrument.to_string(),
            accepted: false,
            message,
            tag: tag.to_string(),
        }));
    }

    fn place(&mut self, side: Side, instrument: &str, price: f64, qty: f64, tag: &str) -> Vec<LocalId> {
        let id = self.allocate_id();
        if !self.knows(instrument) {
            self.reject(id, instrument, tag, "unknown instrument");
            return Vec::new();
        }
        if !(qty.is_finite() && qty > 0.0 && price.is_finite()) {
            self.reject(id, instrument, tag, format!("bad order qty={qty} price={price}"));
            return Vec::new();
        }
        if self.reject_rate > 0.0 && self.rng.gen::<f64>() < self.reject_rate {
            self.reject(id, instrument, tag, "simulated reject");
            return Vec::new();
        }

        self.stats.submitted += 1;
        self.orders.insert(
            id,
            RestingOrder {
                instrument: instrument.to_string(),
                side,
                total_qty: qty,
                remaining_qty: qty,
                price,
                tag: tag.to_string(),
            },
        );
        self.events.push_back(VenueEvent::Ack(OrderAck {
            local_id: id,
            instrument: instrument.to_string(),
            accepted: true,
            message: String::new(),
            tag: tag.to_string(),
        }));
        self.try_fill(id);
        vec![id]
    }

    /// Fill `id` against whatever touch liquidity remains on its book.
    fn try_fill(&mut self, id: LocalId) {
        let Some(order) = self.orders.get(&id) else {
            return;
        };
        let Some(book) = self.books.get(&order.instrument) else {
            return;
        };
        let (touch, crosses) = match order.side {
            Side::Buy => {
                let ask = book.best_ask().price;
                (ask, order.price >= ask)
            }
            Side::Sell => {
                let bid = book.best_bid().price;
                (bid, order.price <= bid)
            }
        };
        if !crosses {
            return;
        }
        let liquidity = self.liquidity.entry(order.instrument.clone()).or_default();
        let available = match order.side {
            Side::Buy => &mut liquidity.ask,
            Side::Sell => &mut liquidity.bid,
        };
        let fill = order.remaining_qty.min(*available);
        if fill <= 0.0 {
            return;
        }
        *available -= fill;

        let Some(order) = self.orders.get_mut(&id) else {
            return;
        };
        order.remaining_qty -= fill;
        *self.positions.entry(order.instrument.clone()).or_insert(0.0) += order.side.sign() * fill;
        self.stats.fills += 1;
        self.stats.filled_qty += fill;

        let trade = TradeReport {
            local_id: id,
            instrument: order.instrument.clone(),
            side: order.side,
            qty: fill,
            price: touch,
            tag: order.tag.clone(),
        };
        let update = order.update(id, false);
        tracing::debug!(
            local_id = %id,
            instrument = %trade.instrument,
            side = %trade.side,
            qty = fill,
            price = touch,
            remaining = update.remaining_qty,
            "venue fill"
        );
        if update.remaining_qty <= 0.0 {
            self.orders.remove(&id);
        }
        self.events.push_back(VenueEvent::Trade(trade));
        self.events.push_back(VenueEvent::Update(update));
    }
}

impl ExecutionRuntime for SimVenue {
    fn subscribe(&mut self, instrument: &str) {
        self.subscriptions.insert(instrument.to_string());
    }

    fn position(&self, instrument: &str) -> f64 {
        self.positions.get(instrument).copied().unwrap_or(0.0)
    }

    fn instrument_info(&self, instrument: &str) -> Option<InstrumentInfo> {
        self.instruments.get(instrument).cloned()
    }

    fn unmanaged_open_qty(&self, instrument: &str) -> f64 {
        self.orders
            .values()
            .filter(|o| o.instrument == instrument)
            .map(|o| o.side.sign() * o.remaining_qty)
            .sum()
    }

    fn submit_buy(&mut self, instrument: &str, price: f64, qty: f64, tag: &str) -> Vec<LocalId> {
        self.place(Side::Buy, instrument, price, qty, tag)
    }

    fn submit_sell(&mut self, instrument: &str, price: f64, qty: f64, tag: &str) -> Vec<LocalId> {
        self.place(Side::Sell, instrument, price, qty, tag)
    }

    fn cancel(&mut self, id: LocalId) {
        let Some(order) = self.orders.remove(&id) else {
            tracing::debug!(local_id = %id, "cancel for closed order ignored");
            return;
        };
        self.stats.cancels += 1;
        self.events.push_back(VenueEvent::Update(order.update(id, true)));
    }

    fn cancel_all(&mut self, instrument: &str, is_buy_side: bool) -> Vec<LocalId> {
        let side = if is_buy_side { Side::Buy } else { Side::Sell };
        let ids: Vec<LocalId> = self
            .orders
            .iter()
            .filter(|(_, o)| o.instrument == instrument && o.side == side)
            .map(|(id, _)| *id)
            .collect();
        for id in &ids {
            self.cancel(*id);
        }
        ids
    }

    fn date(&self) -> u32 {
        self.clock.0
    }

    fn time(&self) -> u32 {
        self.clock.1
    }

    fn millis(&self) -> u32 {
        self.clock.2
    }
}
