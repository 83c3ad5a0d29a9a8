//! Single-instrument book-imbalance strategy.
//!
//! One order batch per triggering tick. While orders are outstanding, ticks
//! only drive timeout management; the signal is re-evaluated fresh once the
//! registry empties.

use super::leg::ManagedLeg;
use super::lifecycle::LifecycleController;
use super::signal::{theoretical_price, Signal};
use super::Strategy;
use crate::config::{ConfigError, ImbalanceOptions};
use crate::domain::{OrderUpdate, Side, Tick};
use crate::registry::CancelCounter;
use crate::runtime::ExecutionRuntime;

pub struct ImbalanceStrategy {
    name: String,
    options: ImbalanceOptions,
    leg: ManagedLeg,
    cancels: CancelCounter,
    lifecycle: LifecycleController,
}

impl ImbalanceStrategy {
    pub fn new(name: impl Into<String>, options: ImbalanceOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self {
            name: name.into(),
            leg: ManagedLeg::new(options.instrument.clone()),
            options,
            cancels: CancelCounter::new(),
            lifecycle: LifecycleController::new(),
        })
    }

    pub fn options(&self) -> &ImbalanceOptions {
        &self.options
    }

    pub fn leg(&self) -> &ManagedLeg {
        &self.leg
    }

    pub fn is_ready(&self) -> bool {
        self.lifecycle.is_ready()
    }
}

impl Strategy for ImbalanceStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_init(&mut self, ctx: &mut dyn ExecutionRuntime) {
        ctx.subscribe(&self.options.instrument);
    }

    fn on_tick(&mut self, ctx: &mut dyn ExecutionRuntime, tick: &Tick) {
        if tick.instrument != self.options.instrument {
            return;
        }
        let now = match ctx.now() {
            Ok(now) => now,
            Err(e) => {
                tracing::warn!(strategy = %self.name, error = %e, "bad session clock, tick skipped");
                return;
            }
        };
        if self.lifecycle.log_tick() {
            tracing::info!(
                strategy = %self.name,
                instrument = %tick.instrument,
                price = tick.price,
                at = %now,
                "tick"
            );
        }

        if !self.leg.is_idle() {
            self.leg
                .cancel_expired(ctx, now, self.options.expiry_secs, &mut self.cancels);
            return;
        }
        if !self.lifecycle.is_ready() {
            return;
        }
        if let Some(last) = self.leg.last_entry() {
            if now.seconds_since(last) <= self.options.quiet_secs {
                return;
            }
        }

        let signal = Signal::from_tick(tick);
        let position = ctx.position(&self.options.instrument);
        let side = match signal {
            Signal::Long if position <= 0.0 => Side::Buy,
            Signal::Short if position >= 0.0 => Side::Sell,
            _ => return,
        };
        let Some(info) = ctx.instrument_info(&self.options.instrument) else {
            tracing::warn!(instrument = %self.options.instrument, "no instrument info, signal skipped");
            return;
        };

        let price = info.offset_through(tick.price, side, self.options.offset_ticks);
        let tag = side.to_string();
        let ids = ctx.submit(side, &self.options.instrument, price, self.options.order_qty, &tag);
        tracing::info!(
            strategy = %self.name,
            instrument = %self.options.instrument,
            signal = ?signal,
            theo = theoretical_price(tick),
            last = tick.price,
            position,
            %side,
            price,
            qty = self.options.order_qty,
            tag = %tag,
            ids = ?ids,
            "entry submitted"
        );
        self.leg.track_entry(ids, now);
    }

    fn on_order_update(&mut self, _ctx: &mut dyn ExecutionRuntime, update: &OrderUpdate) {
        self.leg.on_update(update, &mut self.cancels);
    }

    fn on_channel_ready(&mut self, ctx: &mut dyn ExecutionRuntime) {
        self.lifecycle
            .channel_ready(ctx, &mut [&mut self.leg], &mut self.cancels);
    }

    fn on_channel_lost(&mut self, _ctx: &mut dyn ExecutionRuntime) {
        self.lifecycle.channel_lost();
    }

    fn on_session_end(&mut self, _ctx: &mut dyn ExecutionRuntime, trading_date: u32) {
        self.lifecycle.session_end(trading_date);
    }

    fn pending_cancels(&self) -> u64 {
        self.cancels.get()
    }
}
