//! Two-leg pair strategy.
//!
//! The primary leg carries the scheduled exposure, worked either through a
//! [`RepricingLadder`] or a [`SlicingAlgo`]. The hedge leg only ever
//! flattens pair-level net exposure: it follows, never initiates.

use super::ladder::RepricingLadder;
use super::leg::ManagedLeg;
use super::lifecycle::LifecycleController;
use super::Strategy;
use crate::algo::{AlgoSlot, SlicingAlgo};
use crate::clock::SessionTime;
use crate::config::{ConfigError, PairOptions, PrimaryLegMode, SliceOptions};
use crate::domain::{OrderUpdate, Side, Tick};
use crate::registry::CancelCounter;
use crate::runtime::ExecutionRuntime;

enum PrimaryWorker {
    Ladder(RepricingLadder),
    Sliced(SliceSchedule),
}

struct SliceSchedule {
    options: SliceOptions,
    activate_at: (u32, u32),
    slot: AlgoSlot,
    /// Trading date the algorithm last started on.
    started_on: Option<u32>,
}

pub struct PairStrategy {
    name: String,
    options: PairOptions,
    hedge: ManagedLeg,
    primary: ManagedLeg,
    worker: PrimaryWorker,
    cancels: CancelCounter,
    lifecycle: LifecycleController,
}

impl PairStrategy {
    pub fn new(name: impl Into<String>, options: PairOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        let worker = match &options.primary {
            PrimaryLegMode::Ladder(ladder) => PrimaryWorker::Ladder(RepricingLadder::new(ladder.clone())),
            PrimaryLegMode::Sliced(slice) => PrimaryWorker::Sliced(SliceSchedule {
                activate_at: slice.activation()?,
                options: slice.clone(),
                slot: AlgoSlot::new(),
                started_on: None,
            }),
        };
        Ok(Self {
            name: name.into(),
            hedge: ManagedLeg::new(options.hedge_leg.clone()),
            primary: ManagedLeg::new(options.primary_leg.clone()),
            options,
            worker,
            cancels: CancelCounter::new(),
            lifecycle: LifecycleController::new(),
        })
    }

    pub fn options(&self) -> &PairOptions {
        &self.options
    }

    pub fn hedge(&self) -> &ManagedLeg {
        &self.hedge
    }

    pub fn primary(&self) -> &ManagedLeg {
        &self.primary
    }

    /// The running slicing algorithm, if any.
    pub fn algo(&self) -> Option<&SlicingAlgo> {
        match &self.worker {
            PrimaryWorker::Sliced(s) => s.slot.get(),
            PrimaryWorker::Ladder(_) => None,
        }
    }

    fn net_exposure(&self, ctx: &dyn ExecutionRuntime) -> f64 {
        ctx.position(&self.options.hedge_leg) + ctx.position(&self.options.primary_leg)
    }

    fn on_hedge_tick(&mut self, ctx: &mut dyn ExecutionRuntime, tick: &Tick, now: SessionTime) {
        if !self.hedge.is_idle() {
            self.hedge
                .cancel_expired(ctx, now, self.options.expiry_secs, &mut self.cancels);
            return;
        }
        if !self.lifecycle.is_ready() {
            return;
        }
        let net = self.net_exposure(ctx);
        let Some(side) = Side::to_flatten(net) else {
            return;
        };
        let Some(info) = ctx.instrument_info(&self.options.hedge_leg) else {
            tracing::warn!(instrument = %self.options.hedge_leg, "no instrument info, hedge skipped");
            return;
        };
        let price = info.offset_through(tick.price, side, self.options.hedge_offset_ticks);
        let qty = net.abs();
        let tag = format!("{side}_front");
        let ids = ctx.submit(side, &self.options.hedge_leg, price, qty, &tag);
        tracing::info!(
            strategy = %self.name,
            instrument = %self.options.hedge_leg,
            net,
            %side,
            price,
            qty,
            tag = %tag,
            ids = ?ids,
            "hedge submitted"
        );
        self.hedge.track_entry(ids, now);
    }

    fn on_primary_tick(&mut self, ctx: &mut dyn ExecutionRuntime, tick: &Tick, now: SessionTime) {
        if matches!(self.worker, PrimaryWorker::Sliced(_)) {
            self.on_sliced_tick(ctx, tick, now);
        } else {
            self.on_ladder_tick(ctx, tick, now);
        }
    }

    fn on_ladder_tick(&mut self, ctx: &mut dyn ExecutionRuntime, tick: &Tick, now: SessionTime) {
        let PrimaryWorker::Ladder(ladder) = &self.worker else {
            return;
        };
        if !self.primary.is_idle() {
            self.primary
                .cancel_expired(ctx, now, self.options.expiry_secs, &mut self.cancels);
            return;
        }
        if !self.lifecycle.is_ready() {
            return;
        }
        let Some(info) = ctx.instrument_info(&self.options.primary_leg) else {
            tracing::warn!(instrument = %self.options.primary_leg, "no instrument info, ladder skipped");
            return;
        };
        let position = ctx.position(&self.options.primary_leg);
        let Some(step) = ladder.step(now.minute(), position, self.options.bet_size, tick, &info) else {
            return;
        };
        let ids = ctx.submit(step.side, &self.options.primary_leg, step.price, step.qty, &step.tag);
        tracing::info!(
            strategy = %self.name,
            instrument = %self.options.primary_leg,
            position,
            side = %step.side,
            price = step.price,
            qty = step.qty,
            urgency = ?step.urgency,
            tag = %step.tag,
            ids = ?ids,
            "ladder step submitted"
        );
        self.primary.track_entry(ids, now);
    }

    fn on_sliced_tick(&mut self, ctx: &mut dyn ExecutionRuntime, tick: &Tick, now: SessionTime) {
        let net = self.net_exposure(ctx);
        let ready = self.lifecycle.is_ready();
        let Self {
            worker,
            primary,
            cancels,
            options,
            ..
        } = self;
        let PrimaryWorker::Sliced(schedule) = worker else {
            return;
        };

        let date = now.trading_date();
        if !schedule.slot.is_running()
            && schedule.started_on != Some(date)
            && (now.hour(), now.minute()) == schedule.activate_at
        {
            match SlicingAlgo::new(now, schedule.options.to_params(&options.primary_leg)) {
                Ok(algo) => {
                    schedule.slot.start(algo);
                    schedule.started_on = Some(date);
                }
                Err(e) => {
                    tracing::warn!(instrument = %options.primary_leg, error = %e, "slicing algorithm not started");
                }
            }
        }

        if let Some(status) = schedule.slot.get().map(|algo| algo.status(now)) {
            if status.is_done() {
                schedule.slot.teardown(status);
            }
        }

        if !primary.is_idle() {
            if schedule.slot.is_running() {
                let pulled = primary.cancel_outstanding(ctx, cancels);
                if pulled > 0 {
                    tracing::debug!(instrument = %options.primary_leg, count = pulled, "unfilled slice pulled");
                }
            } else {
                primary.cancel_expired(ctx, now, options.expiry_secs, cancels);
            }
            return;
        }
        if !ready {
            return;
        }
        let Some(algo) = schedule.slot.get_mut() else {
            return;
        };
        if net != 0.0 {
            tracing::debug!(instrument = %options.primary_leg, net, "pair unhedged, slice deferred");
            return;
        }
        if let Some(ids) = algo.tick(ctx, tick, now, primary.orders()) {
            primary.track_entry(ids, now);
        }
    }
}

impl Strategy for PairStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_init(&mut self, ctx: &mut dyn ExecutionRuntime) {
        ctx.subscribe(&self.options.hedge_leg);
        ctx.subscribe(&self.options.primary_leg);
    }

    fn on_tick(&mut self, ctx: &mut dyn ExecutionRuntime, tick: &Tick) {
        let is_hedge = tick.instrument == self.options.hedge_leg;
        if !is_hedge && tick.instrument != self.options.primary_leg {
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
        if is_hedge {
            self.on_hedge_tick(ctx, tick, now);
        } else {
            self.on_primary_tick(ctx, tick, now);
        }
    }

    fn on_order_update(&mut self, _ctx: &mut dyn ExecutionRuntime, update: &OrderUpdate) {
        if !self.hedge.on_update(update, &mut self.cancels) {
            self.primary.on_update(update, &mut self.cancels);
        }
    }

    fn on_channel_ready(&mut self, ctx: &mut dyn ExecutionRuntime) {
        self.lifecycle.channel_ready(
            ctx,
            &mut [&mut self.hedge, &mut self.primary],
            &mut self.cancels,
        );
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
