//! Decision-layer scenarios driven through a recording runtime.

use ticklab_core::config::{
    ImbalanceOptions, LadderOptions, PairOptions, PrimaryLegMode, SliceOptions,
};
use ticklab_core::domain::{BookLevel, LocalId, OrderAck, OrderUpdate, Side, Tick};
use ticklab_core::sim::RecordingRuntime;
use ticklab_core::strategy::{ImbalanceStrategy, PairStrategy, Strategy};

const IF: &str = "CFFEX.IF.HOT";
const NEAR: &str = "SHFE.sp.2201";
const FAR: &str = "SHFE.sp.2202";

// ── Helpers ──────────────────────────────────────────────────────────

fn tick(code: &str, last: f64, bid: (f64, f64), ask: (f64, f64), date: u32, time: u32, millis: u32) -> Tick {
    Tick::new(
        code,
        last,
        vec![BookLevel::new(bid.0, bid.1)],
        vec![BookLevel::new(ask.0, ask.1)],
        date,
        time,
        millis,
    )
    .unwrap()
}

fn feed(strategy: &mut dyn Strategy, rt: &mut RecordingRuntime, tick: &Tick) {
    rt.set_clock(tick.date, tick.time, tick.millis).unwrap();
    strategy.on_tick(rt, tick);
}

fn update(code: &str, id: LocalId, side: Side, remaining: f64, canceled: bool) -> OrderUpdate {
    OrderUpdate {
        local_id: id,
        instrument: code.into(),
        side,
        total_qty: 1.0,
        remaining_qty: remaining,
        price: 100.0,
        canceled,
        tag: String::new(),
    }
}

fn imbalance() -> (ImbalanceStrategy, RecordingRuntime) {
    let opts = ImbalanceOptions {
        instrument: IF.into(),
        offset_ticks: 1.0,
        ..ImbalanceOptions::default()
    };
    let mut s = ImbalanceStrategy::new("demo", opts).unwrap();
    let mut rt = RecordingRuntime::new().with_instrument(IF, 1.0);
    s.on_init(&mut rt);
    s.on_channel_ready(&mut rt);
    (s, rt)
}

/// Last 100 with a heavy bid: theoretical price 100.8, long.
fn long_tick(time: u32, millis: u32) -> Tick {
    tick(IF, 100.0, (99.0, 9.0), (101.0, 1.0), 20211008, time, millis)
}

// ── Imbalance strategy ───────────────────────────────────────────────

#[test]
fn balanced_book_is_flat_and_sends_nothing() {
    let (mut s, mut rt) = imbalance();
    assert_eq!(rt.subscriptions(), &[IF.to_string()]);
    feed(&mut s, &mut rt, &tick(IF, 100.0, (99.0, 5.0), (101.0, 5.0), 20211008, 930, 0));
    assert!(rt.submissions().is_empty());
}

#[test]
fn long_signal_buys_through_last() {
    let (mut s, mut rt) = imbalance();
    feed(&mut s, &mut rt, &long_tick(930, 0));
    let sub = &rt.submissions()[0];
    assert_eq!(sub.side, Side::Buy);
    assert_eq!(sub.price, 101.0);
    assert_eq!(sub.qty, 1.0);
    assert_eq!(sub.tag, "buy");
    assert_eq!(s.leg().orders().count(), 1);
}

#[test]
fn long_signal_ignored_when_already_long() {
    let (mut s, mut rt) = imbalance();
    rt.set_position(IF, 1.0);
    feed(&mut s, &mut rt, &long_tick(930, 0));
    assert!(rt.submissions().is_empty());

    // Short signal while long flips.
    feed(&mut s, &mut rt, &tick(IF, 100.0, (99.0, 1.0), (101.0, 9.0), 20211008, 930, 1000));
    let sub = &rt.submissions()[0];
    assert_eq!(sub.side, Side::Sell);
    assert_eq!(sub.price, 99.0);
    assert_eq!(sub.tag, "sell");
}

#[test]
fn expired_orders_cancelled_exactly_once() {
    let (mut s, mut rt) = imbalance();
    feed(&mut s, &mut rt, &long_tick(930, 0));
    let id = rt.submissions()[0].ids[0];

    for millis in [5_000, 20_000] {
        feed(&mut s, &mut rt, &long_tick(930, millis));
    }
    assert!(rt.cancels().is_empty());

    feed(&mut s, &mut rt, &long_tick(930, 21_000));
    assert_eq!(rt.cancels(), &[id]);
    assert_eq!(s.pending_cancels(), 1);

    feed(&mut s, &mut rt, &long_tick(930, 22_000));
    assert_eq!(rt.cancels().len(), 1);
    assert_eq!(s.pending_cancels(), 1);
    // Outstanding orders route to timeout handling, never a new entry.
    assert_eq!(rt.submissions().len(), 1);

    s.on_order_update(&mut rt, &update(IF, id, Side::Buy, 1.0, true));
    assert_eq!(s.pending_cancels(), 0);
    assert!(s.leg().is_idle());

    // Quiet period: 30 s from the entry at 09:30:00.
    feed(&mut s, &mut rt, &long_tick(930, 25_000));
    assert_eq!(rt.submissions().len(), 1);
    feed(&mut s, &mut rt, &long_tick(930, 31_000));
    assert_eq!(rt.submissions().len(), 2);
}

#[test]
fn fill_after_timeout_cancel_settles_pending_count() {
    let (mut s, mut rt) = imbalance();
    feed(&mut s, &mut rt, &long_tick(930, 0));
    let id = rt.submissions()[0].ids[0];

    feed(&mut s, &mut rt, &long_tick(930, 21_000));
    assert_eq!(rt.cancels(), &[id]);
    assert_eq!(s.pending_cancels(), 1);

    // The order filled before the cancel reached the venue.
    s.on_order_update(&mut rt, &update(IF, id, Side::Buy, 0.0, false));
    assert!(s.leg().is_idle());
    assert_eq!(s.pending_cancels(), 0);

    // A late cancel confirmation for the same id changes nothing.
    s.on_order_update(&mut rt, &update(IF, id, Side::Buy, 0.0, true));
    assert_eq!(s.pending_cancels(), 0);
}

#[test]
fn duplicate_fill_update_is_a_noop() {
    let (mut s, mut rt) = imbalance();
    feed(&mut s, &mut rt, &long_tick(930, 0));
    let id = rt.submissions()[0].ids[0];

    let filled = update(IF, id, Side::Buy, 0.0, false);
    s.on_order_update(&mut rt, &filled);
    assert!(s.leg().is_idle());
    s.on_order_update(&mut rt, &filled);
    assert!(s.leg().is_idle());
    assert_eq!(s.pending_cancels(), 0);

    // Unknown id.
    s.on_order_update(&mut rt, &update(IF, LocalId(999), Side::Buy, 0.0, true));
    assert_eq!(s.pending_cancels(), 0);
}

#[test]
fn no_new_signals_until_channel_ready() {
    let opts = ImbalanceOptions {
        instrument: IF.into(),
        ..ImbalanceOptions::default()
    };
    let mut s = ImbalanceStrategy::new("demo", opts).unwrap();
    let mut rt = RecordingRuntime::new().with_instrument(IF, 1.0);
    s.on_init(&mut rt);

    feed(&mut s, &mut rt, &long_tick(930, 0));
    assert!(rt.submissions().is_empty());

    s.on_channel_ready(&mut rt);
    feed(&mut s, &mut rt, &long_tick(930, 1000));
    assert_eq!(rt.submissions().len(), 1);

    // Lost: timeout handling continues, new entries stop.
    s.on_channel_lost(&mut rt);
    feed(&mut s, &mut rt, &long_tick(930, 30_000));
    assert_eq!(rt.cancels().len(), 1);
    let id = rt.cancels()[0];
    s.on_order_update(&mut rt, &update(IF, id, Side::Buy, 1.0, true));
    feed(&mut s, &mut rt, &long_tick(931, 0));
    assert_eq!(rt.submissions().len(), 1);
}

#[test]
fn channel_ready_reconciles_unmanaged_orders() {
    let opts = ImbalanceOptions {
        instrument: IF.into(),
        ..ImbalanceOptions::default()
    };
    let mut s = ImbalanceStrategy::new("demo", opts).unwrap();
    let mut rt = RecordingRuntime::new().with_instrument(IF, 1.0);
    let external = rt.add_external_order(IF, Side::Sell, 3.0);

    s.on_channel_ready(&mut rt);
    assert_eq!(rt.cancel_all_calls(), &[(IF.to_string(), false)]);
    assert_eq!(s.pending_cancels(), 1);
    assert!(s.leg().orders().contains(external));

    // Registry is not empty: no trading until the cancel confirms.
    feed(&mut s, &mut rt, &long_tick(930, 0));
    assert!(rt.submissions().is_empty());

    rt.close_order(external);
    s.on_order_update(&mut rt, &update(IF, external, Side::Sell, 3.0, true));
    assert_eq!(s.pending_cancels(), 0);
    feed(&mut s, &mut rt, &long_tick(930, 1000));
    assert_eq!(rt.submissions().len(), 1);
}

#[test]
fn rejected_submission_retries_on_next_tick() {
    let (mut s, mut rt) = imbalance();
    rt.set_reject_all(true);
    feed(&mut s, &mut rt, &long_tick(930, 0));
    assert_eq!(rt.submissions().len(), 1);
    assert!(s.leg().is_idle());

    s.on_order_ack(
        &mut rt,
        &OrderAck {
            local_id: LocalId(1),
            instrument: IF.into(),
            accepted: false,
            message: "price out of band".into(),
            tag: "buy".into(),
        },
    );
    assert!(s.leg().is_idle());

    rt.set_reject_all(false);
    feed(&mut s, &mut rt, &long_tick(930, 1000));
    assert_eq!(rt.submissions().len(), 2);
    assert_eq!(s.leg().orders().count(), 1);
}

// ── Pair strategy ────────────────────────────────────────────────────

fn pair(primary: PrimaryLegMode) -> (PairStrategy, RecordingRuntime) {
    let opts = PairOptions {
        hedge_leg: NEAR.into(),
        primary_leg: FAR.into(),
        primary,
        ..PairOptions::default()
    };
    let mut s = PairStrategy::new("sp_pair", opts).unwrap();
    let mut rt = RecordingRuntime::new()
        .with_instrument(NEAR, 2.0)
        .with_instrument(FAR, 2.0);
    s.on_init(&mut rt);
    s.on_channel_ready(&mut rt);
    (s, rt)
}

fn far(date: u32, time: u32, millis: u32) -> Tick {
    tick(FAR, 5000.0, (4998.0, 3.0), (5002.0, 3.0), date, time, millis)
}

fn near(date: u32, time: u32, millis: u32) -> Tick {
    tick(NEAR, 5000.0, (4998.0, 3.0), (5002.0, 3.0), date, time, millis)
}

#[test]
fn ladder_enters_passively_then_escalates() {
    let (mut s, mut rt) = pair(PrimaryLegMode::Ladder(LadderOptions::default()));
    assert_eq!(rt.subscriptions(), &[NEAR.to_string(), FAR.to_string()]);

    feed(&mut s, &mut rt, &far(20211008, 1105, 0));
    let entry = rt.submissions()[0].clone();
    assert_eq!((entry.side, entry.qty, entry.price), (Side::Sell, 10.0, 5000.0));
    assert_eq!(entry.tag, "sell_far");

    // Unfilled past the window: expiry cancel, then an aggressive reprice.
    let id = entry.ids[0];
    feed(&mut s, &mut rt, &far(20211008, 1110, 59_000));
    assert_eq!(rt.cancels(), &[id]);
    s.on_order_update(&mut rt, &update(FAR, id, Side::Sell, 10.0, true));
    rt.set_position(FAR, -4.0);

    // Partially short: the exit branch owns the leg; nothing before minute 48.
    feed(&mut s, &mut rt, &far(20211008, 1111, 0));
    assert_eq!(rt.submissions().len(), 1);

    rt.set_position(FAR, 0.0);
    feed(&mut s, &mut rt, &far(20211008, 1111, 1000));
    let escalated = &rt.submissions()[1];
    assert_eq!((escalated.qty, escalated.price), (10.0, 4978.0));
    assert_eq!(escalated.tag, "sell_far_2");
}

#[test]
fn ladder_exits_in_window() {
    let (mut s, mut rt) = pair(PrimaryLegMode::Ladder(LadderOptions::default()));
    rt.set_position(FAR, -10.0);
    rt.set_position(NEAR, 10.0);

    feed(&mut s, &mut rt, &far(20211008, 1130, 0));
    assert!(rt.submissions().is_empty());

    feed(&mut s, &mut rt, &far(20211008, 1150, 0));
    let exit = &rt.submissions()[0];
    assert_eq!((exit.side, exit.qty, exit.price), (Side::Buy, 10.0, 5000.0));
    assert_eq!(exit.tag, "buyclose_far");
}

#[test]
fn hedge_leg_follows_pair_exposure() {
    let (mut s, mut rt) = pair(PrimaryLegMode::Ladder(LadderOptions::default()));

    // Flat pair: the hedge leg never initiates.
    feed(&mut s, &mut rt, &near(20211008, 1105, 0));
    assert!(rt.submissions().is_empty());

    rt.set_position(FAR, -10.0);
    feed(&mut s, &mut rt, &near(20211008, 1105, 1000));
    let hedge = rt.submissions()[0].clone();
    assert_eq!((hedge.side, hedge.qty, hedge.price), (Side::Buy, 10.0, 5040.0));
    assert_eq!(hedge.tag, "buy_front");

    // Pending hedge: no second order.
    feed(&mut s, &mut rt, &near(20211008, 1105, 2000));
    assert_eq!(rt.submissions().len(), 1);

    s.on_order_update(&mut rt, &update(NEAR, hedge.ids[0], Side::Buy, 0.0, false));
    rt.set_position(NEAR, 10.0);
    feed(&mut s, &mut rt, &near(20211008, 1105, 3000));
    assert_eq!(rt.submissions().len(), 1);
    assert!(s.hedge().is_idle());
}

#[test]
fn sliced_primary_leg_lifecycle() {
    let (mut s, mut rt) = pair(PrimaryLegMode::Sliced(SliceOptions::default()));

    feed(&mut s, &mut rt, &far(20211008, 1100, 59_000));
    assert!(s.algo().is_none());

    // Activation minute: start and fire the first slice.
    feed(&mut s, &mut rt, &far(20211008, 1101, 0));
    assert!(s.algo().is_some());
    let first = rt.submissions()[0].clone();
    assert_eq!((first.side, first.qty, first.price), (Side::Sell, 2.0, 4802.0));
    assert_eq!(first.tag, "sell_far");

    // Unfilled by the next tick: pulled once.
    feed(&mut s, &mut rt, &far(20211008, 1101, 1000));
    feed(&mut s, &mut rt, &far(20211008, 1101, 2000));
    assert_eq!(rt.cancels(), &[first.ids[0]]);
    s.on_order_update(&mut rt, &update(FAR, first.ids[0], Side::Sell, 2.0, true));
    assert_eq!(s.pending_cancels(), 0);

    // Cooldown from 11:01:00.
    feed(&mut s, &mut rt, &far(20211008, 1101, 3000));
    assert_eq!(rt.submissions().len(), 1);
    feed(&mut s, &mut rt, &far(20211008, 1101, 20_000));
    assert_eq!(rt.submissions().len(), 2);
    assert_eq!(s.algo().map(|a| a.consumed_slots()), Some(4));

    // Filled: the pair is unhedged, so slicing waits for the hedge.
    let second = rt.submissions()[1].ids[0];
    s.on_order_update(&mut rt, &update(FAR, second, Side::Sell, 0.0, false));
    rt.set_position(FAR, -2.0);
    feed(&mut s, &mut rt, &far(20211008, 1101, 45_000));
    assert_eq!(rt.submissions().len(), 2);

    feed(&mut s, &mut rt, &near(20211008, 1101, 46_000));
    let hedge = &rt.submissions()[2];
    assert_eq!((hedge.instrument.as_str(), hedge.side, hedge.qty), (NEAR, Side::Buy, 2.0));

    // Horizon over: torn down, and it does not restart the same day.
    feed(&mut s, &mut rt, &far(20211008, 1111, 0));
    assert!(s.algo().is_none());
    feed(&mut s, &mut rt, &far(20211008, 1101, 50_000));
    assert!(s.algo().is_none());

    // Next trading date restarts.
    s.on_session_end(&mut rt, 20211008);
    rt.set_position(NEAR, 2.0);
    feed(&mut s, &mut rt, &far(20211011, 1101, 0));
    assert!(s.algo().is_some());
}
