use chrono::NaiveDate;
use lotbook::prelude::*;
use lotbook::strategy::bollinger::{BollingerStrategy, State};
use lotbook::strategy::{BuyAndHoldStrategy, RandomTrailingStrategy, TrendCrossoverStrategy};

fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, 4).unwrap() + chrono::Duration::days(i as i64)
}

fn flat_series(code: &str, closes: &[f64]) -> InstrumentSeries {
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::flat(day(i), c))
        .collect();
    InstrumentSeries::new(code, bars)
}

fn run(series: InstrumentSeries, strategy: &mut dyn Strategy) -> BacktestResult {
    run_with_cash(series, strategy, BacktestConfig::default().initial_cash)
}

fn run_with_cash(
    series: InstrumentSeries,
    strategy: &mut dyn Strategy,
    initial_cash: f64,
) -> BacktestResult {
    let config = BacktestConfig {
        initial_cash,
        ..BacktestConfig::default()
    };
    let mut engine = BacktestEngine::new(config, series);
    engine.run(strategy).unwrap()
}

//oscillates around 10, then dips to 9 twice and jumps to 12
fn dip_and_rally(tail: &[f64]) -> Vec<f64> {
    let mut closes: Vec<f64> = (0..25)
        .map(|i| if i % 2 == 0 { 10.0 } else { 10.2 })
        .collect();
    closes.extend_from_slice(tail);
    closes
}

#[test]
fn buy_and_hold_on_rising_prices() {
    let bars: Vec<Bar> = (0..30)
        .map(|i| {
            let open = 10.0 + i as f64 * 0.1;
            Bar::new(day(i), open, open + 0.05, open, open + 0.05, 1000.0).unwrap()
        })
        .collect();
    let last_close = bars.last().unwrap().close;

    let mut strategy = BuyAndHoldStrategy::new(BuyAndHoldParams::default());
    let result = run(InstrumentSeries::new("600519.SH", bars), &mut strategy);

    assert_eq!(result.fills.len(), 1);
    let fill = &result.fills[0];
    //floor(0.9 * 10000 / 10.0 / 100) * 100
    assert_eq!(fill.qty, 900);
    assert_eq!(fill.date, day(1));

    let cash = 10000.0 - 900.0 * fill.fill_price;
    assert!((result.final_value - (900.0 * last_close + cash)).abs() < 1e-9);
    assert!(result.trades.is_empty());
    assert!(result.open_trade.is_some());
}

#[test]
fn bollinger_without_a_dip_never_trades() {
    let closes: Vec<f64> = (0..80).map(|i| 10.0 + i as f64 * 0.1).collect();
    let mut strategy = BollingerStrategy::new(BollingerParams::default());
    let result = run(flat_series("000001.SZ", &closes), &mut strategy);

    assert!(result.fills.is_empty());
    assert_eq!(result.analysis.total, 0);
    assert_eq!(result.pnl, 0.0);
    assert_eq!(
        SummaryRow::build(&result.code, result.pnl, &result.analysis),
        Err(SkipReason::NoTrades)
    );
}

#[test]
fn bollinger_round_trip_takes_profit_and_drops_the_stop() {
    let closes = dip_and_rally(&[9.0, 9.0, 12.0, 12.0, 12.0, 12.0, 12.0]);
    let mut strategy = BollingerStrategy::new(BollingerParams::default());
    let result = run(flat_series("601318.SH", &closes), &mut strategy);

    assert_eq!(result.fills.len(), 2);
    //signal on the first 9.0 close, filled on the next open
    assert_eq!(result.fills[0].date, day(26));
    assert_eq!(result.fills[0].qty, 1100);
    //take profit signalled at 12.0, filled on the next open
    assert_eq!(result.fills[1].date, day(28));
    assert_eq!(result.fills[1].qty, -1100);

    assert_eq!(result.analysis.closed, 1);
    assert_eq!(result.analysis.won.count, 1);
    assert!((result.pnl - 1100.0 * 3.0).abs() < 1e-9);
    assert_eq!(result.expired_orders, 0);
    assert_eq!(strategy.state(), State::Flat);
}

#[test]
fn bollinger_stop_loss_liquidates() {
    let closes = dip_and_rally(&[9.0, 9.0, 8.5, 8.5]);
    let params = BollingerParams {
        trail_percent: None,
        ..BollingerParams::default()
    };
    let mut strategy = BollingerStrategy::new(params);
    let result = run(flat_series("601318.SH", &closes), &mut strategy);

    assert_eq!(result.fills.len(), 2);
    assert_eq!(result.fills[1].date, day(28));
    assert_eq!(result.fills[1].fill_price, 8.5);
    assert_eq!(result.analysis.lost.count, 1);
    assert!((result.analysis.lost.total + 1100.0 * 0.5).abs() < 1e-9);
    //the re-entry signalled on the last bar never fills
    assert_eq!(result.expired_orders, 1);
}

//10790 buys 1100 shares at 9 and leaves 890, enough for one more lot at 8.6
fn pyramid_run(pyramiding: bool) -> BacktestResult {
    let closes = dip_and_rally(&[9.0, 9.0, 8.6, 8.6]);
    let params = BollingerParams {
        pyramiding,
        ..BollingerParams::default()
    };
    let mut strategy = BollingerStrategy::new(params);
    run_with_cash(flat_series("601318.SH", &closes), &mut strategy, 10790.0)
}

#[test]
fn bollinger_adds_below_the_lower_band_without_a_second_trail() {
    let result = pyramid_run(true);

    assert_eq!(result.fills.len(), 2);
    assert_eq!(result.fills[0].qty, 1100);
    //8.6 closes under the lower band again while long
    assert_eq!(result.fills[1].date, day(28));
    assert_eq!(result.fills[1].qty, 100);
    assert_eq!(result.fills[1].fill_price, 8.6);
    assert_eq!(result.open_trade.as_ref().unwrap().max_size, 1200);
    //only the trail attached to the first entry is still resting
    assert_eq!(result.expired_orders, 1);
}

#[test]
fn bollinger_without_pyramiding_holds_a_single_entry() {
    let result = pyramid_run(false);

    assert_eq!(result.fills.len(), 1);
    assert_eq!(result.fills[0].qty, 1100);
    assert_eq!(result.open_trade.as_ref().unwrap().max_size, 1100);
    assert_eq!(result.expired_orders, 1);
}

//steady trend, a six bar dip, a rebound that crosses the averages back up, then a slide
fn dip_rebound_slide(start: f64, step: f64) -> Vec<f64> {
    let mut closes: Vec<f64> = (0..70).map(|i| start + i as f64 * step).collect();
    let mut last = *closes.last().unwrap();
    for (len, delta) in [(6, -1.0), (6, 1.5), (8, -1.5)] {
        let from = last;
        closes.extend((0..len).map(|k| from + delta * (k + 1) as f64));
        last = *closes.last().unwrap();
    }
    closes
}

#[test]
fn trend_crossover_buys_tiered_stake_and_exits_on_the_down_cross() {
    let closes = dip_rebound_slide(10.0, 0.3);
    let mut strategy = TrendCrossoverStrategy::new(TrendCrossoverParams::default());
    let result = run(flat_series("000858.SZ", &closes), &mut strategy);

    assert_eq!(result.fills.len(), 2);
    //up cross on bar 79 with trend -0.7: stake 10 x 6
    assert_eq!(result.fills[0].date, day(80));
    assert_eq!(result.fills[0].qty, 60);
    assert!((result.fills[0].fill_price - 32.2).abs() < 1e-9);
    //down cross on bar 86
    assert_eq!(result.fills[1].date, day(87));
    assert_eq!(result.fills[1].qty, -60);
    assert!((result.fills[1].fill_price - 24.7).abs() < 1e-9);
    assert_eq!(result.analysis.lost.count, 1);
}

#[test]
fn trend_crossover_ignores_up_crosses_in_a_falling_market() {
    let closes = dip_rebound_slide(40.0, -0.3);
    let mut strategy = TrendCrossoverStrategy::new(TrendCrossoverParams::default());
    let result = run(flat_series("000858.SZ", &closes), &mut strategy);

    assert!(result.fills.is_empty());
    assert_eq!(result.analysis.total, 0);
}

#[test]
fn trend_crossover_sees_a_cross_on_its_first_decision_bar() {
    let mut closes: Vec<f64> = (0..55).map(|i| 10.0 + i as f64 * 0.3).collect();
    let from = *closes.last().unwrap();
    closes.extend((0..5).map(|k| from - 1.5 * (k + 1) as f64));
    //bar 60 is the 61st bar, the first with every lookback filled
    closes.extend([50.0, 50.0, 50.0]);

    let mut strategy = TrendCrossoverStrategy::new(TrendCrossoverParams::default());
    let result = run(flat_series("000858.SZ", &closes), &mut strategy);

    assert_eq!(result.fills.len(), 1);
    assert_eq!(result.fills[0].date, day(61));
    //trend -1.0: stake 10 x 8
    assert_eq!(result.fills[0].qty, 80);
    assert_eq!(result.fills[0].fill_price, 50.0);
}

#[test]
fn random_entries_repeat_with_the_same_seed() {
    let closes: Vec<f64> = (0..150).map(|i| 10.0 + (i as f64 / 5.0).sin()).collect();
    let params = RandomTrailingParams::default();

    let mut first = RandomTrailingStrategy::new(params.clone(), 42);
    let a = run(flat_series("000002.SZ", &closes), &mut first);
    let mut second = RandomTrailingStrategy::new(params, 42);
    let b = run(flat_series("000002.SZ", &closes), &mut second);

    assert!(!a.fills.is_empty());
    assert_eq!(a.fills, b.fills);
    assert_eq!(a.final_value, b.final_value);
}

//buys once on the first bar with a trailing stop, optionally adds on a later bar
struct EntryThenAdd {
    trail: f64,
    add_on_bar: Option<usize>,
    bars_seen: usize,
}

impl Strategy for EntryThenAdd {
    fn on_bar(&mut self, context: &mut StrategyContext<'_>) {
        if self.bars_seen == 0 {
            context.buy_with_trailing_stop(100, self.trail);
        }
        if Some(self.bars_seen) == self.add_on_bar {
            context.buy(100);
        }
        self.bars_seen += 1;
    }

    fn name(&self) -> &str {
        "entry then add"
    }
}

#[test]
fn trailing_stop_exits_on_the_pullback_below_the_running_peak() {
    let mut strategy = EntryThenAdd {
        trail: 0.05,
        add_on_bar: None,
        bars_seen: 0,
    };
    let result = run(
        flat_series("TEST", &[100.0, 100.0, 110.0, 105.0, 94.0, 94.0]),
        &mut strategy,
    );

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.entry_price, 100.0);
    //105 sits above 110 * 0.95 = 104.5, 94 does not
    assert_eq!(trade.closed, Some(day(4)));
    assert_eq!(trade.exit_price, Some(94.0));
}

#[test]
fn pyramided_add_does_not_rebase_the_trail() {
    let mut strategy = EntryThenAdd {
        trail: 0.05,
        add_on_bar: Some(2),
        bars_seen: 0,
    };
    //peak 120 -> stop 114; the add fills at 115 and must not pull the stop down
    let result = run(
        flat_series("TEST", &[100.0, 100.0, 120.0, 115.0, 113.0, 113.0]),
        &mut strategy,
    );

    assert_eq!(result.fills.len(), 3);
    let exit = &result.fills[2];
    assert_eq!(exit.date, day(4));
    assert_eq!(exit.qty, -200);
    assert_eq!(exit.fill_price, 113.0);
    assert!(result.trades[0].max_size == 200);
}
