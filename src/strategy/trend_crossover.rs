use crate::config::TrendCrossoverParams;
use crate::engine::execution::OrderSide;
use crate::sizer::TieredStake;
use crate::strategy::indicators::{sma_last, trend_strength};
use crate::strategy::{OrderTracker, Strategy, StrategyContext};
use tracing::debug;

//sma crossover gated by multi-horizon trend strength
//goes long when fast sma crosses above slow sma while the trend reading is negative,
//sized by how negative it is; closes when fast crosses back below slow
#[derive(Debug, Clone)]
pub struct TrendCrossoverStrategy {
    params: TrendCrossoverParams,
    sizer: TieredStake,

    //state
    last_fast_sma: Option<f64>,
    last_slow_sma: Option<f64>,
    orders: OrderTracker,
}

impl TrendCrossoverStrategy {
    pub fn new(params: TrendCrossoverParams) -> Self {
        TrendCrossoverStrategy {
            sizer: TieredStake::new(params.stake),
            params,
            last_fast_sma: None,
            last_slow_sma: None,
            orders: OrderTracker::new(),
        }
    }

    //bars needed before the first decision
    fn warmup(&self) -> usize {
        let longest = self.params.lookbacks.iter().copied().max().unwrap_or(0);
        (longest + 1).max(self.params.slow_window)
    }

    //checks for crossover and returns signal
    //returns some(orderside buy) for bullish crossover
    //returns some(orderside sell) for bearish crossover
    //returns none for no crossover
    fn check_crossover(&self, fast_sma: f64, slow_sma: f64) -> Option<OrderSide> {
        if let (Some(prev_fast), Some(prev_slow)) = (self.last_fast_sma, self.last_slow_sma) {
            //bullish crossover fast crosses above slow
            if prev_fast <= prev_slow && fast_sma > slow_sma {
                return Some(OrderSide::Buy);
            }
            //bearish crossover fast crosses below slow
            if prev_fast >= prev_slow && fast_sma < slow_sma {
                return Some(OrderSide::Sell);
            }
        }
        None
    }
}

impl Strategy for TrendCrossoverStrategy {
    fn on_start(&mut self, _context: &mut StrategyContext<'_>) {
        //initialize state
        self.last_fast_sma = None;
        self.last_slow_sma = None;
        self.orders = OrderTracker::new();
    }

    fn on_bar(&mut self, context: &mut StrategyContext<'_>) {
        self.orders.notify(context);

        if context.bar_count() < self.warmup() {
            return;
        }

        let closes = context.closes(self.warmup());

        let (Some(fast_sma), Some(slow_sma)) = (
            sma_last(&closes, self.params.fast_window),
            sma_last(&closes, self.params.slow_window),
        ) else {
            return;
        };

        //first decision bar: the previous bar's averages come from the same window
        if self.last_fast_sma.is_none() || self.last_slow_sma.is_none() {
            let previous = &closes[..closes.len() - 1];
            self.last_fast_sma = sma_last(previous, self.params.fast_window);
            self.last_slow_sma = sma_last(previous, self.params.slow_window);
        }

        let signal = self.check_crossover(fast_sma, slow_sma);

        //update state
        self.last_fast_sma = Some(fast_sma);
        self.last_slow_sma = Some(slow_sma);

        if self.orders.is_pending() {
            return;
        }

        let position = context.position().net_qty;

        match signal {
            Some(OrderSide::Buy) if position == 0 => {
                let trend = trend_strength(&closes, &self.params.lookbacks).unwrap_or(f64::NAN);
                debug!(code = context.code, date = %context.date, trend, "bullish crossover");

                if trend < 0.0 {
                    let qty = self.sizer.size(trend);
                    if qty > 0 {
                        let id = context.buy(qty);
                        self.orders.track(id);
                    }
                }
            }
            Some(OrderSide::Sell) if position > 0 => {
                let id = context.close();
                self.orders.track(id);
            }
            _ => {}
        }
    }

    fn name(&self) -> &str {
        "Trend Crossover"
    }
}
