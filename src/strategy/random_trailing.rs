use crate::config::RandomTrailingParams;
use crate::sizer::AllInOut;
use crate::strategy::{OrderTracker, Strategy, StrategyContext};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

//null benchmark: coin-flip entries, exits only through the trailing stop
#[derive(Debug, Clone)]
pub struct RandomTrailingStrategy {
    params: RandomTrailingParams,
    sizer: AllInOut,
    rng: StdRng,
    orders: OrderTracker,
}

impl RandomTrailingStrategy {
    pub fn new(params: RandomTrailingParams, seed: u64) -> Self {
        RandomTrailingStrategy {
            sizer: AllInOut::new(params.cash_fraction),
            params,
            rng: StdRng::seed_from_u64(seed),
            orders: OrderTracker::new(),
        }
    }
}

impl Strategy for RandomTrailingStrategy {
    fn on_bar(&mut self, context: &mut StrategyContext<'_>) {
        self.orders.notify(context);

        if self.orders.is_pending() || !context.position().is_flat() {
            return;
        }

        //one flip per flat bar
        if !self.rng.gen_bool(0.5) {
            return;
        }

        let Some(close) = context.last_bar().map(|b| b.close) else {
            return;
        };

        let qty = self.sizer.buy_size(context.cash(), close);
        if qty > 0 {
            let (entry, _stop) = context.buy_with_trailing_stop(qty, self.params.trail_percent);
            self.orders.track(entry);
        }
    }

    fn name(&self) -> &str {
        "Random Trailing Stop"
    }
}
