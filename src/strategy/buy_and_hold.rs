use crate::config::BuyAndHoldParams;
use crate::sizer::AllInOut;
use crate::strategy::{OrderTracker, Strategy, StrategyContext};

//baseline: one all-in buy at the start, held to the end
#[derive(Debug, Clone)]
pub struct BuyAndHoldStrategy {
    sizer: AllInOut,
    orders: OrderTracker,
}

impl BuyAndHoldStrategy {
    pub fn new(params: BuyAndHoldParams) -> Self {
        BuyAndHoldStrategy {
            sizer: AllInOut::new(params.cash_fraction),
            orders: OrderTracker::new(),
        }
    }
}

impl Strategy for BuyAndHoldStrategy {
    fn on_bar(&mut self, context: &mut StrategyContext<'_>) {
        self.orders.notify(context);

        //a rejected entry is retried while still flat
        if self.orders.is_pending() || !context.position().is_flat() {
            return;
        }

        let Some(open) = context.last_bar().map(|b| b.open) else {
            return;
        };

        let qty = self.sizer.buy_size(context.cash(), open);
        if qty > 0 {
            let id = context.buy(qty);
            self.orders.track(id);
        }
    }

    fn name(&self) -> &str {
        "Buy and Hold"
    }
}
