use crate::config::BollingerParams;
use crate::engine::execution::OrderId;
use crate::sizer::AllInOut;
use crate::strategy::indicators::bollinger;
use crate::strategy::{OrderTracker, Strategy, StrategyContext};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Flat,
    Long,
    //an exit order is in flight
    PendingExit,
}

//bollinger band mean reversion
//buys closes below the lower band, takes profit above the upper band
//optional protective exits: trailing stop attached to the entry, stop loss on the average entry
#[derive(Debug, Clone)]
pub struct BollingerStrategy {
    params: BollingerParams,
    sizer: AllInOut,

    //state
    state: State,
    orders: OrderTracker,
    trailing_stop: Option<OrderId>,
}

impl BollingerStrategy {
    pub fn new(params: BollingerParams) -> Self {
        BollingerStrategy {
            params,
            sizer: AllInOut::default(),
            state: State::Flat,
            orders: OrderTracker::new(),
            trailing_stop: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    fn enter(&mut self, context: &mut StrategyContext<'_>, price: f64) {
        let qty = self.sizer.buy_size(context.cash(), price);
        if qty == 0 {
            return;
        }

        //the trail covers the whole position, so only an entry from flat attaches one
        match self.params.trail_percent {
            Some(pct) if self.trailing_stop.is_none() => {
                let (entry, stop) = context.buy_with_trailing_stop(qty, pct);
                self.orders.track(entry);
                self.trailing_stop = Some(stop);
            }
            _ => {
                let entry = context.buy(qty);
                self.orders.track(entry);
            }
        }
    }

    fn exit(&mut self, context: &mut StrategyContext<'_>, why: &str) {
        if let Some(stop) = self.trailing_stop.take() {
            context.cancel(stop);
        }
        info!(code = context.code, "{}, {} {} shares", context.date, why, context.position().net_qty);
        let id = context.close();
        self.orders.track(id);
        self.state = State::PendingExit;
    }
}

impl Strategy for BollingerStrategy {
    fn on_start(&mut self, _context: &mut StrategyContext<'_>) {
        self.state = State::Flat;
        self.orders = OrderTracker::new();
        self.trailing_stop = None;
    }

    fn on_bar(&mut self, context: &mut StrategyContext<'_>) {
        self.orders.notify(context);

        if let Some(stop) = self.trailing_stop {
            if context.report().event_for(stop).is_some() {
                self.trailing_stop = None;
            }
        }

        //check if an order is pending, if yes we cannot send a 2nd one
        if self.orders.is_pending() {
            return;
        }

        self.state = if context.position().is_flat() {
            State::Flat
        } else {
            State::Long
        };

        let closes = context.closes(self.params.period);
        let Some(bands) = bollinger(&closes, self.params.period, self.params.devfactor) else {
            return;
        };
        let Some(close) = closes.last().copied() else {
            return;
        };

        match self.state {
            State::Flat => {
                if close < bands.lower {
                    self.enter(context, close);
                }
            }
            State::Long => {
                let entry_price = context.position().avg_entry_price;
                let stopped = self
                    .params
                    .stop_loss
                    .map_or(false, |ratio| close < entry_price * ratio);

                if stopped {
                    self.exit(context, "stop loss");
                } else if close > bands.upper {
                    self.exit(context, "take profit");
                } else if self.params.pyramiding && close < bands.lower {
                    self.enter(context, close);
                }
            }
            State::PendingExit => {}
        }
    }

    fn name(&self) -> &str {
        "Bollinger Band"
    }
}
