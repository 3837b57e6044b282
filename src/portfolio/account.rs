use crate::engine::execution::Fill;
use crate::portfolio::position::Position;
use crate::portfolio::trade::{TradeRecord, TradeTracker};

//cash account holding one instrument for the length of one run
#[derive(Debug, Clone)]
pub struct Account {
    //starting cash
    pub initial_cash: f64,

    //current cash (fills and commissions settle here)
    pub cash: f64,

    //the held position
    pub position: Position,

    //complete fill log
    pub trade_log: Vec<Fill>,

    //round-trip trade records
    pub trades: TradeTracker,
}

impl Account {
    //creates a new account with initial cash
    pub fn new(initial_cash: f64) -> Self {
        Account {
            initial_cash,
            cash: initial_cash,
            position: Position::new(),
            trade_log: Vec::new(),
            trades: TradeTracker::new(),
        }
    }

    //processes a fill and updates cash, position and trades
    //returns the trade closed by this fill, if any
    pub fn process_fill(&mut self, fill: Fill) -> Option<TradeRecord> {
        //buys spend cash, sells return it
        self.cash -= fill.qty as f64 * fill.fill_price;
        self.cash -= fill.commission;

        let realized_pnl = self.position.update_with_fill(fill.qty, fill.fill_price);
        let closed = self.trades.on_fill(
            fill.date,
            fill.fill_price,
            realized_pnl,
            fill.commission,
            &self.position,
        );

        self.trade_log.push(fill);
        closed
    }

    //cash plus the held shares marked at `price`
    pub fn value(&self, price: f64) -> f64 {
        self.cash + self.position.market_value(price)
    }

    //checks whether cash covers a purchase including commission
    pub fn can_afford(&self, cost: f64) -> bool {
        cost <= self.cash
    }
}
