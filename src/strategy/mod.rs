pub mod bollinger;
pub mod buy_and_hold;
pub mod indicators;
pub mod random_trailing;
pub mod trend_crossover;

use crate::data::Bar;
use crate::engine::execution::{
    BarReport, ExecutionEngine, OrderEvent, OrderId, OrderIntent, OrderSide, OrderStatus,
};
use crate::portfolio::{Account, Position};
use chrono::NaiveDate;
use std::collections::VecDeque;
use tracing::info;

pub use bollinger::BollingerStrategy;
pub use buy_and_hold::BuyAndHoldStrategy;
pub use random_trailing::RandomTrailingStrategy;
pub use trend_crossover::TrendCrossoverStrategy;

//strategy interface that all strategies must implement
pub trait Strategy: Send {
    //called once before the first bar
    fn on_start(&mut self, _context: &mut StrategyContext<'_>) {}

    //called on each bar, after orders from earlier bars were resolved against it
    fn on_bar(&mut self, context: &mut StrategyContext<'_>);

    //returns the strategy name
    fn name(&self) -> &str;
}

//view of one instrument's simulation handed to the strategy for a single bar
pub struct StrategyContext<'a> {
    //instrument being traded
    pub code: &'a str,

    //date of the current bar
    pub date: NaiveDate,

    //historical bars, oldest first, current bar last
    history: &'a VecDeque<Bar>,

    account: &'a Account,

    //what the execution engine resolved on this bar
    report: &'a BarReport,

    execution: &'a mut ExecutionEngine,
}

impl<'a> StrategyContext<'a> {
    pub fn new(
        code: &'a str,
        date: NaiveDate,
        history: &'a VecDeque<Bar>,
        account: &'a Account,
        report: &'a BarReport,
        execution: &'a mut ExecutionEngine,
    ) -> Self {
        StrategyContext {
            code,
            date,
            history,
            account,
            report,
            execution,
        }
    }

    //returns the last n bars (oldest first)
    pub fn bars(&self, n: usize) -> impl Iterator<Item = &Bar> {
        let start = self.history.len().saturating_sub(n);
        self.history.range(start..)
    }

    //returns the most recent bar
    pub fn last_bar(&self) -> Option<&Bar> {
        self.history.back()
    }

    //returns the close prices for the last n bars
    pub fn closes(&self, n: usize) -> Vec<f64> {
        self.bars(n).map(|b| b.close).collect()
    }

    //returns the number of bars in history
    pub fn bar_count(&self) -> usize {
        self.history.len()
    }

    pub fn cash(&self) -> f64 {
        self.account.cash
    }

    //cash plus the position marked at the current close
    pub fn value(&self) -> f64 {
        let price = self.last_bar().map_or(0.0, |b| b.close);
        self.account.value(price)
    }

    pub fn position(&self) -> &Position {
        &self.account.position
    }

    pub fn report(&self) -> &BarReport {
        self.report
    }

    //submits an order; it is evaluated from the next bar on
    pub fn submit(&mut self, intent: OrderIntent) -> OrderId {
        self.execution.submit(self.date, intent)
    }

    pub fn buy(&mut self, qty: u64) -> OrderId {
        self.submit(OrderIntent::buy(qty))
    }

    pub fn sell(&mut self, qty: u64) -> OrderId {
        self.submit(OrderIntent::sell(qty))
    }

    //market buy with a protective trailing stop that arms when the buy fills
    //returns (buy, stop)
    pub fn buy_with_trailing_stop(&mut self, qty: u64, trail_percent: f64) -> (OrderId, OrderId) {
        let entry = self.buy(qty);
        let stop = self.submit(OrderIntent::trailing_stop(trail_percent).with_parent(entry));
        (entry, stop)
    }

    //market sell of the whole position
    pub fn close(&mut self) -> OrderId {
        self.submit(OrderIntent::close())
    }

    pub fn cancel(&mut self, order_id: OrderId) -> bool {
        self.execution.cancel(order_id)
    }
}

//one-order-in-flight bookkeeping shared by the strategies
//logs every order notification from the bar report
#[derive(Debug, Clone, Default)]
pub struct OrderTracker {
    in_flight: Option<OrderId>,
}

impl OrderTracker {
    pub fn new() -> Self {
        OrderTracker::default()
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn track(&mut self, order_id: OrderId) {
        self.in_flight = Some(order_id);
    }

    //consumes the bar report; returns the status of the tracked order if it resolved
    pub fn notify(&mut self, context: &StrategyContext<'_>) -> Option<OrderStatus> {
        let report = context.report();

        for event in &report.events {
            match event {
                OrderEvent::Filled(fill) => {
                    let label = match fill.side {
                        OrderSide::Buy => "BUY",
                        OrderSide::Sell => "SELL",
                    };
                    info!(
                        code = context.code,
                        "{}, {} EXECUTED, Price: {:.2}, Shares: {}, Cash: {:.0}, Value {:.0}, Position: {}",
                        report.date,
                        label,
                        fill.fill_price,
                        fill.qty.abs(),
                        context.cash(),
                        context.value(),
                        context.position().net_qty
                    );
                }
                OrderEvent::Canceled { order_id, .. } => {
                    info!(code = context.code, order_id, "{}, Order Canceled", report.date);
                }
                OrderEvent::Margin {
                    order_id,
                    required,
                    available,
                    ..
                } => {
                    info!(
                        code = context.code,
                        order_id,
                        required,
                        available,
                        "{}, Order Margin",
                        report.date
                    );
                }
                OrderEvent::Rejected {
                    order_id, reason, ..
                } => {
                    info!(code = context.code, order_id, ?reason, "{}, Order Rejected", report.date);
                }
            }
        }

        for trade in &report.closed_trades {
            info!(
                code = context.code,
                "{}, OPERATION PROFIT, GROSS {:.2}, NET {:.2}",
                report.date,
                trade.pnl,
                trade.pnl_net
            );
        }

        let tracked = self.in_flight?;
        let status = report.event_for(tracked).map(|e| e.status())?;
        self.in_flight = None;
        Some(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::execution::CostModel;

    #[test]
    fn tracker_clears_on_resolution() {
        let date = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        let next = NaiveDate::from_ymd_opt(2021, 6, 2).unwrap();
        let bar = Bar::new_unchecked(next, 10.0, 10.0, 10.0, 10.0, 100.0);

        let mut engine = ExecutionEngine::new(CostModel::default());
        let mut account = Account::new(10000.0);
        let history = VecDeque::from(vec![bar.clone()]);
        let mut tracker = OrderTracker::new();

        let empty = BarReport::new(date);
        let mut context =
            StrategyContext::new("000001.SZ", date, &history, &account, &empty, &mut engine);
        let id = context.buy(100);
        tracker.track(id);
        assert!(tracker.notify(&context).is_none());
        assert!(tracker.is_pending());

        let report = engine.process_bar(&bar, &mut account);
        let context =
            StrategyContext::new("000001.SZ", next, &history, &account, &report, &mut engine);
        assert_eq!(tracker.notify(&context), Some(OrderStatus::Completed));
        assert!(!tracker.is_pending());
        assert_eq!(context.position().net_qty, 100);
        assert_eq!(context.value(), 10000.0);
    }
}
