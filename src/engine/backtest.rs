use crate::data::{Bar, InstrumentSeries};
use crate::engine::execution::{BarReport, CostModel, ExecutionEngine, Fill};
use crate::metrics::{calculate_equity_curve, EquityPoint, SummaryMetrics, TradeAnalysis};
use crate::portfolio::{Account, TradeRecord};
use crate::strategy::{Strategy, StrategyContext};
use chrono::NaiveDate;
use std::collections::VecDeque;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, PartialEq)]
pub enum EngineError {
    #[error("No bars to simulate for {0}")]
    EmptySeries(String),

    #[error("Non-finite account value for {code} on {date}")]
    NonFiniteValue { code: String, date: NaiveDate },
}

//result of one instrument's backtest
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub code: String,
    pub summary: SummaryMetrics,
    pub equity_curve: Vec<EquityPoint>,
    pub fills: Vec<Fill>,
    //closed round trips
    pub trades: Vec<TradeRecord>,
    pub open_trade: Option<TradeRecord>,
    pub analysis: TradeAnalysis,
    pub final_value: f64,
    pub pnl: f64,
    //orders still pending when the data ran out
    pub expired_orders: usize,
}

//configuration for a backtest
#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub initial_cash: f64,
    pub costs: CostModel,
    pub max_lookback: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_cash: 10000.0,
            costs: CostModel::default(),
            max_lookback: 500,
        }
    }
}

//simulation context for one instrument
//owns the account and the execution book; discarded after the run
pub struct BacktestEngine {
    config: BacktestConfig,
    series: InstrumentSeries,
    account: Account,
    execution: ExecutionEngine,
    history: VecDeque<Bar>,
    samples: Vec<(NaiveDate, f64, f64, i64)>,
}

impl BacktestEngine {
    //creates a new backtest engine
    pub fn new(config: BacktestConfig, series: InstrumentSeries) -> Self {
        let account = Account::new(config.initial_cash);
        let execution = ExecutionEngine::new(config.costs);

        BacktestEngine {
            history: VecDeque::with_capacity(config.max_lookback),
            samples: Vec::with_capacity(series.len()),
            config,
            series,
            account,
            execution,
        }
    }

    //runs the backtest with the given strategy
    pub fn run(&mut self, strategy: &mut dyn Strategy) -> Result<BacktestResult, EngineError> {
        let first_date = self
            .series
            .first_date()
            .ok_or_else(|| EngineError::EmptySeries(self.series.code.clone()))?;

        //call strategy initialization
        let start_report = BarReport::new(first_date);
        let mut context = StrategyContext::new(
            &self.series.code,
            first_date,
            &self.history,
            &self.account,
            &start_report,
            &mut self.execution,
        );
        strategy.on_start(&mut context);

        //main backtest loop
        for bar in &self.series.bars {
            //orders from earlier bars are resolved against this bar first
            let report = self.execution.process_bar(bar, &mut self.account);

            if self.history.len() >= self.config.max_lookback.max(1) {
                self.history.pop_front();
            }
            self.history.push_back(bar.clone());

            let mut context = StrategyContext::new(
                &self.series.code,
                bar.date,
                &self.history,
                &self.account,
                &report,
                &mut self.execution,
            );
            strategy.on_bar(&mut context);

            //record value at the close
            let value = self.account.value(bar.close);
            if !value.is_finite() {
                return Err(EngineError::NonFiniteValue {
                    code: self.series.code.clone(),
                    date: bar.date,
                });
            }
            self.samples.push((
                bar.date,
                value,
                self.account.cash,
                self.account.position.net_qty,
            ));
        }

        let expired = self.execution.pending_order_count();
        if expired > 0 {
            debug!(code = %self.series.code, expired, "orders expired at end of data");
        }

        Ok(self.build_result(expired))
    }

    fn build_result(&self, expired_orders: usize) -> BacktestResult {
        let equity_curve = calculate_equity_curve(&self.samples, self.config.initial_cash);

        let trades = self.account.trades.closed().to_vec();
        let open_trade = self.account.trades.open_trade().cloned();
        let analysis = TradeAnalysis::from_trades(&trades, open_trade.as_ref());

        let summary =
            SummaryMetrics::from_backtest(&equity_curve, &analysis, self.config.initial_cash);

        BacktestResult {
            code: self.series.code.clone(),
            final_value: summary.final_value,
            pnl: summary.pnl,
            summary,
            equity_curve,
            fills: self.account.trade_log.clone(),
            trades,
            open_trade,
            analysis,
            expired_orders,
        }
    }

    //returns a reference to the account
    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn series(&self) -> &InstrumentSeries {
        &self.series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuyAndHoldParams;
    use crate::strategy::BuyAndHoldStrategy;

    #[test]
    fn empty_series_is_an_error() {
        let mut engine = BacktestEngine::new(
            BacktestConfig::default(),
            InstrumentSeries::new("600000.SH", Vec::new()),
        );
        let mut strategy = BuyAndHoldStrategy::new(BuyAndHoldParams::default());
        assert_eq!(
            engine.run(&mut strategy).unwrap_err(),
            EngineError::EmptySeries("600000.SH".to_string())
        );
    }

    #[test]
    fn equity_is_sampled_every_bar() {
        let start = NaiveDate::from_ymd_opt(2021, 1, 4).unwrap();
        let bars: Vec<Bar> = (0..5)
            .map(|i| Bar::flat(start + chrono::Duration::days(i), 10.0 + i as f64))
            .collect();
        let mut engine =
            BacktestEngine::new(BacktestConfig::default(), InstrumentSeries::new("X", bars));
        let mut strategy = BuyAndHoldStrategy::new(BuyAndHoldParams::default());

        let result = engine.run(&mut strategy).unwrap();
        assert_eq!(result.equity_curve.len(), 5);
        //first bar only signals, the buy fills on the second open
        assert_eq!(result.equity_curve[0].position, 0);
        assert_eq!(result.equity_curve[1].position, 900);
        assert_eq!(result.fills.len(), 1);
        assert_eq!(result.fills[0].fill_price, 11.0);
        assert_eq!(result.analysis.total, 1);
        assert_eq!(result.analysis.closed, 0);
    }
}
