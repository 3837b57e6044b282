use crate::metrics::timeseries::{calculate_returns, max_drawdown, EquityPoint};
use crate::metrics::trades::TradeAnalysis;
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

//summary metrics for one instrument run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub initial_cash: f64,
    pub final_value: f64,
    pub pnl: f64,
    pub total_return_pct: f64,
    pub cagr: f64,
    pub max_drawdown: f64,
    pub max_drawdown_money: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub num_trades: usize,
    pub num_winning_trades: usize,
    pub num_losing_trades: usize,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub profit_factor: f64,
    pub exposure: f64,
}

impl SummaryMetrics {
    //calculate summary metrics from the equity curve and trade analysis
    pub fn from_backtest(
        equity_curve: &[EquityPoint],
        analysis: &TradeAnalysis,
        initial_cash: f64,
    ) -> Self {
        let final_value = equity_curve
            .last()
            .map(|p| p.value)
            .unwrap_or(initial_cash);

        let pnl = final_value - initial_cash;
        let total_return_pct = pnl / initial_cash;

        let cagr = match (equity_curve.first(), equity_curve.last()) {
            (Some(first), Some(last)) if equity_curve.len() >= 2 => {
                let years = (last.date - first.date).num_days() as f64 / 365.25;
                if years > 0.0 {
                    ((final_value / initial_cash).powf(1.0 / years) - 1.0) * 100.0
                } else {
                    0.0
                }
            }
            _ => 0.0,
        };

        let (max_dd, max_dd_money) = max_drawdown(equity_curve);

        let values: Vec<f64> = equity_curve.iter().map(|p| p.value).collect();
        let returns = calculate_returns(&values);

        let won = analysis.won.total;
        let lost = analysis.lost.total.abs();
        let profit_factor = if lost > 0.0 {
            won / lost
        } else if won > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        SummaryMetrics {
            initial_cash,
            final_value,
            pnl,
            total_return_pct,
            cagr,
            max_drawdown: max_dd,
            max_drawdown_money: max_dd_money,
            sharpe_ratio: calculate_sharpe_ratio(&returns),
            sortino_ratio: calculate_sortino_ratio(&returns),
            num_trades: analysis.total,
            num_winning_trades: analysis.won.count,
            num_losing_trades: analysis.lost.count,
            win_rate: analysis.win_ratio().unwrap_or(0.0),
            avg_win: analysis.won.average,
            avg_loss: analysis.lost.average,
            largest_win: analysis.won.max,
            largest_loss: analysis.lost.max,
            profit_factor,
            exposure: calculate_exposure(equity_curve),
        }
    }

    //prints metrics in a formatted table
    pub fn pretty_print_table(&self) {
        let mut table = Table::new();

        table.add_row(Row::new(vec![Cell::new("Metric"), Cell::new("Value")]));

        let rows = [
            ("Initial Cash", format!("{:.2}", self.initial_cash)),
            ("Final Value", format!("{:.2}", self.final_value)),
            (
                "P/L",
                format!("{:.2} ({:.2}%)", self.pnl, self.total_return_pct * 100.0),
            ),
            ("CAGR", format!("{:.2}%", self.cagr)),
            (
                "Max Drawdown",
                format!(
                    "{:.2}% ({:.2})",
                    self.max_drawdown * 100.0,
                    self.max_drawdown_money
                ),
            ),
            ("Sharpe Ratio", format!("{:.3}", self.sharpe_ratio)),
            ("Sortino Ratio", format!("{:.3}", self.sortino_ratio)),
            ("Number of Trades", format!("{}", self.num_trades)),
            (
                "Won / Lost",
                format!("{} / {}", self.num_winning_trades, self.num_losing_trades),
            ),
            ("Win Rate", format!("{:.2}%", self.win_rate * 100.0)),
            ("Avg Win", format!("{:.2}", self.avg_win)),
            ("Avg Loss", format!("{:.2}", self.avg_loss)),
            ("Largest Win", format!("{:.2}", self.largest_win)),
            ("Largest Loss", format!("{:.2}", self.largest_loss)),
            ("Profit Factor", format!("{:.3}", self.profit_factor)),
            ("Exposure", format!("{:.2}%", self.exposure * 100.0)),
        ];

        for (name, value) in rows.iter() {
            table.add_row(Row::new(vec![Cell::new(name), Cell::new(value)]));
        }

        table.printstd();
    }
}

fn calculate_sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let mean = returns.mean();
    let std_dev = returns.std_dev();

    if std_dev == 0.0 || !std_dev.is_finite() {
        return 0.0;
    }

    //annualized from daily returns
    (mean / std_dev) * (252.0_f64).sqrt()
}

fn calculate_sortino_ratio(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }

    let mean = returns.mean();

    let negative_returns: Vec<f64> = returns.iter().filter(|&&r| r < 0.0).copied().collect();

    if negative_returns.len() < 2 {
        return 0.0;
    }

    let downside_dev = negative_returns.std_dev();

    if downside_dev == 0.0 {
        return 0.0;
    }

    (mean / downside_dev) * (252.0_f64).sqrt()
}

//fraction of bars closed with shares held
fn calculate_exposure(equity_curve: &[EquityPoint]) -> f64 {
    if equity_curve.is_empty() {
        return 0.0;
    }

    let in_market = equity_curve.iter().filter(|p| p.position != 0).count();
    in_market as f64 / equity_curve.len() as f64
}
