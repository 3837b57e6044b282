use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

//a point in the equity curve, one per bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub cash: f64,
    pub position: i64,
    //fraction below the running peak
    pub drawdown: f64,
    //money below the running peak
    pub drawdown_money: f64,
    pub returns: f64,
}

//builds the curve from (date, value, cash, position) samples
pub fn calculate_equity_curve(
    samples: &[(NaiveDate, f64, f64, i64)],
    initial_cash: f64,
) -> Vec<EquityPoint> {
    let mut curve = Vec::with_capacity(samples.len());
    let mut peak = initial_cash;
    let mut prev_value = initial_cash;

    for &(date, value, cash, position) in samples {
        if value > peak {
            peak = value;
        }

        let drawdown = if peak > 0.0 {
            (peak - value) / peak
        } else {
            0.0
        };

        let returns = if prev_value != 0.0 {
            (value - prev_value) / prev_value
        } else {
            0.0
        };

        curve.push(EquityPoint {
            date,
            value,
            cash,
            position,
            drawdown,
            drawdown_money: peak - value,
            returns,
        });
        prev_value = value;
    }

    curve
}

//maximum drawdown as (fraction, money)
pub fn max_drawdown(equity_curve: &[EquityPoint]) -> (f64, f64) {
    equity_curve.iter().fold((0.0, 0.0), |(pct, money), p| {
        (f64::max(pct, p.drawdown), f64::max(money, p.drawdown_money))
    })
}

//calculates returns from consecutive values
pub fn calculate_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}
