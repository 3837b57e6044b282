use crate::report::summary_row::SummaryRow;
use prettytable::{Cell, Row, Table};

pub const TOTAL_LABEL: &str = "Total";

pub const HEADER: [&str; 13] = [
    "code",
    "PnL",
    "Trades",
    "Wins",
    "Win_Ratio",
    "Losts",
    "Lost_Ratio",
    "Win_Value",
    "Win_Avg",
    "Win_Max",
    "Lost_Value",
    "Lost_Avg",
    "Lost_Max",
];

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//mean of the finite values; NaN when there are none
fn finite_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

//per-instrument rows sorted by code plus a grand total, rounded to cents
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub rows: Vec<SummaryRow>,
    pub total: SummaryRow,
}

impl PivotTable {
    //sums for pnl, counts and values; means for ratios and averages;
    //max of Win_Max and min of Lost_Max
    pub fn build(rows: &[SummaryRow]) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }

        let total = SummaryRow {
            code: TOTAL_LABEL.to_string(),
            pnl: rows.iter().map(|r| r.pnl).sum(),
            trades: rows.iter().map(|r| r.trades).sum(),
            wins: rows.iter().map(|r| r.wins).sum(),
            win_ratio: finite_mean(rows.iter().map(|r| r.win_ratio)),
            losts: rows.iter().map(|r| r.losts).sum(),
            lost_ratio: finite_mean(rows.iter().map(|r| r.lost_ratio)),
            win_value: rows.iter().map(|r| r.win_value).sum(),
            win_avg: finite_mean(rows.iter().map(|r| r.win_avg)),
            win_max: rows.iter().map(|r| r.win_max).fold(f64::NEG_INFINITY, f64::max),
            lost_value: rows.iter().map(|r| r.lost_value).sum(),
            lost_avg: finite_mean(rows.iter().map(|r| r.lost_avg)),
            lost_max: rows.iter().map(|r| r.lost_max).fold(f64::INFINITY, f64::min),
        };

        let mut rows: Vec<SummaryRow> = rows.iter().map(rounded).collect();
        rows.sort_by(|a, b| a.code.cmp(&b.code));

        Some(PivotTable {
            rows,
            total: rounded(&total),
        })
    }

    //rows then the total
    pub fn records(&self) -> impl Iterator<Item = &SummaryRow> {
        self.rows.iter().chain(std::iter::once(&self.total))
    }

    pub fn print_table(&self) {
        let mut table = Table::new();

        table.add_row(Row::new(HEADER.iter().map(|h| Cell::new(h)).collect()));

        for r in self.records() {
            table.add_row(Row::new(vec![
                Cell::new(&r.code),
                Cell::new(&format!("{:.2}", r.pnl)),
                Cell::new(&r.trades.to_string()),
                Cell::new(&r.wins.to_string()),
                Cell::new(&format!("{:.2}", r.win_ratio)),
                Cell::new(&r.losts.to_string()),
                Cell::new(&format!("{:.2}", r.lost_ratio)),
                Cell::new(&format!("{:.2}", r.win_value)),
                Cell::new(&format!("{:.2}", r.win_avg)),
                Cell::new(&format!("{:.2}", r.win_max)),
                Cell::new(&format!("{:.2}", r.lost_value)),
                Cell::new(&format!("{:.2}", r.lost_avg)),
                Cell::new(&format!("{:.2}", r.lost_max)),
            ]));
        }

        table.printstd();
    }
}

fn rounded(row: &SummaryRow) -> SummaryRow {
    SummaryRow {
        code: row.code.clone(),
        pnl: round2(row.pnl),
        trades: row.trades,
        wins: row.wins,
        win_ratio: round2(row.win_ratio),
        losts: row.losts,
        lost_ratio: round2(row.lost_ratio),
        win_value: round2(row.win_value),
        win_avg: round2(row.win_avg),
        win_max: round2(row.win_max),
        lost_value: round2(row.lost_value),
        lost_avg: round2(row.lost_avg),
        lost_max: round2(row.lost_max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, pnl: f64, wins: usize, losts: usize, win_max: f64, lost_max: f64) -> SummaryRow {
        let win_ratio = wins as f64 / (wins + losts) as f64;
        SummaryRow {
            code: code.to_string(),
            pnl,
            trades: wins + losts,
            wins,
            win_ratio,
            losts,
            lost_ratio: 1.0 - win_ratio,
            win_value: win_max * wins as f64,
            win_avg: win_max,
            win_max,
            lost_value: lost_max * losts as f64,
            lost_avg: lost_max,
            lost_max,
        }
    }

    #[test]
    fn total_row_aggregates() {
        let rows = vec![
            row("600000.SH", 120.456, 1, 1, 300.0, -180.0),
            row("000001.SZ", -50.0, 0, 2, 0.0, -25.0),
        ];
        let table = PivotTable::build(&rows).unwrap();

        assert_eq!(table.rows[0].code, "000001.SZ");
        assert_eq!(table.rows[1].pnl, 120.46);

        let total = &table.total;
        assert_eq!(total.code, "Total");
        assert_eq!(total.pnl, 70.46);
        assert_eq!(total.trades, 4);
        assert_eq!(total.wins, 1);
        assert_eq!(total.losts, 3);
        assert_eq!(total.win_ratio, 0.25);
        assert_eq!(total.lost_ratio, 0.75);
        assert_eq!(total.win_max, 300.0);
        assert_eq!(total.lost_max, -180.0);
        assert_eq!(total.lost_value, -230.0);
        assert_eq!(table.records().count(), 3);
    }

    #[test]
    fn no_rows_no_table() {
        assert!(PivotTable::build(&[]).is_none());
    }
}
