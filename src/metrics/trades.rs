use crate::portfolio::TradeRecord;
use serde::{Deserialize, Serialize};

//net pnl statistics of one side (won or lost)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PnlStats {
    pub count: usize,
    pub total: f64,
    pub average: f64,
    //largest win for the won side, worst loss for the lost side
    pub max: f64,
}

impl PnlStats {
    fn push(&mut self, pnl_net: f64, pick: fn(f64, f64) -> f64) {
        self.count += 1;
        self.total += pnl_net;
        self.average = self.total / self.count as f64;
        self.max = pick(self.max, pnl_net);
    }
}

//won/lost breakdown over the closed trades of one run
//break-even trades count as won
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeAnalysis {
    //closed trades plus the one still open
    pub total: usize,
    pub open: usize,
    pub closed: usize,
    pub won: PnlStats,
    pub lost: PnlStats,
    pub gross_pnl: f64,
    pub net_pnl: f64,
}

impl TradeAnalysis {
    pub fn from_trades(closed: &[TradeRecord], open: Option<&TradeRecord>) -> Self {
        let mut analysis = TradeAnalysis {
            open: usize::from(open.is_some()),
            ..TradeAnalysis::default()
        };

        for trade in closed.iter().filter(|t| t.is_closed()) {
            analysis.closed += 1;
            analysis.gross_pnl += trade.pnl;
            analysis.net_pnl += trade.pnl_net;
            if trade.is_won() {
                analysis.won.push(trade.pnl_net, f64::max);
            } else {
                analysis.lost.push(trade.pnl_net, f64::min);
            }
        }

        analysis.total = analysis.closed + analysis.open;
        analysis
    }

    //W / (W + L); None when nothing closed
    pub fn win_ratio(&self) -> Option<f64> {
        let decided = self.won.count + self.lost.count;
        if decided == 0 {
            return None;
        }
        Some(self.won.count as f64 / decided as f64)
    }
}
