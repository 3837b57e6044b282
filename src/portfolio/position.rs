use serde::{Deserialize, Serialize};

//represents a share position in one instrument
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    //net shares (positive for long, 0 for flat)
    pub net_qty: i64,

    //average entry price
    pub avg_entry_price: f64,

    //realized pnl from closed quantity
    pub realized_pnl: f64,
}

impl Position {
    //creates a new flat position
    pub fn new() -> Self {
        Position::default()
    }

    //returns true if the position is flat (no open position)
    pub fn is_flat(&self) -> bool {
        self.net_qty == 0
    }

    //market value of the held shares
    pub fn market_value(&self, price: f64) -> f64 {
        price * self.net_qty as f64
    }

    //applies a signed fill; buys re-average the entry, sells realize against it
    //returns the pnl realized by this fill
    pub fn update_with_fill(&mut self, fill_qty: i64, fill_price: f64) -> f64 {
        if fill_qty >= 0 {
            let total_qty = self.net_qty + fill_qty;
            if total_qty > 0 {
                let total_cost =
                    self.avg_entry_price * self.net_qty as f64 + fill_price * fill_qty as f64;
                self.avg_entry_price = total_cost / total_qty as f64;
            }
            self.net_qty = total_qty;
            return 0.0;
        }

        //oversells are rejected before they reach the position
        let close_qty = fill_qty.abs().min(self.net_qty);
        let realized_pnl = (fill_price - self.avg_entry_price) * close_qty as f64;
        self.realized_pnl += realized_pnl;
        self.net_qty -= close_qty;

        if self.net_qty == 0 {
            self.avg_entry_price = 0.0;
        }

        realized_pnl
    }
}
