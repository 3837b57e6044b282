use crate::portfolio::position::Position;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

//a round trip from flat to flat, possibly with several entries in between
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: u64,
    pub opened: NaiveDate,
    pub closed: Option<NaiveDate>,
    //average entry price of the held shares
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    //largest share count held during the trade
    pub max_size: i64,
    //gross realized pnl
    pub pnl: f64,
    pub commission: f64,
    //pnl after commission
    pub pnl_net: f64,
}

impl TradeRecord {
    pub fn is_closed(&self) -> bool {
        self.closed.is_some()
    }

    //break-even trades count as won
    pub fn is_won(&self) -> bool {
        self.pnl_net >= 0.0
    }
}

//opens and closes trade records as fills move the position
#[derive(Debug, Clone, Default)]
pub struct TradeTracker {
    next_id: u64,
    open: Option<TradeRecord>,
    closed: Vec<TradeRecord>,
}

impl TradeTracker {
    pub fn new() -> Self {
        TradeTracker::default()
    }

    //records a fill already applied to `position`
    //returns the trade it closed, if any
    pub fn on_fill(
        &mut self,
        date: NaiveDate,
        price: f64,
        realized_pnl: f64,
        commission: f64,
        position: &Position,
    ) -> Option<TradeRecord> {
        let next_id = &mut self.next_id;
        let trade = self.open.get_or_insert_with(|| {
            *next_id += 1;
            TradeRecord {
                id: *next_id,
                opened: date,
                closed: None,
                entry_price: price,
                exit_price: None,
                max_size: 0,
                pnl: 0.0,
                commission: 0.0,
                pnl_net: 0.0,
            }
        });

        trade.pnl += realized_pnl;
        trade.commission += commission;
        trade.pnl_net = trade.pnl - trade.commission;
        trade.max_size = trade.max_size.max(position.net_qty.abs());

        if !position.is_flat() {
            trade.entry_price = position.avg_entry_price;
            return None;
        }

        let mut done = self.open.take()?;
        done.closed = Some(date);
        done.exit_price = Some(price);
        self.closed.push(done.clone());
        Some(done)
    }

    pub fn open_trade(&self) -> Option<&TradeRecord> {
        self.open.as_ref()
    }

    pub fn closed(&self) -> &[TradeRecord] {
        &self.closed
    }

    //closed plus the one still open
    pub fn total(&self) -> usize {
        self.closed.len() + usize::from(self.open.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 9, day).unwrap()
    }

    #[test]
    fn round_trip_with_pyramid_is_one_trade() {
        let mut pos = Position::new();
        let mut tracker = TradeTracker::new();

        let r = pos.update_with_fill(100, 10.0);
        assert!(tracker.on_fill(d(1), 10.0, r, 1.0, &pos).is_none());
        let r = pos.update_with_fill(100, 12.0);
        assert!(tracker.on_fill(d(2), 12.0, r, 1.0, &pos).is_none());
        assert_eq!(tracker.total(), 1);

        let r = pos.update_with_fill(-200, 13.0);
        let trade = tracker.on_fill(d(3), 13.0, r, 1.0, &pos).unwrap();

        assert_eq!(trade.max_size, 200);
        assert_eq!(trade.entry_price, 11.0);
        assert_eq!(trade.pnl, 400.0);
        assert_eq!(trade.pnl_net, 397.0);
        assert!(trade.is_won());
        assert!(tracker.open_trade().is_none());
        assert_eq!(tracker.closed().len(), 1);
    }
}
