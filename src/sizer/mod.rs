use crate::portfolio::Position;
use serde::{Deserialize, Serialize};

//board lot
pub const LOT_SIZE: u64 = 100;

//buys the largest lot-aligned quantity a share of cash affords, sells everything
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllInOut {
    //share of cash committed per entry
    pub fraction: f64,
    pub lot: u64,
}

impl Default for AllInOut {
    fn default() -> Self {
        AllInOut::new(1.0)
    }
}

impl AllInOut {
    pub fn new(fraction: f64) -> Self {
        AllInOut {
            fraction,
            lot: LOT_SIZE,
        }
    }

    //largest q, a multiple of the lot, with q * price <= cash * fraction
    pub fn buy_size(&self, cash: f64, price: f64) -> u64 {
        let budget = cash * self.fraction;
        if self.lot == 0 || !(budget > 0.0) || !(price > 0.0) || !budget.is_finite() {
            return 0;
        }

        //keeps lots * lot and (lots + 1) * lot inside u64
        let max_lots = u64::MAX / self.lot - 1;
        let cost = |lots: u64| (lots * self.lot) as f64 * price;
        let mut lots = ((budget / price / self.lot as f64).floor() as u64).min(max_lots);

        //float division can land one lot off either way
        while lots > 0 && cost(lots) > budget {
            lots -= 1;
        }
        while lots < max_lots && cost(lots + 1) <= budget {
            lots += 1;
        }

        lots * self.lot
    }

    //the whole held position
    pub fn sell_size(&self, position: &Position) -> u64 {
        position.net_qty.max(0) as u64
    }
}

//base stake scaled by a signal-strength multiplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieredStake {
    pub stake: u64,
    //(threshold, multiplier), strongest band first
    pub tiers: Vec<(f64, u64)>,
}

impl Default for TieredStake {
    fn default() -> Self {
        TieredStake::new(10)
    }
}

impl TieredStake {
    pub fn new(stake: u64) -> Self {
        TieredStake {
            stake,
            tiers: vec![(-0.8, 8), (-0.6, 6), (-0.4, 4), (-0.2, 2)],
        }
    }

    //a signal exactly on a threshold takes that band; NaN gets the base stake
    pub fn multiplier(&self, signal: f64) -> u64 {
        self.tiers
            .iter()
            .find(|(threshold, _)| signal <= *threshold)
            .map_or(1, |(_, m)| *m)
    }

    pub fn size(&self, signal: f64) -> u64 {
        self.stake * self.multiplier(signal)
    }
}
