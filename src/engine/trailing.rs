use serde::{Deserialize, Serialize};

//trailing stop for a long position
//the peak only ratchets upward; the trigger sits `percent` below it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailingStop {
    percent: f64,
    peak: Option<f64>,
}

impl TrailingStop {
    //percent is a fraction, eg 0.05 for a 5% trail
    pub fn new(percent: f64) -> Self {
        TrailingStop {
            percent,
            peak: None,
        }
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    pub fn is_armed(&self) -> bool {
        self.peak.is_some()
    }

    //starts tracking from the entry fill price, discarding any earlier peak
    pub fn rebase(&mut self, entry_price: f64) {
        self.peak = Some(entry_price);
    }

    //raises the peak when price makes a new high; never lowers it
    pub fn observe(&mut self, price: f64) {
        if let Some(peak) = self.peak {
            self.peak = Some(peak.max(price));
        }
    }

    pub fn peak(&self) -> Option<f64> {
        self.peak
    }

    pub fn stop_price(&self) -> Option<f64> {
        self.peak.map(|peak| peak * (1.0 - self.percent))
    }

    //true when `price` is at or below the current trigger
    pub fn is_hit(&self, price: f64) -> bool {
        self.stop_price().map_or(false, |stop| price <= stop)
    }
}
