use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

//market segment label of main-board listings in stock_basic.csv
pub const MAIN_BOARD: &str = "主板";

//marker carried in the names of special-treatment listings
pub const SPECIAL_TREATMENT: &str = "ST";

//reference data of one listed stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockInfo {
    //exchange code (eg 601318.SH)
    pub code: String,

    pub name: String,

    //market segment (main board, growth board, ...)
    pub market: String,

    pub list_date: Option<NaiveDate>,
}

impl StockInfo {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        market: impl Into<String>,
        list_date: Option<NaiveDate>,
    ) -> Self {
        StockInfo {
            code: code.into(),
            name: name.into(),
            market: market.into(),
            list_date,
        }
    }

    pub fn is_special_treatment(&self) -> bool {
        self.name.contains(SPECIAL_TREATMENT)
    }

    pub fn is_main_board(&self) -> bool {
        self.market.contains(MAIN_BOARD)
    }

    //unknown listing dates never qualify
    pub fn listed_before(&self, cutoff: NaiveDate) -> bool {
        self.list_date.map_or(false, |d| d < cutoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_listing() {
        let listed = NaiveDate::from_ymd_opt(2007, 3, 1);
        let st = StockInfo::new("600001.SH", "*ST Foo", "主板", listed);
        assert!(st.is_special_treatment());
        assert!(st.is_main_board());

        let growth = StockInfo::new("300001.SZ", "Bar", "创业板", None);
        assert!(!growth.is_main_board());
        assert!(!growth.listed_before(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()));
    }
}
