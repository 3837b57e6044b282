use crate::data::bar::InstrumentSeries;
use crate::data::error::DataError;
use crate::data::loader::read_records;
use crate::instrument::StockInfo;
use chrono::{Duration, NaiveDate};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

//which instruments take part in a batch backtest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Scope {
    Random,
    Hs300,
    Zz500,
    Zz1000,
    All,
    Watchlist,
}

impl Scope {
    //parse scope from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "RANDOM" => Some(Scope::Random),
            "HS300" => Some(Scope::Hs300),
            "ZZ500" => Some(Scope::Zz500),
            "ZZ1000" => Some(Scope::Zz1000),
            "ALL" => Some(Scope::All),
            "WATCHLIST" => Some(Scope::Watchlist),
            _ => None,
        }
    }

    //constituent file of index-basket scopes
    pub fn index_file(&self) -> Option<&'static str> {
        match self {
            Scope::Hs300 => Some("hs300.csv"),
            Scope::Zz500 => Some("zz500.csv"),
            Scope::Zz1000 => Some("zz1000.csv"),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConstituentRecord {
    con_code: String,
}

#[derive(Debug, Deserialize)]
struct WatchlistRecord {
    code: String,
}

//codes listed in an index constituent file (con_code column)
pub fn load_index_members<P: AsRef<Path>>(path: P) -> Result<Vec<String>, DataError> {
    let records: Vec<ConstituentRecord> = read_records(path.as_ref())?;
    Ok(records.into_iter().map(|r| r.con_code).collect())
}

//codes listed in a watchlist file (code column)
pub fn load_watchlist<P: AsRef<Path>>(path: P) -> Result<Vec<String>, DataError> {
    let records: Vec<WatchlistRecord> = read_records(path.as_ref())?;
    Ok(records.into_iter().map(|r| r.code).collect())
}

//membership rules applied before a batch run
#[derive(Debug, Clone)]
pub struct UniverseFilter {
    pub scope: Scope,
    pub main_board_only: bool,
    pub ignore_st: bool,
    pub ignore_ipo: bool,
    //listings younger than ipo_days before as_of are excluded
    pub as_of: NaiveDate,
    pub ipo_days: i64,
    pub sample_size: usize,
    pub seed: Option<u64>,
    pub index_dir: PathBuf,
    pub watchlist: Vec<String>,
}

impl UniverseFilter {
    pub fn new(scope: Scope, as_of: NaiveDate) -> Self {
        UniverseFilter {
            scope,
            main_board_only: true,
            ignore_st: true,
            ignore_ipo: true,
            as_of,
            ipo_days: 365,
            sample_size: 100,
            seed: None,
            index_dir: PathBuf::from("./data/daily"),
            watchlist: Vec::new(),
        }
    }

    fn uses_reference_data(&self) -> bool {
        self.main_board_only || self.ignore_st || self.ignore_ipo
    }

    pub fn ipo_cutoff(&self) -> NaiveDate {
        self.as_of - Duration::days(self.ipo_days)
    }

    //reference-data rules for one code
    //codes without a stock_basic entry are excluded whenever a rule needs it
    pub fn admits(&self, info: Option<&StockInfo>) -> bool {
        let info = match info {
            Some(info) => info,
            None => return !self.uses_reference_data(),
        };

        if self.main_board_only && !info.is_main_board() {
            return false;
        }
        if self.ignore_st && info.is_special_treatment() {
            return false;
        }
        if self.ignore_ipo && !info.listed_before(self.ipo_cutoff()) {
            return false;
        }
        true
    }

    //applies reference rules, then the scope selection; result is sorted by code
    pub fn apply(
        &self,
        series: Vec<InstrumentSeries>,
        stocks: &IndexMap<String, StockInfo>,
    ) -> Result<Vec<InstrumentSeries>, DataError> {
        let before = series.len();
        let mut kept: Vec<InstrumentSeries> = series
            .into_iter()
            .filter(|s| self.admits(stocks.get(&s.code)))
            .collect();

        match self.scope {
            Scope::All => {}
            Scope::Random => {
                let mut rng = match self.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                let codes: Vec<String> = kept.iter().map(|s| s.code.clone()).collect();
                let chosen: HashSet<String> = codes
                    .choose_multiple(&mut rng, self.sample_size.min(codes.len()))
                    .cloned()
                    .collect();
                kept.retain(|s| chosen.contains(&s.code));
            }
            Scope::Hs300 | Scope::Zz500 | Scope::Zz1000 => {
                let file = self
                    .scope
                    .index_file()
                    .ok_or_else(|| DataError::UnknownScope(format!("{:?}", self.scope)))?;
                let members: HashSet<String> = load_index_members(self.index_dir.join(file))?
                    .into_iter()
                    .collect();
                kept.retain(|s| members.contains(&s.code));
            }
            Scope::Watchlist => {
                let members: HashSet<&str> = self.watchlist.iter().map(String::as_str).collect();
                kept.retain(|s| members.contains(s.code.as_str()));
            }
        }

        kept.sort_by(|a, b| a.code.cmp(&b.code));

        info!(
            scope = ?self.scope,
            before,
            after = kept.len(),
            "universe filtered"
        );
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Bar;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn series(code: &str) -> InstrumentSeries {
        InstrumentSeries::new(code, vec![Bar::flat(d(2022, 1, 4), 10.0)])
    }

    fn stocks() -> IndexMap<String, StockInfo> {
        let old = Some(d(2001, 8, 27));
        let rows = vec![
            StockInfo::new("600000.SH", "Pudong Bank", "主板", old),
            StockInfo::new("600001.SH", "*ST Sample", "主板", old),
            StockInfo::new("300750.SZ", "Battery", "创业板", old),
            StockInfo::new("601999.SH", "New Listing", "主板", Some(d(2021, 12, 1))),
            StockInfo::new("601318.SH", "Insurance", "主板", old),
        ];
        rows.into_iter().map(|s| (s.code.clone(), s)).collect()
    }

    fn universe() -> Vec<InstrumentSeries> {
        ["601318.SH", "600001.SH", "300750.SZ", "601999.SH", "600000.SH", "000000.XX"]
            .iter()
            .map(|c| series(c))
            .collect()
    }

    #[test]
    fn parses_scope_case_insensitively() {
        assert_eq!(Scope::parse("hs300"), Some(Scope::Hs300));
        assert_eq!(Scope::parse("RANDOM"), Some(Scope::Random));
        assert_eq!(Scope::parse("sz50"), None);
    }

    #[test]
    fn all_scope_applies_reference_rules() {
        let filter = UniverseFilter::new(Scope::All, d(2022, 1, 28));
        let kept = filter.apply(universe(), &stocks()).unwrap();
        let codes: Vec<&str> = kept.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["600000.SH", "601318.SH"]);
    }

    #[test]
    fn rules_can_be_disabled() {
        let mut filter = UniverseFilter::new(Scope::All, d(2022, 1, 28));
        filter.main_board_only = false;
        filter.ignore_st = false;
        filter.ignore_ipo = false;
        let kept = filter.apply(universe(), &stocks()).unwrap();
        assert_eq!(kept.len(), 6);
    }

    #[test]
    fn random_sample_is_seeded_and_bounded() {
        let mut filter = UniverseFilter::new(Scope::Random, d(2022, 1, 28));
        filter.sample_size = 1;
        filter.seed = Some(7);
        let a = filter.apply(universe(), &stocks()).unwrap();
        let b = filter.apply(universe(), &stocks()).unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a, b);

        filter.sample_size = 100;
        assert_eq!(filter.apply(universe(), &stocks()).unwrap().len(), 2);
    }

    #[test]
    fn index_scope_reads_constituents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("hs300.csv"),
            "index_code,con_code,trade_date,weight\n399300.SZ,601318.SH,20220104,2.1\n",
        )
        .unwrap();

        let mut filter = UniverseFilter::new(Scope::Hs300, d(2022, 1, 28));
        filter.index_dir = dir.path().to_path_buf();
        let kept = filter.apply(universe(), &stocks()).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].code, "601318.SH");

        let mut missing = filter.clone();
        missing.scope = Scope::Zz500;
        assert!(missing.apply(universe(), &stocks()).unwrap_err().is_not_found());
    }

    #[test]
    fn watchlist_scope() {
        let mut filter = UniverseFilter::new(Scope::Watchlist, d(2022, 1, 28));
        filter.watchlist = vec!["600000.SH".to_string()];
        let kept = filter.apply(universe(), &stocks()).unwrap();
        assert_eq!(kept.len(), 1);
    }
}
