use chrono::NaiveDate;
use lotbook::prelude::*;
use lotbook::report::HEADER;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, 4).unwrap() + chrono::Duration::days(i as i64)
}

fn ymd(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

//oscillates around 10, dips to 9 twice, then rallies to 12
fn dip_and_rally() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..25)
        .map(|i| if i % 2 == 0 { 10.0 } else { 10.2 })
        .collect();
    closes.extend_from_slice(&[9.0, 9.0, 12.0, 12.0, 12.0, 12.0, 12.0]);
    closes
}

struct Listing {
    code: &'static str,
    //(raw close, adj factor) per day
    rows: Vec<(f64, f64)>,
}

//lays out a local cache: calendar, one daily and one factor file per open day
fn write_store(root: &Path, listings: &[Listing], days: usize) {
    let mut calendar = String::from("exchange,cal_date,is_open\n");
    //a closed day ahead of the window is filtered out
    writeln!(calendar, "SSE,20210101,0").unwrap();
    for i in 0..days {
        writeln!(calendar, "SSE,{},1", ymd(day(i))).unwrap();
    }
    fs::write(root.join("trade_calendar.csv"), calendar).unwrap();

    for i in 0..days {
        let date = ymd(day(i));
        let mut daily = String::from("ts_code,trade_date,open,high,low,close,vol\n");
        let mut factors = String::from("ts_code,trade_date,adj_factor\n");
        for listing in listings {
            let (close, factor) = listing.rows[i];
            writeln!(
                daily,
                "{},{},{},{},{},{},1000",
                listing.code, date, close, close, close, close
            )
            .unwrap();
            writeln!(factors, "{},{},{}", listing.code, date, factor).unwrap();
        }
        fs::write(root.join(format!("{date}.csv")), daily).unwrap();
        fs::write(root.join(format!("adj_factor_{date}.csv")), factors).unwrap();
    }
}

#[test]
fn batch_over_a_local_cache_writes_the_pivot() {
    let dir = tempfile::tempdir().unwrap();
    let closes = dip_and_rally();
    let days = closes.len();

    //2-for-1 split on day 10: raw prices halve while the factor doubles
    let split = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| if i < 10 { (c * 2.0, 1.0) } else { (c, 2.0) })
        .collect();
    let listings = vec![
        Listing {
            code: "600000.SH",
            rows: closes.iter().map(|&c| (c, 1.0)).collect(),
        },
        Listing {
            code: "000001.SZ",
            rows: split,
        },
        Listing {
            code: "300001.SZ",
            rows: (0..days).map(|i| (10.0 + i as f64 * 0.1, 1.0)).collect(),
        },
    ];
    write_store(dir.path(), &listings, days);

    let store = LocalStore::new(dir.path());
    let calendar = store.trade_calendar().unwrap();
    assert_eq!(calendar.len(), days);

    let universe = store
        .load_range(&calendar, day(0), day(days - 1), true)
        .unwrap();
    let codes: Vec<&str> = universe.iter().map(|s| s.code.as_str()).collect();
    assert_eq!(codes, vec!["000001.SZ", "300001.SZ", "600000.SH"]);
    //back-adjusted pre-split bars line up with the unsplit listing
    assert_eq!(universe[0].bars[0].close, universe[2].bars[0].close);

    let strategy = StrategyKind::parse("boll").unwrap();
    let mut inspected = 0;
    let report = run_batch(&universe, &strategy, &BacktestConfig::default(), 1, |_| {
        inspected += 1
    });

    assert_eq!(inspected, 3);
    assert!((report.accumulated_pnl - 6600.0).abs() < 1e-9);
    let skipped: Vec<_> = report.skipped().collect();
    assert_eq!(skipped, vec![("300001.SZ", &SkipReason::NoTrades)]);

    let pivot = report.pivot().unwrap();
    assert_eq!(pivot.rows.len(), 2);
    assert_eq!(pivot.total.pnl, 6600.0);
    assert_eq!(pivot.total.trades, 2);
    assert_eq!(pivot.total.win_ratio, 1.0);
    assert_eq!(pivot.total.lost_ratio, 0.0);
    assert_eq!(pivot.total.win_max, 3300.0);

    let path = dir.path().join("out").join("Bollinger Band_P20D2_TS005.csv");
    write_pivot(&pivot, &path).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(header, HEADER.iter().map(|h| h.to_string()).collect::<Vec<_>>());

    let rows: Vec<SummaryRow> = reader.deserialize().collect::<Result<_, _>>().unwrap();
    let codes: Vec<&str> = rows.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, vec!["000001.SZ", "600000.SH", "Total"]);
    assert_eq!(rows[2], pivot.total);
}

#[test]
fn missing_calendar_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path());
    assert!(store.trade_calendar().unwrap_err().is_not_found());
}

#[test]
fn pivot_report_path_follows_the_strategy() {
    let config = BacktestConfiguration {
        strategy: StrategyKind::parse("random").unwrap(),
        output_dir: "reports".into(),
        ..BacktestConfiguration::default()
    };
    assert_eq!(
        config.report_path(),
        Path::new("reports").join("Random Trailing Stop_TS005.csv")
    );
}
