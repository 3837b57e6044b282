use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use lotbook::data::load_watchlist;
use lotbook::prelude::*;
use lotbook::report::save_growth_csv;
use prettytable::{Cell, Row, Table};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lotbook")]
#[command(about = "A Rust-based daily equity strategy backtester", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    //backtest a strategy over a universe from the local daily cache
    Run {
        //start date, eg 20210101
        #[arg(long)]
        start_date: Option<String>,

        //end date, eg 20220128
        #[arg(long)]
        end_date: Option<String>,

        //local daily cache directory
        #[arg(long)]
        fp: Option<PathBuf>,

        //universe scope (random, hs300, zz500, zz1000, all, watchlist)
        #[arg(long)]
        scope: Option<String>,

        //write per-instrument equity and fill csvs for charting
        #[arg(long)]
        plot: bool,

        //strategy (boll, bh, random, trend)
        #[arg(long)]
        strategy: Option<String>,

        //json configuration file; flags override it
        #[arg(long)]
        config: Option<PathBuf>,

        //seed for the random universe sample and coin flips
        #[arg(long)]
        seed: Option<u64>,

        //starting cash per instrument
        #[arg(long)]
        cash: Option<f64>,

        //commission as a fraction of notional
        #[arg(long)]
        commission: Option<f64>,

        //slippage as a fraction of price
        #[arg(long)]
        slippage: Option<f64>,

        //report directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        //directory holding hs300.csv, zz500.csv, zz1000.csv (defaults to fp)
        #[arg(long)]
        index_dir: Option<PathBuf>,

        //csv with a code column, for the watchlist scope
        #[arg(long)]
        watchlist: Option<PathBuf>,

        //instruments drawn by the random scope
        #[arg(long)]
        sample_size: Option<usize>,
    },

    //backtest one instrument from a csv file
    Single {
        //path to csv data file
        #[arg(long)]
        data: PathBuf,

        //strategy (boll, bh, random, trend)
        #[arg(long, default_value = "boll")]
        strategy: String,

        #[arg(long, default_value = "10000")]
        cash: f64,

        #[arg(long, default_value = "0")]
        commission: f64,

        #[arg(long, default_value = "0")]
        slippage: f64,

        #[arg(long)]
        seed: Option<u64>,

        //output path for equity curve csv
        #[arg(long)]
        output_equity_csv: Option<PathBuf>,

        //output path for fills csv
        #[arg(long)]
        output_fills_csv: Option<PathBuf>,
    },

    //rank the universe by annualized price growth
    Growth {
        #[arg(long, default_value = "20210101")]
        start_date: String,

        #[arg(long, default_value = "20220128")]
        end_date: String,

        #[arg(long, default_value = "./data/daily/")]
        fp: PathBuf,

        //rows to print
        #[arg(long, default_value = "20")]
        top: usize,

        //optional csv of the full ranking
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            start_date,
            end_date,
            fp,
            scope,
            plot,
            strategy,
            config,
            seed,
            cash,
            commission,
            slippage,
            output_dir,
            index_dir,
            watchlist,
            sample_size,
        } => {
            let mut configuration = match config {
                Some(path) => BacktestConfiguration::from_json_file(&path)?,
                None => BacktestConfiguration::default(),
            };

            if let Some(s) = start_date {
                configuration.start_date = parse_cli_date(&s)?;
            }
            if let Some(s) = end_date {
                configuration.end_date = parse_cli_date(&s)?;
            }
            if let Some(fp) = fp {
                configuration.data_dir = fp;
            }
            if let Some(s) = scope {
                configuration.scope =
                    Scope::parse(&s).ok_or_else(|| anyhow::anyhow!("Unknown scope: {}", s))?;
            }
            if let Some(s) = strategy {
                configuration.strategy = StrategyKind::parse(&s)
                    .ok_or_else(|| anyhow::anyhow!("Unknown strategy: {}", s))?;
            }
            if seed.is_some() {
                configuration.seed = seed;
            }
            if let Some(cash) = cash {
                configuration.initial_cash = cash;
            }
            if let Some(rate) = commission {
                configuration.costs.commission_rate = rate;
            }
            if let Some(rate) = slippage {
                configuration.costs.slippage_rate = rate;
            }
            if let Some(dir) = output_dir {
                configuration.output_dir = dir;
            }
            if index_dir.is_some() {
                configuration.index_dir = index_dir;
            }
            if watchlist.is_some() {
                configuration.watchlist = watchlist;
            }
            if let Some(n) = sample_size {
                configuration.sample_size = n;
            }
            configuration.plot |= plot;

            run_universe(&configuration)?;
        }
        Commands::Single {
            data,
            strategy,
            cash,
            commission,
            slippage,
            seed,
            output_equity_csv,
            output_fills_csv,
        } => {
            run_single(
                &data,
                &strategy,
                BacktestConfig {
                    initial_cash: cash,
                    costs: CostModel {
                        commission_rate: commission,
                        slippage_rate: slippage,
                    },
                    ..BacktestConfig::default()
                },
                seed.unwrap_or_else(rand::random),
                output_equity_csv,
                output_fills_csv,
            )?;
        }
        Commands::Growth {
            start_date,
            end_date,
            fp,
            top,
            output,
        } => {
            let start = parse_cli_date(&start_date)?;
            let end = parse_cli_date(&end_date)?;
            run_growth(&fp, start, end, top, output)?;
        }
    }

    Ok(())
}

fn parse_cli_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .with_context(|| format!("Invalid date '{}', expected YYYYMMDD", s))
}

fn run_universe(configuration: &BacktestConfiguration) -> Result<()> {
    println!("Lotbook Daily Equity Backtester");
    println!("===============================\n");

    let store = LocalStore::new(&configuration.data_dir);
    let calendar = store
        .trade_calendar()
        .context("Failed to load trading calendar")?;

    let series = store
        .load_range(
            &calendar,
            configuration.start_date,
            configuration.end_date,
            configuration.adjusted,
        )
        .context(format!(
            "Failed to load daily bars from {:?}",
            configuration.data_dir
        ))?;

    let stocks = store
        .stock_basic()
        .context("Failed to load stock reference data")?;

    let seed = configuration.seed.unwrap_or_else(rand::random);
    info!(seed, "batch seed");

    let mut filter = UniverseFilter::new(configuration.scope, configuration.start_date);
    filter.main_board_only = configuration.main_board_only;
    filter.ignore_st = configuration.ignore_st;
    filter.ignore_ipo = configuration.ignore_ipo;
    filter.sample_size = configuration.sample_size;
    filter.seed = Some(seed);
    filter.index_dir = configuration
        .index_dir
        .clone()
        .unwrap_or_else(|| configuration.data_dir.clone());
    if configuration.scope == Scope::Watchlist {
        let path = configuration
            .watchlist
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("--watchlist required for the WATCHLIST scope"))?;
        filter.watchlist = load_watchlist(path)
            .context(format!("Failed to load watchlist {:?}", path))?;
    }

    let universe = filter.apply(series, &stocks)?;
    if universe.is_empty() {
        anyhow::bail!("No instruments left after filtering");
    }

    println!(
        "Strategy: {} ({})",
        configuration.strategy.name(),
        configuration.strategy.identifier()
    );
    println!(
        "Universe: {:?}, {} instruments, {} to {}\n",
        configuration.scope,
        universe.len(),
        configuration.start_date,
        configuration.end_date
    );

    let backtest_config = BacktestConfig {
        initial_cash: configuration.initial_cash,
        costs: configuration.costs,
        ..BacktestConfig::default()
    };

    let plot_dir = configuration.output_dir.join("plots");
    let report = run_batch(
        &universe,
        &configuration.strategy,
        &backtest_config,
        seed,
        |result| {
            if !configuration.plot {
                return;
            }
            let equity_path = plot_dir.join(format!("{}_equity.csv", result.code));
            let fills_path = plot_dir.join(format!("{}_fills.csv", result.code));
            if let Err(e) = save_equity_csv(&result.equity_curve, &equity_path)
                .and_then(|_| save_fills_csv(&result.fills, &fills_path))
            {
                warn!(code = %result.code, error = %e, "failed to save chart data");
            }
        },
    );

    println!("Accumulated Profit & Loss: {:.2}.", report.accumulated_pnl);

    for (code, reason) in report.skipped() {
        info!(code, %reason, "skipped");
    }

    match report.pivot() {
        Some(table) => {
            table.print_table();
            let path = configuration.report_path();
            write_pivot(&table, &path).context(format!("Failed to write {:?}", path))?;
            println!("\nSummary saved to {:?}", path);
        }
        None => println!("No instrument produced a closed trade"),
    }

    println!(
        "\nProcessed {} instruments in {:.2}s ({:.3}s each)",
        report.instruments(),
        report.elapsed.as_secs_f64(),
        report.average_seconds()
    );

    Ok(())
}

fn run_single(
    data_path: &Path,
    strategy_name: &str,
    config: BacktestConfig,
    seed: u64,
    output_equity_csv: Option<PathBuf>,
    output_fills_csv: Option<PathBuf>,
) -> Result<()> {
    //load data
    println!("Loading data from {:?}...", data_path);
    let bars = load_csv(data_path).context(format!("Failed to load data from {:?}", data_path))?;

    if bars.is_empty() {
        anyhow::bail!("No bars found in {:?}", data_path);
    }

    let code = data_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "data".to_string());

    let kind = StrategyKind::parse(strategy_name)
        .ok_or_else(|| anyhow::anyhow!("Unknown strategy: {}", strategy_name))?;

    println!("Loaded {} bars for {}", bars.len(), code);
    println!("Strategy: {} ({})\n", kind.name(), kind.identifier());

    let mut strategy = kind.build(seed);
    let mut engine = BacktestEngine::new(config, InstrumentSeries::new(code, bars));
    let result = engine.run(strategy.as_mut())?;

    println!("Backtest Results");
    println!("================\n");
    result.summary.pretty_print_table();
    print_trade_analysis(&result.analysis);

    if let Some(equity_path) = output_equity_csv {
        save_equity_csv(&result.equity_curve, &equity_path)?;
        println!("\nEquity curve saved to {:?}", equity_path);
    }

    if let Some(fills_path) = output_fills_csv {
        save_fills_csv(&result.fills, &fills_path)?;
        println!("Fills saved to {:?}", fills_path);
    }

    Ok(())
}

fn print_trade_analysis(analysis: &TradeAnalysis) {
    println!("\nTrade Analysis");
    println!("==============");
    println!(
        "trades: {} ({} closed, {} open)",
        analysis.total, analysis.closed, analysis.open
    );

    let Some(win_ratio) = analysis.win_ratio() else {
        println!("no closed trades");
        return;
    };

    println!("won ratio: {:.2}", win_ratio);
    println!(
        "won hits: {}, pnl total: {:.0}, avg: {:.0}, max: {:.0}",
        analysis.won.count, analysis.won.total, analysis.won.average, analysis.won.max
    );
    println!("lost ratio: {:.2}", 1.0 - win_ratio);
    println!(
        "lost hits: {}, pnl total: {:.0}, avg: {:.0}, max: {:.0}",
        analysis.lost.count, analysis.lost.total, analysis.lost.average, analysis.lost.max
    );
}

fn run_growth(
    fp: &Path,
    start: NaiveDate,
    end: NaiveDate,
    top: usize,
    output: Option<PathBuf>,
) -> Result<()> {
    let store = LocalStore::new(fp);
    let calendar = store
        .trade_calendar()
        .context("Failed to load trading calendar")?;
    let stocks = store
        .stock_basic()
        .context("Failed to load stock reference data")?;

    let rows = growth_from_local(&store, &calendar, start, end, &stocks)?;

    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("code"),
        Cell::new("name"),
        Cell::new("start"),
        Cell::new("end"),
        Cell::new("total"),
        Cell::new("annual %"),
    ]));
    for row in rows.iter().take(top) {
        table.add_row(Row::new(vec![
            Cell::new(&row.code),
            Cell::new(&row.name),
            Cell::new(&format!("{:.2}", row.start_price)),
            Cell::new(&format!("{:.2}", row.end_price)),
            Cell::new(&format!("{:.2}", row.total_growth)),
            Cell::new(&format!("{:.2}", row.annual_growth)),
        ]));
    }
    table.printstd();
    println!("{} instruments ranked", rows.len());

    if let Some(path) = output {
        save_growth_csv(&rows, &path)?;
        println!("Ranking saved to {:?}", path);
    }

    Ok(())
}
