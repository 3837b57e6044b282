use crate::config::StrategyKind;
use crate::data::InstrumentSeries;
use crate::engine::backtest::{BacktestConfig, BacktestEngine, BacktestResult};
use crate::report::{BatchReport, InstrumentOutcome, SkipReason, SummaryRow};
use std::time::Instant;
use tracing::{info, warn};

//runs the strategy over every instrument, one after another
//each instrument gets a fresh engine and strategy; the random seed is offset by position
//`inspect` sees every completed run (eg to save charts)
pub fn run_batch(
    universe: &[InstrumentSeries],
    strategy: &StrategyKind,
    config: &BacktestConfig,
    seed: u64,
    mut inspect: impl FnMut(&BacktestResult),
) -> BatchReport {
    let started = Instant::now();
    let mut report = BatchReport::default();

    for (idx, series) in universe.iter().enumerate() {
        let mut instance = strategy.build(seed.wrapping_add(idx as u64));
        let mut engine = BacktestEngine::new(config.clone(), series.clone());

        let outcome = match engine.run(instance.as_mut()) {
            Ok(result) => {
                info!(
                    code = %result.code,
                    "Final Portfolio Value: {:.2}, P/L: {:.2}",
                    result.final_value,
                    result.pnl
                );
                report.accumulated_pnl += result.pnl;
                inspect(&result);

                match SummaryRow::build(&result.code, result.pnl, &result.analysis) {
                    Ok(row) => InstrumentOutcome::Summarized(row),
                    Err(reason) => InstrumentOutcome::Skipped {
                        code: result.code,
                        reason,
                    },
                }
            }
            Err(e) => {
                warn!(code = %series.code, error = %e, "instrument failed");
                InstrumentOutcome::Skipped {
                    code: series.code.clone(),
                    reason: SkipReason::Engine(e.to_string()),
                }
            }
        };

        report.outcomes.push(outcome);
    }

    report.elapsed = started.elapsed();
    info!(
        instruments = report.instruments(),
        "Accumulated Profit & Loss: {:.2}",
        report.accumulated_pnl
    );
    report
}
