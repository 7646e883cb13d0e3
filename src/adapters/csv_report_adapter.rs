//! CSV result sink.
//!
//! Writes one file per table and symbol into the output directory,
//! replacing any earlier run. Monetary and ratio values are rounded to two
//! decimals here and nowhere else.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use csv::Writer;
use tracing::debug;

use crate::domain::backtest::StrategyResult;
use crate::domain::error::EngineError;
use crate::domain::indicator::IndicatorResult;
use crate::domain::score::ScoreRecord;
use crate::ports::result_port::ResultSink;

pub struct CsvReportAdapter {
    out_dir: PathBuf,
}

fn csv_err(e: csv::Error) -> EngineError {
    EngineError::Io(std::io::Error::other(e))
}

fn money(value: f64) -> String {
    format!("{value:.2}")
}

impl CsvReportAdapter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    fn writer(&self, symbol: &str, table: &str) -> Result<Writer<fs::File>, EngineError> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(format!("{symbol}_{table}.csv"));
        debug!(path = %path.display(), "writing report table");
        Writer::from_path(&path).map_err(csv_err)
    }
}

impl ResultSink for CsvReportAdapter {
    fn write_indicators(
        &self,
        symbol: &str,
        results: &BTreeMap<String, IndicatorResult>,
    ) -> Result<(), EngineError> {
        let mut wtr = self.writer(symbol, "indicators")?;
        wtr.write_record(["key", "group", "status", "days", "score"])
            .map_err(csv_err)?;
        for r in results.values() {
            wtr.write_record([
                r.key.clone(),
                r.group.to_string(),
                r.status.to_string(),
                r.days.to_string(),
                money(r.score),
            ])
            .map_err(csv_err)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_strategies(
        &self,
        symbol: &str,
        results: &BTreeMap<String, StrategyResult>,
    ) -> Result<(), EngineError> {
        let mut summary = self.writer(symbol, "strategies")?;
        summary
            .write_record([
                "key",
                "status",
                "days",
                "trades",
                "win_trades",
                "loss_trades",
                "net_profit",
                "net_profit_percent",
                "gross_profit",
                "gross_profit_percent",
                "gross_loss",
                "gross_loss_percent",
                "win_rate",
                "avg_win_percent",
                "avg_loss_percent",
                "avg_holding_days",
                "avg_win_holding_days",
                "avg_loss_holding_days",
                "win_loss_ratio",
                "largest_win",
                "largest_loss",
                "hold_return",
                "hold_return_percent",
                "open_side",
                "open_entry_time",
                "open_entry_price",
                "open_unit_size",
                "open_holding_days",
                "open_profit",
            ])
            .map_err(csv_err)?;

        let mut ledger = self.writer(symbol, "trades")?;
        ledger
            .write_record([
                "strategy",
                "side",
                "entry_time",
                "exit_time",
                "entry_price",
                "exit_price",
                "unit_size",
                "holding_days",
                "profit",
                "profit_percent",
            ])
            .map_err(csv_err)?;

        for r in results.values() {
            let s = &r.stats;
            // Open position columns stay empty when flat.
            let open = match &r.open_position {
                Some(p) => [
                    p.side.to_string(),
                    p.entry_time.to_string(),
                    money(p.entry_price),
                    p.unit_size.to_string(),
                    p.holding_days.to_string(),
                ],
                None => Default::default(),
            };
            let [open_side, open_entry_time, open_entry_price, open_unit_size, open_holding_days] =
                open;
            summary
                .write_record([
                    r.key.clone(),
                    r.status.to_string(),
                    r.days.to_string(),
                    s.trades.to_string(),
                    s.win_trades.to_string(),
                    s.loss_trades.to_string(),
                    money(s.net_profit),
                    money(s.net_profit_percent),
                    money(s.gross_profit),
                    money(s.gross_profit_percent),
                    money(s.gross_loss),
                    money(s.gross_loss_percent),
                    money(s.win_rate),
                    money(s.avg_win_percent),
                    money(s.avg_loss_percent),
                    money(s.avg_holding_days),
                    money(s.avg_win_holding_days),
                    money(s.avg_loss_holding_days),
                    money(s.win_loss_ratio),
                    money(s.largest_win),
                    money(s.largest_loss),
                    money(r.hold_return),
                    money(r.hold_return_percent),
                    open_side,
                    open_entry_time,
                    open_entry_price,
                    open_unit_size,
                    open_holding_days,
                    money(r.open_profit()),
                ])
                .map_err(csv_err)?;

            for t in &r.trades {
                ledger
                    .write_record([
                        r.key.clone(),
                        t.side.to_string(),
                        t.entry_time.to_string(),
                        t.exit_time.to_string(),
                        money(t.entry_price),
                        money(t.exit_price),
                        t.unit_size.to_string(),
                        t.holding_days.to_string(),
                        money(t.profit),
                        money(t.profit_percent),
                    ])
                    .map_err(csv_err)?;
            }
        }
        summary.flush()?;
        ledger.flush()?;
        Ok(())
    }

    fn write_scores(&self, symbol: &str, scores: &[ScoreRecord]) -> Result<(), EngineError> {
        let mut wtr = self.writer(symbol, "scores")?;
        wtr.write_record([
            "time_key",
            "ma_buy",
            "ma_sell",
            "in_buy",
            "in_sell",
            "strategy_buy",
            "strategy_sell",
            "ma_score",
            "in_score",
            "strategy_score",
            "score",
        ])
        .map_err(csv_err)?;
        for s in scores {
            wtr.write_record([
                s.time_key.to_string(),
                s.ma_buy.to_string(),
                s.ma_sell.to_string(),
                s.in_buy.to_string(),
                s.in_sell.to_string(),
                s.strategy_buy.to_string(),
                s.strategy_sell.to_string(),
                money(s.ma_score),
                money(s.in_score),
                money(s.strategy_score),
                money(s.score),
            ])
            .map_err(csv_err)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
