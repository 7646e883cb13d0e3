//! Aggregate statistics over a closed-trade ledger.
//!
//! Currency amounts are absolute; `*_percent` fields are relative to the
//! notional capital. A trade with zero profit counts as a win.

use crate::domain::backtest::Trade;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeStats {
    pub net_profit: f64,
    pub net_profit_percent: f64,
    pub gross_profit: f64,
    pub gross_profit_percent: f64,
    /// Sum of losing trades' magnitudes, kept positive.
    pub gross_loss: f64,
    pub gross_loss_percent: f64,
    pub trades: usize,
    pub win_trades: usize,
    pub loss_trades: usize,
    pub avg_holding_days: f64,
    pub avg_win_holding_days: f64,
    pub avg_loss_holding_days: f64,
    /// Winning trades as a percentage of all trades.
    pub win_rate: f64,
    pub avg_win_percent: f64,
    pub avg_loss_percent: f64,
    pub win_loss_ratio: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator != 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

impl TradeStats {
    pub fn compute(trades: &[Trade], capital: f64) -> Self {
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        let mut win_trades = 0usize;
        let mut loss_trades = 0usize;
        let mut win_days = 0usize;
        let mut loss_days = 0usize;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;

        for trade in trades {
            if trade.profit >= 0.0 {
                win_trades += 1;
                gross_profit += trade.profit;
                win_days += trade.holding_days;
                largest_win = largest_win.max(trade.profit);
            } else {
                loss_trades += 1;
                gross_loss += trade.profit.abs();
                loss_days += trade.holding_days;
                largest_loss = largest_loss.max(trade.profit.abs());
            }
        }

        let total = trades.len();
        let percent_of_capital = |amount: f64| ratio(amount, capital) * 100.0;
        let gross_profit_percent = percent_of_capital(gross_profit);
        let gross_loss_percent = percent_of_capital(gross_loss);
        let avg_win_percent = ratio(gross_profit_percent, win_trades as f64);
        let avg_loss_percent = ratio(gross_loss_percent, loss_trades as f64);

        TradeStats {
            net_profit: gross_profit - gross_loss,
            net_profit_percent: percent_of_capital(gross_profit - gross_loss),
            gross_profit,
            gross_profit_percent,
            gross_loss,
            gross_loss_percent,
            trades: total,
            win_trades,
            loss_trades,
            avg_holding_days: ratio((win_days + loss_days) as f64, total as f64),
            avg_win_holding_days: ratio(win_days as f64, win_trades as f64),
            avg_loss_holding_days: ratio(loss_days as f64, loss_trades as f64),
            win_rate: ratio(win_trades as f64, total as f64) * 100.0,
            avg_win_percent,
            avg_loss_percent,
            win_loss_ratio: ratio(avg_win_percent, avg_loss_percent),
            largest_win,
            largest_loss,
        }
    }
}
