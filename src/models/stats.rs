//! Derived statistics returned to callers. Recomputed on every request, never stored.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Balance, profit and payout figures for one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatistics {
    pub total_pnl: Decimal,

    /// Gross withdrawals
    pub total_withdrawals: Decimal,

    /// Withdrawals after the firm's profit split
    pub total_net_withdrawals: Decimal,

    /// size + total_pnl - total_withdrawals
    pub current_balance: Decimal,

    /// For funded accounts at firms with a buffer this is the balance above
    /// the buffer minus the amount invested, not trading profit.
    pub net_profit: Decimal,

    /// Net profit over invested capital, in percent
    pub roi: Decimal,

    /// Price paid for this account plus its linked evaluation
    pub total_invested: Decimal,

    /// Only present when strictly positive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer: Option<Decimal>,

    /// Only present when strictly positive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_for_withdrawal: Option<Decimal>,
}

/// Performance over a list of imported trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingStatistics {
    pub total_trades: u32,

    /// Share of trades with positive net PnL (0-100)
    pub trade_win_percent: f64,

    /// Gross profit / gross loss. With no losing trades this is the gross
    /// profit itself, so it stays finite.
    pub profit_factor: f64,

    /// Share of trading days with positive net PnL (0-100)
    pub day_win_percent: f64,

    pub total_lots: Decimal,

    /// Mean holding time in seconds
    pub average_trade_duration: f64,
}

impl TradingStatistics {
    pub fn empty() -> Self {
        Self {
            total_trades: 0,
            trade_win_percent: 0.0,
            profit_factor: 0.0,
            day_win_percent: 0.0,
            total_lots: Decimal::ZERO,
            average_trade_duration: 0.0,
        }
    }
}

impl Default for TradingStatistics {
    fn default() -> Self {
        Self::empty()
    }
}

/// Trade count and win rate for one holding-time band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationBucket {
    pub label: String,

    /// Inclusive lower bound in seconds
    pub min_secs: i64,

    /// Exclusive upper bound in seconds, `None` for the open-ended band
    pub max_secs: Option<i64>,

    pub trade_count: u32,
    pub winning_trades: u32,

    /// 0-100, zero for an empty band
    pub win_rate: f64,

    pub net_pnl: Decimal,
}

/// Where an account stands against its firm's evaluation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleProgress {
    pub profit_target: Decimal,

    /// Total PnL as a share of the profit target (can exceed 100)
    pub profit_target_progress: Decimal,

    pub max_drawdown: Decimal,

    /// Deepest peak-to-trough fall of the end-of-day balance
    pub max_drawdown_reached: Decimal,

    pub drawdown_breached: bool,

    pub daily_loss_limit: Decimal,

    /// Most negative day, zero if no losing day
    pub worst_day: Decimal,

    pub daily_loss_breaches: u32,

    /// Best day as a share of total profit (0-100), zero when not in profit
    pub best_day_share: Decimal,

    pub consistency_rule: Decimal,

    pub consistency_ok: bool,

    pub profitable_days: u32,

    pub min_trading_days: Option<u32>,

    pub eligible_for_validation: bool,
}
