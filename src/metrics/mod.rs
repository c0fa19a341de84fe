//! Statistics over accounts and trades: balances, ROI, payouts, win rates.

mod account_stats;
mod rule_progress;
mod trading_stats;
mod withdrawals;

pub use account_stats::AccountStatsCalculator;
pub use rule_progress::RuleProgressCalculator;
pub use trading_stats::TradingStatsCalculator;
pub use withdrawals::{calculate_total_net_withdrawals, get_net_withdrawal_amount};
