//! Data models for accounts, PnL entries, withdrawals, trades, and derived statistics.

mod account;
mod entries;
mod propfirm;
mod stats;
mod trade;

pub use account::{Account, AccountLedger, AccountStatus, AccountType};
pub use entries::{daily_totals, PnlEntry, Withdrawal};
pub use propfirm::PropfirmId;
pub use stats::{AccountStatistics, DurationBucket, RuleProgress, TradingStatistics};
pub use trade::{Trade, TradeSide};

#[cfg(test)]
pub(crate) use trade::fixtures;
