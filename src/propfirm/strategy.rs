//! Per-firm payout and evaluation policy.
//!
//! Every firm exposes the same operations through [`PropfirmStrategy`]. Firms
//! with a published size table share [`TieredStrategy`]; anything else gets
//! [`FallbackStrategy`], which scales rules with the account size.

use rust_decimal::Decimal;
use tracing::debug;

use super::rules::{fallback, AccountRules, FirmRuleTable, WithdrawalRules};
use crate::models::{daily_totals, PnlEntry, PropfirmId};

/// Policy for one prop firm. Implementations are stateless.
pub trait PropfirmStrategy: Send + Sync {
    /// Firm this policy belongs to.
    fn propfirm(&self) -> PropfirmId;

    /// Cushion above the nominal size that must stay in the account before
    /// profit can be withdrawn. Zero for firms without a buffer.
    fn calculate_buffer(&self, account_size: Decimal) -> Decimal;

    fn get_account_rules(&self, account_size: Decimal) -> AccountRules;

    fn get_withdrawal_rules(&self) -> WithdrawalRules;

    /// Profit that can be withdrawn right now.
    ///
    /// Without cycle rules this is the profit above the buffer. With cycle
    /// rules, at least one complete cycle of qualifying days is needed and
    /// only the cycle's percentage of that profit is released.
    fn calculate_available_for_withdrawal(
        &self,
        account_size: Decimal,
        total_pnl: Decimal,
        total_withdrawals: Decimal,
        pnl_entries: &[PnlEntry],
    ) -> Decimal {
        let buffer = self.calculate_buffer(account_size);
        let above_buffer = profit_above_buffer(account_size, total_pnl, total_withdrawals, buffer);
        if above_buffer.is_zero() {
            return Decimal::ZERO;
        }

        let rules = self.get_withdrawal_rules();
        let Some(cycle) = rules.cycle_requirement.filter(|_| rules.requires_cycles) else {
            return above_buffer;
        };

        let qualifying_days = daily_totals(pnl_entries)
            .values()
            .filter(|&&pnl| pnl >= cycle.min_daily_profit)
            .count() as u32;
        let completed_cycles = qualifying_days / cycle.days_per_cycle.max(1);

        debug!(
            propfirm = %self.propfirm(),
            qualifying_days,
            completed_cycles,
            "Evaluated withdrawal cycles"
        );

        if completed_cycles == 0 {
            return Decimal::ZERO;
        }

        above_buffer * cycle.withdrawal_percentage / Decimal::ONE_HUNDRED
    }

    /// Whether an evaluation has met the firm's criteria: profit target
    /// reached, no day lost more than the daily limit, and enough profitable
    /// days when the firm requires a minimum.
    fn is_eligible_for_validation(&self, account_size: Decimal, pnl_entries: &[PnlEntry]) -> bool {
        if pnl_entries.is_empty() {
            return false;
        }

        let rules = self.get_account_rules(account_size);
        let days = daily_totals(pnl_entries);
        let total_profit: Decimal = days.values().copied().sum();

        if total_profit < rules.profit_target {
            return false;
        }

        if days.values().any(|&pnl| -pnl > rules.daily_loss_limit) {
            return false;
        }

        if let Some(min_days) = rules.min_trading_days {
            let profitable_days = days.values().filter(|&&pnl| pnl > Decimal::ZERO).count() as u32;
            if profitable_days < min_days {
                return false;
            }
        }

        true
    }
}

/// Balance above `size + buffer`, floored at zero.
pub fn profit_above_buffer(
    account_size: Decimal,
    total_pnl: Decimal,
    total_withdrawals: Decimal,
    buffer: Decimal,
) -> Decimal {
    let balance = account_size + total_pnl - total_withdrawals;
    (balance - account_size - buffer).max(Decimal::ZERO)
}

/// Firm with a published table of account sizes.
#[derive(Debug)]
pub struct TieredStrategy {
    id: PropfirmId,
    table: &'static FirmRuleTable,
}

impl TieredStrategy {
    pub const fn new(id: PropfirmId, table: &'static FirmRuleTable) -> Self {
        Self { id, table }
    }
}

impl PropfirmStrategy for TieredStrategy {
    fn propfirm(&self) -> PropfirmId {
        self.id
    }

    fn calculate_buffer(&self, account_size: Decimal) -> Decimal {
        self.table.buffer(account_size)
    }

    fn get_account_rules(&self, account_size: Decimal) -> AccountRules {
        self.table.account_rules(account_size)
    }

    fn get_withdrawal_rules(&self) -> WithdrawalRules {
        self.table.withdrawal
    }
}

/// Policy for firms without a table.
#[derive(Debug)]
pub struct FallbackStrategy;

impl PropfirmStrategy for FallbackStrategy {
    fn propfirm(&self) -> PropfirmId {
        PropfirmId::Other
    }

    fn calculate_buffer(&self, _account_size: Decimal) -> Decimal {
        Decimal::ZERO
    }

    fn get_account_rules(&self, account_size: Decimal) -> AccountRules {
        fallback::account_rules(account_size)
    }

    fn get_withdrawal_rules(&self) -> WithdrawalRules {
        fallback::WITHDRAWAL
    }
}
