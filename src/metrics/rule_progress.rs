//! Progress of an account against its firm's evaluation rules.

use rust_decimal::Decimal;

use super::account_stats::AccountStatsCalculator;
use crate::models::{daily_totals, AccountLedger, RuleProgress};
use crate::propfirm::strategy_for;

/// Calculator for rule progress (profit target, drawdown, daily loss, consistency).
pub struct RuleProgressCalculator;

impl RuleProgressCalculator {
    pub fn evaluate(ledger: &AccountLedger) -> RuleProgress {
        let account = &ledger.account;
        let rules = strategy_for(account.propfirm).get_account_rules(account.size);
        let days = daily_totals(&ledger.pnl_entries);

        let total_pnl: Decimal = days.values().copied().sum();
        let profit_target_progress = if rules.profit_target > Decimal::ZERO {
            total_pnl / rules.profit_target * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        // End-of-day equity curve starting at the nominal size
        let mut equity = account.size;
        let mut peak = account.size;
        let mut max_dd = Decimal::ZERO;
        for pnl in days.values() {
            equity += pnl;
            if equity > peak {
                peak = equity;
            }
            let dd = peak - equity;
            if dd > max_dd {
                max_dd = dd;
            }
        }

        let worst_day = days
            .values()
            .copied()
            .min()
            .unwrap_or(Decimal::ZERO)
            .min(Decimal::ZERO);
        let daily_loss_breaches = days
            .values()
            .filter(|&&pnl| -pnl > rules.daily_loss_limit)
            .count() as u32;

        let profitable_days = days.values().filter(|&&pnl| pnl > Decimal::ZERO).count() as u32;

        let best_day = days.values().copied().max().unwrap_or(Decimal::ZERO);
        let best_day_share = if total_pnl > Decimal::ZERO && best_day > Decimal::ZERO {
            best_day / total_pnl * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        RuleProgress {
            profit_target: rules.profit_target,
            profit_target_progress,
            max_drawdown: rules.max_drawdown,
            max_drawdown_reached: max_dd,
            drawdown_breached: max_dd > rules.max_drawdown,
            daily_loss_limit: rules.daily_loss_limit,
            worst_day,
            daily_loss_breaches,
            best_day_share,
            consistency_rule: rules.consistency_rule,
            consistency_ok: best_day_share <= rules.consistency_rule,
            profitable_days,
            min_trading_days: rules.min_trading_days,
            eligible_for_validation: AccountStatsCalculator::is_eligible_for_validation(ledger),
        }
    }
}
