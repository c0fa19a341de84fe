//! Account statistics: balance, net profit, ROI, buffer and withdrawable profit.

use rust_decimal::Decimal;
use tracing::debug;

use super::calculate_total_net_withdrawals;
use crate::models::{AccountLedger, AccountStatistics};
use crate::propfirm::strategy_for;

/// Calculator for per-account statistics.
pub struct AccountStatsCalculator;

impl AccountStatsCalculator {
    /// Combine an account's entries and withdrawals with its firm's rules.
    pub fn calculate_stats(ledger: &AccountLedger) -> AccountStatistics {
        let account = &ledger.account;
        let strategy = strategy_for(account.propfirm);

        let total_pnl = ledger.total_pnl();
        let total_withdrawals = ledger.total_withdrawals();
        let current_balance = account.size + total_pnl - total_withdrawals;

        let total_invested = account.price_paid
            + ledger
                .linked_evaluation
                .as_ref()
                .map(|eval| eval.price_paid)
                .unwrap_or(Decimal::ZERO);

        let buffer = strategy.calculate_buffer(account.size);
        let available = strategy.calculate_available_for_withdrawal(
            account.size,
            total_pnl,
            total_withdrawals,
            &ledger.pnl_entries,
        );

        let net_profit = if account.is_funded() && strategy.get_withdrawal_rules().has_buffer {
            funded_net_profit(current_balance, buffer, total_invested)
        } else {
            total_pnl - total_invested
        };

        let roi = Self::roi(net_profit, total_invested);

        debug!(
            account = %account.id,
            propfirm = %account.propfirm,
            balance = %current_balance,
            net_profit = %net_profit,
            "Calculated account stats"
        );

        AccountStatistics {
            total_pnl,
            total_withdrawals,
            total_net_withdrawals: calculate_total_net_withdrawals(
                &ledger.withdrawals,
                account.propfirm,
            ),
            current_balance,
            net_profit,
            roi,
            total_invested,
            buffer: positive(buffer),
            available_for_withdrawal: positive(available),
        }
    }

    /// Only evaluations can be validated; the firm's strategy decides the rest.
    pub fn is_eligible_for_validation(ledger: &AccountLedger) -> bool {
        let account = &ledger.account;
        if !account.is_evaluation() {
            return false;
        }
        strategy_for(account.propfirm).is_eligible_for_validation(account.size, &ledger.pnl_entries)
    }

    /// Net profit over invested capital in percent, zero when nothing was invested.
    pub fn roi(net_profit: Decimal, total_invested: Decimal) -> Decimal {
        if total_invested > Decimal::ZERO {
            net_profit / total_invested * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        }
    }
}

/// Funded accounts with a buffer only count the balance above the buffer.
/// A balance below the buffer counts as zero, not as a loss.
fn funded_net_profit(
    current_balance: Decimal,
    buffer: Decimal,
    total_invested: Decimal,
) -> Decimal {
    (current_balance - buffer).max(Decimal::ZERO) - total_invested
}

fn positive(value: Decimal) -> Option<Decimal> {
    (value > Decimal::ZERO).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, AccountType, PnlEntry, PropfirmId, Withdrawal};
    use chrono::{Duration, NaiveDate};
    use rust_decimal_macros::dec;

    fn ledger(
        propfirm: PropfirmId,
        account_type: AccountType,
        size: Decimal,
        price_paid: Decimal,
        pnls: &[Decimal],
        withdrawals: &[Decimal],
    ) -> AccountLedger {
        let account = Account::new("user", "test", propfirm, size, account_type, price_paid);
        let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let mut ledger = AccountLedger::new(account);
        ledger.pnl_entries = pnls
            .iter()
            .enumerate()
            .map(|(i, &a)| PnlEntry::new(&ledger.account.id, start + Duration::days(i as i64), a))
            .collect();
        ledger.withdrawals = withdrawals
            .iter()
            .map(|&a| Withdrawal::new(&ledger.account.id, start, a))
            .collect();
        ledger
    }

    #[test]
    fn test_balance_identity() {
        let l = ledger(
            PropfirmId::Topstep,
            AccountType::Funded,
            dec!(50000),
            dec!(150),
            &[dec!(400), dec!(-120), dec!(900)],
            &[dec!(500), dec!(100)],
        );
        let stats = AccountStatsCalculator::calculate_stats(&l);

        assert_eq!(stats.total_pnl, dec!(1180));
        assert_eq!(stats.total_withdrawals, dec!(600));
        assert_eq!(stats.current_balance, dec!(50000) + dec!(1180) - dec!(600));
    }

    #[test]
    fn test_roi_zero_without_investment() {
        let l = ledger(
            PropfirmId::Other,
            AccountType::Evaluation,
            dec!(25000),
            Decimal::ZERO,
            &[dec!(1000)],
            &[],
        );
        let stats = AccountStatsCalculator::calculate_stats(&l);
        assert_eq!(stats.total_invested, Decimal::ZERO);
        assert_eq!(stats.roi, Decimal::ZERO);
        assert_eq!(stats.net_profit, dec!(1000));
    }

    #[test]
    fn test_invested_includes_linked_evaluation() {
        let mut l = ledger(
            PropfirmId::Topstep,
            AccountType::Funded,
            dec!(50000),
            dec!(149),
            &[dec!(1000)],
            &[],
        );
        let eval = Account::new(
            "user",
            "eval",
            PropfirmId::Topstep,
            dec!(50000),
            AccountType::Evaluation,
            dec!(51),
        );
        l.account.linked_evaluation_id = Some(eval.id.clone());
        l.linked_evaluation = Some(eval);

        let stats = AccountStatsCalculator::calculate_stats(&l);
        assert_eq!(stats.total_invested, dec!(200));
        assert_eq!(stats.net_profit, dec!(800));
        assert_eq!(stats.roi, dec!(400));
    }

    #[test]
    fn test_funded_buffer_net_profit() {
        // TPT 50k funded: buffer 2000, balance 53000, invested 200
        let l = ledger(
            PropfirmId::TakeProfitTrader,
            AccountType::Funded,
            dec!(50000),
            dec!(200),
            &[dec!(3000)],
            &[],
        );
        let stats = AccountStatsCalculator::calculate_stats(&l);

        assert_eq!(stats.buffer, Some(dec!(2000)));
        assert_eq!(stats.net_profit, dec!(53000) - dec!(2000) - dec!(200));
        assert_eq!(stats.available_for_withdrawal, Some(dec!(1000)));
    }

    #[test]
    fn test_funded_net_profit_clamps_below_buffer() {
        assert_eq!(funded_net_profit(dec!(50500), dec!(500), Decimal::ZERO), dec!(50000));
        assert_eq!(funded_net_profit(dec!(400), dec!(500), dec!(100)), dec!(-100));
    }

    #[test]
    fn test_funded_losing_account_reports_balance_above_buffer() {
        // TPT 50k funded: balance 49900, buffer 2000, invested 150
        let l = ledger(
            PropfirmId::TakeProfitTrader,
            AccountType::Funded,
            dec!(50000),
            dec!(150),
            &[dec!(-100)],
            &[],
        );
        let stats = AccountStatsCalculator::calculate_stats(&l);

        assert_eq!(stats.current_balance, dec!(49900));
        assert_eq!(stats.net_profit, dec!(47750));
        assert_eq!(stats.roi.round_dp(2), dec!(31833.33));
        assert_eq!(stats.available_for_withdrawal, None);
    }

    #[test]
    fn test_evaluation_ignores_buffer_for_net_profit() {
        let l = ledger(
            PropfirmId::TakeProfitTrader,
            AccountType::Evaluation,
            dec!(50000),
            dec!(170),
            &[dec!(500)],
            &[],
        );
        let stats = AccountStatsCalculator::calculate_stats(&l);
        assert_eq!(stats.net_profit, dec!(330));
    }

    #[test]
    fn test_absent_buffer_and_availability() {
        let l = ledger(
            PropfirmId::Topstep,
            AccountType::Funded,
            dec!(50000),
            dec!(100),
            &[dec!(-300)],
            &[],
        );
        let stats = AccountStatsCalculator::calculate_stats(&l);
        assert_eq!(stats.buffer, None);
        assert_eq!(stats.available_for_withdrawal, None);

        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("buffer").is_none());
        assert!(json.get("availableForWithdrawal").is_none());
        assert!(json.get("currentBalance").is_some());
    }

    #[test]
    fn test_net_withdrawals_in_stats() {
        let l = ledger(
            PropfirmId::TakeProfitTrader,
            AccountType::Funded,
            dec!(50000),
            dec!(0),
            &[dec!(5000)],
            &[dec!(100), dec!(400)],
        );
        let stats = AccountStatsCalculator::calculate_stats(&l);
        assert_eq!(stats.total_net_withdrawals, dec!(400));
    }

    #[test]
    fn test_eligibility_only_for_evaluations() {
        let pnls = [dec!(1600), dec!(1600)];
        let eval =
            ledger(PropfirmId::Topstep, AccountType::Evaluation, dec!(50000), dec!(0), &pnls, &[]);
        let funded =
            ledger(PropfirmId::Topstep, AccountType::Funded, dec!(50000), dec!(0), &pnls, &[]);

        assert!(AccountStatsCalculator::is_eligible_for_validation(&eval));
        assert!(!AccountStatsCalculator::is_eligible_for_validation(&funded));
    }

    #[test]
    fn test_eligibility_empty_entries() {
        let eval =
            ledger(PropfirmId::Apex, AccountType::Evaluation, dec!(50000), dec!(0), &[], &[]);
        assert!(!AccountStatsCalculator::is_eligible_for_validation(&eval));
    }
}
