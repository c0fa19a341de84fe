//! Tax-adjusted withdrawal amounts.

use rust_decimal::Decimal;

use crate::models::{PropfirmId, Withdrawal};
use crate::propfirm::strategy_for;

/// What reaches the trader after the firm's profit split.
pub fn get_net_withdrawal_amount(withdrawal: &Withdrawal, propfirm: PropfirmId) -> Decimal {
    let tax_rate = strategy_for(propfirm).get_withdrawal_rules().tax_rate;
    net_amount(withdrawal.amount, tax_rate)
}

/// Sum of [`get_net_withdrawal_amount`] over all withdrawals.
pub fn calculate_total_net_withdrawals(
    withdrawals: &[Withdrawal],
    propfirm: PropfirmId,
) -> Decimal {
    withdrawals
        .iter()
        .map(|w| get_net_withdrawal_amount(w, propfirm))
        .sum()
}

fn net_amount(gross: Decimal, tax_rate: Decimal) -> Decimal {
    let rate = tax_rate.clamp(Decimal::ZERO, Decimal::ONE);
    (gross * (Decimal::ONE - rate)).max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn withdrawal(amount: Decimal) -> Withdrawal {
        Withdrawal::new("acct", NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(), amount)
    }

    #[test]
    fn test_net_amount_by_firm() {
        let w = withdrawal(dec!(100));
        assert_eq!(get_net_withdrawal_amount(&w, PropfirmId::TakeProfitTrader), dec!(80));
        assert_eq!(get_net_withdrawal_amount(&w, PropfirmId::Topstep), dec!(100));
        assert_eq!(get_net_withdrawal_amount(&w, PropfirmId::Apex), dec!(90));
    }

    #[test]
    fn test_total_matches_per_item_sum() {
        let withdrawals =
            vec![withdrawal(dec!(100)), withdrawal(dec!(333.33)), withdrawal(dec!(0))];

        for id in PropfirmId::ALL {
            let per_item: Decimal = withdrawals
                .iter()
                .map(|w| get_net_withdrawal_amount(w, id))
                .sum();
            assert_eq!(calculate_total_net_withdrawals(&withdrawals, id), per_item);
        }
    }

    #[test]
    fn test_net_amount_never_negative() {
        assert_eq!(net_amount(dec!(100), dec!(1.5)), Decimal::ZERO);
        assert_eq!(net_amount(dec!(-10), dec!(0.2)), Decimal::ZERO);
        assert_eq!(net_amount(dec!(100), dec!(-0.5)), dec!(100));
    }

    #[test]
    fn test_empty_total() {
        assert_eq!(calculate_total_net_withdrawals(&[], PropfirmId::Apex), Decimal::ZERO);
    }
}
