//! Daily PnL entries and withdrawals recorded against an account.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Profit or loss the user recorded for one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlEntry {
    pub id: String,
    pub account_id: String,
    pub date: NaiveDate,

    /// Signed amount; losses are negative
    pub amount: Decimal,

    #[serde(default)]
    pub notes: String,
}

impl PnlEntry {
    pub fn new(account_id: impl Into<String>, date: NaiveDate, amount: Decimal) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account_id.into(),
            date,
            amount,
            notes: String::new(),
        }
    }
}

/// Gross payout requested from an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    pub id: String,
    pub account_id: String,
    pub date: NaiveDate,

    /// Gross amount before the firm's profit split, never negative
    pub amount: Decimal,

    #[serde(default)]
    pub notes: String,
}

impl Withdrawal {
    pub fn new(account_id: impl Into<String>, date: NaiveDate, amount: Decimal) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account_id.into(),
            date,
            amount,
            notes: String::new(),
        }
    }
}

/// Sum PnL entries per calendar day, ordered by date.
///
/// Users may log several entries for the same day; rules that talk about
/// "a day" always mean the day's total.
pub fn daily_totals(entries: &[PnlEntry]) -> BTreeMap<NaiveDate, Decimal> {
    let mut days = BTreeMap::new();
    for entry in entries {
        *days.entry(entry.date).or_insert(Decimal::ZERO) += entry.amount;
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_daily_totals_merges_same_day() {
        let entries = vec![
            PnlEntry::new("a", day(4), dec!(300)),
            PnlEntry::new("a", day(3), dec!(-120)),
            PnlEntry::new("a", day(4), dec!(-50)),
        ];

        let days = daily_totals(&entries);
        let collected: Vec<_> = days.into_iter().collect();

        assert_eq!(collected, vec![(day(3), dec!(-120)), (day(4), dec!(250))]);
    }

    #[test]
    fn test_daily_totals_empty() {
        assert!(daily_totals(&[]).is_empty());
    }
}
