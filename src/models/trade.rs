//! Trade model representing one imported execution (round trip).

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Long,
    Short,
}

impl TradeSide {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "LONG" | "BUY" | "B" => Some(Self::Long),
            "SHORT" | "SELL" | "S" => Some(Self::Short),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Long => "LONG",
            TradeSide::Short => "SHORT",
        }
    }
}

/// Closed trade imported from a trading platform export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: String,

    pub account_id: String,

    /// Platform the trade was exported from (e.g. "tradovate", "rithmic")
    pub platform: String,

    /// Trade id on the platform, unique per account and platform
    pub external_id: String,

    /// Contract symbol (e.g. "MNQZ5")
    pub contract_name: String,

    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,

    pub entry_price: Decimal,
    pub exit_price: Decimal,

    /// Number of lots/contracts
    pub size: Decimal,

    pub side: TradeSide,

    /// Realized PnL as reported by the platform, before fees
    pub pnl: Decimal,

    pub fees: Decimal,

    #[serde(default)]
    pub commissions: Option<Decimal>,

    /// Date-only trading day the trade counts towards
    pub trading_day: NaiveDate,

    pub duration_secs: i64,
}

impl Trade {
    /// PnL after fees and commissions; the value every win/loss rule uses.
    pub fn net_pnl(&self) -> Decimal {
        self.pnl - self.fees - self.commissions.unwrap_or(Decimal::ZERO)
    }

    pub fn is_win(&self) -> bool {
        self.net_pnl() > Decimal::ZERO
    }

    /// Trading day and holding time for an entry/exit pair.
    pub fn timing(entry_time: DateTime<Utc>, exit_time: DateTime<Utc>) -> (NaiveDate, i64) {
        let duration = (exit_time - entry_time).num_seconds().max(0);
        (entry_time.date_naive(), duration)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    /// Minimal trade with the fields the statistics care about.
    pub fn trade(
        pnl: Decimal,
        fees: Decimal,
        size: Decimal,
        day: &str,
        duration_secs: i64,
    ) -> Trade {
        let trading_day = NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap();
        let entry_time = Utc.from_utc_datetime(&trading_day.and_hms_opt(14, 30, 0).unwrap());
        Trade {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: "acct".to_string(),
            platform: "test".to_string(),
            external_id: uuid::Uuid::new_v4().to_string(),
            contract_name: "MNQZ5".to_string(),
            entry_time,
            exit_time: entry_time + chrono::Duration::seconds(duration_secs),
            entry_price: Decimal::ZERO,
            exit_price: Decimal::ZERO,
            size,
            side: TradeSide::Long,
            pnl,
            fees,
            commissions: None,
            trading_day,
            duration_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::trade;
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_net_pnl_subtracts_fees_and_commissions() {
        let mut t = trade(dec!(12.0), dec!(2.22), dec!(3), "2025-12-18", 30);
        assert_eq!(t.net_pnl(), dec!(9.78));
        assert!(t.is_win());

        t.commissions = Some(dec!(10));
        assert_eq!(t.net_pnl(), dec!(-0.22));
        assert!(!t.is_win());
    }

    #[test]
    fn test_fees_can_turn_a_scratch_into_a_loss() {
        let t = trade(dec!(0), dec!(1.5), dec!(1), "2025-12-18", 5);
        assert!(!t.is_win());
        assert_eq!(t.net_pnl(), dec!(-1.5));
    }

    #[test]
    fn test_timing() {
        let entry = Utc.with_ymd_and_hms(2025, 12, 18, 23, 59, 0).unwrap();
        let exit = Utc.with_ymd_and_hms(2025, 12, 19, 0, 1, 30).unwrap();

        let (day, secs) = Trade::timing(entry, exit);
        assert_eq!(day, NaiveDate::from_ymd_opt(2025, 12, 18).unwrap());
        assert_eq!(secs, 150);
    }

    #[test]
    fn test_side_parsing() {
        assert_eq!(TradeSide::from_str("Buy"), Some(TradeSide::Long));
        assert_eq!(TradeSide::from_str(" short "), Some(TradeSide::Short));
        assert_eq!(TradeSide::from_str("flat"), None);
    }
}
