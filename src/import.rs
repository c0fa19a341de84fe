//! CSV import of closed trades exported from a trading platform.

use std::io::Read;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::models::{Trade, TradeSide};

/// One row of a trade export.
#[derive(Debug, Deserialize)]
struct TradeRecord {
    id: String,
    contract: String,
    entry_time: DateTime<Utc>,
    exit_time: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::str")]
    entry_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    exit_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    size: Decimal,
    side: String,
    #[serde(with = "rust_decimal::serde::str")]
    pnl: Decimal,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    fees: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    commissions: Option<Decimal>,
}

/// Parses trade exports into [`Trade`]s for one account.
pub struct TradeImporter {
    platform: String,
    account_id: String,
}

impl TradeImporter {
    pub fn new(platform: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            platform: platform.into().trim().to_lowercase(),
            account_id: account_id.into(),
        }
    }

    /// Parse a whole export. Fails on the first bad row, naming its line.
    pub fn from_reader<R: Read>(
        platform: impl Into<String>,
        account_id: impl Into<String>,
        reader: R,
    ) -> Result<Vec<Trade>> {
        Self::new(platform, account_id).parse(reader)
    }

    pub fn parse<R: Read>(&self, reader: R) -> Result<Vec<Trade>> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut trades = Vec::new();
        for (i, result) in rdr.deserialize::<TradeRecord>().enumerate() {
            // Header is line 1
            let line = i + 2;
            let record = result.with_context(|| format!("Invalid trade row at line {}", line))?;
            trades.push(
                self.to_trade(record)
                    .with_context(|| format!("Invalid trade row at line {}", line))?,
            );
        }

        debug!(
            platform = %self.platform,
            account = %self.account_id,
            count = trades.len(),
            "Parsed trade export"
        );
        Ok(trades)
    }

    fn to_trade(&self, record: TradeRecord) -> Result<Trade> {
        if record.id.is_empty() {
            bail!("Missing trade id");
        }
        if record.exit_time < record.entry_time {
            bail!(
                "Trade {} exits ({}) before it enters ({})",
                record.id,
                record.exit_time,
                record.entry_time
            );
        }
        if record.size <= Decimal::ZERO {
            bail!("Trade {} has non-positive size {}", record.id, record.size);
        }
        let side = TradeSide::from_str(&record.side)
            .with_context(|| format!("Unknown side {:?} on trade {}", record.side, record.id))?;

        let (trading_day, duration_secs) = Trade::timing(record.entry_time, record.exit_time);

        Ok(Trade {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: self.account_id.clone(),
            platform: self.platform.clone(),
            external_id: record.id,
            contract_name: record.contract,
            entry_time: record.entry_time,
            exit_time: record.exit_time,
            entry_price: record.entry_price,
            exit_price: record.exit_price,
            size: record.size,
            side,
            pnl: record.pnl,
            fees: record.fees.unwrap_or(Decimal::ZERO),
            commissions: record.commissions,
            trading_day,
            duration_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    const HEADER: &str =
        "id,contract,entry_time,exit_time,entry_price,exit_price,size,side,pnl,fees,commissions\n";

    #[test]
    fn test_parse_rows() {
        let csv = format!(
            "{}{}{}",
            HEADER,
            "T1,MNQZ5,2025-12-18T14:30:00Z,2025-12-18T14:30:40Z,\
             21500.25,21502.25,3,Buy,12.00,2.22,\n",
            "T2, MESZ5 ,2025-12-19T15:00:00Z,2025-12-19T15:01:30Z,6050,6048,1,SELL,-10,2.5,0.5\n",
        );

        let trades = TradeImporter::from_reader("Tradovate", "acct-1", csv.as_bytes()).unwrap();
        assert_eq!(trades.len(), 2);

        let t1 = &trades[0];
        assert_eq!(t1.platform, "tradovate");
        assert_eq!(t1.account_id, "acct-1");
        assert_eq!(t1.external_id, "T1");
        assert_eq!(t1.side, TradeSide::Long);
        assert_eq!(t1.commissions, None);
        assert_eq!(t1.duration_secs, 40);
        assert_eq!(t1.trading_day, NaiveDate::from_ymd_opt(2025, 12, 18).unwrap());
        assert_eq!(t1.net_pnl(), dec!(9.78));

        let t2 = &trades[1];
        assert_eq!(t2.contract_name, "MESZ5");
        assert_eq!(t2.side, TradeSide::Short);
        assert_eq!(t2.commissions, Some(dec!(0.5)));
        assert_eq!(t2.duration_secs, 90);
        assert_eq!(t2.net_pnl(), dec!(-13));
    }

    #[test]
    fn test_exit_before_entry_names_line() {
        let csv = format!(
            "{}{}{}",
            HEADER,
            "T1,MNQZ5,2025-12-18T14:30:00Z,2025-12-18T14:31:00Z,1,1,1,LONG,0,0,\n",
            "T2,MNQZ5,2025-12-18T14:30:00Z,2025-12-18T14:29:00Z,1,1,1,LONG,0,0,\n",
        );

        let err = TradeImporter::from_reader("tradovate", "acct", csv.as_bytes()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 3"));
    }

    #[test]
    fn test_bad_side_and_bad_number() {
        let bad_side = format!(
            "{}{}",
            HEADER, "T1,MNQZ5,2025-12-18T14:30:00Z,2025-12-18T14:31:00Z,1,1,1,FLAT,0,0,\n"
        );
        assert!(TradeImporter::from_reader("x", "acct", bad_side.as_bytes()).is_err());

        let bad_pnl = format!(
            "{}{}",
            HEADER, "T1,MNQZ5,2025-12-18T14:30:00Z,2025-12-18T14:31:00Z,1,1,1,LONG,abc,0,\n"
        );
        assert!(TradeImporter::from_reader("x", "acct", bad_pnl.as_bytes()).is_err());
    }

    #[test]
    fn test_empty_export() {
        let trades = TradeImporter::from_reader("x", "acct", HEADER.as_bytes()).unwrap();
        assert!(trades.is_empty());
    }
}
