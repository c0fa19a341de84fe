//! Trading statistics over imported trades: win rates, profit factor, lots, duration.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use statrs::statistics::Statistics;

use crate::models::{DurationBucket, Trade, TradingStatistics};

/// Holding-time bands used by the duration breakdown: (label, from, until).
const DURATION_BANDS: [(&str, i64, Option<i64>); 11] = [
    ("<15s", 0, Some(15)),
    ("15-45s", 15, Some(45)),
    ("45s-1m", 45, Some(60)),
    ("1-2m", 60, Some(120)),
    ("2-5m", 120, Some(300)),
    ("5-10m", 300, Some(600)),
    ("10-30m", 600, Some(1800)),
    ("30m-1h", 1800, Some(3600)),
    ("1-2h", 3600, Some(7200)),
    ("2-4h", 7200, Some(14400)),
    (">=4h", 14400, None),
];

/// Calculator for trade-level performance statistics.
pub struct TradingStatsCalculator;

impl TradingStatsCalculator {
    /// Summarise a list of trades. An empty list gives all-zero statistics.
    pub fn calculate(trades: &[Trade]) -> TradingStatistics {
        if trades.is_empty() {
            return TradingStatistics::empty();
        }

        let net_pnls: Vec<Decimal> = trades.iter().map(Trade::net_pnl).collect();
        let winning = net_pnls.iter().filter(|&&p| p > Decimal::ZERO).count();

        let durations: Vec<f64> = trades.iter().map(|t| t.duration_secs as f64).collect();

        TradingStatistics {
            total_trades: trades.len() as u32,
            trade_win_percent: percent(winning, trades.len()),
            profit_factor: Self::profit_factor(&net_pnls),
            day_win_percent: Self::day_win_percent(trades),
            total_lots: trades.iter().map(|t| t.size).sum(),
            average_trade_duration: durations.mean(),
        }
    }

    /// Gross profit over gross loss.
    ///
    /// With no losing trades the ratio is unbounded, so the gross profit is
    /// reported instead. No trades (or only scratches) give zero.
    pub fn profit_factor(net_pnls: &[Decimal]) -> f64 {
        let gross_profit: Decimal = net_pnls.iter().filter(|&&p| p > Decimal::ZERO).copied().sum();
        let gross_loss: Decimal = net_pnls
            .iter()
            .filter(|&&p| p < Decimal::ZERO)
            .map(|p| p.abs())
            .sum();

        if gross_loss > Decimal::ZERO {
            gross_profit.to_f64().unwrap_or(0.0) / gross_loss.to_f64().unwrap_or(1.0)
        } else {
            gross_profit.to_f64().unwrap_or(0.0)
        }
    }

    /// Share of distinct trading days whose summed net PnL is positive.
    pub fn day_win_percent(trades: &[Trade]) -> f64 {
        let days = Self::daily_net_pnl(trades);
        let winning_days = days.values().filter(|&&p| p > Decimal::ZERO).count();
        percent(winning_days, days.len())
    }

    /// Net PnL per trading day, ordered by day.
    pub fn daily_net_pnl(trades: &[Trade]) -> BTreeMap<NaiveDate, Decimal> {
        let mut days = BTreeMap::new();
        for trade in trades {
            *days.entry(trade.trading_day).or_insert(Decimal::ZERO) += trade.net_pnl();
        }
        days
    }

    /// Count, wins and net PnL per holding-time band. Every band is returned,
    /// empty ones with zeros.
    pub fn duration_buckets(trades: &[Trade]) -> Vec<DurationBucket> {
        let mut buckets: Vec<DurationBucket> = DURATION_BANDS
            .iter()
            .map(|&(label, min_secs, max_secs)| DurationBucket {
                label: label.to_string(),
                min_secs,
                max_secs,
                trade_count: 0,
                winning_trades: 0,
                win_rate: 0.0,
                net_pnl: Decimal::ZERO,
            })
            .collect();

        for trade in trades {
            let idx = band_index(trade.duration_secs);
            let bucket = &mut buckets[idx];
            bucket.trade_count += 1;
            bucket.net_pnl += trade.net_pnl();
            if trade.is_win() {
                bucket.winning_trades += 1;
            }
        }

        for bucket in &mut buckets {
            bucket.win_rate = percent(bucket.winning_trades as usize, bucket.trade_count as usize);
        }

        buckets
    }
}

/// Band for a holding time. Negative durations fall into the first band.
fn band_index(duration_secs: i64) -> usize {
    DURATION_BANDS
        .iter()
        .position(|&(_, _, max)| max.map_or(true, |max| duration_secs < max))
        .unwrap_or(DURATION_BANDS.len() - 1)
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::trade;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_trades() {
        let stats = TradingStatsCalculator::calculate(&[]);
        assert_eq!(stats, TradingStatistics::empty());
        assert_eq!(stats.total_trades, 0);
        assert_eq!(stats.profit_factor, 0.0);
        assert_eq!(stats.average_trade_duration, 0.0);
    }

    #[test]
    fn test_mixed_days() {
        let trades = vec![
            trade(dec!(12.0), dec!(2.22), dec!(3), "2025-12-18", 20),
            trade(dec!(25.5), dec!(2.22), dec!(3), "2025-12-18", 40),
            trade(dec!(-10.0), dec!(2.5), dec!(1), "2025-12-19", 90),
        ];

        let stats = TradingStatsCalculator::calculate(&trades);

        assert_eq!(stats.total_trades, 3);
        assert!((stats.trade_win_percent - 66.67).abs() < 0.01);
        assert_eq!(stats.total_lots, dec!(7));
        assert!((stats.day_win_percent - 50.0).abs() < 1e-9);
        // (9.78 + 23.28) / 12.5
        assert!((stats.profit_factor - 2.6448).abs() < 1e-9);
        assert!((stats.average_trade_duration - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_profit_factor_without_losses_is_gross_profit() {
        let pnls = vec![dec!(100), dec!(50.5), dec!(0)];
        assert!((TradingStatsCalculator::profit_factor(&pnls) - 150.5).abs() < 1e-9);
        assert_eq!(TradingStatsCalculator::profit_factor(&[]), 0.0);
        assert!(TradingStatsCalculator::profit_factor(&pnls).is_finite());
    }

    #[test]
    fn test_profit_factor_only_losses() {
        let pnls = vec![dec!(-100), dec!(-20)];
        assert_eq!(TradingStatsCalculator::profit_factor(&pnls), 0.0);
    }

    #[test]
    fn test_commissions_count_against_wins() {
        let mut t = trade(dec!(5), dec!(1), dec!(1), "2025-12-18", 10);
        t.commissions = Some(dec!(4));
        let stats = TradingStatsCalculator::calculate(&[t]);
        assert_eq!(stats.trade_win_percent, 0.0);
        assert_eq!(stats.day_win_percent, 0.0);
    }

    #[test]
    fn test_duration_buckets() {
        let trades = vec![
            trade(dec!(10), dec!(1), dec!(1), "2025-12-18", 5),
            trade(dec!(-10), dec!(1), dec!(1), "2025-12-18", 14),
            trade(dec!(10), dec!(1), dec!(1), "2025-12-18", 15),
            trade(dec!(10), dec!(1), dec!(1), "2025-12-18", 14400),
            trade(dec!(10), dec!(1), dec!(1), "2025-12-18", 90000),
        ];

        let buckets = TradingStatsCalculator::duration_buckets(&trades);
        assert_eq!(buckets.len(), DURATION_BANDS.len());

        assert_eq!(buckets[0].label, "<15s");
        assert_eq!(buckets[0].trade_count, 2);
        assert_eq!(buckets[0].winning_trades, 1);
        assert!((buckets[0].win_rate - 50.0).abs() < 1e-9);
        assert_eq!(buckets[0].net_pnl, dec!(-2));

        assert_eq!(buckets[1].trade_count, 1);
        assert_eq!(buckets[1].win_rate, 100.0);

        let last = buckets.last().unwrap();
        assert_eq!(last.trade_count, 2);
        assert_eq!(last.max_secs, None);

        let total: u32 = buckets.iter().map(|b| b.trade_count).sum();
        assert_eq!(total, 5);
        assert_eq!(buckets[5].win_rate, 0.0);
    }

    #[test]
    fn test_band_index_edges() {
        assert_eq!(band_index(-3), 0);
        assert_eq!(band_index(0), 0);
        assert_eq!(band_index(59), 2);
        assert_eq!(band_index(60), 3);
        assert_eq!(band_index(14399), 9);
        assert_eq!(band_index(14400), 10);
    }
}
