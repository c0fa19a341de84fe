//! Static per-firm rule tables: evaluation targets, drawdown limits and payout terms.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Evaluation rules for one account size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRules {
    pub profit_target: Decimal,
    pub max_drawdown: Decimal,
    pub daily_loss_limit: Decimal,

    /// Largest share (percent) of total profit a single day may contribute.
    /// 100 means the firm has no consistency rule.
    pub consistency_rule: Decimal,

    pub min_trading_days: Option<u32>,

    /// Contract limits per account size offered by the firm
    pub max_contracts: Option<Vec<ContractLimit>>,
}

/// Maximum contracts allowed on one account size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractLimit {
    pub size: Decimal,
    pub contracts: u32,
}

/// Payout cycle: `days_per_cycle` days of at least `min_daily_profit`
/// unlock `withdrawal_percentage` percent of the profit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleRequirement {
    pub days_per_cycle: u32,
    pub min_daily_profit: Decimal,
    pub withdrawal_percentage: Decimal,
}

/// Payout terms, identical for every account size of a firm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRules {
    /// Share of each withdrawal kept by the firm (0-1)
    pub tax_rate: Decimal,
    pub requires_cycles: bool,
    pub cycle_requirement: Option<CycleRequirement>,
    pub has_buffer: bool,
}

/// One row of a firm's size table.
#[derive(Debug, Clone, Copy)]
pub struct RuleTier {
    pub size: Decimal,
    pub profit_target: Decimal,
    pub max_drawdown: Decimal,
    pub daily_loss_limit: Decimal,
    pub max_contracts: u32,
}

/// Everything we know about a firm with a fixed list of account sizes.
#[derive(Debug)]
pub struct FirmRuleTable {
    /// Sorted by size, never empty
    pub tiers: &'static [RuleTier],
    pub consistency_rule: Decimal,
    pub min_trading_days: Option<u32>,
    pub withdrawal: WithdrawalRules,

    /// Funded buffer is the tier's max drawdown plus this offset.
    /// `None` when the firm has no buffer.
    pub buffer_offset: Option<Decimal>,
}

impl FirmRuleTable {
    /// Tier for `size`, or the nearest one when the size isn't offered.
    /// Ties go to the smaller tier.
    pub fn tier_for(&self, size: Decimal) -> &RuleTier {
        let mut best = &self.tiers[0];
        for tier in &self.tiers[1..] {
            if (tier.size - size).abs() < (best.size - size).abs() {
                best = tier;
            }
        }
        best
    }

    pub fn account_rules(&self, size: Decimal) -> AccountRules {
        let tier = self.tier_for(size);
        AccountRules {
            profit_target: tier.profit_target,
            max_drawdown: tier.max_drawdown,
            daily_loss_limit: tier.daily_loss_limit,
            consistency_rule: self.consistency_rule,
            min_trading_days: self.min_trading_days,
            max_contracts: Some(
                self.tiers
                    .iter()
                    .map(|t| ContractLimit {
                        size: t.size,
                        contracts: t.max_contracts,
                    })
                    .collect(),
            ),
        }
    }

    pub fn buffer(&self, size: Decimal) -> Decimal {
        match self.buffer_offset {
            Some(offset) => self.tier_for(size).max_drawdown + offset,
            None => Decimal::ZERO,
        }
    }
}

const fn tier(
    size: Decimal,
    profit_target: Decimal,
    max_drawdown: Decimal,
    daily_loss_limit: Decimal,
    max_contracts: u32,
) -> RuleTier {
    RuleTier {
        size,
        profit_target,
        max_drawdown,
        daily_loss_limit,
        max_contracts,
    }
}

pub static TOPSTEP: FirmRuleTable = FirmRuleTable {
    tiers: &[
        tier(dec!(50000), dec!(3000), dec!(2000), dec!(1000), 5),
        tier(dec!(100000), dec!(6000), dec!(3000), dec!(2000), 10),
        tier(dec!(150000), dec!(9000), dec!(4500), dec!(3000), 15),
    ],
    consistency_rule: dec!(50),
    min_trading_days: Some(2),
    withdrawal: WithdrawalRules {
        tax_rate: dec!(0),
        requires_cycles: true,
        cycle_requirement: Some(CycleRequirement {
            days_per_cycle: 5,
            min_daily_profit: dec!(200),
            withdrawal_percentage: dec!(50),
        }),
        has_buffer: false,
    },
    buffer_offset: None,
};

pub static TAKE_PROFIT_TRADER: FirmRuleTable = FirmRuleTable {
    tiers: &[
        tier(dec!(25000), dec!(1500), dec!(1500), dec!(500), 3),
        tier(dec!(50000), dec!(3000), dec!(2000), dec!(1100), 6),
        tier(dec!(75000), dec!(4500), dec!(2500), dec!(1700), 9),
        tier(dec!(100000), dec!(6000), dec!(3000), dec!(2200), 12),
        tier(dec!(150000), dec!(9000), dec!(4500), dec!(3300), 15),
    ],
    consistency_rule: dec!(50),
    min_trading_days: Some(5),
    withdrawal: WithdrawalRules {
        tax_rate: dec!(0.20),
        requires_cycles: false,
        cycle_requirement: None,
        has_buffer: true,
    },
    buffer_offset: Some(dec!(0)),
};

// Apex has no separate daily loss limit; the trailing drawdown is the only cap.
pub static APEX: FirmRuleTable = FirmRuleTable {
    tiers: &[
        tier(dec!(25000), dec!(1500), dec!(1500), dec!(1500), 4),
        tier(dec!(50000), dec!(3000), dec!(2500), dec!(2500), 10),
        tier(dec!(100000), dec!(6000), dec!(3000), dec!(3000), 14),
        tier(dec!(150000), dec!(9000), dec!(5000), dec!(5000), 17),
        tier(dec!(250000), dec!(15000), dec!(6500), dec!(6500), 27),
        tier(dec!(300000), dec!(20000), dec!(7500), dec!(7500), 35),
    ],
    consistency_rule: dec!(30),
    min_trading_days: Some(7),
    withdrawal: WithdrawalRules {
        tax_rate: dec!(0.10),
        requires_cycles: true,
        cycle_requirement: Some(CycleRequirement {
            days_per_cycle: 8,
            min_daily_profit: dec!(50),
            withdrawal_percentage: dec!(100),
        }),
        has_buffer: true,
    },
    buffer_offset: Some(dec!(100)),
};

pub static BULENOX: FirmRuleTable = FirmRuleTable {
    tiers: &[
        tier(dec!(25000), dec!(1500), dec!(1500), dec!(500), 3),
        tier(dec!(50000), dec!(3000), dec!(2500), dec!(1100), 7),
        tier(dec!(100000), dec!(6000), dec!(3000), dec!(2200), 12),
        tier(dec!(150000), dec!(9000), dec!(4500), dec!(3300), 15),
        tier(dec!(250000), dec!(15000), dec!(5500), dec!(4500), 25),
    ],
    consistency_rule: dec!(40),
    min_trading_days: Some(10),
    withdrawal: WithdrawalRules {
        tax_rate: dec!(0.10),
        requires_cycles: false,
        cycle_requirement: None,
        has_buffer: true,
    },
    buffer_offset: Some(dec!(100)),
};

pub static PHIDIAS: FirmRuleTable = FirmRuleTable {
    tiers: &[
        tier(dec!(25000), dec!(1500), dec!(1000), dec!(1000), 3),
        tier(dec!(50000), dec!(4000), dec!(2500), dec!(2500), 10),
        tier(dec!(100000), dec!(6000), dec!(3000), dec!(3000), 14),
        tier(dec!(150000), dec!(9000), dec!(4500), dec!(4500), 17),
    ],
    consistency_rule: dec!(30),
    min_trading_days: None,
    withdrawal: WithdrawalRules {
        tax_rate: dec!(0.20),
        requires_cycles: false,
        cycle_requirement: None,
        has_buffer: false,
    },
    buffer_offset: None,
};

/// Rules for firms we have no table for, as fractions of the account size.
pub mod fallback {
    use super::*;

    pub const PROFIT_TARGET_PCT: Decimal = dec!(0.06);
    pub const MAX_DRAWDOWN_PCT: Decimal = dec!(0.04);
    pub const DAILY_LOSS_PCT: Decimal = dec!(0.02);

    pub const WITHDRAWAL: WithdrawalRules = WithdrawalRules {
        tax_rate: dec!(0),
        requires_cycles: false,
        cycle_requirement: None,
        has_buffer: false,
    };

    pub fn account_rules(size: Decimal) -> AccountRules {
        let size = size.max(Decimal::ZERO);
        AccountRules {
            profit_target: size * PROFIT_TARGET_PCT,
            max_drawdown: size * MAX_DRAWDOWN_PCT,
            daily_loss_limit: size * DAILY_LOSS_PCT,
            consistency_rule: dec!(100),
            min_trading_days: None,
            max_contracts: None,
        }
    }
}
