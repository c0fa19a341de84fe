//! Maps a provider identifier to its strategy.

use super::rules::{APEX, BULENOX, PHIDIAS, TAKE_PROFIT_TRADER, TOPSTEP};
use super::strategy::{FallbackStrategy, PropfirmStrategy, TieredStrategy};
use crate::models::PropfirmId;

static TOPSTEP_STRATEGY: TieredStrategy = TieredStrategy::new(PropfirmId::Topstep, &TOPSTEP);
static TAKE_PROFIT_TRADER_STRATEGY: TieredStrategy =
    TieredStrategy::new(PropfirmId::TakeProfitTrader, &TAKE_PROFIT_TRADER);
static APEX_STRATEGY: TieredStrategy = TieredStrategy::new(PropfirmId::Apex, &APEX);
static BULENOX_STRATEGY: TieredStrategy = TieredStrategy::new(PropfirmId::Bulenox, &BULENOX);
static PHIDIAS_STRATEGY: TieredStrategy = TieredStrategy::new(PropfirmId::Phidias, &PHIDIAS);
static FALLBACK_STRATEGY: FallbackStrategy = FallbackStrategy;

/// Strategy for a known provider.
pub fn strategy_for(propfirm: PropfirmId) -> &'static dyn PropfirmStrategy {
    match propfirm {
        PropfirmId::Topstep => &TOPSTEP_STRATEGY,
        PropfirmId::TakeProfitTrader => &TAKE_PROFIT_TRADER_STRATEGY,
        PropfirmId::Apex => &APEX_STRATEGY,
        PropfirmId::Bulenox => &BULENOX_STRATEGY,
        PropfirmId::Phidias => &PHIDIAS_STRATEGY,
        PropfirmId::Other => &FALLBACK_STRATEGY,
    }
}

/// Strategy for any provider tag. Unrecognised tags get the fallback policy.
pub fn get_strategy(propfirm: &str) -> &'static dyn PropfirmStrategy {
    strategy_for(PropfirmId::from_str(propfirm))
}
