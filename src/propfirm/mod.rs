//! Prop firm rules engine: rule tables, per-firm strategies and the selector.

pub mod rules;
mod selector;
pub mod strategy;

pub use selector::{get_strategy, strategy_for};
