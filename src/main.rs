//! Prop Firm Account Tracker
//!
//! Tracks evaluation and funded prop firm accounts: daily PnL, withdrawals,
//! imported trades, and the statistics each firm's rules imply.

mod config;
mod db;
mod import;
mod metrics;
mod models;
mod propfirm;

use std::fs::File;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::config::TrackerConfig;
use crate::db::Database;
use crate::import::TradeImporter;
use crate::metrics::{
    get_net_withdrawal_amount, AccountStatsCalculator, RuleProgressCalculator,
    TradingStatsCalculator,
};
use crate::models::{Account, AccountStatus, AccountType, PnlEntry, PropfirmId, Withdrawal};
use crate::propfirm::{get_strategy, strategy_for};

/// Prop firm account tracker CLI.
#[derive(Parser)]
#[command(name = "propfirm-tracker")]
#[command(about = "Track prop firm accounts, payouts and trading statistics", long_about = None)]
struct Cli {
    /// Database file path
    #[arg(
        short,
        long,
        env = "TRACKER_DATABASE_URL",
        default_value = "sqlite:./propfirm_tracker.db?mode=rwc"
    )]
    database: String,

    /// User owning the accounts
    #[arg(short, long, env = "TRACKER_USER", default_value = "local")]
    user: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "TRACKER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage accounts
    Account {
        #[command(subcommand)]
        action: AccountCommand,
    },

    /// Record daily PnL
    Pnl {
        #[command(subcommand)]
        action: PnlCommand,
    },

    /// Record payouts
    Withdraw {
        #[command(subcommand)]
        action: WithdrawCommand,
    },

    /// Import trades and show trading statistics
    Trades {
        #[command(subcommand)]
        action: TradesCommand,
    },

    /// Show a firm's rules for an account size
    Rules {
        /// Firm name (topstep, tpt, apex, bulenox, phidias, ...)
        #[arg(short, long)]
        propfirm: String,

        /// Account size in USD
        #[arg(short, long)]
        size: Decimal,

        #[arg(long)]
        json: bool,
    },

    /// Overview of all active accounts
    Summary {
        #[arg(long)]
        json: bool,
    },

    /// Show current configuration
    Config,
}

#[derive(Subcommand)]
enum AccountCommand {
    /// Create an account
    Add {
        name: String,

        #[arg(short, long)]
        propfirm: String,

        /// Account size in USD
        #[arg(short, long)]
        size: Decimal,

        /// evaluation or funded
        #[arg(short = 't', long = "type", default_value = "evaluation")]
        account_type: String,

        /// Price paid for the account
        #[arg(long, default_value = "0")]
        price: Decimal,

        /// Evaluation this funded account came from
        #[arg(long)]
        linked_eval: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List accounts
    List {
        /// Include archived accounts
        #[arg(long)]
        all: bool,
    },

    /// Show an account with its rule progress
    Show { id: String },

    /// Show account statistics
    Stats {
        id: String,

        #[arg(long)]
        json: bool,
    },

    /// Mark an evaluation as passed
    Validate {
        id: String,

        /// Validate even if the rules are not met
        #[arg(long)]
        force: bool,
    },

    /// Mark an account as failed
    Fail { id: String },

    /// Archive an account
    Archive { id: String },

    /// Delete an account and everything recorded on it
    Delete { id: String },
}

#[derive(Subcommand)]
enum PnlCommand {
    /// Record the PnL of a trading day
    Add {
        account: String,

        #[arg(allow_hyphen_values = true)]
        amount: Decimal,

        /// Trading day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Change the date, amount or notes of an entry
    Edit {
        account: String,

        id: String,

        #[arg(long, allow_hyphen_values = true)]
        amount: Option<Decimal>,

        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        notes: Option<String>,
    },

    List { account: String },

    Delete { id: String },
}

#[derive(Subcommand)]
enum WithdrawCommand {
    /// Record a payout
    Add {
        account: String,

        amount: Decimal,

        /// Payout date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        notes: Option<String>,
    },

    List { account: String },

    Delete { id: String },
}

#[derive(Subcommand)]
enum TradesCommand {
    /// Import a CSV trade export into an account
    Import {
        account: String,

        file: PathBuf,

        /// Platform the export came from
        #[arg(long)]
        platform: Option<String>,
    },

    /// Trading statistics for one account or all accounts
    Stats {
        #[arg(long)]
        account: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Win rate and PnL by holding time
    Durations {
        #[arg(long)]
        account: Option<String>,

        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = TrackerConfig {
        database_url: cli.database,
        user_id: cli.user,
        log_level: cli.log_level,
        ..TrackerConfig::default()
    };

    // Setup logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.level())
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Commands::Config = cli.command {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }
    if let Commands::Rules { propfirm, size, json } = &cli.command {
        return show_rules(propfirm, *size, *json);
    }

    let db = Database::new(&config.database_url).await?;
    let user = config.user_id.as_str();

    match cli.command {
        Commands::Account { action } => run_account(&db, user, action).await?,
        Commands::Pnl { action } => run_pnl(&db, user, action).await?,
        Commands::Withdraw { action } => run_withdraw(&db, user, action).await?,
        Commands::Trades { action } => run_trades(&db, &config, action).await?,
        Commands::Summary { json } => show_summary(&db, user, json).await?,
        Commands::Config | Commands::Rules { .. } => {}
    }

    Ok(())
}

async fn run_account(db: &Database, user: &str, action: AccountCommand) -> Result<()> {
    match action {
        AccountCommand::Add {
            name,
            propfirm,
            size,
            account_type,
            price,
            linked_eval,
            notes,
        } => {
            if size <= Decimal::ZERO {
                bail!("Account size must be positive");
            }
            let account_type = AccountType::from_str(&account_type)
                .with_context(|| format!("Unknown account type: {}", account_type))?;
            let firm = PropfirmId::from_str(&propfirm);
            if firm == PropfirmId::Other {
                warn!(propfirm = %propfirm, "Unknown firm, using generic rules");
            }

            let mut account = Account::new(user, name, firm, size, account_type, price);
            account.linked_evaluation_id = linked_eval;
            account.notes = notes.unwrap_or_default();
            db.insert_account(&account).await?;

            println!(
                "Created {} account {} ({})",
                account.account_type.as_str(),
                account.id,
                account.name
            );
        }

        AccountCommand::List { all } => {
            let accounts = db.list_accounts(user, all).await?;
            if accounts.is_empty() {
                println!("No accounts yet. Use 'propfirm-tracker account add' to create one.");
                return Ok(());
            }

            println!(
                "\n{:<36} {:<20} {:<18} {:>10} {:<10} {:<10}",
                "ID", "NAME", "FIRM", "SIZE", "TYPE", "STATUS"
            );
            println!("{}", "-".repeat(109));
            for a in accounts {
                println!(
                    "{:<36} {:<20} {:<18} {:>10} {:<10} {:<10}",
                    a.id,
                    truncate(&a.name, 18),
                    a.propfirm.as_str(),
                    a.size,
                    a.account_type.as_str(),
                    a.status.as_str()
                );
            }
        }

        AccountCommand::Show { id } => {
            let ledger = db.load_ledger(user, &id).await?;
            let a = &ledger.account;
            let progress = RuleProgressCalculator::evaluate(&ledger);

            println!("\n=== Account: {} ===", a.name);
            println!("ID:       {}", a.id);
            println!("Firm:     {}", a.propfirm);
            println!("Size:     ${}", a.size);
            println!("Type:     {}", a.account_type.as_str());
            println!("Status:   {}", a.status.as_str());
            println!("Paid:     ${:.2}", a.price_paid);
            if let Some(eval) = &ledger.linked_evaluation {
                println!("From:     {} ({})", eval.name, eval.id);
            }
            if !a.notes.is_empty() {
                println!("Notes:    {}", a.notes);
            }

            println!("\n--- Rules ---");
            println!(
                "Profit Target:  ${:.2} / ${:.2} ({:.1}%)",
                ledger.total_pnl(),
                progress.profit_target,
                progress.profit_target_progress
            );
            println!(
                "Max Drawdown:   ${:.2} / ${:.2}{}",
                progress.max_drawdown_reached,
                progress.max_drawdown,
                if progress.drawdown_breached { "  BREACHED" } else { "" }
            );
            println!(
                "Daily Loss:     worst ${:.2} / limit ${:.2} ({} breaches)",
                progress.worst_day, progress.daily_loss_limit, progress.daily_loss_breaches
            );
            println!(
                "Consistency:    best day {:.1}% / max {}%{}",
                progress.best_day_share,
                progress.consistency_rule,
                if progress.consistency_ok { "" } else { "  OVER" }
            );
            match progress.min_trading_days {
                Some(min) => println!("Trading Days:   {} / {}", progress.profitable_days, min),
                None => println!("Trading Days:   {}", progress.profitable_days),
            }
            if a.is_evaluation() {
                println!(
                    "Eligible:       {}",
                    if progress.eligible_for_validation { "Yes" } else { "No" }
                );
            }
        }

        AccountCommand::Stats { id, json } => {
            let ledger = db.load_ledger(user, &id).await?;
            let stats = AccountStatsCalculator::calculate_stats(&ledger);

            if json {
                return print_json(&stats);
            }

            println!("\n=== Stats: {} ===", ledger.account.name);
            println!("Total P&L:         ${:.2}", stats.total_pnl);
            println!(
                "Withdrawals:       ${:.2} (net ${:.2})",
                stats.total_withdrawals, stats.total_net_withdrawals
            );
            println!("Balance:           ${:.2}", stats.current_balance);
            println!("Invested:          ${:.2}", stats.total_invested);
            println!("Net Profit:        ${:.2}", stats.net_profit);
            println!("ROI:               {:.1}%", stats.roi);
            if let Some(buffer) = stats.buffer {
                println!("Buffer:            ${:.2}", buffer);
            }
            if let Some(available) = stats.available_for_withdrawal {
                println!("Withdrawable:      ${:.2}", available);
            }
        }

        AccountCommand::Validate { id, force } => {
            let ledger = db.load_ledger(user, &id).await?;
            if !ledger.account.is_evaluation() {
                bail!("Only evaluation accounts can be validated");
            }
            if !AccountStatsCalculator::is_eligible_for_validation(&ledger) {
                if !force {
                    bail!(
                        "Account {} does not meet its firm's rules yet (use --force to override)",
                        id
                    );
                }
                warn!(account = %id, "Validating account that does not meet the rules");
            }
            db.update_account_status(user, &id, AccountStatus::Validated).await?;
            println!("Validated: {}", id);
        }

        AccountCommand::Fail { id } => {
            db.update_account_status(user, &id, AccountStatus::Failed).await?;
            println!("Failed: {}", id);
        }

        AccountCommand::Archive { id } => {
            db.update_account_status(user, &id, AccountStatus::Archived).await?;
            println!("Archived: {}", id);
        }

        AccountCommand::Delete { id } => {
            if db.delete_account(user, &id).await? {
                println!("Deleted: {}", id);
            } else {
                println!("Account not found: {}", id);
            }
        }
    }

    Ok(())
}

async fn run_pnl(db: &Database, user: &str, action: PnlCommand) -> Result<()> {
    match action {
        PnlCommand::Add { account, amount, date, notes } => {
            let mut entry = PnlEntry::new(account, date.unwrap_or_else(today), amount);
            entry.notes = notes.unwrap_or_default();
            db.add_pnl_entry(user, &entry).await?;
            println!("Recorded ${:.2} on {} ({})", entry.amount, entry.date, entry.id);
        }

        PnlCommand::Edit { account, id, amount, date, notes } => {
            let mut entry = db
                .list_pnl_entries(user, &account)
                .await?
                .into_iter()
                .find(|e| e.id == id)
                .with_context(|| format!("Entry {} not found on account {}", id, account))?;

            if let Some(amount) = amount {
                entry.amount = amount;
            }
            if let Some(date) = date {
                entry.date = date;
            }
            if let Some(notes) = notes {
                entry.notes = notes;
            }

            db.update_pnl_entry(user, &entry).await?;
            println!("Updated {}: ${:.2} on {}", entry.id, entry.amount, entry.date);
        }

        PnlCommand::List { account } => {
            let entries = db.list_pnl_entries(user, &account).await?;
            println!("\n{:<36} {:<10} {:>12}  {}", "ID", "DATE", "P&L", "NOTES");
            println!("{}", "-".repeat(80));
            let mut running = Decimal::ZERO;
            for e in &entries {
                running += e.amount;
                println!(
                    "{:<36} {:<10} {:>12.2}  {}",
                    e.id,
                    e.date,
                    e.amount,
                    truncate(&e.notes, 30)
                );
            }
            println!("{}", "-".repeat(80));
            println!("{:<47} {:>12.2}", "TOTAL", running);
        }

        PnlCommand::Delete { id } => {
            if db.delete_pnl_entry(user, &id).await? {
                println!("Deleted: {}", id);
            } else {
                println!("Entry not found: {}", id);
            }
        }
    }

    Ok(())
}

async fn run_withdraw(db: &Database, user: &str, action: WithdrawCommand) -> Result<()> {
    match action {
        WithdrawCommand::Add { account, amount, date, notes } => {
            let ledger = db.load_ledger(user, &account).await?;
            let strategy = strategy_for(ledger.account.propfirm);
            let available = strategy.calculate_available_for_withdrawal(
                ledger.account.size,
                ledger.total_pnl(),
                ledger.total_withdrawals(),
                &ledger.pnl_entries,
            );
            if amount > available {
                warn!(
                    account = %account,
                    amount = %amount,
                    available = %available,
                    "Withdrawal exceeds available amount"
                );
            }

            let mut withdrawal = Withdrawal::new(account, date.unwrap_or_else(today), amount);
            withdrawal.notes = notes.unwrap_or_default();
            db.add_withdrawal(user, &withdrawal).await?;

            let net = get_net_withdrawal_amount(&withdrawal, ledger.account.propfirm);
            println!(
                "Recorded payout ${:.2} (net ${:.2}) on {}",
                withdrawal.amount, net, withdrawal.date
            );
        }

        WithdrawCommand::List { account } => {
            let acct = db.require_account(user, &account).await?;
            let withdrawals = db.list_withdrawals(user, &account).await?;
            println!("\n{:<36} {:<10} {:>12} {:>12}", "ID", "DATE", "GROSS", "NET");
            println!("{}", "-".repeat(73));
            for w in &withdrawals {
                println!(
                    "{:<36} {:<10} {:>12.2} {:>12.2}",
                    w.id,
                    w.date,
                    w.amount,
                    get_net_withdrawal_amount(w, acct.propfirm)
                );
            }
        }

        WithdrawCommand::Delete { id } => {
            if db.delete_withdrawal(user, &id).await? {
                println!("Deleted: {}", id);
            } else {
                println!("Withdrawal not found: {}", id);
            }
        }
    }

    Ok(())
}

async fn run_trades(db: &Database, config: &TrackerConfig, action: TradesCommand) -> Result<()> {
    let user = config.user_id.as_str();

    match action {
        TradesCommand::Import { account, file, platform } => {
            let platform = platform.unwrap_or_else(|| config.default_platform.clone());
            let reader = File::open(&file)
                .with_context(|| format!("Failed to open {}", file.display()))?;
            let trades = TradeImporter::from_reader(platform, account.clone(), reader)?;

            info!(file = %file.display(), trades = trades.len(), "Importing trades");
            let inserted = db.insert_trades(user, &account, &trades).await?;
            println!(
                "Imported {} trades ({} already present)",
                inserted,
                trades.len() as u64 - inserted
            );
        }

        TradesCommand::Stats { account, json } => {
            let trades = db.list_trades(user, account.as_deref()).await?;
            let stats = TradingStatsCalculator::calculate(&trades);

            if json {
                return print_json(&stats);
            }

            println!("\n=== Trading Stats ===");
            println!("Total Trades:   {}", stats.total_trades);
            println!("Trade Win %:    {:.1}%", stats.trade_win_percent);
            println!("Day Win %:      {:.1}%", stats.day_win_percent);
            println!("Profit Factor:  {:.2}", stats.profit_factor);
            println!("Total Lots:     {}", stats.total_lots);
            println!("Avg Duration:   {:.0}s", stats.average_trade_duration);
        }

        TradesCommand::Durations { account, json } => {
            let trades = db.list_trades(user, account.as_deref()).await?;
            let buckets = TradingStatsCalculator::duration_buckets(&trades);

            if json {
                return print_json(&buckets);
            }

            println!("\n{:<10} {:>8} {:>8} {:>12}", "DURATION", "TRADES", "WIN%", "NET P&L");
            println!("{}", "-".repeat(41));
            for b in buckets.iter().filter(|b| b.trade_count > 0) {
                println!(
                    "{:<10} {:>8} {:>7.1}% {:>12.2}",
                    b.label, b.trade_count, b.win_rate, b.net_pnl
                );
            }
        }
    }

    Ok(())
}

fn show_rules(propfirm: &str, size: Decimal, json: bool) -> Result<()> {
    let strategy = get_strategy(propfirm);
    if strategy.propfirm() == PropfirmId::Other && !json {
        let known: Vec<&str> = PropfirmId::ALL
            .iter()
            .filter(|id| **id != PropfirmId::Other)
            .map(|id| id.as_str())
            .collect();
        println!(
            "Unknown firm {:?}, showing generic rules (known: {})",
            propfirm,
            known.join(", ")
        );
    }
    let rules = strategy.get_account_rules(size);
    let withdrawal = strategy.get_withdrawal_rules();

    if json {
        return print_json(&serde_json::json!({
            "propfirm": strategy.propfirm(),
            "accountRules": rules,
            "withdrawalRules": withdrawal,
            "buffer": strategy.calculate_buffer(size),
        }));
    }

    println!("\n=== {} ${} ===", strategy.propfirm(), size);
    println!("Profit Target:      ${}", rules.profit_target);
    println!("Max Drawdown:       ${}", rules.max_drawdown);
    println!("Daily Loss Limit:   ${}", rules.daily_loss_limit);
    println!("Consistency:        {}%", rules.consistency_rule);
    if let Some(days) = rules.min_trading_days {
        println!("Min Trading Days:   {}", days);
    }
    if let Some(limits) = &rules.max_contracts {
        for limit in limits {
            println!("Max Contracts:      {} (${})", limit.contracts, limit.size);
        }
    }

    println!("\nPayouts:");
    println!("  Profit Split Fee: {}%", withdrawal.tax_rate * Decimal::ONE_HUNDRED);
    let buffer = strategy.calculate_buffer(size);
    if buffer > Decimal::ZERO {
        println!("  Buffer:           ${}", buffer);
    }
    if let Some(cycle) = withdrawal.cycle_requirement {
        println!(
            "  Cycle:            {} days of ${}+, then {}% withdrawable",
            cycle.days_per_cycle, cycle.min_daily_profit, cycle.withdrawal_percentage
        );
    }

    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryRow {
    account: Account,
    stats: crate::models::AccountStatistics,
}

async fn show_summary(db: &Database, user: &str, json: bool) -> Result<()> {
    let accounts = db.list_accounts(user, false).await?;

    let mut rows = Vec::with_capacity(accounts.len());
    for account in accounts {
        let ledger = db.load_ledger(user, &account.id).await?;
        let stats = AccountStatsCalculator::calculate_stats(&ledger);
        rows.push(SummaryRow { account, stats });
    }

    if json {
        return print_json(&rows);
    }

    if rows.is_empty() {
        println!("No active accounts.");
        return Ok(());
    }

    println!(
        "\n{:<20} {:<18} {:<10} {:>12} {:>12} {:>8}",
        "NAME", "FIRM", "TYPE", "BALANCE", "NET PROFIT", "ROI"
    );
    println!("{}", "-".repeat(85));

    let mut invested = Decimal::ZERO;
    let mut withdrawn = Decimal::ZERO;
    for row in &rows {
        invested += row.account.price_paid;
        withdrawn += row.stats.total_net_withdrawals;
        println!(
            "{:<20} {:<18} {:<10} {:>12.2} {:>12.2} {:>7.1}%",
            truncate(&row.account.name, 18),
            row.account.propfirm.as_str(),
            row.account.account_type.as_str(),
            row.stats.current_balance,
            row.stats.net_profit,
            row.stats.roi
        );
    }

    println!("{}", "-".repeat(85));
    println!("Accounts:        {}", rows.len());
    println!("Paid for:        ${:.2}", invested);
    println!("Net payouts:     ${:.2}", withdrawn);
    println!("Cash result:     ${:.2}", withdrawn - invested);

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Truncate a string with ellipsis if too long.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
