//! Database persistence for accounts, PnL entries, withdrawals and trades.
//!
//! Every read is scoped to the owning user. Money is stored as decimal text
//! so amounts round-trip exactly.

use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tracing::{debug, info};

use crate::models::{
    Account, AccountLedger, AccountStatus, AccountType, PnlEntry, PropfirmId, Trade, TradeSide,
    Withdrawal,
};

/// Database connection pool.
pub struct Database {
    pool: SqlitePool,
}

/// Stored account record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredAccount {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub propfirm: String,
    pub size: String,
    pub account_type: String,
    pub status: String,
    pub price_paid: String,
    pub linked_evaluation_id: Option<String>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Stored PnL entry or withdrawal; both tables share this shape.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredAmount {
    pub id: String,
    pub account_id: String,
    pub date: NaiveDate,
    pub amount: String,
    pub notes: String,
}

/// Stored trade record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredTrade {
    pub id: String,
    pub account_id: String,
    pub platform: String,
    pub external_id: String,
    pub contract_name: String,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: String,
    pub exit_price: String,
    pub size: String,
    pub side: String,
    pub pnl: String,
    pub fees: String,
    pub commissions: Option<String>,
    pub trading_day: NaiveDate,
    pub duration_secs: i64,
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal> {
    Decimal::from_str(value).with_context(|| format!("Invalid decimal in {}: {:?}", field, value))
}

impl TryFrom<StoredAccount> for Account {
    type Error = anyhow::Error;

    fn try_from(row: StoredAccount) -> Result<Self> {
        Ok(Account {
            size: parse_decimal("accounts.size", &row.size)?,
            price_paid: parse_decimal("accounts.price_paid", &row.price_paid)?,
            propfirm: PropfirmId::from_str(&row.propfirm),
            account_type: AccountType::from_str(&row.account_type)
                .ok_or_else(|| anyhow!("Invalid account type: {}", row.account_type))?,
            status: AccountStatus::from_str(&row.status)
                .ok_or_else(|| anyhow!("Invalid account status: {}", row.status))?,
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            linked_evaluation_id: row.linked_evaluation_id,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<StoredAmount> for PnlEntry {
    type Error = anyhow::Error;

    fn try_from(row: StoredAmount) -> Result<Self> {
        Ok(PnlEntry {
            amount: parse_decimal("pnl_entries.amount", &row.amount)?,
            id: row.id,
            account_id: row.account_id,
            date: row.date,
            notes: row.notes,
        })
    }
}

impl TryFrom<StoredAmount> for Withdrawal {
    type Error = anyhow::Error;

    fn try_from(row: StoredAmount) -> Result<Self> {
        Ok(Withdrawal {
            amount: parse_decimal("withdrawals.amount", &row.amount)?,
            id: row.id,
            account_id: row.account_id,
            date: row.date,
            notes: row.notes,
        })
    }
}

impl TryFrom<StoredTrade> for Trade {
    type Error = anyhow::Error;

    fn try_from(row: StoredTrade) -> Result<Self> {
        Ok(Trade {
            entry_price: parse_decimal("trades.entry_price", &row.entry_price)?,
            exit_price: parse_decimal("trades.exit_price", &row.exit_price)?,
            size: parse_decimal("trades.size", &row.size)?,
            side: TradeSide::from_str(&row.side)
                .ok_or_else(|| anyhow!("Invalid trade side: {}", row.side))?,
            pnl: parse_decimal("trades.pnl", &row.pnl)?,
            fees: parse_decimal("trades.fees", &row.fees)?,
            commissions: row
                .commissions
                .as_deref()
                .map(|c| parse_decimal("trades.commissions", c))
                .transpose()?,
            id: row.id,
            account_id: row.account_id,
            platform: row.platform,
            external_id: row.external_id,
            contract_name: row.contract_name,
            entry_time: row.entry_time,
            exit_time: row.exit_time,
            trading_day: row.trading_day,
            duration_secs: row.duration_secs,
        })
    }
}

fn convert_all<S, T>(rows: Vec<S>) -> Result<Vec<T>>
where
    T: TryFrom<S, Error = anyhow::Error>,
{
    rows.into_iter().map(T::try_from).collect()
}

impl Database {
    /// Create a new database connection.
    pub async fn new(database_url: &str) -> Result<Self> {
        // Each connection to an in-memory database is its own database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database url: {}", database_url))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run all database migrations.
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                propfirm TEXT NOT NULL,
                size TEXT NOT NULL,
                account_type TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                price_paid TEXT NOT NULL DEFAULT '0',
                linked_evaluation_id TEXT,
                notes TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pnl_entries (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                date TEXT NOT NULL,
                amount TEXT NOT NULL,
                notes TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS withdrawals (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                date TEXT NOT NULL,
                amount TEXT NOT NULL,
                notes TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trades (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                platform TEXT NOT NULL,
                external_id TEXT NOT NULL,
                contract_name TEXT NOT NULL,
                entry_time TEXT NOT NULL,
                exit_time TEXT NOT NULL,
                entry_price TEXT NOT NULL,
                exit_price TEXT NOT NULL,
                size TEXT NOT NULL,
                side TEXT NOT NULL,
                pnl TEXT NOT NULL,
                fees TEXT NOT NULL DEFAULT '0',
                commissions TEXT,
                trading_day TEXT NOT NULL,
                duration_secs INTEGER NOT NULL DEFAULT 0,
                imported_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(account_id, platform, external_id),
                FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Indexes
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_accounts_user ON accounts(user_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_pnl_entries_account ON pnl_entries(account_id, date)",
        )
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_withdrawals_account ON withdrawals(account_id, date)",
        )
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_trades_account_day ON trades(account_id, trading_day)",
        )
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ==================== Accounts ====================

    /// Save a new account.
    pub async fn insert_account(&self, account: &Account) -> Result<()> {
        if let Some(eval_id) = &account.linked_evaluation_id {
            let eval = self
                .require_account(&account.user_id, eval_id)
                .await
                .context("Linked evaluation not found")?;
            if !eval.is_evaluation() {
                bail!("Linked account {} is not an evaluation", eval_id);
            }
        }

        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, user_id, name, propfirm, size, account_type, status,
                price_paid, linked_evaluation_id, notes, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.id)
        .bind(&account.user_id)
        .bind(&account.name)
        .bind(account.propfirm.as_str())
        .bind(account.size.to_string())
        .bind(account.account_type.as_str())
        .bind(account.status.as_str())
        .bind(account.price_paid.to_string())
        .bind(&account.linked_evaluation_id)
        .bind(&account.notes)
        .bind(account.created_at)
        .execute(&self.pool)
        .await?;

        info!(account = %account.id, propfirm = %account.propfirm, "Account created");
        Ok(())
    }

    /// Get one of the user's accounts.
    pub async fn get_account(&self, user_id: &str, account_id: &str) -> Result<Option<Account>> {
        sqlx::query_as::<_, StoredAccount>(
            "SELECT id, user_id, name, propfirm, size, account_type, status, price_paid, \
             linked_evaluation_id, notes, created_at FROM accounts WHERE user_id = ? AND id = ?",
        )
        .bind(user_id)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Account::try_from)
        .transpose()
    }

    /// Get one of the user's accounts or fail.
    pub async fn require_account(&self, user_id: &str, account_id: &str) -> Result<Account> {
        self.get_account(user_id, account_id)
            .await?
            .ok_or_else(|| anyhow!("Account not found: {}", account_id))
    }

    /// List the user's accounts, oldest first.
    pub async fn list_accounts(
        &self,
        user_id: &str,
        include_archived: bool,
    ) -> Result<Vec<Account>> {
        let rows = sqlx::query_as::<_, StoredAccount>(
            "SELECT id, user_id, name, propfirm, size, account_type, status, price_paid, \
             linked_evaluation_id, notes, created_at FROM accounts \
             WHERE user_id = ? AND (? OR status != 'archived') ORDER BY created_at",
        )
        .bind(user_id)
        .bind(include_archived)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch accounts")?;

        convert_all(rows)
    }

    /// Move an account to a new lifecycle status.
    pub async fn update_account_status(
        &self,
        user_id: &str,
        account_id: &str,
        status: AccountStatus,
    ) -> Result<Account> {
        let mut account = self.require_account(user_id, account_id).await?;

        if !account.status.can_transition_to(status) {
            bail!(
                "Cannot move account {} from {} to {}",
                account_id,
                account.status.as_str(),
                status.as_str()
            );
        }

        sqlx::query(
            "UPDATE accounts SET status = ?, updated_at = datetime('now') \
             WHERE user_id = ? AND id = ?",
        )
        .bind(status.as_str())
        .bind(user_id)
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        info!(
            account = %account_id,
            from = account.status.as_str(),
            to = status.as_str(),
            "Account status changed"
        );
        account.status = status;
        Ok(account)
    }

    /// Delete an account with its entries, withdrawals and trades.
    pub async fn delete_account(&self, user_id: &str, account_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let owned: Option<(String,)> =
            sqlx::query_as("SELECT id FROM accounts WHERE user_id = ? AND id = ?")
                .bind(user_id)
                .bind(account_id)
                .fetch_optional(&mut *tx)
                .await?;
        if owned.is_none() {
            return Ok(false);
        }

        for sql in [
            "DELETE FROM pnl_entries WHERE account_id = ?",
            "DELETE FROM withdrawals WHERE account_id = ?",
            "DELETE FROM trades WHERE account_id = ?",
        ] {
            sqlx::query(sql)
                .bind(account_id)
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query(
            "UPDATE accounts SET linked_evaluation_id = NULL WHERE linked_evaluation_id = ?",
        )
            .bind(account_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(account_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(account = %account_id, "Account deleted");
        Ok(true)
    }

    // ==================== PnL Entries ====================

    /// Record a PnL entry on one of the user's accounts.
    pub async fn add_pnl_entry(&self, user_id: &str, entry: &PnlEntry) -> Result<()> {
        self.require_account(user_id, &entry.account_id).await?;

        sqlx::query(
            "INSERT INTO pnl_entries (id, account_id, date, amount, notes) VALUES (?, ?, ?, ?, ?)",
        )
            .bind(&entry.id)
            .bind(&entry.account_id)
            .bind(entry.date)
            .bind(entry.amount.to_string())
            .bind(&entry.notes)
            .execute(&self.pool)
            .await?;

        debug!(
            account = %entry.account_id,
            date = %entry.date,
            amount = %entry.amount,
            "PnL entry added"
        );
        Ok(())
    }

    /// Edit date, amount and notes of an entry. Returns false if not found.
    pub async fn update_pnl_entry(&self, user_id: &str, entry: &PnlEntry) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE pnl_entries SET date = ?, amount = ?, notes = ?
            WHERE id = ? AND account_id IN (SELECT id FROM accounts WHERE user_id = ?)
            "#,
        )
        .bind(entry.date)
        .bind(entry.amount.to_string())
        .bind(&entry.notes)
        .bind(&entry.id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_pnl_entry(&self, user_id: &str, entry_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM pnl_entries \
             WHERE id = ? AND account_id IN (SELECT id FROM accounts WHERE user_id = ?)",
        )
        .bind(entry_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// PnL entries of an account, by date.
    pub async fn list_pnl_entries(&self, user_id: &str, account_id: &str) -> Result<Vec<PnlEntry>> {
        let rows = sqlx::query_as::<_, StoredAmount>(
            r#"
            SELECT e.id, e.account_id, e.date, e.amount, e.notes FROM pnl_entries e
            JOIN accounts a ON a.id = e.account_id
            WHERE a.user_id = ? AND e.account_id = ?
            ORDER BY e.date, e.created_at
            "#,
        )
        .bind(user_id)
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch PnL entries")?;

        convert_all(rows)
    }

    // ==================== Withdrawals ====================

    /// Record a withdrawal on one of the user's accounts.
    pub async fn add_withdrawal(&self, user_id: &str, withdrawal: &Withdrawal) -> Result<()> {
        if withdrawal.amount < Decimal::ZERO {
            bail!("Withdrawal amount cannot be negative: {}", withdrawal.amount);
        }
        self.require_account(user_id, &withdrawal.account_id).await?;

        sqlx::query(
            "INSERT INTO withdrawals (id, account_id, date, amount, notes) VALUES (?, ?, ?, ?, ?)",
        )
            .bind(&withdrawal.id)
            .bind(&withdrawal.account_id)
            .bind(withdrawal.date)
            .bind(withdrawal.amount.to_string())
            .bind(&withdrawal.notes)
            .execute(&self.pool)
            .await?;

        info!(account = %withdrawal.account_id, amount = %withdrawal.amount, "Withdrawal recorded");
        Ok(())
    }

    pub async fn delete_withdrawal(&self, user_id: &str, withdrawal_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM withdrawals \
             WHERE id = ? AND account_id IN (SELECT id FROM accounts WHERE user_id = ?)",
        )
        .bind(withdrawal_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Withdrawals of an account, by date.
    pub async fn list_withdrawals(
        &self,
        user_id: &str,
        account_id: &str,
    ) -> Result<Vec<Withdrawal>> {
        let rows = sqlx::query_as::<_, StoredAmount>(
            r#"
            SELECT w.id, w.account_id, w.date, w.amount, w.notes FROM withdrawals w
            JOIN accounts a ON a.id = w.account_id
            WHERE a.user_id = ? AND w.account_id = ?
            ORDER BY w.date, w.created_at
            "#,
        )
        .bind(user_id)
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch withdrawals")?;

        convert_all(rows)
    }

    // ==================== Trades ====================

    /// Insert imported trades. Trades already imported for the same account
    /// and platform are skipped. Returns how many were inserted.
    pub async fn insert_trades(
        &self,
        user_id: &str,
        account_id: &str,
        trades: &[Trade],
    ) -> Result<u64> {
        self.require_account(user_id, account_id).await?;

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for trade in trades {
            if trade.account_id != account_id {
                bail!(
                    "Trade {} belongs to account {}, not {}",
                    trade.external_id,
                    trade.account_id,
                    account_id
                );
            }

            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO trades (
                    id, account_id, platform, external_id, contract_name,
                    entry_time, exit_time, entry_price, exit_price, size, side,
                    pnl, fees, commissions, trading_day, duration_secs
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&trade.id)
            .bind(&trade.account_id)
            .bind(&trade.platform)
            .bind(&trade.external_id)
            .bind(&trade.contract_name)
            .bind(trade.entry_time)
            .bind(trade.exit_time)
            .bind(trade.entry_price.to_string())
            .bind(trade.exit_price.to_string())
            .bind(trade.size.to_string())
            .bind(trade.side.as_str())
            .bind(trade.pnl.to_string())
            .bind(trade.fees.to_string())
            .bind(trade.commissions.map(|c| c.to_string()))
            .bind(trade.trading_day)
            .bind(trade.duration_secs)
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected();
        }

        tx.commit().await?;

        info!(
            account = %account_id,
            received = trades.len(),
            inserted,
            "Trades imported"
        );
        Ok(inserted)
    }

    /// Trades for one account, or for all of the user's accounts.
    pub async fn list_trades(&self, user_id: &str, account_id: Option<&str>) -> Result<Vec<Trade>> {
        let rows = sqlx::query_as::<_, StoredTrade>(
            r#"
            SELECT t.id, t.account_id, t.platform, t.external_id, t.contract_name,
                   t.entry_time, t.exit_time, t.entry_price, t.exit_price, t.size, t.side,
                   t.pnl, t.fees, t.commissions, t.trading_day, t.duration_secs
            FROM trades t
            JOIN accounts a ON a.id = t.account_id
            WHERE a.user_id = ? AND (? IS NULL OR t.account_id = ?)
            ORDER BY t.entry_time
            "#,
        )
        .bind(user_id)
        .bind(account_id)
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch trades")?;

        convert_all(rows)
    }

    // ==================== Ledger ====================

    /// Load an account with everything the aggregators need.
    pub async fn load_ledger(&self, user_id: &str, account_id: &str) -> Result<AccountLedger> {
        let account = self.require_account(user_id, account_id).await?;

        let linked_evaluation = match &account.linked_evaluation_id {
            Some(eval_id) => self.get_account(user_id, eval_id).await?,
            None => None,
        };

        let mut ledger = AccountLedger::new(account);
        ledger.linked_evaluation = linked_evaluation;
        ledger.pnl_entries = self.list_pnl_entries(user_id, account_id).await?;
        ledger.withdrawals = self.list_withdrawals(user_id, account_id).await?;
        Ok(ledger)
    }

    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
