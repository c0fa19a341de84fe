//! Prop firm account model and its lifecycle.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::entries::{PnlEntry, Withdrawal};
use super::propfirm::PropfirmId;

/// Evaluation (challenge) or funded account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Evaluation,
    Funded,
}

impl AccountType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "evaluation" | "eval" | "challenge" => Some(Self::Evaluation),
            "funded" | "pa" => Some(Self::Funded),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Evaluation => "evaluation",
            Self::Funded => "funded",
        }
    }
}

/// Account lifecycle: `active -> validated | failed -> archived`.
///
/// Any non-archived account may be archived directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Validated,
    Failed,
    Archived,
}

impl AccountStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "validated" => Some(Self::Validated),
            "failed" => Some(Self::Failed),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Validated => "validated",
            Self::Failed => "failed",
            Self::Archived => "archived",
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: AccountStatus) -> bool {
        use AccountStatus::*;
        matches!(
            (self, next),
            (Active, Validated) | (Active, Failed) | (Active, Archived)
                | (Validated, Archived)
                | (Failed, Archived)
        )
    }
}

/// A prop firm account owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,

    /// Owning user
    pub user_id: String,

    /// Display name chosen by the user
    pub name: String,

    pub propfirm: PropfirmId,

    /// Nominal account size (e.g. 50000)
    pub size: Decimal,

    pub account_type: AccountType,

    #[serde(default)]
    pub status: AccountStatus,

    /// What the user paid for this account (evaluation fee or activation fee)
    pub price_paid: Decimal,

    /// Evaluation this funded account came from, counted in invested capital
    pub linked_evaluation_id: Option<String>,

    #[serde(default)]
    pub notes: String,

    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new active account with a fresh id.
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        propfirm: PropfirmId,
        size: Decimal,
        account_type: AccountType,
        price_paid: Decimal,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            name: name.into(),
            propfirm,
            size,
            account_type,
            status: AccountStatus::Active,
            price_paid,
            linked_evaluation_id: None,
            notes: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_evaluation(&self) -> bool {
        self.account_type == AccountType::Evaluation
    }

    pub fn is_funded(&self) -> bool {
        self.account_type == AccountType::Funded
    }
}

/// Everything the aggregators need about one account, already loaded.
#[derive(Debug, Clone)]
pub struct AccountLedger {
    pub account: Account,

    /// Prior evaluation account, when `account.linked_evaluation_id` is set
    pub linked_evaluation: Option<Account>,

    pub pnl_entries: Vec<PnlEntry>,

    pub withdrawals: Vec<Withdrawal>,
}

impl AccountLedger {
    pub fn new(account: Account) -> Self {
        Self {
            account,
            linked_evaluation: None,
            pnl_entries: Vec::new(),
            withdrawals: Vec::new(),
        }
    }

    pub fn total_pnl(&self) -> Decimal {
        self.pnl_entries.iter().map(|e| e.amount).sum()
    }

    pub fn total_withdrawals(&self) -> Decimal {
        self.withdrawals.iter().map(|w| w.amount).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use AccountStatus::*;

        assert!(Active.can_transition_to(Validated));
        assert!(Active.can_transition_to(Failed));
        assert!(Validated.can_transition_to(Archived));
        assert!(Failed.can_transition_to(Archived));

        assert!(!Validated.can_transition_to(Active));
        assert!(!Failed.can_transition_to(Validated));
        assert!(!Archived.can_transition_to(Active));
        assert!(!Archived.can_transition_to(Archived));
    }

    #[test]
    fn test_account_type_parsing() {
        assert_eq!(AccountType::from_str("Evaluation"), Some(AccountType::Evaluation));
        assert_eq!(AccountType::from_str("funded"), Some(AccountType::Funded));
        assert_eq!(AccountType::from_str("demo"), None);
    }
}
