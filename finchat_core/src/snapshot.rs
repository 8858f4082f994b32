//! Read-only view of the user's financial records.
//!
//! The records come from upstream data providers; this crate only reads
//! them when a request is being built. Every leaf field is optional because
//! the providers hand over partially filled rows.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    /// Balance in minor units (cents).
    #[serde(default)]
    pub balance: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Budget {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, alias = "imported_payee")]
    pub payee: Option<String>,
    /// Amount in minor units (cents).
    #[serde(default)]
    pub amount: Option<i64>,
}

/// Point-in-time snapshot. `transactions` is most-recent-first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FinancialSnapshot {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub budgets: Vec<Budget>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl FinancialSnapshot {
    /// Sum of all account balances, treating a missing balance as zero.
    #[must_use]
    pub fn total_balance(&self) -> i64 {
        self.accounts
            .iter()
            .map(|account| account.balance.unwrap_or(0))
            .fold(0_i64, i64::saturating_add)
    }
}

/// Supplier of the current snapshot, queried once per outgoing request.
pub trait SnapshotSource: Send + Sync {
    fn snapshot(&self) -> Option<FinancialSnapshot>;
}

impl SnapshotSource for FinancialSnapshot {
    fn snapshot(&self) -> Option<FinancialSnapshot> {
        Some(self.clone())
    }
}
