//! System prompt construction.
//!
//! The prompt is rebuilt on every turn from the privacy flag and the
//! current snapshot. Nothing here reads the clock or keeps state, so equal
//! inputs always give equal output.

use crate::snapshot::{FinancialSnapshot, Transaction};

/// Prompt used when personal data is withheld.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful financial assistant.";

/// Number of transactions summarized, taken from the front of the list.
pub const RECENT_TRANSACTION_LIMIT: usize = 5;

const UNNAMED_BUDGET: &str = "Unnamed";
const UNKNOWN_DATE: &str = "Unknown date";
const UNKNOWN_PAYEE: &str = "Unknown payee";
const NO_BUDGETS: &str = "No budget data available.";
const NO_TRANSACTIONS: &str = "No recent transactions.";
const CLOSING: &str = "Use this data to provide personalized assistance when relevant.";

/// Render a minor-unit amount as major units with two decimals.
///
/// `12345` becomes `"123.45"`, `-5` becomes `"-0.05"`.
#[must_use]
pub fn format_minor_units(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let magnitude = amount.unsigned_abs();
    format!("{sign}{}.{:02}", magnitude / 100, magnitude % 100)
}

/// Build the system instruction for the next request.
///
/// With `include_personal_data` off the snapshot is never looked at. With it
/// on, a missing snapshot is summarized as an empty one.
#[must_use]
pub fn build_system_prompt(
    snapshot: Option<&FinancialSnapshot>,
    include_personal_data: bool,
) -> String {
    if !include_personal_data {
        return DEFAULT_SYSTEM_PROMPT.to_string();
    }

    let empty = FinancialSnapshot::default();
    let snapshot = snapshot.unwrap_or(&empty);

    [
        DEFAULT_SYSTEM_PROMPT.to_string(),
        format!(
            "The user has {} accounts with a total combined balance of {}.",
            snapshot.accounts.len(),
            format_minor_units(snapshot.total_balance())
        ),
        budget_section(snapshot),
        transaction_section(snapshot),
        CLOSING.to_string(),
    ]
    .join(" ")
}

fn budget_section(snapshot: &FinancialSnapshot) -> String {
    if snapshot.budgets.is_empty() {
        return NO_BUDGETS.to_string();
    }

    let names = snapshot
        .budgets
        .iter()
        .map(|budget| non_empty(budget.name.as_deref()).unwrap_or(UNNAMED_BUDGET))
        .collect::<Vec<_>>()
        .join(", ");

    format!("They have the following budget categories: {names}.")
}

fn transaction_section(snapshot: &FinancialSnapshot) -> String {
    if snapshot.transactions.is_empty() {
        return NO_TRANSACTIONS.to_string();
    }

    let entries = snapshot
        .transactions
        .iter()
        .take(RECENT_TRANSACTION_LIMIT)
        .map(describe_transaction)
        .collect::<Vec<_>>()
        .join("; ");

    format!("Recent transactions (up to {RECENT_TRANSACTION_LIMIT}): {entries}.")
}

/// Empty strings count as missing.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

fn describe_transaction(transaction: &Transaction) -> String {
    format!(
        "{}: {} - ${}",
        non_empty(transaction.date.as_deref()).unwrap_or(UNKNOWN_DATE),
        non_empty(transaction.payee.as_deref()).unwrap_or(UNKNOWN_PAYEE),
        format_minor_units(transaction.amount.unwrap_or(0))
    )
}
