//! Display-only transactions and quick-stat aggregation.
//!
//! Transactions in the tracker are either bundled sample data or ephemeral
//! form state; nothing here is persisted. The aggregation feeds the quick
//! stats shown above the dashboard chart.

use serde::{Deserialize, Serialize};
use time::{Date, macros::date};

/// Whether a transaction adds to or subtracts from the balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming in.
    Income,
    /// Money going out.
    Expense,
}

/// One entry in the transaction list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Income or expense.
    pub kind: TransactionKind,
    /// The amount, always positive; the sign is carried by `kind`.
    pub amount: f64,
    /// A short description, e.g. "Lunch at Italian Restaurant".
    pub description: String,
    /// The category label shown as a badge, e.g. "Food".
    pub category: String,
    /// The day the transaction happened.
    pub date: Date,
}

impl Transaction {
    /// Create a transaction entry.
    pub fn new(
        kind: TransactionKind,
        amount: f64,
        description: impl Into<String>,
        category: impl Into<String>,
        date: Date,
    ) -> Self {
        Self {
            kind,
            amount,
            description: description.into(),
            category: category.into(),
            date,
        }
    }

    /// The amount with its sign applied: positive for income, negative for
    /// expenses.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}

/// Totals for the quick-stat cards.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TransactionSummary {
    /// Sum of all income amounts.
    pub total_income: f64,
    /// Sum of all expense amounts, as a positive number.
    pub total_expenses: f64,
    /// Income minus expenses.
    pub net_balance: f64,
}

/// Aggregate a slice of transactions into quick-stat totals.
pub fn summarize(transactions: &[Transaction]) -> TransactionSummary {
    let mut summary = TransactionSummary::default();

    for transaction in transactions {
        match transaction.kind {
            TransactionKind::Income => summary.total_income += transaction.amount,
            TransactionKind::Expense => summary.total_expenses += transaction.amount,
        }
    }

    summary.net_balance = summary.total_income - summary.total_expenses;
    summary
}

/// The sample ledger rendered in the recent-transactions card, newest first.
pub fn sample_transactions() -> Vec<Transaction> {
    vec![
        Transaction::new(
            TransactionKind::Expense,
            45.67,
            "Lunch at Italian Restaurant",
            "Food",
            date!(2024 - 01 - 15),
        ),
        Transaction::new(
            TransactionKind::Income,
            2500.00,
            "Client Payment - Website Design",
            "Business",
            date!(2024 - 01 - 14),
        ),
        Transaction::new(
            TransactionKind::Expense,
            89.99,
            "Office Supplies",
            "Business",
            date!(2024 - 01 - 13),
        ),
        Transaction::new(
            TransactionKind::Expense,
            120.00,
            "Gas Station",
            "Transportation",
            date!(2024 - 01 - 12),
        ),
        Transaction::new(
            TransactionKind::Income,
            1800.00,
            "Freelance Project Payment",
            "Business",
            date!(2024 - 01 - 11),
        ),
    ]
}
