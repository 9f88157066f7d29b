use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub budget: f64,
    #[serde(default)]
    pub spent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: u64,
    pub category: String,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring: Option<bool>,
}

impl Transaction {
    /// Calendar day of the transaction. Accepts plain dates and ISO
    /// date-times; anything else yields `None`.
    pub fn day(&self) -> Option<NaiveDate> {
        let prefix = self.date.get(..10)?;
        NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTransaction {
    pub id: u64,
    pub category: String,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    pub frequency: Frequency,
    pub next_date: NaiveDate,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    pub id: u64,
    pub name: String,
    pub target: f64,
    #[serde(default)]
    pub current: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsAccount {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub balance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SavingsKind {
    Deposit,
    Withdrawal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsTransaction {
    pub id: u64,
    pub account_id: u64,
    pub kind: SavingsKind,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionTemplate {
    pub id: u64,
    pub name: String,
    pub category: String,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySnapshot {
    pub name: String,
    pub budget: f64,
    pub spent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySnapshot {
    /// `YYYY-MM`
    pub month: String,
    pub salary: f64,
    pub total_budget: f64,
    pub total_spent: f64,
    pub transaction_count: usize,
    pub categories: BTreeMap<String, CategorySnapshot>,
}

/// The whole budget record. Loaded and saved wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BudgetData {
    pub salary: f64,
    pub categories: BTreeMap<String, Category>,
    pub transactions: Vec<Transaction>,
    pub recurring_transactions: Vec<RecurringTransaction>,
    pub savings_goals: Vec<SavingsGoal>,
    pub savings_accounts: Vec<SavingsAccount>,
    pub savings_transactions: Vec<SavingsTransaction>,
    pub transaction_templates: Vec<TransactionTemplate>,
    pub monthly_history: Vec<MonthlySnapshot>,
}

fn default_true() -> bool {
    true
}

/// Body of `POST /api/transactions` and `PUT /api/transactions/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub category: String,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring: Option<bool>,
}

impl TransactionRequest {
    pub fn new(category: impl Into<String>, amount: f64, description: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            amount,
            description: description.into(),
            date: None,
            recurring: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub success: bool,
    pub transaction: Transaction,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessedRecurringResponse {
    pub success: bool,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CloseMonthResponse {
    pub success: bool,
    pub snapshot: MonthlySnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_data_accepts_partial_json() {
        let data: BudgetData = serde_json::from_str(
            r#"{"salary": 3000, "categories": {"food": {"name": "Food", "budget": 400, "spent": 12.5}}}"#,
        )
        .unwrap();

        assert_eq!(data.salary, 3000.0);
        assert_eq!(data.categories["food"].spent, 12.5);
        assert!(data.transactions.is_empty());
        assert!(data.monthly_history.is_empty());
    }

    #[test]
    fn budget_data_uses_camel_case_keys() {
        let value = serde_json::to_value(BudgetData::default()).unwrap();
        assert!(value.get("recurringTransactions").is_some());
        assert!(value.get("savingsGoals").is_some());
        assert!(value.get("transactionTemplates").is_some());
        assert!(value.get("monthlyHistory").is_some());
    }

    #[test]
    fn transaction_day_reads_date_and_datetime() {
        let mut tx = Transaction {
            id: 1,
            category: "food".into(),
            amount: 5.0,
            description: String::new(),
            date: "2026-03-14".into(),
            recurring: None,
        };
        assert_eq!(tx.day(), NaiveDate::from_ymd_opt(2026, 3, 14));

        tx.date = "2026-03-14T09:30:00.000Z".into();
        assert_eq!(tx.day(), NaiveDate::from_ymd_opt(2026, 3, 14));

        tx.date = "yesterday".into();
        assert_eq!(tx.day(), None);
    }
}
