use crate::budget::round_cents;
use crate::errors::BudgetError;
use crate::models::{BudgetData, CategorySnapshot, MonthlySnapshot, Transaction};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use tracing::info;

pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Parses a `YYYY-MM` key into the first day of that month.
pub fn parse_month(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{key}-01"), "%Y-%m-%d").ok()
}

fn in_month(tx: &Transaction, month: NaiveDate) -> bool {
    tx.day()
        .is_some_and(|day| day.year() == month.year() && day.month() == month.month())
}

pub fn close_month(data: &mut BudgetData, month: NaiveDate) -> Result<MonthlySnapshot, BudgetError> {
    let key = month_key(month);
    if data.monthly_history.iter().any(|snapshot| snapshot.month == key) {
        return Err(BudgetError::MonthAlreadyClosed(key));
    }

    let (archived, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut data.transactions)
        .into_iter()
        .partition(|tx| in_month(tx, month));
    data.transactions = kept;

    let mut categories: BTreeMap<String, CategorySnapshot> = data
        .categories
        .iter()
        .map(|(key, category)| {
            let snapshot = CategorySnapshot {
                name: category.name.clone(),
                budget: category.budget,
                spent: 0.0,
            };
            (key.clone(), snapshot)
        })
        .collect();

    let mut total_spent = 0.0;
    for tx in &archived {
        total_spent += tx.amount;
        if let Some(snapshot) = categories.get_mut(&tx.category) {
            snapshot.spent = round_cents(snapshot.spent + tx.amount);
        }
        if let Some(category) = data.categories.get_mut(&tx.category) {
            category.spent = round_cents(category.spent - tx.amount);
        }
    }

    let snapshot = MonthlySnapshot {
        month: key,
        salary: data.salary,
        total_budget: round_cents(data.categories.values().map(|c| c.budget).sum()),
        total_spent: round_cents(total_spent),
        transaction_count: archived.len(),
        categories,
    };
    info!(
        month = %snapshot.month,
        transactions = snapshot.transaction_count,
        "closed month"
    );
    data.monthly_history.push(snapshot.clone());
    Ok(snapshot)
}
