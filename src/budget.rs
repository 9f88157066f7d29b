use crate::errors::BudgetError;
use crate::history::month_key;
use crate::models::{BudgetData, Category, Transaction, TransactionRequest};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rounds a running money total to whole cents.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `spent / budget * 100`, or `0` when nothing was budgeted.
pub fn usage_percentage(spent: f64, budget: f64) -> f64 {
    if budget == 0.0 || !budget.is_finite() || !spent.is_finite() {
        return 0.0;
    }
    spent / budget * 100.0
}

pub(crate) fn next_id(ids: impl Iterator<Item = u64>) -> Result<u64, BudgetError> {
    ids.max()
        .unwrap_or(0)
        .checked_add(1)
        .ok_or(BudgetError::IdSpaceExhausted)
}

pub(crate) fn check_amount(amount: f64) -> Result<f64, BudgetError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(BudgetError::InvalidAmount(amount))
    }
}

fn check_non_negative(value: f64, field: &'static str) -> Result<f64, BudgetError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(BudgetError::NegativeValue(field))
    }
}

fn salary_share(budget: f64, salary: f64) -> f64 {
    round_cents(usage_percentage(budget, salary))
}

pub fn set_salary(data: &mut BudgetData, salary: f64) -> Result<(), BudgetError> {
    data.salary = check_non_negative(salary, "salary")?;
    for category in data.categories.values_mut() {
        category.percentage = Some(salary_share(category.budget, data.salary));
    }
    Ok(())
}

pub fn add_category(
    data: &mut BudgetData,
    key: &str,
    name: &str,
    budget: f64,
    color: Option<String>,
) -> Result<Category, BudgetError> {
    let key = key.trim();
    let name = name.trim();
    if key.is_empty() {
        return Err(BudgetError::EmptyField("category key"));
    }
    if name.is_empty() {
        return Err(BudgetError::EmptyField("category name"));
    }
    if data.categories.contains_key(key) {
        return Err(BudgetError::DuplicateCategory(key.to_string()));
    }
    let budget = check_non_negative(budget, "budget")?;

    let order = data
        .categories
        .values()
        .filter_map(|category| category.order)
        .max()
        .map_or(0, |max| max + 1);

    let category = Category {
        name: name.to_string(),
        budget,
        spent: 0.0,
        percentage: Some(salary_share(budget, data.salary)),
        color,
        order: Some(order),
    };
    data.categories.insert(key.to_string(), category.clone());
    Ok(category)
}

#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub budget: Option<f64>,
    pub color: Option<String>,
}

pub fn update_category(
    data: &mut BudgetData,
    key: &str,
    update: CategoryUpdate,
) -> Result<(), BudgetError> {
    let name = match update.name.as_deref().map(str::trim) {
        Some("") => return Err(BudgetError::EmptyField("category name")),
        other => other.map(str::to_string),
    };
    let budget = update
        .budget
        .map(|budget| check_non_negative(budget, "budget"))
        .transpose()?;

    let salary = data.salary;
    let category = data
        .categories
        .get_mut(key)
        .ok_or_else(|| BudgetError::UnknownCategory(key.to_string()))?;

    if let Some(name) = name {
        category.name = name;
    }
    if let Some(budget) = budget {
        category.budget = budget;
        category.percentage = Some(salary_share(budget, salary));
    }
    if update.color.is_some() {
        category.color = update.color;
    }
    Ok(())
}

/// Assigns display order by position in `keys`. Categories not listed keep
/// their relative order after the listed ones.
pub fn reorder_categories(data: &mut BudgetData, keys: &[&str]) -> Result<(), BudgetError> {
    if let Some(missing) = keys.iter().find(|key| !data.categories.contains_key(**key)) {
        return Err(BudgetError::UnknownCategory(missing.to_string()));
    }

    let mut rest: Vec<(Option<u32>, String)> = data
        .categories
        .iter()
        .filter(|(key, _)| !keys.contains(&key.as_str()))
        .map(|(key, category)| (category.order, key.clone()))
        .collect();
    rest.sort();

    let ordered = keys
        .iter()
        .map(|key| key.to_string())
        .chain(rest.into_iter().map(|(_, key)| key));
    for (position, key) in ordered.enumerate() {
        if let Some(category) = data.categories.get_mut(&key) {
            category.order = Some(position as u32);
        }
    }
    Ok(())
}

/// Removes a category along with every transaction filed under it.
pub fn remove_category(data: &mut BudgetData, key: &str) -> Result<Vec<Transaction>, BudgetError> {
    if data.categories.remove(key).is_none() {
        return Err(BudgetError::UnknownCategory(key.to_string()));
    }
    let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut data.transactions)
        .into_iter()
        .partition(|tx| tx.category == key);
    data.transactions = kept;
    Ok(removed)
}

fn resolve_date(requested: Option<&str>, today: NaiveDate) -> Result<String, BudgetError> {
    let date = match requested.map(str::trim) {
        None | Some("") => return Ok(today.to_string()),
        Some(date) => date,
    };
    let day_ok = date
        .get(..10)
        .is_some_and(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").is_ok());
    let rest_ok = date
        .get(10..)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('T') || rest.starts_with(' '));
    if day_ok && rest_ok {
        Ok(date.to_string())
    } else {
        Err(BudgetError::InvalidDate(date.to_string()))
    }
}

/// Closed months are archived; nothing new may be dated inside them.
fn check_month_open(data: &BudgetData, date: &str) -> Result<(), BudgetError> {
    let Some(day) = date.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    else {
        return Ok(());
    };
    let month = month_key(day);
    if data.monthly_history.iter().any(|snapshot| snapshot.month == month) {
        return Err(BudgetError::MonthClosed(month));
    }
    Ok(())
}

fn adjust_spent(data: &mut BudgetData, key: &str, delta: f64) {
    if let Some(category) = data.categories.get_mut(key) {
        category.spent = round_cents(category.spent + delta);
    }
}

pub fn add_transaction(
    data: &mut BudgetData,
    request: TransactionRequest,
    today: NaiveDate,
) -> Result<Transaction, BudgetError> {
    let amount = check_amount(request.amount)?;
    if !data.categories.contains_key(&request.category) {
        return Err(BudgetError::UnknownCategory(request.category));
    }
    let date = resolve_date(request.date.as_deref(), today)?;
    check_month_open(data, &date)?;

    let transaction = Transaction {
        id: next_id(data.transactions.iter().map(|tx| tx.id))?,
        category: request.category,
        amount,
        description: request.description.trim().to_string(),
        date,
        recurring: request.recurring,
    };

    adjust_spent(data, &transaction.category, amount);
    data.transactions.push(transaction.clone());
    Ok(transaction)
}

/// Replaces a transaction's category, amount and description. Without an
/// explicit date the original date is kept.
pub fn edit_transaction(
    data: &mut BudgetData,
    id: u64,
    request: TransactionRequest,
) -> Result<Transaction, BudgetError> {
    let amount = check_amount(request.amount)?;
    if !data.categories.contains_key(&request.category) {
        return Err(BudgetError::UnknownCategory(request.category));
    }
    let index = data
        .transactions
        .iter()
        .position(|tx| tx.id == id)
        .ok_or(BudgetError::TransactionNotFound(id))?;

    let previous = data.transactions[index].clone();
    let date = match request.date.as_deref().map(str::trim) {
        None | Some("") => previous.date.clone(),
        Some(date) => resolve_date(Some(date), NaiveDate::MIN)?,
    };
    check_month_open(data, &date)?;

    adjust_spent(data, &previous.category, -previous.amount);
    adjust_spent(data, &request.category, amount);

    let updated = Transaction {
        id,
        category: request.category,
        amount,
        description: request.description.trim().to_string(),
        date,
        recurring: request.recurring.or(previous.recurring),
    };
    data.transactions[index] = updated.clone();
    Ok(updated)
}

pub fn delete_transaction(data: &mut BudgetData, id: u64) -> Result<Transaction, BudgetError> {
    let index = data
        .transactions
        .iter()
        .position(|tx| tx.id == id)
        .ok_or(BudgetError::TransactionNotFound(id))?;
    let removed = data.transactions.remove(index);
    adjust_spent(data, &removed.category, -removed.amount);
    Ok(removed)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpentDrift {
    pub category: String,
    pub recorded: f64,
    pub actual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub drifts: Vec<SpentDrift>,
    /// Ids of transactions filed under a category that no longer exists.
    pub orphaned_transactions: Vec<u64>,
}

impl IntegrityReport {
    pub fn is_consistent(&self) -> bool {
        self.drifts.is_empty() && self.orphaned_transactions.is_empty()
    }
}

fn actual_spent(data: &BudgetData) -> BTreeMap<&str, f64> {
    let mut totals: BTreeMap<&str, f64> = data
        .categories
        .keys()
        .map(|key| (key.as_str(), 0.0))
        .collect();
    for tx in &data.transactions {
        if let Some(total) = totals.get_mut(tx.category.as_str()) {
            *total += tx.amount;
        }
    }
    totals
}

/// Compares every category's running total against the transaction log.
pub fn integrity_report(data: &BudgetData) -> IntegrityReport {
    let drifts = actual_spent(data)
        .into_iter()
        .filter_map(|(key, actual)| {
            let recorded = data.categories[key].spent;
            let actual = round_cents(actual);
            (round_cents(recorded) != actual).then(|| SpentDrift {
                category: key.to_string(),
                recorded,
                actual,
            })
        })
        .collect();

    let orphaned_transactions = data
        .transactions
        .iter()
        .filter(|tx| !data.categories.contains_key(&tx.category))
        .map(|tx| tx.id)
        .collect();

    IntegrityReport {
        drifts,
        orphaned_transactions,
    }
}

/// Recomputes every `spent` total from the transaction log.
pub fn reconcile(data: &mut BudgetData) {
    let totals: Vec<(String, f64)> = actual_spent(data)
        .into_iter()
        .map(|(key, total)| (key.to_string(), round_cents(total)))
        .collect();
    for (key, total) in totals {
        if let Some(category) = data.categories.get_mut(&key) {
            category.spent = total;
        }
    }
}
