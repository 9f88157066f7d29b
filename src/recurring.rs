use crate::budget::{add_transaction, check_amount, next_id};
use crate::errors::BudgetError;
use crate::models::{BudgetData, Frequency, RecurringTransaction, Transaction, TransactionRequest};
use chrono::{Duration, Months, NaiveDate};
use tracing::{info, warn};

/// Upper bound on catch-up occurrences generated for one template per run.
const MAX_OCCURRENCES_PER_RUN: usize = 366;

impl Frequency {
    /// The date one period after `date`. Month and year steps clamp to the
    /// last day of shorter months.
    pub fn advance(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::Daily => date.checked_add_signed(Duration::days(1)),
            Frequency::Weekly => date.checked_add_signed(Duration::weeks(1)),
            Frequency::Monthly => date.checked_add_months(Months::new(1)),
            Frequency::Yearly => date.checked_add_months(Months::new(12)),
        }
    }
}

pub fn add_recurring(
    data: &mut BudgetData,
    category: &str,
    amount: f64,
    description: &str,
    frequency: Frequency,
    start: NaiveDate,
) -> Result<RecurringTransaction, BudgetError> {
    let amount = check_amount(amount)?;
    if !data.categories.contains_key(category) {
        return Err(BudgetError::UnknownCategory(category.to_string()));
    }

    let recurring = RecurringTransaction {
        id: next_id(data.recurring_transactions.iter().map(|r| r.id))?,
        category: category.to_string(),
        amount,
        description: description.trim().to_string(),
        frequency,
        next_date: start,
        active: true,
    };
    data.recurring_transactions.push(recurring.clone());
    Ok(recurring)
}

pub fn set_recurring_active(data: &mut BudgetData, id: u64, active: bool) -> Result<(), BudgetError> {
    let recurring = data
        .recurring_transactions
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or(BudgetError::RecurringNotFound(id))?;
    recurring.active = active;
    Ok(())
}

pub fn remove_recurring(data: &mut BudgetData, id: u64) -> Result<RecurringTransaction, BudgetError> {
    let index = data
        .recurring_transactions
        .iter()
        .position(|r| r.id == id)
        .ok_or(BudgetError::RecurringNotFound(id))?;
    Ok(data.recurring_transactions.remove(index))
}

/// Records every occurrence that has come due on or before `today` and moves
/// each template's `next_date` past `today`.
pub fn process_due(data: &mut BudgetData, today: NaiveDate) -> Vec<Transaction> {
    let mut generated = Vec::new();

    for index in 0..data.recurring_transactions.len() {
        let template = data.recurring_transactions[index].clone();
        if !template.active || template.next_date > today {
            continue;
        }
        if !data.categories.contains_key(&template.category) {
            warn!(
                id = template.id,
                category = %template.category,
                "skipping recurring transaction for missing category"
            );
            continue;
        }

        let mut due = template.next_date;
        let mut count = 0;
        while due <= today && count < MAX_OCCURRENCES_PER_RUN {
            let request = TransactionRequest {
                category: template.category.clone(),
                amount: template.amount,
                description: template.description.clone(),
                date: Some(due.to_string()),
                recurring: Some(true),
            };
            match add_transaction(data, request, today) {
                Ok(tx) => generated.push(tx),
                Err(BudgetError::MonthClosed(month)) => {
                    warn!(id = template.id, %month, "skipping occurrence in closed month");
                }
                Err(err) => {
                    warn!(id = template.id, "recurring transaction rejected: {err}");
                    break;
                }
            }
            count += 1;
            match template.frequency.advance(due) {
                Some(next) => due = next,
                None => break,
            }
        }

        data.recurring_transactions[index].next_date = due;
    }

    if !generated.is_empty() {
        info!(count = generated.len(), "recorded recurring transactions");
    }
    generated
}
