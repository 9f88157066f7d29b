use crate::budget::{check_amount, next_id, round_cents, usage_percentage};
use crate::errors::BudgetError;
use crate::models::{BudgetData, SavingsAccount, SavingsGoal, SavingsKind, SavingsTransaction};
use chrono::NaiveDate;

pub fn add_goal(
    data: &mut BudgetData,
    name: &str,
    target: f64,
    deadline: Option<NaiveDate>,
) -> Result<SavingsGoal, BudgetError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BudgetError::EmptyField("goal name"));
    }
    let target = check_amount(target)?;

    let goal = SavingsGoal {
        id: next_id(data.savings_goals.iter().map(|goal| goal.id))?,
        name: name.to_string(),
        target,
        current: 0.0,
        deadline,
    };
    data.savings_goals.push(goal.clone());
    Ok(goal)
}

pub fn contribute_to_goal(data: &mut BudgetData, id: u64, amount: f64) -> Result<f64, BudgetError> {
    let amount = check_amount(amount)?;
    let goal = data
        .savings_goals
        .iter_mut()
        .find(|goal| goal.id == id)
        .ok_or(BudgetError::GoalNotFound(id))?;
    goal.current = round_cents(goal.current + amount);
    Ok(goal.current)
}

pub fn remove_goal(data: &mut BudgetData, id: u64) -> Result<SavingsGoal, BudgetError> {
    let index = data
        .savings_goals
        .iter()
        .position(|goal| goal.id == id)
        .ok_or(BudgetError::GoalNotFound(id))?;
    Ok(data.savings_goals.remove(index))
}

/// Percentage of the target reached, capped at 100.
pub fn goal_progress(goal: &SavingsGoal) -> f64 {
    usage_percentage(goal.current, goal.target).min(100.0)
}

pub fn add_account(
    data: &mut BudgetData,
    name: &str,
    opening_balance: f64,
) -> Result<SavingsAccount, BudgetError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BudgetError::EmptyField("account name"));
    }
    if !opening_balance.is_finite() || opening_balance < 0.0 {
        return Err(BudgetError::NegativeValue("opening balance"));
    }

    let account = SavingsAccount {
        id: next_id(data.savings_accounts.iter().map(|account| account.id))?,
        name: name.to_string(),
        balance: round_cents(opening_balance),
    };
    data.savings_accounts.push(account.clone());
    Ok(account)
}

pub fn remove_account(data: &mut BudgetData, id: u64) -> Result<SavingsAccount, BudgetError> {
    let index = data
        .savings_accounts
        .iter()
        .position(|account| account.id == id)
        .ok_or(BudgetError::AccountNotFound(id))?;
    data.savings_transactions.retain(|movement| movement.account_id != id);
    Ok(data.savings_accounts.remove(index))
}

pub fn deposit(
    data: &mut BudgetData,
    account_id: u64,
    amount: f64,
    description: &str,
    date: NaiveDate,
) -> Result<SavingsTransaction, BudgetError> {
    move_funds(data, account_id, SavingsKind::Deposit, amount, description, date)
}

pub fn withdraw(
    data: &mut BudgetData,
    account_id: u64,
    amount: f64,
    description: &str,
    date: NaiveDate,
) -> Result<SavingsTransaction, BudgetError> {
    move_funds(data, account_id, SavingsKind::Withdrawal, amount, description, date)
}

fn move_funds(
    data: &mut BudgetData,
    account_id: u64,
    kind: SavingsKind,
    amount: f64,
    description: &str,
    date: NaiveDate,
) -> Result<SavingsTransaction, BudgetError> {
    let amount = check_amount(amount)?;
    let id = next_id(data.savings_transactions.iter().map(|movement| movement.id))?;
    let account = data
        .savings_accounts
        .iter_mut()
        .find(|account| account.id == account_id)
        .ok_or(BudgetError::AccountNotFound(account_id))?;

    account.balance = match kind {
        SavingsKind::Deposit => round_cents(account.balance + amount),
        SavingsKind::Withdrawal if amount > account.balance => {
            return Err(BudgetError::InsufficientFunds {
                requested: amount,
                available: account.balance,
            });
        }
        SavingsKind::Withdrawal => round_cents(account.balance - amount),
    };

    let movement = SavingsTransaction {
        id,
        account_id,
        kind,
        amount,
        description: description.trim().to_string(),
        date,
    };
    data.savings_transactions.push(movement.clone());
    Ok(movement)
}
