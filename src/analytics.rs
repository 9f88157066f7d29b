use crate::budget::{round_cents, usage_percentage};
use crate::models::{BudgetData, Transaction};
use chrono::{Datelike, Duration, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const WEEK_COUNT: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub salary: f64,
    pub total_budget: f64,
    pub total_spent: f64,
    /// Salary left after spending.
    pub remaining: f64,
    /// Salary not assigned to any category.
    pub unallocated: f64,
    pub savings_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUsage {
    pub key: String,
    pub name: String,
    pub budget: f64,
    pub spent: f64,
    pub remaining: f64,
    pub percentage: f64,
    pub over_budget: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyComparison {
    pub current_month: String,
    pub previous_month: String,
    pub current_total: f64,
    pub previous_total: f64,
    pub change: f64,
    pub change_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPrediction {
    pub key: String,
    pub spent: f64,
    pub projected: f64,
    pub budget: f64,
    pub projected_overrun: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetPrediction {
    pub days_elapsed: u32,
    pub days_in_month: u32,
    pub spent_so_far: f64,
    pub daily_average: f64,
    pub projected_total: f64,
    pub total_budget: f64,
    pub projected_overrun: f64,
    pub categories: Vec<CategoryPrediction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SpendingStatistics {
    pub count: usize,
    pub total: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    pub date: String,
    pub total: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPoint {
    pub week: String,
    pub start_date: String,
    pub end_date: String,
    pub total: f64,
    pub days_counted: u8,
    pub daily_average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub generated_for: String,
    pub summary: Summary,
    pub categories: Vec<CategoryUsage>,
    pub comparison: MonthlyComparison,
    pub prediction: BudgetPrediction,
    pub statistics: SpendingStatistics,
    pub last_7_days: Vec<DailyPoint>,
    pub weekly_totals: Vec<WeeklyPoint>,
}

pub fn build_report(data: &BudgetData) -> AnalyticsReport {
    build_report_at(Local::now().date_naive(), data)
}

pub fn build_report_at(today: NaiveDate, data: &BudgetData) -> AnalyticsReport {
    let daily = daily_totals(&data.transactions);
    let amounts: Vec<f64> = data.transactions.iter().map(|tx| tx.amount).collect();

    AnalyticsReport {
        generated_for: today.to_string(),
        summary: summary(data),
        categories: category_usage(data),
        comparison: monthly_comparison(today, &data.transactions),
        prediction: predict(today, data),
        statistics: statistics(&amounts),
        last_7_days: last_7_days(today, &daily),
        weekly_totals: weekly_totals(today, &daily),
    }
}

pub fn summary(data: &BudgetData) -> Summary {
    let total_budget = round_cents(data.categories.values().map(|c| c.budget).sum());
    let total_spent = round_cents(data.categories.values().map(|c| c.spent).sum());
    let remaining = round_cents(data.salary - total_spent);

    Summary {
        salary: data.salary,
        total_budget,
        total_spent,
        remaining,
        unallocated: round_cents(data.salary - total_budget),
        savings_rate: round_cents(usage_percentage(remaining, data.salary)),
    }
}

/// Usage per category, in display order.
pub fn category_usage(data: &BudgetData) -> Vec<CategoryUsage> {
    let mut usage: Vec<(Option<u32>, CategoryUsage)> = data
        .categories
        .iter()
        .map(|(key, category)| {
            let entry = CategoryUsage {
                key: key.clone(),
                name: category.name.clone(),
                budget: category.budget,
                spent: category.spent,
                remaining: round_cents(category.budget - category.spent),
                percentage: round_cents(usage_percentage(category.spent, category.budget)),
                over_budget: category.spent > category.budget,
            };
            (category.order, entry)
        })
        .collect();
    usage.sort_by(|(a_order, a), (b_order, b)| {
        let a_order = a_order.unwrap_or(u32::MAX);
        let b_order = b_order.unwrap_or(u32::MAX);
        a_order.cmp(&b_order).then_with(|| a.key.cmp(&b.key))
    });
    usage.into_iter().map(|(_, entry)| entry).collect()
}

fn month_total(transactions: &[Transaction], month: NaiveDate) -> f64 {
    transactions
        .iter()
        .filter(|tx| {
            tx.day()
                .is_some_and(|day| day.year() == month.year() && day.month() == month.month())
        })
        .map(|tx| tx.amount)
        .sum()
}

pub fn monthly_comparison(today: NaiveDate, transactions: &[Transaction]) -> MonthlyComparison {
    let current = month_start(today);
    let previous = current
        .checked_sub_months(Months::new(1))
        .unwrap_or(current);

    let current_total = round_cents(month_total(transactions, current));
    let previous_total = round_cents(month_total(transactions, previous));
    let change = round_cents(current_total - previous_total);

    MonthlyComparison {
        current_month: current.format("%Y-%m").to_string(),
        previous_month: previous.format("%Y-%m").to_string(),
        current_total,
        previous_total,
        change,
        change_percentage: round_cents(usage_percentage(change, previous_total)),
    }
}

/// Straight-line projection of this month's spending to month end.
pub fn predict(today: NaiveDate, data: &BudgetData) -> BudgetPrediction {
    let start = month_start(today);
    let days_elapsed = today.day();
    let days_in_month = days_in_month(today);
    let scale = f64::from(days_in_month) / f64::from(days_elapsed);

    let mut per_category: BTreeMap<&str, f64> = BTreeMap::new();
    let mut spent_so_far = 0.0;
    for tx in &data.transactions {
        let Some(day) = tx.day() else { continue };
        if day < start || day > today {
            continue;
        }
        spent_so_far += tx.amount;
        *per_category.entry(tx.category.as_str()).or_default() += tx.amount;
    }

    let categories = data
        .categories
        .iter()
        .map(|(key, category)| {
            let spent = per_category.get(key.as_str()).copied().unwrap_or(0.0);
            let projected = round_cents(spent * scale);
            CategoryPrediction {
                key: key.clone(),
                spent: round_cents(spent),
                projected,
                budget: category.budget,
                projected_overrun: round_cents((projected - category.budget).max(0.0)),
            }
        })
        .collect();

    let projected_total = round_cents(spent_so_far * scale);
    let total_budget = round_cents(data.categories.values().map(|c| c.budget).sum());

    BudgetPrediction {
        days_elapsed,
        days_in_month,
        spent_so_far: round_cents(spent_so_far),
        daily_average: round_cents(spent_so_far / f64::from(days_elapsed)),
        projected_total,
        total_budget,
        projected_overrun: round_cents((projected_total - total_budget).max(0.0)),
        categories,
    }
}

/// Count, mean, median and population standard deviation of `amounts`.
pub fn statistics(amounts: &[f64]) -> SpendingStatistics {
    if amounts.is_empty() {
        return SpendingStatistics::default();
    }

    let mut sorted = amounts.to_vec();
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    let total: f64 = sorted.iter().sum();
    let mean = total / count as f64;
    let median = if count % 2 == 0 {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    } else {
        sorted[count / 2]
    };
    let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count as f64;

    SpendingStatistics {
        count,
        total: round_cents(total),
        mean: round_cents(mean),
        median: round_cents(median),
        std_dev: round_cents(variance.sqrt()),
        min: sorted[0],
        max: sorted[count - 1],
    }
}

fn daily_totals(transactions: &[Transaction]) -> BTreeMap<NaiveDate, (f64, usize)> {
    let mut totals: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for tx in transactions {
        if let Some(day) = tx.day() {
            let entry = totals.entry(day).or_default();
            entry.0 += tx.amount;
            entry.1 += 1;
        }
    }
    totals
}

fn last_7_days(today: NaiveDate, daily: &BTreeMap<NaiveDate, (f64, usize)>) -> Vec<DailyPoint> {
    (0..7)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let (total, count) = daily.get(&date).copied().unwrap_or_default();
            DailyPoint {
                date: date.to_string(),
                total: round_cents(total),
                count,
            }
        })
        .collect()
}

fn weekly_totals(today: NaiveDate, daily: &BTreeMap<NaiveDate, (f64, usize)>) -> Vec<WeeklyPoint> {
    let current_week_start = week_start(today);

    (0..WEEK_COUNT)
        .rev()
        .map(|offset| {
            let start = current_week_start - Duration::weeks(offset as i64);
            let end = start + Duration::days(6);
            let total: f64 = daily.range(start..=end).map(|(_, (amount, _))| amount).sum();

            let days_counted = if today > end {
                7
            } else {
                (today - start).num_days() as u8 + 1
            };

            WeeklyPoint {
                week: week_label(start),
                start_date: start.to_string(),
                end_date: end.to_string(),
                total: round_cents(total),
                days_counted,
                daily_average: round_cents(total / f64::from(days_counted)),
            }
        })
        .collect()
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn days_in_month(date: NaiveDate) -> u32 {
    let start = month_start(date);
    start
        .checked_add_months(Months::new(1))
        .map_or(31, |next| (next - start).num_days() as u32)
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}
