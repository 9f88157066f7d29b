use crate::budget::{add_transaction, check_amount, next_id};
use crate::errors::BudgetError;
use crate::models::{BudgetData, Transaction, TransactionRequest, TransactionTemplate};
use chrono::NaiveDate;

pub fn add_template(
    data: &mut BudgetData,
    name: &str,
    category: &str,
    amount: f64,
    description: &str,
) -> Result<TransactionTemplate, BudgetError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BudgetError::EmptyField("template name"));
    }
    let amount = check_amount(amount)?;
    if !data.categories.contains_key(category) {
        return Err(BudgetError::UnknownCategory(category.to_string()));
    }

    let template = TransactionTemplate {
        id: next_id(data.transaction_templates.iter().map(|t| t.id))?,
        name: name.to_string(),
        category: category.to_string(),
        amount,
        description: description.trim().to_string(),
    };
    data.transaction_templates.push(template.clone());
    Ok(template)
}

pub fn remove_template(data: &mut BudgetData, id: u64) -> Result<TransactionTemplate, BudgetError> {
    let index = data
        .transaction_templates
        .iter()
        .position(|t| t.id == id)
        .ok_or(BudgetError::TemplateNotFound(id))?;
    Ok(data.transaction_templates.remove(index))
}

/// Records a transaction from a saved template, dated `today`.
pub fn apply_template(
    data: &mut BudgetData,
    id: u64,
    today: NaiveDate,
) -> Result<Transaction, BudgetError> {
    let template = data
        .transaction_templates
        .iter()
        .find(|t| t.id == id)
        .ok_or(BudgetError::TemplateNotFound(id))?;
    let request = TransactionRequest::new(
        template.category.clone(),
        template.amount,
        template.description.clone(),
    );
    add_transaction(data, request, today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::add_category;

    #[test]
    fn applying_a_template_records_a_transaction() {
        let mut data = BudgetData::default();
        add_category(&mut data, "coffee", "Coffee", 60.0, None).unwrap();
        let template = add_template(&mut data, "Flat white", "coffee", 4.5, "cafe").unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();

        let tx = apply_template(&mut data, template.id, today).unwrap();
        apply_template(&mut data, template.id, today).unwrap();

        assert_eq!(tx.description, "cafe");
        assert_eq!(data.transactions.len(), 2);
        assert_eq!(data.categories["coffee"].spent, 9.0);
    }

    #[test]
    fn template_for_removed_category_fails_cleanly() {
        let mut data = BudgetData::default();
        add_category(&mut data, "coffee", "Coffee", 60.0, None).unwrap();
        let template = add_template(&mut data, "Flat white", "coffee", 4.5, "").unwrap();
        data.categories.clear();

        let today = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        assert_eq!(
            apply_template(&mut data, template.id, today),
            Err(BudgetError::UnknownCategory("coffee".into()))
        );
        assert!(data.transactions.is_empty());

        remove_template(&mut data, template.id).unwrap();
        assert_eq!(
            apply_template(&mut data, template.id, today),
            Err(BudgetError::TemplateNotFound(template.id))
        );
    }
}
