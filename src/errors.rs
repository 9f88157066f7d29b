use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    Json,
};
use serde_json::json;

/// Rejections raised by operations on the budget record. The record is
/// left untouched whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BudgetError {
    #[error("amount must be a positive number, got {0}")]
    InvalidAmount(f64),

    #[error("{0} must be a non-negative number")]
    NegativeValue(&'static str),

    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    #[error("'{0}' is not a YYYY-MM-DD date")]
    InvalidDate(String),

    #[error("category '{0}' does not exist")]
    UnknownCategory(String),

    #[error("category '{0}' already exists")]
    DuplicateCategory(String),

    #[error("transaction {0} not found")]
    TransactionNotFound(u64),

    #[error("recurring transaction {0} not found")]
    RecurringNotFound(u64),

    #[error("savings goal {0} not found")]
    GoalNotFound(u64),

    #[error("savings account {0} not found")]
    AccountNotFound(u64),

    #[error("template {0} not found")]
    TemplateNotFound(u64),

    #[error("cannot withdraw {requested} from an account holding {available}")]
    InsufficientFunds { requested: f64, available: f64 },

    #[error("month {0} has already been closed")]
    MonthAlreadyClosed(String),

    #[error("month {0} is closed; transactions dated in it cannot change")]
    MonthClosed(String),

    #[error("no ids left to allocate")]
    IdSpaceExhausted,
}

impl BudgetError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::TransactionNotFound(_)
            | Self::RecurringNotFound(_)
            | Self::GoalNotFound(_)
            | Self::AccountNotFound(_)
            | Self::TemplateNotFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateCategory(_)
            | Self::MonthAlreadyClosed(_)
            | Self::MonthClosed(_)
            | Self::IdSpaceExhausted => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<BudgetError> for AppError {
    fn from(err: BudgetError) -> Self {
        Self {
            status: err.status(),
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, "{}", self.message);
        }
        let body = Json(json!({ "success": false, "error": self.message }));
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_errors_map_to_http_status() {
        assert_eq!(BudgetError::TransactionNotFound(4).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            BudgetError::DuplicateCategory("food".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(BudgetError::InvalidAmount(0.0).status(), StatusCode::BAD_REQUEST);
        assert_eq!(BudgetError::MonthClosed("2026-01".into()).status(), StatusCode::CONFLICT);
        assert_eq!(BudgetError::IdSpaceExhausted.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn app_error_keeps_budget_message() {
        let err = AppError::from(BudgetError::UnknownCategory("rent".into()));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "category 'rent' does not exist");
    }
}
