pub mod analytics;
pub mod app;
pub mod budget;
pub mod client;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod history;
pub mod models;
pub mod recurring;
pub mod savings;
pub mod state;
pub mod storage;
pub mod templates;

pub use app::router;
pub use client::{ApiClient, ClientError};
pub use config::Config;
pub use errors::{AppError, BudgetError};
pub use models::BudgetData;
pub use state::AppState;
pub use storage::load_data;
