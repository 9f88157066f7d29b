use crate::errors::AppError;
use crate::models::BudgetData;
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

/// Reads the budget record. A missing file starts an empty record; an
/// unreadable or corrupt one is logged and also starts empty.
pub async fn load_data(path: &Path) -> BudgetData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!(path = %path.display(), "failed to parse data file: {err}");
                BudgetData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no data file yet, starting empty");
            BudgetData::default()
        }
        Err(err) => {
            error!(path = %path.display(), "failed to read data file: {err}");
            BudgetData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &BudgetData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}
