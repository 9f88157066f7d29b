use crate::errors::AppError;
use crate::models::BudgetData;
use crate::storage::persist_data;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<BudgetData>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: BudgetData) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
        }
    }

    /// Applies `change` to the record under the lock and saves the whole
    /// record. On a rejected change nothing is written; on a failed save the
    /// in-memory record is rolled back.
    pub async fn mutate<T, E>(
        &self,
        change: impl FnOnce(&mut BudgetData) -> Result<T, E>,
    ) -> Result<T, AppError>
    where
        AppError: From<E>,
    {
        let mut data = self.data.lock().await;
        let before = data.clone();
        let value = change(&mut *data)?;
        if let Err(err) = persist_data(&self.data_path, &data).await {
            *data = before;
            return Err(err);
        }
        Ok(value)
    }
}
