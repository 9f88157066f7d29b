use crate::analytics::AnalyticsReport;
use crate::budget::IntegrityReport;
use crate::errors::BudgetError;
use crate::models::{
    BudgetData, CloseMonthResponse, MonthlySnapshot, ProcessedRecurringResponse, SuccessResponse,
    Transaction, TransactionRequest, TransactionResponse,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error(transparent)]
    Budget(#[from] BudgetError),
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn load(&self) -> Result<BudgetData, ClientError> {
        let response = self.http.get(self.url("/api/data")).send().await?;
        decode(response).await
    }

    pub async fn save(&self, data: &BudgetData) -> Result<(), ClientError> {
        let response = self.http.post(self.url("/api/data")).json(data).send().await?;
        let _: SuccessResponse = decode(response).await?;
        Ok(())
    }

    /// Loads the record, applies `change` locally and saves the result. A
    /// rejected change is returned without saving anything.
    pub async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut BudgetData) -> Result<T, BudgetError>,
    ) -> Result<T, ClientError> {
        let mut data = self.load().await?;
        let value = change(&mut data)?;
        self.save(&data).await?;
        Ok(value)
    }

    pub async fn add_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<Transaction, ClientError> {
        let response = self
            .http
            .post(self.url("/api/transactions"))
            .json(request)
            .send()
            .await?;
        let body: TransactionResponse = decode(response).await?;
        Ok(body.transaction)
    }

    pub async fn update_transaction(
        &self,
        id: u64,
        request: &TransactionRequest,
    ) -> Result<Transaction, ClientError> {
        let response = self
            .http
            .put(self.url(&format!("/api/transactions/{id}")))
            .json(request)
            .send()
            .await?;
        let body: TransactionResponse = decode(response).await?;
        Ok(body.transaction)
    }

    pub async fn delete_transaction(&self, id: u64) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/api/transactions/{id}")))
            .send()
            .await?;
        let _: SuccessResponse = decode(response).await?;
        Ok(())
    }

    pub async fn analytics(&self) -> Result<AnalyticsReport, ClientError> {
        let response = self.http.get(self.url("/api/analytics")).send().await?;
        decode(response).await
    }

    pub async fn integrity(&self) -> Result<IntegrityReport, ClientError> {
        let response = self.http.get(self.url("/api/integrity")).send().await?;
        decode(response).await
    }

    pub async fn process_recurring(&self) -> Result<Vec<Transaction>, ClientError> {
        let response = self
            .http
            .post(self.url("/api/recurring/process"))
            .send()
            .await?;
        let body: ProcessedRecurringResponse = decode(response).await?;
        Ok(body.transactions)
    }

    pub async fn close_month(&self, month: &str) -> Result<MonthlySnapshot, ClientError> {
        let response = self
            .http
            .post(self.url(&format!("/api/months/{month}/close")))
            .send()
            .await?;
        let body: CloseMonthResponse = decode(response).await?;
        Ok(body.snapshot)
    }
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    error: String,
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
