//! Hosted ledger reached over a PostgREST-style HTTP interface.
//!
//! Tables live under `{base_url}/rest/v1/{table}`. Filters use the
//! `column=eq.value` syntax, inserts ask for the stored row back with
//! `Prefer: return=representation`, and every request carries the project
//! key in both the `apikey` and `Authorization` headers.

use async_trait::async_trait;
use debtbook_types::{
    DebtId, DebtRow, DebtorId, DebtorRow, NewDebt, NewDebtor, NewPayment, OwnerRef, PaymentId,
    PaymentRow,
};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};
use crate::traits::LedgerBackend;

const DEBTORS: &str = "debtors";
const DEBTS: &str = "debts";
const PAYMENTS: &str = "payments";

/// Connection settings for [`RestBackend`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestConfig {
    /// Project URL, e.g. `https://example.supabase.co`.
    pub base_url: String,
    pub api_key: String,
    /// Whether the database deletes debts and payments with their debtor
    /// (`ON DELETE CASCADE` on the foreign keys).
    #[serde(default = "default_cascades")]
    pub cascades: bool,
}

fn default_cascades() -> bool {
    true
}

/// A [`LedgerBackend`] backed by a hosted REST data service.
#[derive(Clone, Debug)]
pub struct RestBackend {
    client: reqwest::Client,
    config: RestConfig,
}

impl RestBackend {
    pub fn new(config: RestConfig) -> StorageResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| StorageError::Unavailable(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Use a preconfigured HTTP client (proxy, TLS, or timeout settings).
    pub fn with_client(config: RestConfig, client: reqwest::Client) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            table
        )
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    async fn select<T: DeserializeOwned + Send>(
        &self,
        table: &'static str,
        filters: &[(&str, String)],
        order: &str,
    ) -> StorageResult<Vec<T>> {
        let mut query: Vec<(&str, String)> = vec![("select", "*".into()), ("order", order.into())];
        query.extend(filters.iter().cloned());

        debug!(table, ?filters, "select");
        let response = send(self.request(Method::GET, table).query(&query)).await?;
        decode(table, response).await
    }

    async fn insert<B: Serialize + Sync, T: DeserializeOwned + Send>(
        &self,
        table: &'static str,
        body: &B,
    ) -> StorageResult<T> {
        debug!(table, "insert");
        let request = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&[body]);
        let rows: Vec<T> = decode(table, send(request).await?).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StorageError::malformed(table, "insert returned no row"))
    }

    async fn delete(&self, table: &'static str, id: &str) -> StorageResult<bool> {
        debug!(table, id, "delete");
        let request = self
            .request(Method::DELETE, table)
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{id}"))]);
        let rows: Vec<serde_json::Value> = decode(table, send(request).await?).await?;
        Ok(!rows.is_empty())
    }
}

async fn send(request: RequestBuilder) -> StorageResult<Response> {
    let response = request
        .send()
        .await
        .map_err(|e| StorageError::Unavailable(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), %message, "collaborator rejected request");
    Err(StorageError::Rejected {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(table: &'static str, response: Response) -> StorageResult<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| StorageError::Unavailable(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| StorageError::malformed(table, e))
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

#[async_trait]
impl LedgerBackend for RestBackend {
    async fn select_debtors(&self, owner: Option<&OwnerRef>) -> StorageResult<Vec<DebtorRow>> {
        let filters: Vec<(&str, String)> = owner
            .map(|o| vec![("owner_ref", eq(o.as_str()))])
            .unwrap_or_default();
        self.select(DEBTORS, &filters, "created_at.desc").await
    }

    async fn select_debts(&self, debtor_id: &DebtorId) -> StorageResult<Vec<DebtRow>> {
        self.select(DEBTS, &[("debtor_id", eq(debtor_id.as_str()))], "created_at.desc")
            .await
    }

    async fn select_payments(&self, debtor_id: &DebtorId) -> StorageResult<Vec<PaymentRow>> {
        self.select(PAYMENTS, &[("debtor_id", eq(debtor_id.as_str()))], "date.desc")
            .await
    }

    async fn insert_debtor(&self, debtor: &NewDebtor) -> StorageResult<DebtorRow> {
        self.insert(DEBTORS, debtor).await
    }

    async fn insert_debt(&self, debt: &NewDebt) -> StorageResult<DebtRow> {
        self.insert(DEBTS, debt).await
    }

    async fn insert_payment(&self, payment: &NewPayment) -> StorageResult<PaymentRow> {
        self.insert(PAYMENTS, payment).await
    }

    async fn delete_debtor(&self, id: &DebtorId) -> StorageResult<bool> {
        self.delete(DEBTORS, id.as_str()).await
    }

    async fn delete_debt(&self, id: &DebtId) -> StorageResult<bool> {
        self.delete(DEBTS, id.as_str()).await
    }

    async fn delete_payment(&self, id: &PaymentId) -> StorageResult<bool> {
        self.delete(PAYMENTS, id.as_str()).await
    }

    fn cascades_deletes(&self) -> bool {
        self.config.cascades
    }
}
