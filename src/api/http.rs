//! HTTP implementation of the repository traits.
//!
//! Transport details stay inside this module: paths, query encoding and
//! bearer auth never leak into the engine. Failure payloads of the shape
//! `{"message": ...}` are surfaced verbatim; anything else falls back to a
//! generic status message.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::api::types::{
    BudgetPatch, DailyLedgerResponse, DailyTransactionPatch, DefaultTransactionPatch,
    DefaultTransactionsResponse, ListResponse, MutationResponse, NewBudget, NewDailyTransaction,
    NewDefaultTransaction, NewPlan, NewPlanItem, PlanItemPatch, PlanPatch, PlanStatusPayload,
};
use crate::api::{
    BudgetRepository, DailyTransactionRepository, DefaultTransactionRepository,
    PlanItemRepository, PlanRepository,
};
use crate::config::service::ServiceConfig;
use crate::entities::{Budget, DailyTransaction, DefaultTransaction, Plan, PlanItem, PlanStatus};
use crate::errors::{Error, Result};

/// Error payload the remote service attaches to failed requests.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Repository implementation over the remote HTTP service.
#[derive(Debug, Clone)]
pub struct HttpDataService {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpDataService {
    /// Builds a client for the given base URL, without authentication.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_token(base_url, None)
    }

    /// Builds a client with an optional bearer token.
    pub fn with_token(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Builds a client from loaded service configuration.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        trace!("{method} {url}");
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends a request and decodes the JSON body, mapping non-2xx responses
    /// to [`Error::Remote`] with the payload message when one is present.
    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| format!("remote service returned status {status}"));
            debug!("remote failure {status}: {message}");
            return Err(Error::Remote {
                status: Some(status.as_u16()),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }

    /// Like [`Self::execute`] for endpoints that return no body.
    async fn execute_empty(&self, builder: RequestBuilder) -> Result<()> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| format!("remote service returned status {status}"));
            return Err(Error::Remote {
                status: Some(status.as_u16()),
                message,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PlanRepository for HttpDataService {
    async fn list_plans(&self, skip: u64, limit: u64) -> Result<ListResponse<Plan>> {
        self.execute(
            self.request(Method::GET, "/plans")
                .query(&[("skip", skip), ("limit", limit)]),
        )
        .await
    }

    async fn get_plan(&self, id: i64) -> Result<Plan> {
        self.execute(self.request(Method::GET, &format!("/plans/{id}")))
            .await
    }

    async fn create_plan(&self, draft: &NewPlan) -> Result<MutationResponse<Plan>> {
        self.execute(self.request(Method::POST, "/plans").json(draft))
            .await
    }

    async fn update_plan(&self, id: i64, patch: &PlanPatch) -> Result<MutationResponse<Plan>> {
        self.execute(
            self.request(Method::PATCH, &format!("/plans/{id}"))
                .json(patch),
        )
        .await
    }

    async fn delete_plan(&self, id: i64) -> Result<()> {
        self.execute_empty(self.request(Method::DELETE, &format!("/plans/{id}")))
            .await
    }

    async fn set_plan_status(
        &self,
        id: i64,
        status: PlanStatus,
    ) -> Result<MutationResponse<Plan>> {
        self.execute(
            self.request(Method::PATCH, &format!("/plans/{id}/status"))
                .json(&PlanStatusPayload { status }),
        )
        .await
    }
}

#[async_trait]
impl PlanItemRepository for HttpDataService {
    async fn list_plan_items(&self, plan_id: i64) -> Result<ListResponse<PlanItem>> {
        self.execute(self.request(Method::GET, &format!("/plans/{plan_id}/items")))
            .await
    }

    async fn get_plan_item(&self, id: i64) -> Result<PlanItem> {
        self.execute(self.request(Method::GET, &format!("/items/{id}")))
            .await
    }

    async fn create_plan_item(&self, draft: &NewPlanItem) -> Result<MutationResponse<PlanItem>> {
        self.execute(
            self.request(Method::POST, &format!("/plans/{}/items", draft.plan_id))
                .json(draft),
        )
        .await
    }

    async fn update_plan_item(
        &self,
        id: i64,
        patch: &PlanItemPatch,
    ) -> Result<MutationResponse<PlanItem>> {
        self.execute(
            self.request(Method::PATCH, &format!("/items/{id}"))
                .json(patch),
        )
        .await
    }

    async fn delete_plan_item(&self, id: i64) -> Result<()> {
        self.execute_empty(self.request(Method::DELETE, &format!("/items/{id}")))
            .await
    }
}

#[async_trait]
impl DailyTransactionRepository for HttpDataService {
    async fn daily_ledger(
        &self,
        plan_id: i64,
        item_id: i64,
        skip: u64,
        limit: u64,
    ) -> Result<DailyLedgerResponse> {
        self.execute(self.request(Method::GET, "/daily-transactions").query(&[
            ("planId", plan_id.to_string()),
            ("itemId", item_id.to_string()),
            ("skip", skip.to_string()),
            ("limit", limit.to_string()),
        ]))
        .await
    }

    async fn create_daily_transaction(
        &self,
        draft: &NewDailyTransaction,
    ) -> Result<MutationResponse<DailyTransaction>> {
        self.execute(self.request(Method::POST, "/daily-transactions").json(draft))
            .await
    }

    async fn update_daily_transaction(
        &self,
        id: i64,
        patch: &DailyTransactionPatch,
    ) -> Result<MutationResponse<DailyTransaction>> {
        self.execute(
            self.request(Method::PATCH, &format!("/daily-transactions/{id}"))
                .json(patch),
        )
        .await
    }

    async fn delete_daily_transaction(&self, id: i64) -> Result<()> {
        self.execute_empty(self.request(Method::DELETE, &format!("/daily-transactions/{id}")))
            .await
    }
}

#[async_trait]
impl DefaultTransactionRepository for HttpDataService {
    async fn default_transactions(
        &self,
        plan_id: i64,
        item_id: i64,
    ) -> Result<DefaultTransactionsResponse> {
        self.execute(self.request(Method::GET, "/default-transactions").query(&[
            ("planId", plan_id.to_string()),
            ("itemId", item_id.to_string()),
        ]))
        .await
    }

    async fn create_default_transaction(
        &self,
        draft: &NewDefaultTransaction,
    ) -> Result<MutationResponse<DefaultTransaction>> {
        self.execute(self.request(Method::POST, "/default-transactions").json(draft))
            .await
    }

    async fn update_default_transaction(
        &self,
        id: i64,
        patch: &DefaultTransactionPatch,
    ) -> Result<MutationResponse<DefaultTransaction>> {
        self.execute(
            self.request(Method::PATCH, &format!("/default-transactions/{id}"))
                .json(patch),
        )
        .await
    }

    async fn delete_default_transaction(&self, id: i64) -> Result<()> {
        self.execute_empty(self.request(Method::DELETE, &format!("/default-transactions/{id}")))
            .await
    }
}

#[async_trait]
impl BudgetRepository for HttpDataService {
    async fn list_budgets(&self, skip: u64, limit: u64) -> Result<ListResponse<Budget>> {
        self.execute(
            self.request(Method::GET, "/budgets")
                .query(&[("skip", skip), ("limit", limit)]),
        )
        .await
    }

    async fn get_budget(&self, id: i64) -> Result<Budget> {
        self.execute(self.request(Method::GET, &format!("/budgets/{id}")))
            .await
    }

    async fn create_budget(&self, draft: &NewBudget) -> Result<MutationResponse<Budget>> {
        self.execute(self.request(Method::POST, "/budgets").json(draft))
            .await
    }

    async fn update_budget(
        &self,
        id: i64,
        patch: &BudgetPatch,
    ) -> Result<MutationResponse<Budget>> {
        self.execute(
            self.request(Method::PATCH, &format!("/budgets/{id}"))
                .json(patch),
        )
        .await
    }

    async fn delete_budget(&self, id: i64) -> Result<()> {
        self.execute_empty(self.request(Method::DELETE, &format!("/budgets/{id}")))
            .await
    }
}
