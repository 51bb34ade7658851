//! HTTP gateway client.
//!
//! Talks to an RPC endpoint that fronts the gateway contract. State-changing
//! methods go through `POST {base}/call/{contract}/{method}`, read-only
//! views through `POST {base}/view/{contract}/{method}`; bodies and
//! responses are JSON.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::gateway::{Gateway, GatewayError};
use crate::types::{CallOutcome, Job, Receipt, RequestJobArgs, ResultSubmission};

#[derive(Clone)]
pub struct HttpGateway {
    base: String,
    contract_id: String,
    client: Client,
}

impl HttpGateway {
    pub fn new(base: impl Into<String>, contract_id: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        HttpGateway {
            base: base.into(),
            contract_id: contract_id.into(),
            client,
        }
    }

    fn call_url(&self, method: &str) -> String {
        format!(
            "{}/call/{}/{}",
            self.base.trim_end_matches('/'),
            self.contract_id,
            method
        )
    }

    fn view_url(&self, method: &str) -> String {
        format!(
            "{}/view/{}/{}",
            self.base.trim_end_matches('/'),
            self.contract_id,
            method
        )
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let resp = self.client.post(url).json(body).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(resp.json::<T>().await?)
        } else {
            let message = resp.text().await.unwrap_or_default();
            Err(GatewayError::Call {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn request_job(&self, args: &RequestJobArgs) -> Result<CallOutcome, GatewayError> {
        self.post_json(&self.call_url("request_job"), args).await
    }

    async fn get_pending_jobs(&self, limit: u32) -> Result<Vec<Job>, GatewayError> {
        let body = serde_json::json!({ "limit": limit });
        self.post_json(&self.view_url("get_pending_jobs"), &body).await
    }

    async fn submit_result(&self, submission: &ResultSubmission) -> Result<(), GatewayError> {
        let resp = self
            .client
            .post(self.call_url("submit_result"))
            .json(submission)
            .send()
            .await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            let message = resp.text().await.unwrap_or_default();
            Err(GatewayError::Call {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn get_receipt(&self, job_id: &str) -> Result<Option<Receipt>, GatewayError> {
        let body = serde_json::json!({ "job_id": job_id });
        // The view returns JSON `null` while the job is unsettled.
        self.post_json(&self.view_url("get_receipt"), &body).await
    }
}
