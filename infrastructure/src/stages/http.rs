//! Remote stage: delegates one loan to an HTTP service
//!
//! The service receives `{ loan_id, parameter, attempt }` and answers
//! `{ status: "success" | "no_data" | "failure", detail?, transcript? }`.

use async_trait::async_trait;
use loanflow_application::ports::stage::{Stage, StageContext, StageError};
use loanflow_domain::{StageReport, StageVerdict};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct RemoteStageRequest<'a> {
    loan_id: &'a str,
    parameter: Option<u32>,
    attempt: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RemoteStatus {
    Success,
    NoData,
    Failure,
}

#[derive(Debug, Deserialize)]
struct RemoteStageResponse {
    status: RemoteStatus,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    transcript: String,
}

impl RemoteStageResponse {
    fn into_report(self) -> StageReport {
        let detail = self.detail.filter(|d| !d.trim().is_empty());
        let verdict = match self.status {
            RemoteStatus::Success => StageVerdict::Success,
            RemoteStatus::NoData => {
                StageVerdict::NoData(detail.unwrap_or_else(|| "no applicable data".to_string()))
            }
            RemoteStatus::Failure => {
                StageVerdict::Failure(detail.unwrap_or_else(|| "remote stage failed".to_string()))
            }
        };
        StageReport::new(verdict, self.transcript)
    }
}

/// Stage served by a remote endpoint.
#[derive(Debug, Clone)]
pub struct HttpStage {
    name: String,
    url: String,
    client: reqwest::Client,
}

impl HttpStage {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Stage for HttpStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &StageContext) -> Result<StageReport, StageError> {
        debug!("Stage {}: POST {} for loan {}", self.name, self.url, ctx.loan_id);
        let request = RemoteStageRequest {
            loan_id: ctx.loan_id.as_str(),
            parameter: ctx.parameter,
            attempt: ctx.attempt,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| StageError::Remote(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StageError::Remote(format!("HTTP {}: {}", status, body.trim())));
        }

        let body: RemoteStageResponse = response
            .json()
            .await
            .map_err(|e| StageError::Remote(format!("invalid response: {}", e)))?;
        Ok(body.into_report())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> StageReport {
        serde_json::from_str::<RemoteStageResponse>(json)
            .unwrap()
            .into_report()
    }

    #[test]
    fn test_success_response() {
        let report = parse(r#"{"status": "success", "transcript": "3 documents"}"#);
        assert_eq!(report.verdict, StageVerdict::Success);
        assert_eq!(report.transcript, "3 documents");
    }

    #[test]
    fn test_no_data_response() {
        let report = parse(r#"{"status": "no_data", "detail": "No paystub or W2 documents found"}"#);
        assert_eq!(
            report.verdict,
            StageVerdict::NoData("No paystub or W2 documents found".to_string())
        );
    }

    #[test]
    fn test_failure_without_detail() {
        let report = parse(r#"{"status": "failure"}"#);
        assert_eq!(
            report.verdict,
            StageVerdict::Failure("remote stage failed".to_string())
        );
    }

    #[test]
    fn test_request_shape() {
        let request = RemoteStageRequest {
            loan_id: "L1",
            parameter: Some(3),
            attempt: 1,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"loan_id": "L1", "parameter": 3, "attempt": 1})
        );
    }
}
