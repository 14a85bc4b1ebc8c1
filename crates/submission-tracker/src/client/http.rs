//! 基于 reqwest 的判题 API 客户端。

use async_trait::async_trait;
use judge_watch_api_types::{
    ErrorResponse, SubmissionResponse, SubmitRequest, SubmitResponse, TestCaseResultDto,
};
use judge_watch_core::domain::{
    JudgeApi, JudgeApiError, SubmissionId, SubmissionMetrics, SubmissionRequest,
    SubmissionSnapshot, SubmitReceipt, TestCaseResult, Verdict,
};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{Result, TrackerError};

/// 通过 HTTP 调用判题后端。
///
/// 客户端本身不做重试，重试策略由调用方决定。
#[derive(Debug, Clone)]
pub struct HttpJudgeClient {
    client: Client,
    base_url: Url,
    access_token: Option<String>,
}

impl HttpJudgeClient {
    /// 创建客户端。`base_url` 必须是合法的 http(s) 地址。
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim()).map_err(|err| {
            TrackerError::Config(format!("invalid api.base_url '{}': {err}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(TrackerError::Config(format!(
                "api.base_url '{}' cannot be used as a base url",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| TrackerError::Config(format!("failed to build http client: {err}")))?;

        Ok(Self {
            client,
            base_url,
            access_token: config
                .access_token
                .clone()
                .filter(|token| !token.trim().is_empty()),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> std::result::Result<T, JudgeApiError> {
        let request = match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|error| error.error)
                .unwrap_or_else(|_| {
                    if body.trim().is_empty() {
                        status.canonical_reason().unwrap_or("request failed").to_string()
                    } else {
                        body
                    }
                });
            return Err(JudgeApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response.json::<T>().await.map_err(map_reqwest_error)
    }
}

#[async_trait]
impl JudgeApi for HttpJudgeClient {
    async fn submit(
        &self,
        request: &SubmissionRequest,
    ) -> std::result::Result<SubmitReceipt, JudgeApiError> {
        let body = SubmitRequest {
            slug: request.problem.as_str().to_string(),
            code: request.source_code.as_str().to_string(),
            language: request.language.as_str().to_string(),
        };

        let url = self.endpoint(&["submissions"]);
        debug!(%url, "POST submission");
        let response: SubmitResponse = self.send(self.client.post(url).json(&body)).await?;
        receipt_from_wire(response)
    }

    async fn get_submission(
        &self,
        id: &SubmissionId,
    ) -> std::result::Result<SubmissionSnapshot, JudgeApiError> {
        let url = self.endpoint(&["submissions", id.as_str()]);
        debug!(%url, "GET submission");
        let response: SubmissionResponse = self.send(self.client.get(url)).await?;
        snapshot_from_wire(response)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> JudgeApiError {
    if err.is_timeout() {
        JudgeApiError::Timeout
    } else if err.is_decode() {
        JudgeApiError::Decode(err.to_string())
    } else {
        JudgeApiError::Transport(err.to_string())
    }
}

fn wire_id(raw: String) -> std::result::Result<SubmissionId, JudgeApiError> {
    SubmissionId::new(raw).map_err(|err| JudgeApiError::Decode(err.to_string()))
}

fn receipt_from_wire(
    response: SubmitResponse,
) -> std::result::Result<SubmitReceipt, JudgeApiError> {
    Ok(SubmitReceipt {
        id: wire_id(response.id)?,
        verdict: Verdict::parse(&response.verdict),
        message: response.message,
    })
}

fn snapshot_from_wire(
    response: SubmissionResponse,
) -> std::result::Result<SubmissionSnapshot, JudgeApiError> {
    let metrics = SubmissionMetrics {
        execution_time_ms: response.execution_time,
        memory_used_kb: response.memory_used,
        score: response.score,
        tests_passed: response.tests_passed,
        tests_failed: response.tests_failed,
    };

    Ok(SubmissionSnapshot {
        id: wire_id(response.id)?,
        verdict: Verdict::parse(&response.verdict),
        metrics,
        test_results: response
            .test_results
            .unwrap_or_default()
            .into_iter()
            .map(test_result_from_wire)
            .collect(),
        language: response.language,
        submitted_at: response.submitted_at,
        judged_at: response.judged_at,
    })
}

fn test_result_from_wire(dto: TestCaseResultDto) -> TestCaseResult {
    TestCaseResult {
        id: dto.id,
        verdict: Verdict::parse(&dto.verdict),
        execution_time_ms: dto.execution_time,
        memory_used_kb: dto.memory_used,
        output: dto.output,
        error_message: dto.error_message,
    }
}
