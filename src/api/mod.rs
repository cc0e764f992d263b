//! Jupiter v6 报价 / Swap HTTP API 封装。

pub mod quote;
pub mod serde_helpers;
pub mod swap;
pub mod transaction_config;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::monitoring::prometheus_enabled;

pub use quote::{QuoteRequest, QuoteResponse, QuoteSummary, SwapMode};
pub use swap::{SwapRequest, SwapResponse};
pub use transaction_config::{
    DynamicSlippageSettings, PriorityLevel, PrioritizationFeeLamports, TransactionConfig,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Jupiter API 请求失败: {0}")]
    Http(#[from] reqwest::Error),
    #[error("请求 {endpoint} 超时（{timeout_ms}ms）")]
    Timeout {
        endpoint: String,
        timeout_ms: u64,
        #[source]
        source: reqwest::Error,
    },
    #[error("响应解析失败: {0}")]
    Json(#[from] serde_json::Error),
    #[error("请求 {endpoint} 返回状态 {status}: {body}")]
    ApiStatus {
        endpoint: String,
        status: StatusCode,
        body: String,
    },
    #[error("请求 {endpoint} 被限流，状态 {status}: {body}")]
    RateLimited {
        endpoint: String,
        status: StatusCode,
        body: String,
    },
    #[error("Jupiter 响应结构不符合预期: {0}")]
    Schema(String),
}

/// 报价 + Swap 两个端点的抽象，swap 流程经由它触网，测试里可以替换为桩实现。
#[async_trait]
pub trait SwapApi: Send + Sync {
    async fn quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, ApiError>;
    async fn swap(&self, request: &SwapRequest) -> Result<SwapResponse, ApiError>;
}

#[derive(Clone, Debug)]
pub struct SwapApiClient {
    base_url: String,
    client: reqwest::Client,
    request_timeout: Duration,
}

impl SwapApiClient {
    pub fn new(client: reqwest::Client, base_url: String, request_timeout_ms: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            request_timeout: Duration::from_millis(request_timeout_ms),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_json(
        &self,
        endpoint: String,
        response: reqwest::Response,
        stage: &'static str,
    ) -> Result<Value, ApiError> {
        let status = response.status();
        let body = response.text().await.map_err(|err| {
            if err.is_timeout() {
                ApiError::Timeout {
                    endpoint: endpoint.clone(),
                    timeout_ms: self.request_timeout.as_millis() as u64,
                    source: err,
                }
            } else {
                ApiError::from(err)
            }
        })?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            let summary = summarize_error_body(body);
            record_api_metrics(stage, "rate_limited", None);
            warn!(
                target: "api",
                endpoint = %endpoint,
                status = status.as_u16(),
                body = %summary,
                "Jupiter 请求命中限流"
            );
            return Err(ApiError::RateLimited {
                endpoint,
                status,
                body: summary,
            });
        }

        if !status.is_success() {
            let summary = summarize_error_body(body);
            record_api_metrics(stage, "http_error", None);
            warn!(
                target: "api",
                endpoint = %endpoint,
                status = status.as_u16(),
                body = %summary,
                "Jupiter 返回非 200 状态"
            );
            return Err(ApiError::ApiStatus {
                endpoint,
                status,
                body: summary,
            });
        }

        serde_json::from_str(&body).map_err(|err| {
            record_api_metrics(stage, "decode_error", None);
            warn!(
                target: "api",
                endpoint = %endpoint,
                error = %err,
                "Jupiter 响应 JSON 解析失败"
            );
            ApiError::Json(err)
        })
    }
}

#[async_trait]
impl SwapApi for SwapApiClient {
    async fn quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, ApiError> {
        let url = self.endpoint("/quote");
        let started = Instant::now();

        trace!(
            target: "api::quote",
            input_mint = %request.input_mint,
            output_mint = %request.output_mint,
            amount = request.amount,
            slippage_bps = request.slippage_bps,
            only_direct_routes = ?request.only_direct_routes,
            as_legacy_transaction = ?request.as_legacy_transaction,
            "开始请求 Jupiter 报价"
        );

        let response = self
            .client
            .get(&url)
            .timeout(self.request_timeout)
            .query(&request.to_query_params())
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    record_api_metrics("quote", "timeout", None);
                    ApiError::Timeout {
                        endpoint: url.clone(),
                        timeout_ms: self.request_timeout.as_millis() as u64,
                        source: err,
                    }
                } else {
                    record_api_metrics("quote", "transport_error", None);
                    ApiError::from(err)
                }
            })?;

        let json = self.read_json(url.clone(), response, "quote").await?;
        let quote = QuoteResponse::try_from_value(json).map_err(|err| {
            record_api_metrics("quote", "schema_error", None);
            ApiError::Schema(format!("解析报价响应失败: {err}"))
        })?;

        let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;
        record_api_metrics("quote", "success", Some(elapsed_ms));
        debug!(
            target: "api::quote",
            elapsed_ms = format_args!("{elapsed_ms:.3}"),
            in_amount = quote.summary().in_amount,
            out_amount = quote.summary().out_amount,
            "报价请求完成"
        );

        Ok(quote)
    }

    async fn swap(&self, request: &SwapRequest) -> Result<SwapResponse, ApiError> {
        let url = self.endpoint("/swap");
        let started = Instant::now();

        let payload = serde_json::to_value(request)
            .map_err(|err| ApiError::Schema(format!("序列化 swap 请求失败: {err}")))?;
        trace!(target: "api::swap", payload = %payload, "即将请求 Jupiter swap 交易");

        let response = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    record_api_metrics("swap", "timeout", None);
                    ApiError::Timeout {
                        endpoint: url.clone(),
                        timeout_ms: self.request_timeout.as_millis() as u64,
                        source: err,
                    }
                } else {
                    record_api_metrics("swap", "transport_error", None);
                    ApiError::from(err)
                }
            })?;

        let json = self.read_json(url.clone(), response, "swap").await?;
        let swap = SwapResponse::try_from_value(json).map_err(|err| {
            record_api_metrics("swap", "schema_error", None);
            ApiError::Schema(format!("解析 swap 响应失败: {err}"))
        })?;

        let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;
        record_api_metrics("swap", "success", Some(elapsed_ms));
        debug!(
            target: "api::swap",
            elapsed_ms = format_args!("{elapsed_ms:.3}"),
            last_valid_block_height = ?swap.last_valid_block_height,
            "swap 交易请求完成"
        );

        Ok(swap)
    }
}

fn record_api_metrics(stage: &'static str, status: &'static str, elapsed_ms: Option<f64>) {
    if !prometheus_enabled() {
        return;
    }
    counter!("juno_api_requests_total", "stage" => stage, "status" => status).increment(1);
    if let Some(value) = elapsed_ms {
        histogram!("juno_api_latency_ms", "stage" => stage).record(value);
    }
}

fn summarize_error_body(body: String) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "(empty response body)".to_string();
    }
    let mut single_line = trimmed.replace(['\n', '\r'], " ");
    const MAX_LEN: usize = 512;
    if single_line.len() > MAX_LEN {
        single_line.truncate(MAX_LEN);
        single_line.push('…');
    }
    single_line
}
