//! HTTP探测器实现
//!
//! 对目标URL发起GET请求，传输失败时按固定间隔重试，并记录成功那次尝试的耗时

use crate::error::ProbeError;
use crate::health::result::ProbeResult;
use crate::health::retry::{run_with_retry, RetryPolicy};
use crate::logging::REPORT_TARGET;
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// 探测器trait，定义单轮探测接口
#[async_trait]
pub trait HealthChecker: Send + Sync {
    /// 执行一轮探测（包含重试）
    ///
    /// # 参数
    /// * `url` - 目标URL
    ///
    /// # 返回
    /// * `ProbeResult` - 成功或重试耗尽的结果，本轮错误不会向外传播
    async fn check(&self, url: &str) -> ProbeResult;
}

/// HTTP探测器实现
pub struct HttpHealthChecker {
    /// HTTP客户端
    client: Client,
    /// 重试策略
    retry_policy: RetryPolicy,
}

impl HttpHealthChecker {
    /// 创建新的HTTP探测器
    ///
    /// # 参数
    /// * `timeout` - 单次请求超时时间
    /// * `retry_policy` - 重试策略
    pub fn new(timeout: Duration, retry_policy: RetryPolicy) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .build()
            .map_err(ProbeError::ClientBuild)?;

        Ok(Self {
            client,
            retry_policy,
        })
    }

    /// 当前重试策略
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }

    /// 执行单次GET请求
    ///
    /// 只有请求成功完成时才读取响应，响应在本函数返回前释放。
    async fn perform_request(&self, url: &str) -> Result<(u16, Duration), ProbeError> {
        let start_time = Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ProbeError::Transport {
                message: format_request_error(&source),
                source,
            })?;

        let response_time = start_time.elapsed();
        let status_code = response.status().as_u16();
        drop(response);

        Ok((status_code, response_time))
    }
}

#[async_trait]
impl HealthChecker for HttpHealthChecker {
    async fn check(&self, url: &str) -> ProbeResult {
        let policy = self.retry_policy;

        let outcome = run_with_retry(
            policy,
            |attempt| {
                debug!("探测 {} 第 {} 次尝试", url, attempt);
                self.perform_request(url)
            },
            |attempt, error| {
                warn!(
                    target: REPORT_TARGET,
                    "attempt {} of {} failed for {}: {}, retrying in {:?}...",
                    attempt, policy.max_attempts, url, error, policy.backoff
                );
            },
        )
        .await;

        match outcome {
            Ok(succeeded) => {
                let (status_code, response_time) = succeeded.value;
                ProbeResult::success(url, status_code, response_time)
                    .with_attempts(succeeded.attempt)
            }
            Err(exhausted) => ProbeResult::exhausted(url, exhausted.error.to_string())
                .with_attempts(exhausted.attempts),
        }
    }
}

/// 格式化请求错误信息，使其更加清晰易读
fn format_request_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        let chain = error_chain(error);
        if chain.contains("dns") || chain.contains("failed to lookup address") {
            "DNS resolution failed".to_string()
        } else {
            "Connection refused".to_string()
        }
    } else if error.is_builder() {
        format!("Invalid request: {error}")
    } else {
        let chain = error_chain(error);
        if chain.contains("certificate") || chain.contains("tls") || chain.contains("ssl") {
            "SSL/TLS certificate error".to_string()
        } else {
            format!("Request failed: {chain}")
        }
    }
}

/// 拼接错误及其所有 source
fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
