//! 探测结果数据结构
//!
//! 每轮探测产生一个结果，写入日志后即丢弃

use std::time::Duration;

/// 单轮探测结果
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    /// 目标URL
    pub url: String,
    /// HTTP状态码，传输失败时为空
    pub status_code: Option<u16>,
    /// 成功那次尝试的耗时，失败时为0
    pub response_time: Duration,
    /// 本轮消耗的尝试次数
    pub attempts: u32,
    /// 重试耗尽时的最后错误
    pub error: Option<String>,
}

impl ProbeResult {
    /// 创建成功结果（收到任意HTTP响应即视为成功）
    pub fn success(url: impl Into<String>, status_code: u16, response_time: Duration) -> Self {
        Self {
            url: url.into(),
            status_code: Some(status_code),
            response_time,
            attempts: 1,
            error: None,
        }
    }

    /// 创建重试耗尽的失败结果
    pub fn exhausted(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status_code: None,
            response_time: Duration::ZERO,
            attempts: 1,
            error: Some(error.into()),
        }
    }

    /// 设置尝试次数
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// 设置响应时间
    pub fn with_response_time(mut self, response_time: Duration) -> Self {
        self.response_time = response_time;
        self
    }

    /// 是否收到了HTTP响应
    pub fn is_success(&self) -> bool {
        self.status_code.is_some() && self.error.is_none()
    }

    /// 延迟是否严格超过阈值（秒）
    pub fn exceeds_threshold(&self, threshold_secs: f64) -> bool {
        self.is_success() && self.response_time.as_secs_f64() > threshold_secs
    }

    /// 获取响应时间（毫秒）
    pub fn response_time_ms(&self) -> u64 {
        self.response_time.as_millis() as u64
    }

    /// 写入探测日志的消息正文，时间戳和级别由日志sink添加
    ///
    /// 仅对成功结果有意义。
    pub fn log_message(&self) -> Option<String> {
        match (self.status_code, &self.error) {
            (Some(code), None) => Some(format!("Checked {}, Status: {}", self.url, code)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_result() {
        let result = ProbeResult::success(
            "http://localhost/health",
            200,
            Duration::from_millis(120),
        )
        .with_attempts(2);

        assert!(result.is_success());
        assert_eq!(result.attempts, 2);
        assert_eq!(result.response_time_ms(), 120);
        assert_eq!(
            result.log_message().as_deref(),
            Some("Checked http://localhost/health, Status: 200")
        );
    }

    #[test]
    fn test_server_error_status_is_still_success() {
        let result = ProbeResult::success("http://localhost", 503, Duration::from_millis(5));
        assert!(result.is_success());
        assert_eq!(
            result.log_message().as_deref(),
            Some("Checked http://localhost, Status: 503")
        );
    }

    #[test]
    fn test_exhausted_result_has_no_log_message() {
        let result = ProbeResult::exhausted("http://localhost", "Connection refused").with_attempts(3);

        assert!(!result.is_success());
        assert_eq!(result.status_code, None);
        assert_eq!(result.attempts, 3);
        assert_eq!(result.error.as_deref(), Some("Connection refused"));
        assert!(result.log_message().is_none());
    }

    #[test]
    fn test_exceeds_threshold_is_strict() {
        let result = ProbeResult::success("http://localhost", 200, Duration::from_millis(500));
        assert!(!result.exceeds_threshold(0.5));
        assert!(result.exceeds_threshold(0.499));
        assert!(!result.exceeds_threshold(1.0));
    }

    #[test]
    fn test_exhausted_never_exceeds_threshold() {
        let result = ProbeResult::exhausted("http://localhost", "timeout")
            .with_response_time(Duration::from_secs(30));
        assert!(!result.exceeds_threshold(0.5));
    }
}
