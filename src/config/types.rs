//! 配置数据结构定义
//!
//! 定义探测器的配置结构体、时长解析和验证逻辑

use crate::error::ConfigError;
use crate::health::retry::RetryPolicy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 主配置结构，启动时解析一次，之后只读
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// 目标URL，为空时每轮探测都会失败
    pub url: String,
    /// 探测日志文件路径（追加写入）
    pub logfile: PathBuf,
    /// 探测间隔
    #[serde(with = "duration_serde")]
    pub interval: Duration,
    /// 静默模式：不向控制台回显探测日志
    pub silent: bool,
    /// 详细模式：强制回显并启用延迟告警，优先于静默模式
    pub verbose: bool,
    /// 延迟告警阈值（秒）
    pub threshold: f64,
    /// 每轮最多尝试次数
    pub retries: u32,
    /// 单次请求超时时间
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// 重试间隔（固定退避）
    #[serde(with = "duration_serde")]
    pub retry_delay: Duration,
    /// 诊断日志级别
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: String::new(),
            logfile: PathBuf::from(default_logfile()),
            interval: Duration::from_secs(2),
            silent: false,
            verbose: false,
            threshold: 0.5,
            retries: 3,
            request_timeout: Duration::from_secs(10),
            retry_delay: Duration::from_secs(2),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// 探测日志是否需要同时输出到控制台
    ///
    /// 只有 silent 且非 verbose 时才仅写文件。
    pub fn echo_to_console(&self) -> bool {
        !self.silent || self.verbose
    }

    /// 延迟超阈值时是否输出告警
    pub fn latency_warnings_enabled(&self) -> bool {
        self.verbose
    }

    /// 根据配置构造重试策略
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries, self.retry_delay)
    }
}

/// 默认日志文件名
pub fn default_logfile() -> &'static str {
    "healthcheck.log"
}

/// 配置验证函数
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &Config) -> Result<(), String> {
    if config.interval.is_zero() {
        return Err("检测间隔必须大于0".to_string());
    }

    if config.retries == 0 {
        return Err("重试次数至少为1".to_string());
    }

    if !config.threshold.is_finite() || config.threshold < 0.0 {
        return Err(format!("无效的延迟阈值: {}", config.threshold));
    }

    if config.request_timeout.is_zero() {
        return Err("请求超时时间不能为0".to_string());
    }

    if config.logfile.as_os_str().is_empty() {
        return Err("日志文件路径不能为空".to_string());
    }

    // 空URL允许启动，但非空时必须是HTTP(S)地址
    if !config.url.is_empty()
        && !config.url.starts_with("http://")
        && !config.url.starts_with("https://")
    {
        return Err(format!("URL格式无效: {}", config.url));
    }

    let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_log_levels.contains(&config.log_level.as_str()) {
        return Err(format!(
            "无效的日志级别: {}，支持的级别: {:?}",
            config.log_level, valid_log_levels
        ));
    }

    Ok(())
}

/// 解析形如 `100ms`、`2s`、`1m30s`、`1.5h` 的时长字符串
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidDuration {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = input.trim();
    if trimmed == "0" {
        return Ok(Duration::ZERO);
    }

    let whole = Regex::new(r"^(?:(?:\d+(?:\.\d*)?|\.\d+)(?:ns|us|µs|μs|ms|s|m|h))+$")
        .map_err(|e| invalid(&e.to_string()))?;
    if !whole.is_match(trimmed) {
        return Err(invalid("expected a number followed by ns, us, ms, s, m or h"));
    }

    let component = Regex::new(r"(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|μs|ms|s|m|h)")
        .map_err(|e| invalid(&e.to_string()))?;

    let mut total_nanos = 0f64;
    for captures in component.captures_iter(trimmed) {
        let value: f64 = captures[1]
            .parse()
            .map_err(|_| invalid("malformed number"))?;
        let unit_nanos = match &captures[2] {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return Err(invalid("unknown unit")),
        };
        total_nanos += value * unit_nanos;
    }

    if total_nanos > u64::MAX as f64 {
        return Err(invalid("value out of range"));
    }

    Ok(Duration::from_nanos(total_nanos.round() as u64))
}

/// 将时长格式化为 `parse_duration` 可读回的字符串
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        "0s".to_string()
    } else if nanos % 1_000_000_000 == 0 {
        format!("{}s", duration.as_secs())
    } else if nanos % 1_000_000 == 0 {
        format!("{}ms", duration.as_millis())
    } else if nanos % 1_000 == 0 {
        format!("{}us", duration.as_micros())
    } else {
        format!("{nanos}ns")
    }
}

/// Duration序列化模块，使用人类可读的时长字符串
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
