//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口，并与配置文件合并

use crate::config::{parse_duration, Config, ConfigLoader, TomlConfigLoader};
use crate::error::Result;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

/// Endpoint Vitals - 周期性HTTP端点健康探测
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "endpoint-vitals",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 要探测的URL
    #[arg(long, value_name = "URL", help = "URL to check", env = "ENDPOINT_VITALS_URL")]
    pub url: Option<String>,

    /// 探测日志文件
    #[arg(
        long,
        value_name = "FILE",
        help = "file to log output to [default: healthcheck.log]",
        env = "ENDPOINT_VITALS_LOGFILE"
    )]
    pub logfile: Option<PathBuf>,

    /// 探测间隔
    #[arg(
        long,
        value_name = "DURATION",
        value_parser = parse_duration_arg,
        help = "interval between health checks, e.g. 500ms, 2s, 1m [default: 2s]",
        env = "ENDPOINT_VITALS_INTERVAL"
    )]
    pub interval: Option<Duration>,

    /// 静默模式
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "do not echo probe results to stdout",
        env = "ENDPOINT_VITALS_SILENT"
    )]
    pub silent: bool,

    /// 详细模式，优先于静默模式
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "echo probe results and warn on slow responses; overrides --silent",
        env = "ENDPOINT_VITALS_VERBOSE"
    )]
    pub verbose: bool,

    /// 延迟告警阈值（秒）
    #[arg(
        long,
        value_name = "SECONDS",
        help = "response time above which a response is considered too slow [default: 0.5]",
        env = "ENDPOINT_VITALS_THRESHOLD"
    )]
    pub threshold: Option<f64>,

    /// 每轮最多尝试次数
    #[arg(
        long,
        value_name = "COUNT",
        help = "maximum attempts per check [default: 3]",
        env = "ENDPOINT_VITALS_RETRIES"
    )]
    pub retries: Option<u32>,

    /// 单次请求超时
    #[arg(
        long,
        value_name = "DURATION",
        value_parser = parse_duration_arg,
        help = "timeout for a single request [default: 10s]",
        env = "ENDPOINT_VITALS_TIMEOUT"
    )]
    pub timeout: Option<Duration>,

    /// 重试间隔
    #[arg(
        long,
        value_name = "DURATION",
        value_parser = parse_duration_arg,
        help = "fixed delay between failed attempts [default: 2s]",
        env = "ENDPOINT_VITALS_RETRY_DELAY"
    )]
    pub retry_delay: Option<Duration>,

    /// TOML配置文件，命令行参数优先
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "TOML configuration file; flags take precedence",
        env = "ENDPOINT_VITALS_CONFIG"
    )]
    pub config: Option<PathBuf>,

    /// 诊断日志级别
    #[arg(
        long,
        value_name = "LEVEL",
        help = "diagnostic log level: trace, debug, info, warn, error [default: info]",
        env = "ENDPOINT_VITALS_LOG_LEVEL"
    )]
    pub log_level: Option<String>,

    /// 只执行一轮探测后退出
    #[arg(long, help = "run a single check immediately and exit")]
    pub once: bool,
}

/// clap 使用的时长解析器
fn parse_duration_arg(raw: &str) -> std::result::Result<Duration, String> {
    parse_duration(raw).map_err(|e| e.to_string())
}

impl Args {
    /// 用命令行参数覆盖配置
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(ref url) = self.url {
            config.url = url.clone();
        }
        if let Some(ref logfile) = self.logfile {
            config.logfile = logfile.clone();
        }
        if let Some(interval) = self.interval {
            config.interval = interval;
        }
        if self.silent {
            config.silent = true;
        }
        if self.verbose {
            config.verbose = true;
        }
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(retries) = self.retries {
            config.retries = retries;
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout = timeout;
        }
        if let Some(retry_delay) = self.retry_delay {
            config.retry_delay = retry_delay;
        }
        if let Some(ref log_level) = self.log_level {
            config.log_level = log_level.to_lowercase();
        }
    }

    /// 解析最终配置：默认值 < 配置文件 < 命令行/环境变量，合并后验证
    pub async fn resolve_config(&self) -> Result<Config> {
        let loader = TomlConfigLoader::new(true);

        let mut config = match self.config {
            Some(ref path) => loader.load_from_file(path).await?,
            None => Config::default(),
        };

        self.apply_overrides(&mut config);
        loader.validate(&config)?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, EndpointVitalsError};
    use clap::CommandFactory;
    use std::io::Write;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_all_flags() {
        let args = Args::try_parse_from([
            "endpoint-vitals",
            "--url",
            "http://localhost:8080/health",
            "--logfile",
            "/tmp/check.log",
            "--interval",
            "100ms",
            "--silent",
            "--verbose",
            "--threshold",
            "0.25",
            "--retries",
            "5",
            "--timeout",
            "3s",
            "--retry-delay",
            "250ms",
            "--log-level",
            "DEBUG",
        ])
        .unwrap();

        let mut config = Config::default();
        args.apply_overrides(&mut config);

        assert_eq!(config.url, "http://localhost:8080/health");
        assert_eq!(config.logfile, PathBuf::from("/tmp/check.log"));
        assert_eq!(config.interval, Duration::from_millis(100));
        assert!(config.silent);
        assert!(config.verbose);
        assert!(config.echo_to_console());
        assert_eq!(config.threshold, 0.25);
        assert_eq!(config.retries, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.retry_delay, Duration::from_millis(250));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_invalid_interval_rejected_by_parser() {
        let result = Args::try_parse_from(["endpoint-vitals", "--interval", "fast"]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_resolve_defaults() {
        let args = Args::default();
        let config = args.resolve_config().await.unwrap();
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn test_resolve_rejects_zero_interval() {
        let args = Args {
            interval: Some(Duration::ZERO),
            ..Default::default()
        };

        let result = args.resolve_config().await;
        assert!(matches!(
            result,
            Err(EndpointVitalsError::Config(ConfigError::ValidationError(_)))
        ));
    }

    #[tokio::test]
    async fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "url = \"http://from-file/health\"").unwrap();
        writeln!(file, "retries = 7").unwrap();
        writeln!(file, "interval = \"5s\"").unwrap();

        let args = Args {
            config: Some(file.path().to_path_buf()),
            retries: Some(2),
            ..Default::default()
        };

        let config = args.resolve_config().await.unwrap();
        assert_eq!(config.url, "http://from-file/health");
        assert_eq!(config.retries, 2);
        assert_eq!(config.interval, Duration::from_secs(5));
    }
}
