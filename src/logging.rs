//! 日志系统模块
//!
//! 包含两部分：
//! - 诊断日志：基于 tracing 输出到标准错误（重试、延迟告警、失败信息）
//! - 探测日志：追加写入日志文件、可选回显到控制台的 `ProbeLog`

use crate::config::Config;
use crate::error::ProbeLogError;
use chrono::{DateTime, Local};
use log::LevelFilter;
use std::fs::OpenOptions;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::filter::{Directive, Targets};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

/// 探测日志时间戳格式，例如 `2026/10/19 14:03:27`
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// 探测报告的 tracing target：重试、延迟告警、重试耗尽
///
/// 该 target 的 WARN 及以上事件总是写到标准错误，不受 `--log-level` 和 `RUST_LOG` 影响。
pub const REPORT_TARGET: &str = "endpoint_vitals::report";

/// 诊断日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志级别
    pub level: LevelFilter,
    /// 是否输出ANSI颜色
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            // 标准错误被重定向到文件时不输出颜色控制符
            ansi: std::io::stderr().is_terminal(),
        }
    }
}

impl LogConfig {
    /// 从级别字符串创建配置，无法识别时回退到 info
    pub fn from_level_str(level: &str) -> Self {
        Self {
            level: LevelFilter::from_str(level).unwrap_or(LevelFilter::Info),
            ..Default::default()
        }
    }
}

/// 全局初始化结果，只初始化一次
static GLOBAL_LOGGING_STATE: OnceLock<Mutex<Option<Result<(), String>>>> = OnceLock::new();

/// 诊断日志系统管理器
#[derive(Debug)]
pub struct LoggingSystem {
    config: LogConfig,
}

impl LoggingSystem {
    /// 初始化诊断日志系统
    ///
    /// 重复调用不会重复安装 subscriber，后续调用直接返回之前的结果。
    pub fn setup_logging(config: LogConfig) -> anyhow::Result<Self> {
        let state_mutex = GLOBAL_LOGGING_STATE.get_or_init(|| Mutex::new(None));
        let mut state = state_mutex
            .lock()
            .map_err(|_| anyhow::anyhow!("日志状态锁已损坏"))?;

        if state.is_none() {
            *state = Some(Self::perform_initialization(&config).map_err(|e| e.to_string()));
        }

        match state.as_ref() {
            Some(Err(e)) => Err(anyhow::anyhow!("日志系统初始化失败: {}", e)),
            _ => Ok(Self { config }),
        }
    }

    /// 当前配置
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// 检查日志系统是否已初始化
    pub fn is_initialized() -> bool {
        GLOBAL_LOGGING_STATE
            .get()
            .and_then(|state| state.lock().ok().map(|s| s.is_some()))
            .unwrap_or(false)
    }

    fn perform_initialization(config: &LogConfig) -> anyhow::Result<()> {
        // log crate 到 tracing 的桥接，reqwest 等依赖通过 log 输出
        tracing_log::LogTracer::init().map_err(|e| anyhow::anyhow!("LogTracer初始化失败: {}", e))?;

        // LogTracer 已在上面安装，这里只设置 subscriber
        tracing::subscriber::set_global_default(build_subscriber(config, std::io::stderr)?)
            .map_err(|e| anyhow::anyhow!("tracing subscriber初始化失败: {}", e))?;

        tracing::debug!("日志配置: {:?}", config);
        Ok(())
    }
}

/// 构建诊断日志 subscriber
///
/// 两个输出层共用同一个写入器：
/// - 普通诊断经过 `EnvFilter`，由日志级别和 `RUST_LOG` 控制
/// - `REPORT_TARGET` 上的事件只经过固定的 WARN 过滤，日志级别无法关闭
pub fn build_subscriber<W>(
    config: &LogConfig,
    make_writer: W,
) -> anyhow::Result<impl tracing::Subscriber + Send + Sync + 'static>
where
    W: for<'w> MakeWriter<'w> + Clone + Send + Sync + 'static,
{
    let report_off: Directive = format!("{REPORT_TARGET}=off")
        .parse()
        .map_err(|e| anyhow::anyhow!("无效的日志指令: {}", e))?;

    let env_filter = EnvFilter::from_default_env()
        .add_directive(convert_level_to_directive(config.level))
        .add_directive(report_off);

    let diagnostics = fmt::layer()
        .with_writer(make_writer.clone())
        .with_timer(fmt::time::ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_ansi(config.ansi)
        .with_target(false)
        .with_filter(env_filter);

    let reports = fmt::layer()
        .with_writer(make_writer)
        .with_timer(fmt::time::ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_ansi(config.ansi)
        .with_target(false)
        .with_filter(Targets::new().with_target(REPORT_TARGET, tracing::Level::WARN));

    Ok(registry().with(diagnostics).with(reports))
}

/// 将 log::LevelFilter 转换为 tracing 的指令
fn convert_level_to_directive(level: LevelFilter) -> Directive {
    use tracing_subscriber::filter::LevelFilter as TracingLevel;
    match level {
        LevelFilter::Off => Directive::from(TracingLevel::OFF),
        LevelFilter::Error => Directive::from(tracing::Level::ERROR),
        LevelFilter::Warn => Directive::from(tracing::Level::WARN),
        LevelFilter::Info => Directive::from(tracing::Level::INFO),
        LevelFilter::Debug => Directive::from(tracing::Level::DEBUG),
        LevelFilter::Trace => Directive::from(tracing::Level::TRACE),
    }
}

/// 探测日志输出目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    /// 仅写文件
    FileOnly,
    /// 同时写文件和控制台，内容一致
    FileAndConsole,
}

impl SinkMode {
    /// 根据配置选择输出目标，见 `Config::echo_to_console`
    pub fn for_config(config: &Config) -> Self {
        if config.echo_to_console() {
            SinkMode::FileAndConsole
        } else {
            SinkMode::FileOnly
        }
    }
}

/// 格式化一行探测日志：`INFO: <date> <time> <message>`
pub fn format_line(level: &str, timestamp: &DateTime<Local>, message: &str) -> String {
    format!(
        "{}: {} {}\n",
        level,
        timestamp.format(TIMESTAMP_FORMAT),
        message.trim_end_matches('\n')
    )
}

/// 探测结果日志sink
///
/// 在进程生命周期内保持文件以追加模式打开，所有写入都不会截断已有内容。
pub struct ProbeLog {
    file: Box<dyn Write + Send>,
    console: Option<Box<dyn Write + Send>>,
    path: Option<PathBuf>,
}

impl ProbeLog {
    /// 以追加模式打开（必要时创建）日志文件
    pub fn open(path: impl AsRef<Path>, mode: SinkMode) -> Result<Self, ProbeLogError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| ProbeLogError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        let console: Option<Box<dyn Write + Send>> = match mode {
            SinkMode::FileOnly => None,
            SinkMode::FileAndConsole => Some(Box::new(std::io::stdout())),
        };

        Ok(Self {
            file: Box::new(file),
            console,
            path: Some(path.to_path_buf()),
        })
    }

    /// 使用任意写入器构造，主要用于测试
    pub fn from_writers(
        file: Box<dyn Write + Send>,
        console: Option<Box<dyn Write + Send>>,
    ) -> Self {
        Self {
            file,
            console,
            path: None,
        }
    }

    /// 日志文件路径（通过 `open` 创建时可用）
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 是否回显到控制台
    pub fn echoes_to_console(&self) -> bool {
        self.console.is_some()
    }

    /// 写入一行 INFO 级别日志，时间戳由sink添加
    pub fn info(&mut self, message: &str) -> Result<(), ProbeLogError> {
        let line = format_line("INFO", &Local::now(), message);
        self.write_line(&line)
    }

    fn write_line(&mut self, line: &str) -> Result<(), ProbeLogError> {
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;

        if let Some(console) = self.console.as_mut() {
            console.write_all(line.as_bytes())?;
            console.flush()?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for ProbeLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeLog")
            .field("path", &self.path)
            .field("console", &self.console.is_some())
            .finish()
    }
}
