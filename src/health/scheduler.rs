//! 任务调度器模块
//!
//! 按固定间隔驱动探测，每次触发同步执行一轮探测并写入探测日志

use crate::config::Config;
use crate::health::{HealthChecker, ProbeResult};
use crate::logging::{ProbeLog, REPORT_TARGET};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// 单轮探测的最终结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// 收到响应并写入了探测日志
    Logged,
    /// 收到响应，但写探测日志失败
    LogWriteFailed,
    /// 重试耗尽，没有写入探测日志
    Exhausted,
}

/// 调度统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// 已执行的轮数
    pub cycles: u64,
    /// 写入探测日志的轮数
    pub logged: u64,
    /// 重试耗尽的轮数
    pub exhausted: u64,
    /// 触发延迟告警的次数
    pub slow_warnings: u64,
}

/// 是否需要输出延迟告警：仅在 verbose 且延迟严格超过阈值时
pub fn should_warn_latency(result: &ProbeResult, threshold_secs: f64, verbose: bool) -> bool {
    verbose && result.exceeds_threshold(threshold_secs)
}

/// 任务调度器
///
/// 单个目标、单个执行流：上一轮探测结束前不会开始下一轮。
pub struct Scheduler {
    /// 探测器
    checker: Arc<dyn HealthChecker>,
    /// 启动时解析的配置
    config: Arc<Config>,
    /// 探测日志sink
    probe_log: ProbeLog,
    /// 统计
    stats: CycleStats,
}

impl Scheduler {
    /// 创建新的调度器
    pub fn new(checker: Arc<dyn HealthChecker>, config: Arc<Config>, probe_log: ProbeLog) -> Self {
        Self {
            checker,
            config,
            probe_log,
            stats: CycleStats::default(),
        }
    }

    /// 当前统计
    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    /// 运行调度循环，直到收到关闭信号
    ///
    /// 第一次探测发生在启动后一个完整间隔。探测耗时超过间隔时，
    /// 下一次触发顺延而不是补发。
    pub async fn run(&mut self, mut shutdown: broadcast::Receiver<()>) -> CycleStats {
        let period = self.config.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "启动探测任务: {}，间隔 {:?}，最多尝试 {} 次",
            self.config.url, period, self.config.retries
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_once().await;
                }
                _ = shutdown.recv() => {
                    info!("收到关闭信号，停止探测任务");
                    break;
                }
            }
        }

        self.stats
    }

    /// 执行一轮探测并处理结果
    pub async fn run_once(&mut self) -> CycleOutcome {
        debug!("开始探测: {}", self.config.url);
        let result = self.checker.check(&self.config.url).await;
        self.report(&result)
    }

    /// 处理一轮探测结果：输出诊断信息并写入探测日志
    fn report(&mut self, result: &ProbeResult) -> CycleOutcome {
        self.stats.cycles += 1;

        let Some(message) = result.log_message() else {
            self.stats.exhausted += 1;
            error!(
                target: REPORT_TARGET,
                "{} failed after {} retries: {}",
                result.url,
                result.attempts,
                result.error.as_deref().unwrap_or("unknown error")
            );
            return CycleOutcome::Exhausted;
        };

        if should_warn_latency(
            result,
            self.config.threshold,
            self.config.latency_warnings_enabled(),
        ) {
            self.stats.slow_warnings += 1;
            warn!(
                target: REPORT_TARGET,
                "Warning: {} response time ({:?}) exceeded threshold of {}s",
                result.url, result.response_time, self.config.threshold
            );
        }

        match self.probe_log.info(&message) {
            Ok(()) => {
                self.stats.logged += 1;
                CycleOutcome::Logged
            }
            Err(e) => {
                error!(target: REPORT_TARGET, "{}", e);
                CycleOutcome::LogWriteFailed
            }
        }
    }
}
