//! Endpoint Vitals 主程序入口
//!
//! 周期性HTTP端点健康探测工具

use anyhow::{Context, Result};
use clap::Parser;
use endpoint_vitals::cli::Args;
use endpoint_vitals::config::Config;
use endpoint_vitals::health::{CycleOutcome, HttpHealthChecker, Scheduler};
use endpoint_vitals::logging::{LogConfig, LoggingSystem, ProbeLog, SinkMode};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};

// 单目标、单执行流，不需要多线程运行时
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // 配置错误在日志系统初始化之前发生，直接写标准错误
    let config = match args.resolve_config().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let log_config = LogConfig::from_level_str(&config.log_level);
    if let Err(e) = LoggingSystem::setup_logging(log_config) {
        eprintln!("初始化日志系统失败: {e}");
        return ExitCode::FAILURE;
    }

    info!("Endpoint Vitals v{} 启动", endpoint_vitals::VERSION);

    match run(config, args.once).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// 初始化组件并运行调度器
async fn run(config: Config, once: bool) -> Result<ExitCode> {
    let probe_log = ProbeLog::open(&config.logfile, SinkMode::for_config(&config))?;

    if config.url.is_empty() {
        tracing::warn!("未配置URL，每轮探测都将失败");
    }

    let checker = Arc::new(
        HttpHealthChecker::new(config.request_timeout, config.retry_policy())
            .context("创建HTTP探测器失败")?,
    );

    let mut scheduler = Scheduler::new(checker, Arc::new(config), probe_log);

    if once {
        let outcome = scheduler.run_once().await;
        return Ok(match outcome {
            CycleOutcome::Logged => ExitCode::SUCCESS,
            CycleOutcome::LogWriteFailed | CycleOutcome::Exhausted => ExitCode::FAILURE,
        });
    }

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        let _ = shutdown_tx.send(());
    });

    let stats = scheduler.run(shutdown_rx).await;
    info!(
        "探测已停止，共 {} 轮：成功 {}，失败 {}",
        stats.cycles, stats.logged, stats.exhausted
    );

    Ok(ExitCode::SUCCESS)
}

/// 等待 Ctrl+C 或 SIGTERM
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => {
                        if let Err(err) = result {
                            error!("监听中断信号失败: {}", err);
                        }
                    }
                    _ = terminate.recv() => {}
                }
            }
            Err(err) => {
                error!("监听SIGTERM失败: {}", err);
                if let Err(err) = tokio::signal::ctrl_c().await {
                    error!("监听中断信号失败: {}", err);
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("监听中断信号失败: {}", err);
        }
    }

    info!("收到中断信号，正在停止服务...");
}
