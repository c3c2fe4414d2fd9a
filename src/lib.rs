//! Endpoint Vitals - 周期性HTTP端点健康探测工具
//!
//! 按固定间隔探测单个URL，支持：
//! - 传输失败时按固定间隔重试
//! - 记录成功请求的状态码与延迟
//! - 延迟超阈值告警（详细模式）
//! - 追加写入探测日志，可选同时回显到控制台

pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;

// 重新导出主要类型
pub use config::Config;
pub use error::EndpointVitalsError;
pub use health::{HealthChecker, HttpHealthChecker, ProbeResult, Scheduler};
pub use logging::{ProbeLog, SinkMode};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
