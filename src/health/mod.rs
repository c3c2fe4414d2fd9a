//! 健康检测模块
//!
//! 提供HTTP探测、有界重试、结果处理和间隔调度功能

pub mod checker;
pub mod result;
pub mod retry;
pub mod scheduler;

// 重新导出主要类型
pub use checker::{HealthChecker, HttpHealthChecker};
pub use result::ProbeResult;
pub use retry::RetryPolicy;
pub use scheduler::{CycleOutcome, CycleStats, Scheduler};
