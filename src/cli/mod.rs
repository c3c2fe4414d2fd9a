//! 命令行接口模块
//!
//! 提供CLI参数解析以及与配置文件的合并

pub mod args;

// 重新导出主要类型
pub use args::Args;
