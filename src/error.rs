//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use std::path::PathBuf;
use thiserror::Error;

/// Endpoint Vitals 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum EndpointVitalsError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 探测相关错误
    #[error("探测错误: {0}")]
    Probe(#[from] ProbeError),

    /// 探测日志相关错误
    #[error("探测日志错误: {0}")]
    ProbeLog(#[from] ProbeLogError),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },

    /// 时长格式错误
    #[error("invalid duration {input:?}: {reason}")]
    InvalidDuration { input: String, reason: String },
}

/// 探测错误类型
#[derive(Error, Debug)]
pub enum ProbeError {
    /// 传输层失败（连接拒绝、超时、DNS等）
    #[error("{message}")]
    Transport {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP客户端构建失败
    #[error("HTTP客户端构建失败: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

/// 探测日志写入错误
#[derive(Error, Debug)]
pub enum ProbeLogError {
    /// 日志文件无法打开
    #[error("Error creating log file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 写入失败
    #[error("写入探测日志失败: {0}")]
    Write(#[from] std::io::Error),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, EndpointVitalsError>;
