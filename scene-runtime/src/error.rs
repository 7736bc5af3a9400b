//! # Error 模块
//!
//! 定义 scene-runtime 中使用的错误类型。

use thiserror::Error;

/// 资源加载错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// 资源未找到
    #[error("资源未找到: {path}")]
    NotFound {
        /// 逻辑路径
        path: String,
    },

    /// 资源加载失败
    #[error("加载 {kind} 资源失败: {path} - {message}")]
    LoadFailed {
        /// 逻辑路径
        path: String,
        /// 资源类型（audio, image）
        kind: String,
        /// 错误消息
        message: String,
    },
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),

    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    Io(String),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}

/// 音频系统装配错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SetupError {
    /// 音频输出的通道数量不正确
    #[error("音频通道数量不是 {expected} 个（实际 {actual} 个）")]
    ChannelCount { expected: usize, actual: usize },
}
