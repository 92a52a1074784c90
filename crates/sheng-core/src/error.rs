//! 统一错误类型定义.
//!
//! 所有笙 crate 共用的错误类型, 支持跨模块传播.
//!
//! 频谱重建的四个逐帧阶段本身不可失败 (输入在上游码流解析阶段已验证);
//! 错误只产生于构造边界, 即由原始数组装配带不变量的频带布局/游程表时.

use thiserror::Error;

/// 笙框架统一错误类型
#[derive(Debug, Error)]
pub enum ShengError {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 无效数据 (违反布局不变量等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// 不支持的操作
    #[error("不支持的操作: {0}")]
    Unsupported(String),

    /// 内部错误 (不应发生)
    #[error("内部错误: {0}")]
    Internal(String),
}

/// 笙框架统一 Result 类型
pub type ShengResult<T> = Result<T, ShengError>;
