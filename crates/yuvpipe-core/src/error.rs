//! 统一错误类型定义.
//!
//! 所有 yuvpipe crate 共用的错误类型, 支持跨模块传播.
//! `NeedMoreData` 与 `Eof` 是解码器接口上的流程信号, 不会越过管线驱动.

use thiserror::Error as ThisError;

/// yuvpipe 统一错误类型
#[derive(Debug, ThisError)]
pub enum Error {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 不支持的操作
    #[error("不支持的操作: {0}")]
    Unsupported(String),

    /// 编解码器错误 (拒绝数据包或解码失败)
    #[error("编解码器错误: {0}")]
    Codec(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 数据不足, 需要更多输入
    #[error("数据不足, 需要更多输入")]
    NeedMoreData,

    /// 已到达流末尾
    #[error("已到达流末尾")]
    Eof,

    /// 无效数据 (损坏的码流、帧平面几何不合法等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// 未找到或无法初始化指定的编解码器
    #[error("未找到编解码器: {0}")]
    CodecNotFound(String),

    /// 内部错误 (不应发生)
    #[error("内部错误: {0}")]
    Internal(String),
}

impl Error {
    /// 是否为解码器流程信号 (而非真正的失败)
    pub fn is_flow_signal(&self) -> bool {
        matches!(self, Self::NeedMoreData | Self::Eof)
    }
}

/// yuvpipe 统一 Result 类型
pub type Result<T> = std::result::Result<T, Error>;
