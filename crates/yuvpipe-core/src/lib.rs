//! # yuvpipe-core
//!
//! yuvpipe 核心库, 提供错误类型、像素格式定义和比特流读取器.
//!
//! 编解码层与管线层共用本 crate 中的类型.

pub mod bitreader;
pub mod error;
pub mod pixel_format;

// 重导出常用类型
pub use error::{Error, Result};
pub use pixel_format::PixelFormat;
