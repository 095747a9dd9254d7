//! # yuvpipe-codec
//!
//! yuvpipe 编解码接口库, 定义访问单元 (Packet)、解码帧 (Frame) 以及
//! 解码器 (`Decoder`) 和码流分割器 (`UnitSplitter`) 两个能力接口.
//!
//! 管线驱动只依赖这两个接口, 任何符合约定的实现都可以替换进来.
//!
//! ## 内置实现
//!
//! - **分割器**: H.264 Annex B 访问单元分割器 (`H264Splitter`)
//! - **解码器**: 基于 OpenH264 的 H.264 解码器 (`openh264` feature)
//!
//! ## 使用示例
//!
//! ```rust
//! use yuvpipe_codec::{H264Splitter, UnitSplitter};
//!
//! let mut splitter = H264Splitter::new();
//! let (consumed, unit) = splitter.consume(&[0x00, 0x00, 0x01, 0x09, 0xF0], 0).unwrap();
//! assert_eq!(consumed, 5);
//! assert!(unit.is_none());
//! ```

pub mod decoder;
pub mod decoders;
pub mod frame;
pub mod packet;
pub mod parser;
pub mod parsers;

// 重导出常用类型
pub use decoder::Decoder;
pub use frame::{DecodedFrame, FrameRef, PictureType, Plane, VideoFrame};
pub use packet::Packet;
pub use parser::{StreamInfo, UnitSplitter};
pub use parsers::h264::H264Splitter;

#[cfg(feature = "openh264")]
pub use decoders::openh264::OpenH264Decoder;
