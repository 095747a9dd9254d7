//! H.264/AVC 码流解析器.
//!
//! 提供对 H.264 Annex B 码流的解析能力:
//! - NAL 单元起始码扫描与类型识别
//! - SPS (Sequence Parameter Set) 尺寸解析
//! - 流式访问单元分割 (`H264Splitter`)

pub mod nal;
pub mod splitter;
pub mod sps;

pub use nal::{NalUnit, NalUnitType, nal_units};
pub use splitter::H264Splitter;
pub use sps::{Sps, parse_sps};
