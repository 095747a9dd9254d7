//! # yuvpipe
//!
//! 把 H.264 Annex B 裸码流流式解码为原始平面 YUV 帧.
//!
//! 输入按固定大小分块读取, 访问单元边界与读取边界无关; 分割器在内部
//! 累积不完整的单元, 解码器逐单元产出帧, 输入结束后刷新解码器取出
//! 全部缓存帧. 每帧只写出各平面的有效像素, 不含行尾填充.
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use std::fs::File;
//! use std::io::BufWriter;
//!
//! use yuvpipe::codec::{H264Splitter, OpenH264Decoder};
//! use yuvpipe::{Pipeline, PipelineConfig};
//!
//! # fn main() -> yuvpipe::core::Result<()> {
//! let mut splitter = H264Splitter::new();
//! let mut decoder = OpenH264Decoder::new()?;
//! let input = File::open("input.h264")?;
//! let output = BufWriter::new(File::create("output.yuv")?);
//!
//! let stats = Pipeline::new(PipelineConfig::default(), &mut splitter, &mut decoder)?
//!     .run(input, output)?;
//! println!("{} 帧, {} 字节", stats.frames, stats.bytes_written);
//! # Ok(())
//! # }
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `yuvpipe-core` | 错误类型、像素格式、比特流读取 |
//! | `yuvpipe-codec` | 访问单元、解码帧、解码器与分割器接口及内置实现 |

/// 核心类型与工具
pub use yuvpipe_core as core;

/// 编解码接口与内置实现
pub use yuvpipe_codec as codec;

pub mod pipeline;
pub mod reader;
pub mod writer;

pub use pipeline::{Pipeline, PipelineConfig, PipelineStats};
pub use reader::{ChunkReader, DEFAULT_CHUNK_SIZE};
pub use writer::FramePlanarWriter;

/// 获取 yuvpipe 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
