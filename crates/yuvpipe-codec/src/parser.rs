//! 码流分割器 trait 定义.
//!
//! 裸码流中没有长度前缀, 访问单元的边界需要逐字节扫描才能发现,
//! 而且与读取块的边界毫无关系. 分割器在内部累积不完整的单元,
//! 每次调用只推进一部分输入.

use yuvpipe_core::Result;

use crate::packet::Packet;

/// 码流基本信息 (在解析到序列头后可用)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    /// 编解码器完整名称
    pub codec_name: String,
    /// 图像宽度 (像素, 已应用裁剪)
    pub width: u32,
    /// 图像高度 (像素, 已应用裁剪)
    pub height: u32,
}

/// 访问单元分割器 trait
///
/// 约定:
/// - 输入非空时, 返回的消耗字节数必须大于 0 且不超过输入长度
/// - 返回的访问单元只引用已消耗或此前已缓存的数据
/// - 调用方需把未消耗的剩余部分再次送入, 直到当前块用完
pub trait UnitSplitter {
    /// 获取分割器名称
    fn name(&self) -> &str;

    /// 消耗一段输入, 在凑齐一个完整访问单元时返回它
    ///
    /// # 参数
    /// - `data`: 当前块中尚未消耗的字节
    /// - `pos`: `data[0]` 在输入流中的字节偏移
    ///
    /// # 返回
    /// `(消耗的字节数, 可选的访问单元)`
    fn consume(&mut self, data: &[u8], pos: i64) -> Result<(usize, Option<Packet>)>;

    /// 输入结束时取出最后一个仍在缓存中的访问单元
    fn flush(&mut self) -> Option<Packet>;

    /// 码流基本信息, 尚未解析到时返回 None
    fn stream_info(&self) -> Option<StreamInfo> {
        None
    }
}
