//! 访问单元 (Packet).
//!
//! 一个 Packet 对应码流中一个完整、可独立送入解码器的访问单元.

use bytes::Bytes;

use crate::frame::PictureType;

/// 压缩数据包 (访问单元)
///
/// 由码流分割器产生, 立即送入解码器, 不做持久保存.
/// `data` 从分割器的累积缓冲区中切出, 之后不再复制.
#[derive(Debug, Clone)]
pub struct Packet {
    /// 压缩数据 (含起始码)
    pub data: Bytes,
    /// 首字节在输入流中的字节偏移 (-1 表示未知)
    pub pos: i64,
    /// 是否为关键帧 (IDR)
    pub is_keyframe: bool,
    /// 首个切片的图片类型
    pub picture_type: PictureType,
    /// 分割器输出的访问单元序号 (从 0 开始)
    pub sequence: u64,
}

impl Packet {
    /// 创建空数据包 (flush 信号)
    pub fn empty() -> Self {
        Self {
            data: Bytes::new(),
            pos: -1,
            is_keyframe: false,
            picture_type: PictureType::None,
            sequence: 0,
        }
    }

    /// 从数据创建数据包
    pub fn from_data(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            ..Self::empty()
        }
    }

    /// 数据大小 (字节)
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 是否为空包 (flush packet)
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
