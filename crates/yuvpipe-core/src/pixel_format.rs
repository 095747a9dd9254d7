//! 像素格式定义.
//!
//! 定义解码帧中像素的平面布局, 并据此计算每个平面的逻辑行宽与行数.
//! 子采样平面的尺寸一律向下取整 (奇数宽高时色度平面丢弃最后半个像素).

use std::fmt;

/// 像素格式
///
/// 仅包含 8 位平面格式, 每个分量占 1 字节.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum PixelFormat {
    /// 未指定
    #[default]
    None,
    /// YUV 4:2:0 平面格式, 8 位 (H.264 默认输出)
    Yuv420p,
    /// YUV 4:2:2 平面格式, 8 位
    Yuv422p,
    /// YUV 4:4:4 平面格式, 8 位
    Yuv444p,
    /// 灰度 8 位 (单平面)
    Gray8,
}

impl PixelFormat {
    /// 获取色度子采样 (log2 水平, log2 垂直)
    ///
    /// 例如 YUV420 返回 (1, 1), 表示色度分辨率为亮度的 1/2 x 1/2.
    pub const fn chroma_subsampling(&self) -> (u32, u32) {
        match self {
            Self::Yuv420p => (1, 1),
            Self::Yuv422p => (1, 0),
            _ => (0, 0),
        }
    }

    /// 平面数量
    pub const fn plane_count(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::Yuv420p | Self::Yuv422p | Self::Yuv444p => 3,
            Self::Gray8 => 1,
        }
    }

    /// 计算指定平面每行的逻辑字节数 (不含对齐填充)
    ///
    /// # 返回
    /// - `Some(bytes)`: 该平面每行的有效字节数
    /// - `None`: 格式为 None 或平面索引超出范围
    pub fn plane_linesize(&self, plane: usize, width: u32) -> Option<usize> {
        if plane >= self.plane_count() as usize {
            return None;
        }
        let w = width as usize;
        let (sub_h, _) = self.chroma_subsampling();
        Some(if plane == 0 { w } else { w >> sub_h })
    }

    /// 计算指定平面的行数
    ///
    /// # 返回
    /// - `Some(rows)`: 该平面的行数
    /// - `None`: 格式为 None 或平面索引超出范围
    pub fn plane_height(&self, plane: usize, height: u32) -> Option<usize> {
        if plane >= self.plane_count() as usize {
            return None;
        }
        let h = height as usize;
        let (_, sub_v) = self.chroma_subsampling();
        Some(if plane == 0 { h } else { h >> sub_v })
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Yuv420p => "yuv420p",
            Self::Yuv422p => "yuv422p",
            Self::Yuv444p => "yuv444p",
            Self::Gray8 => "gray8",
        };
        write!(f, "{name}")
    }
}
