//! 解码后的帧数据 (Frame).
//!
//! 解码帧的像素存储归解码器所有, 调用方只能在下一次取帧之前借用它.
//! 这一约束通过生命周期表达: `FrameRef<'a>` 借用自 `&'a mut Decoder`,
//! 因此在帧被丢弃之前无法再次调用 `receive_frame`.

use yuvpipe_core::PixelFormat;

/// 单个平面的借用视图
#[derive(Debug, Clone, Copy)]
pub struct Plane<'a> {
    /// 平面像素数据 (从第 0 行起始, 可能含行尾对齐填充)
    pub data: &'a [u8],
    /// 每行的字节跨度 (linesize / stride), 不小于逻辑行宽
    pub linesize: usize,
}

/// 解码帧访问接口
///
/// 不同解码引擎的帧缓冲布局各不相同, 写出端只通过此接口读取平面.
pub trait DecodedFrame {
    /// 宽度 (像素)
    fn width(&self) -> u32;

    /// 高度 (像素)
    fn height(&self) -> u32;

    /// 像素格式
    fn pixel_format(&self) -> PixelFormat {
        PixelFormat::Yuv420p
    }

    /// 图片类型 (I/P/B 帧), 引擎不提供时为 `PictureType::None`
    fn picture_type(&self) -> PictureType {
        PictureType::None
    }

    /// 获取指定平面, 索引超出 `pixel_format().plane_count()` 时返回 None
    fn plane(&self, index: usize) -> Option<Plane<'_>>;
}

/// 从解码器借出的帧
pub type FrameRef<'a> = Box<dyn DecodedFrame + 'a>;

/// 视频帧
///
/// 以借用切片描述各平面的通用帧, 适用于自行管理缓冲区的解码器.
/// 例如 YUV420P 格式有 3 个平面: Y, U, V.
#[derive(Debug, Clone)]
pub struct VideoFrame<'a> {
    /// 各平面的像素数据
    pub data: Vec<&'a [u8]>,
    /// 各平面每行的字节数 (linesize / stride)
    pub linesize: Vec<usize>,
    /// 宽度 (像素)
    pub width: u32,
    /// 高度 (像素)
    pub height: u32,
    /// 像素格式
    pub pixel_format: PixelFormat,
    /// 图片类型 (I/P/B 帧)
    pub picture_type: PictureType,
}

impl<'a> VideoFrame<'a> {
    /// 创建没有平面数据的视频帧
    pub fn new(width: u32, height: u32, pixel_format: PixelFormat) -> Self {
        let plane_count = pixel_format.plane_count() as usize;
        Self {
            data: vec![&[][..]; plane_count],
            linesize: vec![0; plane_count],
            width,
            height,
            pixel_format,
            picture_type: PictureType::None,
        }
    }

    /// 设置指定平面的数据与跨度
    pub fn with_plane(mut self, index: usize, data: &'a [u8], linesize: usize) -> Self {
        if index < self.data.len() {
            self.data[index] = data;
            self.linesize[index] = linesize;
        }
        self
    }
}

impl DecodedFrame for VideoFrame<'_> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    fn picture_type(&self) -> PictureType {
        self.picture_type
    }

    fn plane(&self, index: usize) -> Option<Plane<'_>> {
        Some(Plane {
            data: *self.data.get(index)?,
            linesize: *self.linesize.get(index)?,
        })
    }
}

/// 图片类型 (I/P/B 帧)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PictureType {
    /// 未指定
    #[default]
    None,
    /// I 帧 (帧内编码)
    I,
    /// P 帧 (前向预测)
    P,
    /// B 帧 (双向预测)
    B,
    /// SI 帧 (切换 I 帧)
    Si,
    /// SP 帧 (切换 P 帧)
    Sp,
}

impl PictureType {
    /// 从 H.264 slice_type 映射 (0..=9, 5..=9 表示整帧同类型)
    pub fn from_h264_slice_type(slice_type: u32) -> Self {
        match slice_type % 5 {
            0 => Self::P,
            1 => Self::B,
            2 => Self::I,
            3 => Self::Sp,
            _ => Self::Si,
        }
    }
}

impl std::fmt::Display for PictureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "Other"),
            Self::I => write!(f, "I"),
            Self::P => write!(f, "P"),
            Self::B => write!(f, "B"),
            Self::Si => write!(f, "SI"),
            Self::Sp => write!(f, "SP"),
        }
    }
}
